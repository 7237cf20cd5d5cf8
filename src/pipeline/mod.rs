//! Pipeline stages for turning an article into a structured report.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the network stage can be swapped for a fake.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ html ──▶ client ──▶ postprocess ──▶ structure (+ table)
//! (files)    (text)   (model)    (cleanup)       (Document)
//! ```
//!
//! 1. [`source`]      — read the instruction and article files (`.docx` or text)
//! 2. [`html`]        — reduce a saved web page to its article text
//! 3. [`client`]      — call the generation service with retry/backoff; the
//!    only stage with network I/O
//! 4. [`postprocess`] — strip fences and invisible characters from the response
//! 5. [`structure`]   — single-pass line classifier producing the
//!    [`crate::document::Document`], with [`table`] accumulating pipe tables

pub mod client;
pub mod html;
pub mod postprocess;
pub mod source;
pub mod structure;
pub mod table;
