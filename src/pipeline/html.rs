//! HTML → plain text for saved article pages.
//!
//! Saved blog pages carry navigation, sidebars and footers around the one
//! block that matters. The extractor prefers an article container, falls
//! back to every `<p>`, and finally to all visible text, so it always
//! returns *something* for the generation service to read.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

static RE_CONTAINER_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)content|main").unwrap());

static RE_CONTAINER_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)article|main|post").unwrap());

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

static SEL_CONTAINERS: Lazy<Selector> = Lazy::new(|| Selector::parse("article, div").unwrap());

static SEL_PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Elements whose text is never shown to a reader.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template", "head", "title"];

/// Extract readable article text from an HTML page.
///
/// Strategy, first non-empty result wins:
/// 1. `article`/`div` elements whose `id` matches `content|main` and whose
///    `class` matches `article|main|post` (case-insensitive); text nodes
///    separated by blank lines
/// 2. text of every `<p>`, separated by blank lines
/// 3. all visible text, one node per line
pub fn html_to_plain_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let containers = article_containers(&document);
    let text = if containers.is_empty() {
        debug!("No article container found; falling back to <p> text");
        document
            .select(&SEL_PARAGRAPHS)
            .map(|p| visible_text(p).join(" "))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        debug!("Extracting text from {} article container(s)", containers.len());
        containers
            .into_iter()
            .map(|c| visible_text(c).join("\n\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let text = RE_BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string();
    if !text.is_empty() {
        return text;
    }

    visible_text(document.root_element()).join("\n")
}

/// Matching containers, outermost only, in document order.
fn article_containers(document: &Html) -> Vec<ElementRef<'_>> {
    let matches: Vec<ElementRef<'_>> = document
        .select(&SEL_CONTAINERS)
        .filter(|el| {
            let attrs = el.value();
            let id_ok = attrs.id().is_some_and(|id| RE_CONTAINER_ID.is_match(id));
            let class_ok = attrs
                .attr("class")
                .is_some_and(|c| RE_CONTAINER_CLASS.is_match(c));
            id_ok && class_ok
        })
        .collect();

    let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();
    matches
        .into_iter()
        .filter(|el| !el.ancestors().any(|a| ids.contains(&a.id())))
        .collect()
}

/// Trimmed, non-empty text nodes under `root`, skipping invisible elements.
fn visible_text(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| INVISIBLE.contains(&e.name()))
            });
            let trimmed = text.trim();
            (!hidden && !trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}
