//! Readability-style heuristic: find the largest coherent text block in a
//! document, penalizing link-heavy chrome, and return it as article text.

use memex_core::types::ExtractedContent;
use scraper::{ElementRef, Html, Selector};

/// Elements whose subtree never contributes article text.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
    "button", "select", "iframe",
];

/// Block-level elements assembled into the final article text.
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre",
];

/// Extracts the main article from an HTML document.
///
/// Returns `None` when the document has no coherent article block or the
/// extracted text is shorter than `min_content_length`; the caller treats
/// this as a normal skip.
pub fn extract_from_html(html: &str, min_content_length: usize) -> Option<ExtractedContent> {
    let doc = Html::parse_document(html);

    let root = best_candidate(&doc).or_else(|| body_of(&doc))?;
    let content = assemble_content(root);
    if content.is_empty() || content.len() < min_content_length {
        return None;
    }

    let word_count = content.split_whitespace().count();
    let reading_time = ((word_count + 199) / 200) as u32;
    let excerpt = extract_excerpt(&doc, &content);

    Some(ExtractedContent {
        title: extract_title(&doc),
        byline: extract_byline(&doc),
        content_length: content.len(),
        word_count,
        excerpt,
        content,
        reading_time,
    })
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn body_of(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&selector("body")).next()
}

/// Picks the candidate container with the highest text mass after link
/// penalty. Semantic containers are tried first; text-heavy divs/sections are
/// the fallback for soup-of-divs pages.
fn best_candidate(doc: &Html) -> Option<ElementRef<'_>> {
    let primary = selector("article, main, [role=\"main\"]");
    let secondary = selector("div, section");

    pick_best(doc.select(&primary)).or_else(|| pick_best(doc.select(&secondary)))
}

fn pick_best<'a>(candidates: impl Iterator<Item = ElementRef<'a>>) -> Option<ElementRef<'a>> {
    let mut best: Option<(i64, usize, ElementRef)> = None;
    for el in candidates {
        let text = subtree_text(el);
        let total = text.len();
        let links = link_text_len(el);
        let score = total as i64 - 2 * links as i64;
        if score <= 0 {
            continue;
        }
        let better = match &best {
            None => true,
            // Equal score means the same paragraphs seen through a wrapper;
            // the smaller subtree is the tighter article boundary.
            Some((best_score, best_total, _)) => {
                score > *best_score || (score == *best_score && total < *best_total)
            }
        };
        if better {
            best = Some((score, total, el));
        }
    }
    best.map(|(_, _, el)| el)
}

/// Concatenated text of the subtree, noise subtrees excluded, whitespace
/// compacted.
fn subtree_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    compact_ws(&out)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !NOISE_TAGS.contains(&child_el.value().name()) {
                collect_text(child_el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

fn link_text_len(el: ElementRef<'_>) -> usize {
    let anchors = selector("a");
    el.select(&anchors).map(|a| subtree_text(a).len()).sum()
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins the container's top-level block elements with blank lines; falls
/// back to the raw subtree text for containers without block markup.
fn assemble_content(root: ElementRef<'_>) -> String {
    let blocks = selector("p, h1, h2, h3, h4, h5, h6, li, blockquote, pre");
    let mut parts: Vec<String> = Vec::new();

    for block in root.select(&blocks) {
        if has_excluded_ancestor(root, block) {
            continue;
        }
        let text = subtree_text(block);
        if !text.is_empty() {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        subtree_text(root)
    } else {
        parts.join("\n\n")
    }
}

/// True when a block ancestor (nested markup, counted once at the outer
/// level) or a noise ancestor sits between the element and the chosen root.
fn has_excluded_ancestor(root: ElementRef<'_>, el: ElementRef<'_>) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.id() == root.id() {
            return false;
        }
        if let Some(ancestor_el) = ElementRef::wrap(ancestor) {
            let name = ancestor_el.value().name();
            if BLOCK_TAGS.contains(&name) || NOISE_TAGS.contains(&name) {
                return true;
            }
        }
    }
    false
}

fn extract_title(doc: &Html) -> String {
    if let Some(el) = doc.select(&selector("title")).next() {
        let title = compact_ws(&el.text().collect::<String>());
        if !title.is_empty() {
            return title;
        }
    }
    if let Some(el) = doc.select(&selector("meta[property=\"og:title\"]")).next() {
        if let Some(content) = el.value().attr("content") {
            let title = compact_ws(content);
            if !title.is_empty() {
                return title;
            }
        }
    }
    if let Some(el) = doc.select(&selector("h1")).next() {
        return compact_ws(&el.text().collect::<String>());
    }
    String::new()
}

fn extract_byline(doc: &Html) -> Option<String> {
    if let Some(el) = doc.select(&selector("meta[name=\"author\"]")).next() {
        if let Some(content) = el.value().attr("content") {
            let byline = compact_ws(content);
            if !byline.is_empty() {
                return Some(byline);
            }
        }
    }
    doc.select(&selector("[rel=\"author\"], .byline, .author"))
        .next()
        .map(|el| compact_ws(&el.text().collect::<String>()))
        .filter(|byline| !byline.is_empty())
}

fn extract_excerpt(doc: &Html, content: &str) -> String {
    for css in [
        "meta[name=\"description\"]",
        "meta[property=\"og:description\"]",
    ] {
        if let Some(el) = doc.select(&selector(css)).next() {
            if let Some(description) = el.value().attr("content") {
                let excerpt = compact_ws(description);
                if !excerpt.is_empty() {
                    return excerpt;
                }
            }
        }
    }
    content.chars().take(300).collect()
}
