//! Text helpers shared by the structured and rendered extractors.
//!
//! `scraper` exposes raw text nodes only, so block boundaries are rebuilt here
//! to approximate what a browser's `innerText` would return.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Text content of an element with block elements separated by line breaks.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    normalize_whitespace(&raw)
}

/// Text held directly by the element, ignoring descendants.
pub fn own_text(element: ElementRef<'_>) -> String {
    let raw: String = element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| text.to_string()))
        .collect();
    collapse_spaces(&raw)
}

/// Single-line text of an element, used for short header fields.
pub fn inline_text(element: ElementRef<'_>) -> String {
    collapse_spaces(&element.text().collect::<String>())
}

/// Text of `container` that follows `marker` in document order, with the
/// same line structure as [`element_text`]. Empty when `marker` is not a
/// descendant of `container`.
pub fn text_after(container: ElementRef<'_>, marker: ElementRef<'_>) -> String {
    let mut raw = String::new();
    let mut emitting = false;
    collect_gated(container, Some(marker), &mut emitting, &mut raw);
    normalize_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let mut emitting = true;
    collect_gated(element, None, &mut emitting, out);
}

/// Output starts once `marker` has been passed; the marker's own subtree is
/// skipped.
fn collect_gated(
    element: ElementRef<'_>,
    marker: Option<ElementRef<'_>>,
    emitting: &mut bool,
    out: &mut String,
) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            if *emitting {
                out.push_str(text);
            }
            continue;
        }

        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };

        if marker.is_some_and(|marker| marker.id() == child.id()) {
            *emitting = true;
            out.push('\n');
            continue;
        }

        let name = child_element.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }

        let block = BLOCK_TAGS.contains(&name);
        if block && *emitting {
            out.push('\n');
        }
        collect_gated(child_element, marker, emitting, out);
        if block && *emitting {
            out.push('\n');
        }
    }
}

/// Collapse horizontal whitespace, trim every line, and drop blank lines.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_spaces(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compile a static selector list. Panics on invalid selectors, which are
/// programming errors.
pub fn compile_selectors(raw: &[&str]) -> Vec<Selector> {
    raw.iter()
        .map(|css| {
            Selector::parse(css).unwrap_or_else(|err| panic!("invalid selector `{css}`: {err}"))
        })
        .collect()
}

/// Text of the first element matching any selector, in selector order,
/// truncated to `max_chars`.
pub fn first_matching_text(
    root: ElementRef<'_>,
    selectors: &[Selector],
    max_chars: usize,
) -> Option<String> {
    selectors
        .iter()
        .flat_map(|selector| root.select(selector))
        .map(inline_text)
        .find(|text| !text.is_empty())
        .map(|text| truncate_chars(&text, max_chars))
}

/// Decode entities and drop markup from an HTML fragment, keeping paragraph
/// structure as line breaks.
pub fn strip_markup(fragment: &str) -> String {
    let decoded = html_escape::decode_html_entities(fragment);
    let parsed = Html::parse_fragment(&decoded);
    element_text(parsed.root_element())
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Extract the `<title>` of a raw HTML document without building a DOM.
pub fn page_title(body: &str) -> Option<String> {
    let caps = TITLE_RE.captures(body)?;
    let title = collapse_spaces(&html_escape::decode_html_entities(caps.get(1)?.as_str()));
    (!title.is_empty()).then_some(title)
}

/// Parse applicant counts such as "Over 200 applicants" or
/// "Be among the first 25 applicants".
pub fn parse_applicant_count(text: &str) -> Option<u32> {
    let caps = APPLICANTS_RE.captures(text)?;
    caps.get(1)?.as_str().replace(',', "").parse().ok()
}

/// Canonical employment type found in free text.
pub fn detect_job_type(text: &str) -> Option<String> {
    let caps = JOB_TYPE_RE.captures(text)?;
    let found = caps.get(1)?.as_str().to_ascii_lowercase();
    let canonical = match found.as_str() {
        "full-time" | "full time" => "Full-time",
        "part-time" | "part time" => "Part-time",
        "contract" => "Contract",
        "temporary" => "Temporary",
        "internship" => "Internship",
        "volunteer" => "Volunteer",
        _ => return None,
    };
    Some(canonical.to_string())
}

/// Canonical workplace type found in free text.
pub fn detect_workplace_type(text: &str) -> Option<String> {
    let caps = WORKPLACE_RE.captures(text)?;
    let found = caps.get(1)?.as_str().to_ascii_lowercase();
    let canonical = match found.as_str() {
        "remote" => "Remote",
        "hybrid" => "Hybrid",
        "on-site" | "onsite" | "on site" => "On-site",
        _ => return None,
    };
    Some(canonical.to_string())
}

pub fn looks_like_salary(text: &str) -> bool {
    SALARY_RE.is_match(text)
}

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"<title[^>]*>(.*?)</title>")
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("invalid title regex")
});

static APPLICANTS_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"(\d[\d,]*)\+?\s+(?:applicants?|people clicked apply)")
        .case_insensitive(true)
        .build()
        .expect("invalid applicants regex")
});

static JOB_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\b(full[- ]time|part[- ]time|contract|temporary|internship|volunteer)\b")
        .case_insensitive(true)
        .build()
        .expect("invalid job type regex")
});

static WORKPLACE_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\b(remote|hybrid|on[- ]?site)\b")
        .case_insensitive(true)
        .build()
        .expect("invalid workplace regex")
});

static SALARY_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"([$€£¥]\s?\d|\d\s?[kK]\b|\d[\d,.]*\s?(?:USD|EUR|GBP|CAD)|/\s?(?:yr|year|hr|hour|mo|month)\b)")
        .case_insensitive(true)
        .build()
        .expect("invalid salary regex")
});

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn block_elements_become_line_breaks() {
        let html = Html::parse_fragment(
            "<div><p>First   paragraph</p><ul><li>one</li><li>two</li></ul><span>tail</span></div>",
        );
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();

        assert_eq!(element_text(div), "First paragraph\none\ntwo\ntail");
    }

    #[test]
    fn scripts_are_ignored() {
        let html = Html::parse_fragment("<div>visible<script>var hidden = 1;</script></div>");
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();

        assert_eq!(element_text(div), "visible");
    }

    #[test]
    fn text_after_starts_at_the_marker_element() {
        let html = Html::parse_fragment(
            "<section><h1>Product Description Writer</h1><div><h2>Description</h2><p>Body</p></div><p>More</p></section>",
        );
        let section = html.select(&Selector::parse("section").unwrap()).next().unwrap();
        let heading = html.select(&Selector::parse("h2").unwrap()).next().unwrap();

        assert_eq!(text_after(section, heading), "Body\nMore");
    }

    #[test]
    fn strips_encoded_markup() {
        let text = strip_markup("&lt;p&gt;We build &amp;amp; ship.&lt;/p&gt;&lt;p&gt;Join us&lt;/p&gt;");
        assert_eq!(text, "We build & ship.\nJoin us");
    }

    #[test]
    fn parses_applicant_counts() {
        assert_eq!(parse_applicant_count("Over 200 applicants"), Some(200));
        assert_eq!(parse_applicant_count("Be among the first 25 applicants"), Some(25));
        assert_eq!(parse_applicant_count("1,204 applicants"), Some(1204));
        assert_eq!(parse_applicant_count("No applicants yet"), None);
    }

    #[test]
    fn reads_title_without_dom() {
        let body = "<html><head><title>\n Senior Engineer | Acme &amp; Co\n</title></head></html>";
        assert_eq!(page_title(body).as_deref(), Some("Senior Engineer | Acme & Co"));
    }

    #[test]
    fn first_match_follows_selector_order() {
        let html = Html::parse_document(
            "<div class='b'>second</div><div class='a'>  first   choice </div><div class='c'></div>",
        );
        let selectors = compile_selectors(&[".c", ".a", ".b"]);

        assert_eq!(
            first_matching_text(html.root_element(), &selectors, 200).as_deref(),
            Some("first choice")
        );
        assert_eq!(
            first_matching_text(html.root_element(), &selectors, 5).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("héllo world", 5), "héllo");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn detects_canonical_types() {
        assert_eq!(detect_job_type("Full time · Mid-Senior").as_deref(), Some("Full-time"));
        assert_eq!(detect_workplace_type("Onsite").as_deref(), Some("On-site"));
        assert!(looks_like_salary("$120K/yr - $150K/yr"));
        assert!(!looks_like_salary("Software Engineer"));
    }
}
