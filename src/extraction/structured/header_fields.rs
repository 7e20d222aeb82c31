//! Narrow selectors for the posting's header fields.
//!
//! Every field is optional; a missing element leaves the field `None`.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::extraction::core::text::{
    compile_selectors, detect_job_type, detect_workplace_type, first_matching_text, inline_text,
    looks_like_salary, parse_applicant_count, truncate_chars,
};
use crate::extraction::core::{HeaderFields, SourceStrategy};

use super::{DescriptionExtractor, StructuredMatch};

static TITLE: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".top-card-layout__title",
        ".topcard__title",
        ".jobs-unified-top-card__job-title",
    ])
});

static COMPANY: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".topcard__org-name-link",
        ".top-card-layout__second-subline .topcard__flavor a",
        ".jobs-unified-top-card__company-name",
    ])
});

static LOCATION: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".topcard__flavor--bullet",
        ".jobs-unified-top-card__bullet",
    ])
});

static SALARY: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".compensation__salary",
        ".salary.compensation__salary",
        ".salary",
        "[class*='salary']",
    ])
});

static APPLICANTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".num-applicants__caption",
        ".jobs-unified-top-card__applicant-count",
        ".topcard__flavor--metadata",
    ])
});

static CRITERIA_ITEM: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".description__job-criteria-item").expect("invalid criteria item selector")
});
static CRITERIA_LABEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".description__job-criteria-subheader").expect("invalid criteria label selector")
});
static CRITERIA_VALUE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".description__job-criteria-text").expect("invalid criteria value selector")
});

static APPLY_CONTROLS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "button.jobs-apply-button, .apply-button, [data-tracking-control-name*='apply'], a.topcard__link--apply",
    )
    .expect("invalid apply control selector")
});

#[derive(Debug, Clone)]
pub struct HeaderFieldScanner {
    max_chars: usize,
}

impl HeaderFieldScanner {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Scan a parsed document for header fields.
    pub fn scan(&self, document: &Html) -> HeaderFields {
        let root = document.root_element();
        let mut fields = HeaderFields {
            title: first_matching_text(root, &TITLE, self.max_chars),
            company: first_matching_text(root, &COMPANY, self.max_chars),
            location: first_matching_text(root, &LOCATION, self.max_chars),
            salary: first_matching_text(root, &SALARY, self.max_chars)
                .filter(|text| looks_like_salary(text)),
            num_applicants: APPLICANTS
                .iter()
                .flat_map(|selector| root.select(selector))
                .find_map(|element| parse_applicant_count(&inline_text(element))),
            easy_apply: easy_apply(document),
            ..Default::default()
        };

        for (label, value) in criteria(document) {
            let value = truncate_chars(&value, self.max_chars);
            match label.to_ascii_lowercase().as_str() {
                "seniority level" if fields.seniority_level.is_none() => {
                    fields.seniority_level = Some(value);
                }
                "employment type" if fields.job_type.is_none() => {
                    fields.job_type = detect_job_type(&value).or(Some(value));
                }
                _ => {}
            }
        }

        if fields.workplace_type.is_none() {
            fields.workplace_type = fields.location.as_deref().and_then(detect_workplace_type);
        }

        fields
    }
}

impl DescriptionExtractor for HeaderFieldScanner {
    fn name(&self) -> &'static str {
        "header-fields"
    }

    fn strategy(&self) -> Option<SourceStrategy> {
        None
    }

    fn extract(&self, document: &Html) -> StructuredMatch {
        StructuredMatch {
            description: None,
            fields: self.scan(document),
        }
    }
}

/// `(label, value)` pairs of the job criteria list.
fn criteria(document: &Html) -> Vec<(String, String)> {
    document
        .select(&CRITERIA_ITEM)
        .filter_map(|item| {
            let label = child_text(item, &CRITERIA_LABEL)?;
            let value = child_text(item, &CRITERIA_VALUE)?;
            Some((label, value))
        })
        .collect()
}

fn child_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .map(inline_text)
        .find(|text| !text.is_empty())
}

/// `Some(true)` for an "Easy Apply" control, `Some(false)` for any other
/// apply control, `None` when the page shows none.
fn easy_apply(document: &Html) -> Option<bool> {
    let mut saw_apply = false;
    for control in document.select(&APPLY_CONTROLS) {
        let text = inline_text(control).to_ascii_lowercase();
        if text.contains("easy apply") {
            return Some(true);
        }
        saw_apply = true;
    }
    saw_apply.then_some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP_CARD: &str = r#"
        <section class="top-card-layout">
          <h1 class="top-card-layout__title">Staff Platform Engineer</h1>
          <div class="top-card-layout__second-subline">
            <span class="topcard__flavor"><a class="topcard__org-name-link">Acme Corp</a></span>
            <span class="topcard__flavor topcard__flavor--bullet">Austin, TX (Hybrid)</span>
            <figcaption class="num-applicants__caption">Over 200 applicants</figcaption>
          </div>
          <div class="salary compensation__salary">$180,000.00/yr - $220,000.00/yr</div>
          <button class="jobs-apply-button">Easy Apply</button>
        </section>
        <ul class="description__job-criteria-list">
          <li class="description__job-criteria-item">
            <h3 class="description__job-criteria-subheader">Seniority level</h3>
            <span class="description__job-criteria-text">Mid-Senior level</span>
          </li>
          <li class="description__job-criteria-item">
            <h3 class="description__job-criteria-subheader">Employment type</h3>
            <span class="description__job-criteria-text">Full-time</span>
          </li>
        </ul>
    "#;

    #[test]
    fn scans_top_card_and_criteria() {
        let fields = HeaderFieldScanner::new(200).scan(&Html::parse_document(TOP_CARD));

        assert_eq!(fields.title.as_deref(), Some("Staff Platform Engineer"));
        assert_eq!(fields.company.as_deref(), Some("Acme Corp"));
        assert_eq!(fields.location.as_deref(), Some("Austin, TX (Hybrid)"));
        assert_eq!(fields.workplace_type.as_deref(), Some("Hybrid"));
        assert_eq!(fields.salary.as_deref(), Some("$180,000.00/yr - $220,000.00/yr"));
        assert_eq!(fields.num_applicants, Some(200));
        assert_eq!(fields.easy_apply, Some(true));
        assert_eq!(fields.seniority_level.as_deref(), Some("Mid-Senior level"));
        assert_eq!(fields.job_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn external_apply_is_not_easy_apply() {
        let html = r#"<a class="apply-button" data-tracking-control-name="public_jobs_apply-link-offsite">Apply on company website</a>"#;
        let fields = HeaderFieldScanner::new(200).scan(&Html::parse_document(html));
        assert_eq!(fields.easy_apply, Some(false));
    }

    #[test]
    fn absent_fields_stay_none() {
        let fields = HeaderFieldScanner::new(200).scan(&Html::parse_document("<p>nothing</p>"));
        assert!(fields.is_empty());
    }
}
