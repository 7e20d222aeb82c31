//! Header fields of the logged-in, client-rendered posting view.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::extraction::core::HeaderFields;
use crate::extraction::core::text::{
    compile_selectors, detect_job_type, detect_workplace_type, first_matching_text, inline_text,
    looks_like_salary, parse_applicant_count, truncate_chars,
};

static TITLE: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".job-details-jobs-unified-top-card__job-title",
        ".jobs-unified-top-card__job-title",
        ".top-card-layout__title",
        "h1",
    ])
});

static COMPANY: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".job-details-jobs-unified-top-card__company-name",
        ".jobs-unified-top-card__company-name",
        ".topcard__org-name-link",
    ])
});

static LOCATION: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".job-details-jobs-unified-top-card__primary-description-container .tvm__text",
        ".jobs-unified-top-card__bullet",
        ".topcard__flavor--bullet",
    ])
});

/// Insight pills carry salary, workplace and employment type.
static INSIGHTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".job-details-preferences-and-skills__pill",
        ".job-details-jobs-unified-top-card__job-insight",
        ".jobs-unified-top-card__job-insight",
        ".ui-label",
        "[class*='salary']",
    ])
});

static APPLICANTS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile_selectors(&[
        ".job-details-jobs-unified-top-card__primary-description-container",
        ".jobs-unified-top-card__applicant-count",
        ".num-applicants__caption",
    ])
});

static APPLY_BUTTON: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".jobs-apply-button, .jobs-s-apply button").expect("invalid apply selector")
});

/// Ordered "first matching selector, length-capped" field lookups.
#[derive(Debug, Clone)]
pub struct RenderedFieldScanner {
    max_chars: usize,
}

impl RenderedFieldScanner {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn scan(&self, document: &Html) -> HeaderFields {
        let root = document.root_element();
        let insights = texts(root, &INSIGHTS);

        let location = first_matching_text(root, &LOCATION, self.max_chars);
        let workplace_type = insights
            .iter()
            .find_map(|text| detect_workplace_type(text))
            .or_else(|| location.as_deref().and_then(detect_workplace_type));

        HeaderFields {
            title: first_matching_text(root, &TITLE, self.max_chars),
            company: first_matching_text(root, &COMPANY, self.max_chars),
            location,
            salary: insights
                .iter()
                .find(|text| looks_like_salary(text))
                .map(|text| truncate_chars(text, self.max_chars)),
            job_type: insights.iter().find_map(|text| detect_job_type(text)),
            workplace_type,
            num_applicants: texts(root, &APPLICANTS)
                .iter()
                .find_map(|text| parse_applicant_count(text)),
            easy_apply: document
                .select(&APPLY_BUTTON)
                .next()
                .map(|button| inline_text(button).to_ascii_lowercase().contains("easy apply")),
            seniority_level: None,
        }
    }
}

fn texts(root: ElementRef<'_>, selectors: &[Selector]) -> Vec<String> {
    selectors
        .iter()
        .flat_map(|selector| root.select(selector))
        .map(inline_text)
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_logged_in_top_card() {
        let html = r#"
            <div class="job-details-jobs-unified-top-card__company-name"><a>Acme Corp</a></div>
            <h1 class="job-details-jobs-unified-top-card__job-title">Backend Engineer</h1>
            <div class="job-details-jobs-unified-top-card__primary-description-container">
              <span class="tvm__text">Lisbon, Portugal</span>
              <span class="tvm__text">· 3 days ago ·</span>
              <span class="tvm__text">57 applicants</span>
            </div>
            <ul>
              <li class="job-details-preferences-and-skills__pill">€70K/yr - €90K/yr</li>
              <li class="job-details-preferences-and-skills__pill">Remote</li>
              <li class="job-details-preferences-and-skills__pill">Full-time</li>
            </ul>
            <button class="jobs-apply-button">Apply</button>
        "#;

        let fields = RenderedFieldScanner::new(200).scan(&Html::parse_document(html));

        assert_eq!(fields.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(fields.company.as_deref(), Some("Acme Corp"));
        assert_eq!(fields.location.as_deref(), Some("Lisbon, Portugal"));
        assert_eq!(fields.salary.as_deref(), Some("€70K/yr - €90K/yr"));
        assert_eq!(fields.workplace_type.as_deref(), Some("Remote"));
        assert_eq!(fields.job_type.as_deref(), Some("Full-time"));
        assert_eq!(fields.num_applicants, Some(57));
        assert_eq!(fields.easy_apply, Some(false));
    }

    #[test]
    fn long_matches_are_capped() {
        let long_title = "Engineer ".repeat(40);
        let html = format!("<h1>{long_title}</h1>");
        let fields = RenderedFieldScanner::new(20).scan(&Html::parse_document(&html));
        assert_eq!(fields.title.map(|t| t.chars().count()), Some(20));
    }
}
