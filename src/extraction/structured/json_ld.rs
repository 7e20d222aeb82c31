//! `JobPosting` schema.org objects embedded as JSON-LD.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::extraction::core::SourceStrategy;
use crate::extraction::core::text::strip_markup;

use super::{DescriptionExtractor, StructuredMatch};

static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("invalid JSON-LD selector")
});

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLdExtractor;

impl JsonLdExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptionExtractor for JsonLdExtractor {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn strategy(&self) -> Option<SourceStrategy> {
        Some(SourceStrategy::JsonLd)
    }

    fn extract(&self, document: &Html) -> StructuredMatch {
        let mut found = StructuredMatch::default();

        for element in document.select(&JSON_LD_SELECTOR) {
            let raw = element.inner_html();
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value = match serde_json::from_str::<Value>(raw) {
                Ok(value) => value,
                Err(err) => {
                    log::debug!("skipping malformed JSON-LD block: {err}");
                    continue;
                }
            };

            for posting in job_postings(&value) {
                apply_posting(posting, &mut found);
                if found.description.is_some() {
                    return found;
                }
            }
        }

        found
    }
}

/// All `JobPosting` objects in a JSON-LD payload: a single object, an array,
/// or a `@graph` container.
fn job_postings(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_postings(value, &mut out);
    out
}

fn collect_postings<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_postings(item, out)),
        Value::Object(map) => {
            if is_job_posting(value) {
                out.push(value);
            }
            if let Some(graph) = map.get("@graph") {
                collect_postings(graph, out);
            }
        }
        _ => {}
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn apply_posting(posting: &Value, found: &mut StructuredMatch) {
    if found.description.is_none() {
        found.description = posting
            .get("description")
            .and_then(Value::as_str)
            .map(strip_markup)
            .filter(|text| !text.is_empty());
    }

    let fields = &mut found.fields;
    if fields.title.is_none() {
        fields.title = non_empty_str(posting.get("title"));
    }
    if fields.company.is_none() {
        fields.company = posting
            .get("hiringOrganization")
            .and_then(|org| non_empty_str(org.get("name")).or_else(|| non_empty_str(Some(org))));
    }
    if fields.location.is_none() {
        fields.location = posting.get("jobLocation").and_then(format_location);
    }
    if fields.salary.is_none() {
        fields.salary = posting.get("baseSalary").and_then(format_salary);
    }
    if fields.job_type.is_none() {
        fields.job_type = posting.get("employmentType").and_then(format_employment_type);
    }
    if fields.workplace_type.is_none()
        && posting.get("jobLocationType").and_then(Value::as_str) == Some("TELECOMMUTE")
    {
        fields.workplace_type = Some("Remote".into());
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn format_location(value: &Value) -> Option<String> {
    let place = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    let address = place.get("address").unwrap_or(place);
    if let Value::String(text) = address {
        let text = text.trim();
        return (!text.is_empty()).then(|| text.to_string());
    }

    let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
        .iter()
        .filter_map(|key| {
            let part = address.get(*key)?;
            non_empty_str(Some(part)).or_else(|| non_empty_str(part.get("name")))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// `{currency} {min}-{max} / {unit}` from a nested `MonetaryAmount`.
fn format_salary(value: &Value) -> Option<String> {
    let currency = value
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let amount = value.get("value")?;

    let (range, unit) = match amount {
        Value::Object(_) => {
            let min = amount.get("minValue").and_then(format_number);
            let max = amount.get("maxValue").and_then(format_number);
            let single = amount.get("value").and_then(format_number);
            let range = match (min, max, single) {
                (Some(min), Some(max), _) if min != max => format!("{min}-{max}"),
                (Some(min), _, _) => min,
                (None, Some(max), _) => max,
                (None, None, Some(value)) => value,
                (None, None, None) => return None,
            };
            let unit = amount
                .get("unitText")
                .and_then(Value::as_str)
                .or_else(|| value.get("unitText").and_then(Value::as_str));
            (range, unit)
        }
        other => (
            format_number(other)?,
            value.get("unitText").and_then(Value::as_str),
        ),
    };

    let mut salary = if currency.is_empty() {
        range
    } else {
        format!("{currency} {range}")
    };
    if let Some(unit) = unit.filter(|unit| !unit.is_empty()) {
        salary.push_str(" / ");
        salary.push_str(&unit.to_ascii_lowercase());
    }
    Some(salary)
}

fn format_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else {
                let float = number.as_f64()?;
                if float.fract() == 0.0 {
                    Some(format!("{float:.0}"))
                } else {
                    Some(format!("{float:.2}"))
                }
            }
        }
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn format_employment_type(value: &Value) -> Option<String> {
    let labels: Vec<String> = match value {
        Value::String(kind) => vec![employment_label(kind)],
        Value::Array(kinds) => kinds
            .iter()
            .filter_map(Value::as_str)
            .map(employment_label)
            .collect(),
        _ => return None,
    };
    let labels: Vec<String> = labels.into_iter().filter(|label| !label.is_empty()).collect();
    (!labels.is_empty()).then(|| labels.join(", "))
}

fn employment_label(raw: &str) -> String {
    match raw.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
        "FULL_TIME" => "Full-time".into(),
        "PART_TIME" => "Part-time".into(),
        "CONTRACTOR" | "CONTRACT" => "Contract".into(),
        "TEMPORARY" => "Temporary".into(),
        "INTERN" | "INTERNSHIP" => "Internship".into(),
        "VOLUNTEER" => "Volunteer".into(),
        "PER_DIEM" => "Per diem".into(),
        "OTHER" => "Other".into(),
        _ => raw.trim().to_string(),
    }
}
