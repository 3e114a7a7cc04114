//! Model card field extraction.
//!
//! A model card is markdown with optional YAML front matter:
//!
//! ```text
//! ---
//! license: apache-2.0
//! language: [en]
//! pipeline_tag: text-generation
//! ---
//! # Granite 3.1 8B
//!
//! Granite is a family of ...
//! ```

pub mod license;

use modelcar_core::metadata::ExtractedMetadata;
use serde_yaml::Value;

pub use license::{human_readable_license_name, license_url};

/// Front matter delimiter line.
const FRONT_MATTER_FENCE: &str = "---";

/// Extracts metadata fields from model card content.
pub trait ModelCardParser: Send + Sync {
    /// Full metadata record, including the readme body.
    fn parse_values(&self, content: &[u8]) -> ExtractedMetadata;

    /// Metadata reported in the run manifest. Same fields as
    /// [`parse_values`](Self::parse_values) without the readme body.
    fn parse_flags(&self, content: &[u8]) -> ExtractedMetadata {
        let mut metadata = self.parse_values(content);
        metadata.readme = None;
        metadata
    }
}

/// Parser reading YAML front matter and the leading markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontMatterParser;

impl FrontMatterParser {
    pub fn new() -> Self {
        Self
    }
}

impl ModelCardParser for FrontMatterParser {
    fn parse_values(&self, content: &[u8]) -> ExtractedMetadata {
        let text = String::from_utf8_lossy(content);
        let (front_matter, body) = split_front_matter(&text);

        let mut metadata = ExtractedMetadata::default();

        if let Some(raw) = front_matter {
            match serde_yaml::from_str::<Value>(raw) {
                Ok(value @ Value::Mapping(_)) => apply_front_matter(&mut metadata, &value),
                Ok(Value::Null) => {}
                Ok(_) => tracing::debug!("Front matter is not a mapping; ignoring"),
                Err(e) => tracing::warn!(error = %e, "Failed to parse model card front matter"),
            }
        }

        if metadata.name.is_none() {
            metadata.name = first_heading(body);
        }
        metadata.description = first_paragraph(body);

        let body = body.trim();
        if !body.is_empty() {
            metadata.readme = Some(body.to_string());
        }

        metadata
    }
}

/// Split `---` fenced front matter from the body.
///
/// Returns `(None, text)` when the text does not open with a fence or the
/// fence is never closed.
fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start_matches('\u{feff}');
    let Some(rest) = trimmed
        .strip_prefix(FRONT_MATTER_FENCE)
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
    else {
        return (None, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, text)
}

fn apply_front_matter(metadata: &mut ExtractedMetadata, front_matter: &Value) {
    if let Some(id) = scalar(front_matter, "license") {
        metadata.license_link = license_url(&id).map(str::to_string);
        metadata.license = Some(human_readable_license_name(&id));
    }
    if let Some(link) = scalar(front_matter, "license_link") {
        metadata.license_link = Some(link);
    }

    metadata.name = scalar(front_matter, "model_name");
    metadata.provider =
        scalar(front_matter, "provider").or_else(|| scalar(front_matter, "author"));
    metadata.language = string_list(front_matter, "language");
    metadata.tags = string_list(front_matter, "tags");
    metadata.tasks = string_list(front_matter, "pipeline_tag");
}

/// Non-empty scalar value rendered as a string.
fn scalar(front_matter: &Value, key: &str) -> Option<String> {
    let value = match front_matter.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// A string or a list of strings, without empty entries.
fn string_list(front_matter: &Value, key: &str) -> Vec<String> {
    match front_matter.get(key) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(_) => scalar(front_matter, key).into_iter().collect(),
        None => Vec::new(),
    }
}

fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|heading| heading.trim().to_string())
        .filter(|heading| !heading.is_empty())
}

/// First block of prose, skipping headings, lists, tables, quotes, code and HTML.
fn first_paragraph(body: &str) -> Option<String> {
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_code = false;

    for line in body.lines() {
        let line = line.trim();

        if line.starts_with("```") || line.starts_with("~~~") {
            in_code = !in_code;
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }
        if in_code {
            continue;
        }

        if line.is_empty() {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }

        let structural = line.starts_with('#')
            || line.starts_with('|')
            || line.starts_with('>')
            || line.starts_with('<')
            || line.starts_with("- ")
            || line.starts_with("* ")
            || line.starts_with("![")
            || line.chars().all(|c| matches!(c, '-' | '=' | '*' | '_'));
        if structural {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }

        paragraph.push(line);
    }

    (!paragraph.is_empty()).then(|| paragraph.join(" "))
}
