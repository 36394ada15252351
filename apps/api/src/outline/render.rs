//! Outline export rendering — plain text and Markdown.
//!
//! The styled DOCX export lives upstream; these renderings are what the
//! service can produce on its own for download fallbacks and previews.

use serde::{Deserialize, Serialize};

use crate::outline::ResumeOutline;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
}

pub fn render(outline: &ResumeOutline, format: ExportFormat) -> String {
    match format {
        ExportFormat::Text => to_text(outline),
        ExportFormat::Markdown => to_markdown(outline),
    }
}

/// Converts an outline to plain text.
pub fn to_text(outline: &ResumeOutline) -> String {
    let mut out = String::new();
    if !outline.name.is_empty() {
        out.push_str(&outline.name);
        out.push('\n');
    }
    for line in &outline.contact {
        out.push_str(line);
        out.push('\n');
    }
    for section in &outline.sections {
        out.push('\n');
        out.push_str(&section.title);
        out.push('\n');
        for item in &section.items {
            out.push_str("- ");
            out.push_str(&item.text);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// Converts an outline to Markdown: name as H1, section titles as H2,
/// items as list entries.
pub fn to_markdown(outline: &ResumeOutline) -> String {
    let mut out = String::new();
    if !outline.name.is_empty() {
        out.push_str("# ");
        out.push_str(&outline.name);
        out.push('\n');
    }
    if !outline.contact.is_empty() {
        out.push('\n');
        out.push_str(&outline.contact.join(" · "));
        out.push('\n');
    }
    for section in &outline.sections {
        out.push('\n');
        out.push_str("## ");
        out.push_str(&section.title);
        out.push('\n');
        for item in &section.items {
            out.push_str("- ");
            out.push_str(&item.text);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}
