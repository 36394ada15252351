//! Resume outline — the structured (name/contact/sections/items) view of a
//! resume derived from extracted plain text.
//!
//! The outline is the single source of truth for the live preview: it is
//! built fresh on every extraction or re-analysis, mutated in place by edits
//! and accepted suggestions, and rendered on export. It is never persisted
//! server-side.

pub mod edits;
pub mod handlers;
pub mod parser;
pub mod render;

use serde::{Deserialize, Serialize};

/// Kind of outline item. Only bullets exist today; the tag is kept on the
/// wire so the preview can branch on it without guessing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Bullet,
}

/// A single bullet line of resume content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Synthetic id, unique within one parse. Used only as a UI key.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub text: String,
}

/// A named, ordered group of bullet items ("EXPERIENCE", "TECHNICAL SKILLS").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Lowercased title with whitespace runs collapsed to hyphens.
    pub id: String,
    /// The header line verbatim, pre-lowercase.
    pub title: String,
    pub items: Vec<Item>,
}

/// Structured outline of a resume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeOutline {
    /// First non-empty cleaned line of the input.
    pub name: String,
    /// Reserved for a future subtitle ("Software Engineer"); always empty.
    pub title: String,
    /// Up to two contact lines, third raw line before the second.
    pub contact: Vec<String>,
    pub sections: Vec<Section>,
}

impl ResumeOutline {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.contact.is_empty() && self.sections.is_empty()
    }
}

/// Derives a section id from a header line: lowercase, whitespace runs → "-".
pub fn section_id(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_id_lowercases_and_hyphenates() {
        assert_eq!(section_id("PROFESSIONAL SUMMARY"), "professional-summary");
        assert_eq!(section_id("TECHNICAL  SKILLS"), "technical-skills");
    }

    #[test]
    fn test_section_id_single_word() {
        assert_eq!(section_id("EXPERIENCE"), "experience");
    }

    #[test]
    fn test_item_kind_serializes_as_type_bullet() {
        let item = Item {
            id: "it-0-1".to_string(),
            kind: ItemKind::Bullet,
            text: "Did a thing".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "bullet");
    }

    #[test]
    fn test_empty_outline_is_empty() {
        assert!(ResumeOutline::default().is_empty());
    }
}
