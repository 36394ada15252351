//! Suggestion application — mutates a `ResumeOutline` in place when the user
//! accepts an AI suggestion.
//!
//! Three suggestion kinds exist on the wire (camelCase, matching the
//! suggestion payload the analysis service emits): add a bullet to an
//! existing section, rewrite an existing bullet by item id, or add a project
//! idea, creating a "Projects" section on the fly if the target section is
//! missing.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::outline::{Item, ItemKind, ResumeOutline, Section};

/// An AI suggestion as delivered by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    #[serde(rename_all = "camelCase")]
    AddBullet {
        id: String,
        title: String,
        suggested_text: String,
        target_section_id: String,
    },
    #[serde(rename_all = "camelCase")]
    RewriteBullet {
        id: String,
        title: String,
        #[serde(default)]
        original_text: Option<String>,
        suggested_text: String,
        target_item_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ProjectIdea {
        id: String,
        title: String,
        suggested_text: String,
        target_section_id: String,
    },
}

impl Suggestion {
    pub fn id(&self) -> &str {
        match self {
            Suggestion::AddBullet { id, .. }
            | Suggestion::RewriteBullet { id, .. }
            | Suggestion::ProjectIdea { id, .. } => id,
        }
    }
}

/// Applies a suggestion to the outline. Returns whether anything changed:
/// an `AddBullet` targeting a missing section is a no-op, as is a
/// `RewriteBullet` whose item id matches nothing. `ProjectIdea` always
/// applies, creating its target section when absent.
pub fn apply_suggestion(outline: &mut ResumeOutline, suggestion: &Suggestion) -> bool {
    match suggestion {
        Suggestion::AddBullet {
            suggested_text,
            target_section_id,
            ..
        } => {
            let Some(section) = outline
                .sections
                .iter_mut()
                .find(|s| s.id == *target_section_id)
            else {
                return false;
            };
            section.items.push(new_item("item", suggested_text));
            true
        }
        Suggestion::RewriteBullet {
            suggested_text,
            target_item_id,
            ..
        } => {
            let mut changed = false;
            for section in &mut outline.sections {
                for item in &mut section.items {
                    if item.id == *target_item_id {
                        item.text = suggested_text.clone();
                        changed = true;
                    }
                }
            }
            changed
        }
        Suggestion::ProjectIdea {
            suggested_text,
            target_section_id,
            ..
        } => {
            let idx = match outline
                .sections
                .iter()
                .position(|s| s.id == *target_section_id)
            {
                Some(idx) => idx,
                None => {
                    outline.sections.push(Section {
                        id: target_section_id.clone(),
                        title: "Projects".to_string(),
                        items: Vec::new(),
                    });
                    outline.sections.len() - 1
                }
            };
            outline.sections[idx].items.push(new_item("proj", suggested_text));
            true
        }
    }
}

/// Rewrites the text of an existing item in place (the live-preview edit
/// path). Returns false when the item id matches nothing.
pub fn edit_item_text(outline: &mut ResumeOutline, item_id: &str, text: &str) -> bool {
    for section in &mut outline.sections {
        for item in &mut section.items {
            if item.id == item_id {
                item.text = text.to_string();
                return true;
            }
        }
    }
    false
}

fn new_item(prefix: &str, text: &str) -> Item {
    Item {
        id: format!("{prefix}-{}", Utc::now().timestamp_millis()),
        kind: ItemKind::Bullet,
        text: text.to_string(),
    }
}
