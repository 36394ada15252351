//! Outline parser — turns freeform extracted resume text into a
//! `ResumeOutline`.
//!
//! This is a total function: every input, including the empty string, yields
//! a well-formed (possibly empty) outline. Heuristics (the all-caps header
//! rule, the 60-char bound, the bullet glyph set) are tuned against real
//! extracted resumes; keep them as-is unless the classification boundary is
//! deliberately changed.

use chrono::Utc;
use regex::Regex;

use crate::outline::{section_id, Item, ItemKind, ResumeOutline, Section};

/// Upper bound (exclusive) on header length. An all-caps line at or past
/// this length is treated as an emphasized body line, not a header.
const MAX_HEADER_LEN: usize = 60;

/// Compiled-regex holder for line cleaning and header classification.
/// Build once (it lives in `AppState`) and reuse across parses.
pub struct OutlineParser {
    /// Leading extraction artifacts: one-or-more runs of '%' plus any one
    /// character and optional space, e.g. "%Ï %Ï Experience".
    artifact: Regex,
    /// Leading bullet glyph cluster followed by whitespace.
    bullet: Regex,
    /// All-caps header: uppercase letters, spaces, and '&' only.
    header: Regex,
    /// Multiline variants applied to whole extraction output.
    artifact_multiline: Regex,
    bullet_multiline: Regex,
}

impl Default for OutlineParser {
    fn default() -> Self {
        Self {
            artifact: Regex::new(r"^(%.\s*)+").unwrap(),
            bullet: Regex::new(r"^[•●▪·\-*]+\s+").unwrap(),
            header: Regex::new(r"^[A-Z][A-Z\s&]*$").unwrap(),
            artifact_multiline: Regex::new(r"(?m)^(%Ï\s*)+").unwrap(),
            bullet_multiline: Regex::new(r"(?m)^[•●▪·\-*]+\s+").unwrap(),
        }
    }
}

impl OutlineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one raw line: trim, strip leading "%<char>" artifact runs,
    /// strip a leading bullet glyph cluster, re-trim. Idempotent.
    pub fn clean_line(&self, line: &str) -> String {
        let t = line.trim();
        let t = self.artifact.replace(t, "");
        let t = self.bullet.replace(&t, "");
        t.trim().to_string()
    }

    /// Whole-text normalization applied to upstream extraction output before
    /// it is handed back to callers: the same artifact/bullet stripping as
    /// `clean_line`, anchored per line.
    pub fn normalize_extracted(&self, text: &str) -> String {
        let t = self.artifact_multiline.replace_all(text, "");
        self.bullet_multiline.replace_all(&t, "").to_string()
    }

    /// Header test: all-caps (letters, spaces, '&') and shorter than 60
    /// characters. Counted in chars, not bytes: `\s` admits non-ASCII
    /// whitespace such as U+00A0.
    pub fn is_section_header(&self, line: &str) -> bool {
        self.header.is_match(line) && line.chars().count() < MAX_HEADER_LEN
    }

    /// Parses extracted resume text into an outline.
    ///
    /// Line 1 becomes the name; raw lines 3 and 2 (in that order) become the
    /// contact block; everything from line 4 onward feeds the section
    /// builder. Sections and items preserve input order. A header with no
    /// following body lines is dropped, as is any body before the first
    /// header.
    pub fn parse(&self, text: &str) -> ResumeOutline {
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| self.clean_line(l))
            .collect();

        if lines.is_empty() {
            return ResumeOutline::default();
        }

        let name = lines[0].clone();

        let mut contact = Vec::new();
        if let Some(l) = lines.get(2).filter(|l| !l.is_empty()) {
            contact.push(l.clone()); // location line
        }
        if let Some(l) = lines.get(1).filter(|l| !l.is_empty()) {
            contact.push(l.clone()); // GitHub / LinkedIn line
        }

        let body: &[String] = lines.get(3..).unwrap_or(&[]);

        // One timestamp per parse; a running index keeps item ids unique
        // within the parse even across sections.
        let stamp = Utc::now().timestamp_millis();
        let mut item_seq = 0usize;

        let mut sections = Vec::new();
        let mut current = Section {
            id: "section-0".to_string(),
            title: String::new(),
            items: Vec::new(),
        };

        for line in body {
            if self.is_section_header(line) {
                flush(&mut sections, current);
                current = Section {
                    id: section_id(line),
                    title: line.clone(),
                    items: Vec::new(),
                };
            } else {
                current.items.push(Item {
                    id: format!("it-{item_seq}-{stamp}"),
                    kind: ItemKind::Bullet,
                    // Cleaning is idempotent; re-cleaning here is harmless.
                    text: self.clean_line(line),
                });
                item_seq += 1;
            }
        }
        flush(&mut sections, current);

        ResumeOutline {
            name,
            title: String::new(),
            contact,
            sections,
        }
    }
}

/// Appends a section only if it has both a title and at least one item; a
/// dangling trailing header and any pre-header body are silently dropped.
fn flush(sections: &mut Vec<Section>, section: Section) {
    if !section.title.is_empty() && !section.items.is_empty() {
        sections.push(section);
    }
}
