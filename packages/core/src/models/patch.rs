//! Patch Structures
//!
//! A patch is a deferred change proposed against a specific `base_version` of
//! a document. It is created independently of the live document and resolved
//! exactly once: `Pending -> Applied` when the base version still matches at
//! apply time, `Pending -> Conflicted` otherwise.
//!
//! The diff format and its payload travel together in [`PatchDiff`], so an
//! unsupported format cannot be constructed (or deserialized) in the first place.
//!
//! # Examples
//!
//! ```rust
//! use manuscript_core::models::{LineEdit, PatchDiff};
//!
//! let diff = PatchDiff::LineEdits {
//!     edits: vec![LineEdit::Replace { line: 2, text: "It was a dark night.".to_string() }],
//! };
//! let updated = diff.apply("Chapter 1\nIt was night.").unwrap();
//! assert_eq!(updated, "Chapter 1\nIt was a dark night.");
//! ```

use crate::models::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    Pending,
    Applied,
    Conflicted,
}

impl PatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchStatus::Pending => "pending",
            PatchStatus::Applied => "applied",
            PatchStatus::Conflicted => "conflicted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PatchStatus::Pending),
            "applied" => Some(PatchStatus::Applied),
            "conflicted" => Some(PatchStatus::Conflicted),
            _ => None,
        }
    }

    /// Applied and conflicted patches never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PatchStatus::Pending)
    }
}

impl std::fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line-level edit; `line` is 1-based
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LineEdit {
    /// Replace the text of an existing line
    Replace { line: usize, text: String },
    /// Insert a new line before `line` (`len + 1` appends)
    Insert { line: usize, text: String },
    /// Remove an existing line
    Delete { line: usize },
}

impl LineEdit {
    fn line(&self) -> usize {
        match self {
            LineEdit::Replace { line, .. }
            | LineEdit::Insert { line, .. }
            | LineEdit::Delete { line } => *line,
        }
    }
}

/// Diff format tag together with its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum PatchDiff {
    /// The payload is the complete new content
    Full { content: String },
    /// Ordered line edits against the base content; each sees the previous result
    LineEdits { edits: Vec<LineEdit> },
}

impl PatchDiff {
    pub fn full(content: impl Into<String>) -> Self {
        PatchDiff::Full {
            content: content.into(),
        }
    }

    /// Format tag as stored alongside the payload
    pub fn format(&self) -> &'static str {
        match self {
            PatchDiff::Full { .. } => "full",
            PatchDiff::LineEdits { .. } => "line_edits",
        }
    }

    /// Produce the new content from the content the patch was based on.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidLineEdit` when an edit addresses a line that
    /// does not exist at the point it is applied.
    pub fn apply(&self, base_content: &str) -> Result<String, ValidationError> {
        match self {
            PatchDiff::Full { content } => Ok(content.clone()),
            PatchDiff::LineEdits { edits } => apply_line_edits(base_content, edits),
        }
    }
}

fn apply_line_edits(base_content: &str, edits: &[LineEdit]) -> Result<String, ValidationError> {
    let mut lines: Vec<String> = if base_content.is_empty() {
        Vec::new()
    } else {
        base_content.split('\n').map(str::to_string).collect()
    };

    for edit in edits {
        let line = edit.line();
        let upper = match edit {
            LineEdit::Insert { .. } => lines.len() + 1,
            _ => lines.len(),
        };
        if line == 0 || line > upper {
            return Err(ValidationError::InvalidLineEdit {
                line,
                reason: format!("content has {} line(s)", lines.len()),
            });
        }

        match edit {
            LineEdit::Replace { text, .. } => lines[line - 1] = text.clone(),
            LineEdit::Insert { text, .. } => lines.insert(line - 1, text.clone()),
            LineEdit::Delete { .. } => {
                lines.remove(line - 1);
            }
        }
    }

    Ok(lines.join("\n"))
}

/// A proposed change to a document, resolved exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub id: String,
    pub document_id: String,
    pub project_id: String,
    /// Version the diff was computed against
    pub base_version: i64,
    pub diff: PatchDiff,
    pub status: PatchStatus,
    pub created_by: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patch {
    pub fn new(
        document_id: String,
        project_id: String,
        base_version: i64,
        diff: PatchDiff,
        created_by: String,
        message: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            document_id,
            project_id,
            base_version,
            diff,
            status: PatchStatus::Pending,
            created_by,
            message,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_diff_replaces_content() {
        let diff = PatchDiff::full("new text");
        assert_eq!(diff.apply("old text").unwrap(), "new text");
        assert_eq!(diff.format(), "full");
    }

    #[test]
    fn test_line_edits_apply_in_order() {
        let diff = PatchDiff::LineEdits {
            edits: vec![
                LineEdit::Insert {
                    line: 1,
                    text: "# Title".to_string(),
                },
                LineEdit::Delete { line: 3 },
                LineEdit::Insert {
                    line: 3,
                    text: "end".to_string(),
                },
            ],
        };
        // "a\nb" -> "# Title\na\nb" -> "# Title\na" -> "# Title\na\nend"
        assert_eq!(diff.apply("a\nb").unwrap(), "# Title\na\nend");
    }

    #[test]
    fn test_line_edits_on_empty_content() {
        let diff = PatchDiff::LineEdits {
            edits: vec![LineEdit::Insert {
                line: 1,
                text: "first".to_string(),
            }],
        };
        assert_eq!(diff.apply("").unwrap(), "first");
    }

    #[test]
    fn test_line_edit_out_of_range() {
        let diff = PatchDiff::LineEdits {
            edits: vec![LineEdit::Replace {
                line: 5,
                text: "x".to_string(),
            }],
        };
        assert!(matches!(
            diff.apply("one\ntwo"),
            Err(ValidationError::InvalidLineEdit { line: 5, .. })
        ));

        let zero = PatchDiff::LineEdits {
            edits: vec![LineEdit::Delete { line: 0 }],
        };
        assert!(zero.apply("one").is_err());
    }

    #[test]
    fn test_diff_serialization_is_internally_tagged() {
        let json = serde_json::to_value(PatchDiff::full("x")).unwrap();
        assert_eq!(json["format"], "full");
        assert_eq!(json["content"], "x");

        let unknown = serde_json::from_str::<PatchDiff>(r#"{"format":"xdelta","payload":"?"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_patch_starts_pending() {
        let patch = Patch::new(
            "d1".to_string(),
            "p1".to_string(),
            3,
            PatchDiff::full("x"),
            "alice".to_string(),
            "tighten prose".to_string(),
        );
        assert_eq!(patch.status, PatchStatus::Pending);
        assert!(!patch.status.is_terminal());
        assert!(PatchStatus::Applied.is_terminal());
        assert_eq!(PatchStatus::parse("conflicted"), Some(PatchStatus::Conflicted));
    }
}
