//! Closed vocabularies shared by the pipeline and the database.
//!
//! Every enum here is stored as lowercase text in SQLite and serialized the
//! same way in JSON payloads.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                Self::parse(text).ok_or_else(|| {
                    FromSqlError::Other(
                        format!("unknown {} value '{}'", stringify!($name), text).into(),
                    )
                })
            }
        }
    };
}

/// Lifecycle of a candidate's evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

text_enum!(CandidateStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

impl CandidateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CandidateStatus::Completed | CandidateStatus::Failed)
    }
}

/// Resume container format, decided once from the uploaded file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "text")]
    PlainText,
    #[serde(rename = "doc")]
    DocFamily,
}

text_enum!(FileKind {
    Pdf => "pdf",
    PlainText => "text",
    DocFamily => "doc",
});

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "txt" | "text" => Some(FileKind::PlainText),
            "doc" | "docx" => Some(FileKind::DocFamily),
            _ => None,
        }
    }

    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Interview,
    Decline,
}

text_enum!(Recommendation {
    Interview => "interview",
    Decline => "decline",
});

impl Recommendation {
    /// Minimum score that earns an interview.
    pub const INTERVIEW_THRESHOLD: u8 = 6;

    /// The score is the single source of truth for the final recommendation.
    pub fn for_score(score: u8) -> Self {
        if score >= Self::INTERVIEW_THRESHOLD {
            Recommendation::Interview
        } else {
            Recommendation::Decline
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Approve,
    Reject,
    Comment,
}

text_enum!(FeedbackKind {
    Approve => "approve",
    Reject => "reject",
    Comment => "comment",
});

/// Status of a single audit-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

text_enum!(LogStatus {
    Started => "started",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
});

/// Pipeline stage names as they appear in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PipelineStart,
    ResumeParsing,
    GithubDetection,
    GithubFetch,
    AiEvaluation,
    DocumentGeneration,
    TelegramNotification,
    PipelineComplete,
    PipelineError,
}

text_enum!(Stage {
    PipelineStart => "pipeline_start",
    ResumeParsing => "resume_parsing",
    GithubDetection => "github_detection",
    GithubFetch => "github_fetch",
    AiEvaluation => "ai_evaluation",
    DocumentGeneration => "document_generation",
    TelegramNotification => "telegram_notification",
    PipelineComplete => "pipeline_complete",
    PipelineError => "pipeline_error",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("txt"), Some(FileKind::PlainText));
        assert_eq!(FileKind::from_extension("text"), Some(FileKind::PlainText));
        assert_eq!(FileKind::from_extension("doc"), Some(FileKind::DocFamily));
        assert_eq!(FileKind::from_extension("docx"), Some(FileKind::DocFamily));
        assert_eq!(FileKind::from_extension("rtf"), None);
    }

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(
            FileKind::from_filename("jane.doe.resume.PDF"),
            Some(FileKind::Pdf)
        );
        assert_eq!(FileKind::from_filename("noextension"), None);
    }

    #[test]
    fn test_recommendation_follows_score() {
        for score in 1..=10u8 {
            let expected = if score >= 6 {
                Recommendation::Interview
            } else {
                Recommendation::Decline
            };
            assert_eq!(Recommendation::for_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn test_text_round_trip_for_log_status() {
        assert_eq!(LogStatus::InProgress.as_str(), "in_progress");
        assert_eq!(LogStatus::parse("skipped"), Some(LogStatus::Skipped));
        assert_eq!(LogStatus::parse("unknown"), None);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::GithubDetection).unwrap();
        assert_eq!(json, "\"github_detection\"");
        assert_eq!(Stage::GithubDetection.as_str(), "github_detection");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CandidateStatus::Completed.is_terminal());
        assert!(CandidateStatus::Failed.is_terminal());
        assert!(!CandidateStatus::Processing.is_terminal());
        assert!(!CandidateStatus::Pending.is_terminal());
    }
}
