//! Job outcome reporting types.

use serde::{Deserialize, Serialize};

/// One file produced by the converter and uploaded to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Normalized target format this file was produced for
    pub format: String,
    /// Object storage key the file was uploaded to
    pub storage_key: String,
    /// Filename as written by the converter
    pub filename: String,
    /// File size in bytes
    pub size_bytes: u64,
}

/// The single success-or-failure result of one job invocation.
///
/// Reported both as the return value to the dispatcher layer and as the
/// terminal webhook notification; the two channels always carry the same
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// All requested outputs were converted and uploaded
    Completed { results: Vec<ResultEntry> },
    /// The invocation failed; `reason` is a stable taxonomy identifier
    Failed { reason: String },
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let completed = JobOutcome::Completed {
            results: vec![ResultEntry {
                format: "docx".to_string(),
                storage_key: "results/j1/docx/a.docx".to_string(),
                filename: "a.docx".to_string(),
                size_bytes: 1024,
            }],
        };
        let json = serde_json::to_value(&completed).expect("serialize");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["results"][0]["storage_key"], "results/j1/docx/a.docx");

        let failed = JobOutcome::Failed {
            reason: "checksum_mismatch".to_string(),
        };
        let json = serde_json::to_value(&failed).expect("serialize");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "checksum_mismatch");
    }

    #[test]
    fn outcome_roundtrips() {
        let failed = JobOutcome::Failed {
            reason: "conversion_timed_out".to_string(),
        };
        let json = serde_json::to_string(&failed).expect("serialize");
        let decoded: JobOutcome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, failed);
        assert!(!decoded.is_completed());
    }
}
