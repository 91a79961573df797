//! Conversion job definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// Stable across retries of the same logical job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One requested output of a conversion job.
///
/// `format` is a case-insensitive target format identifier (e.g. "docx",
/// "pptx"). `options` is an optional converter filter string appended to
/// the target as `format:options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRequest {
    /// Target format identifier
    pub format: String,
    /// Optional converter filter options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl OutputRequest {
    /// Create a request for a plain format.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            options: None,
        }
    }

    /// Set converter filter options.
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Normalized (lowercase, trimmed) format identifier.
    pub fn normalized_format(&self) -> String {
        self.format.trim().to_ascii_lowercase()
    }

    /// Full converter target: normalized format plus filter options.
    pub fn convert_target(&self) -> String {
        let format = self.normalized_format();
        match &self.options {
            Some(options) => format!("{}:{}", format, options),
            None => format,
        }
    }
}

/// A document conversion job.
///
/// Created by an external producer, leased to the worker by the queue, and
/// read-only to the pipeline for the duration of one invocation. Duplicate
/// entries in `outputs` are permitted and processed independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Object storage key of the input artifact
    pub input_key: String,
    /// Optional lowercase hex SHA-256 of the input; verified after download
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_checksum: Option<String>,
    /// Requested outputs, processed in order
    pub outputs: Vec<OutputRequest>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl ConversionJob {
    /// Create a new conversion job.
    pub fn new(input_key: impl Into<String>, outputs: Vec<OutputRequest>) -> Self {
        Self {
            job_id: JobId::new(),
            input_key: input_key.into(),
            expected_checksum: None,
            outputs,
            created_at: Utc::now(),
        }
    }

    /// Set the expected input checksum.
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }

    /// Generate idempotency key for enqueue deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("convert:{}", self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_job_serde_roundtrip() {
        let job = ConversionJob::new(
            "in/report.pdf",
            vec![
                OutputRequest::new("DOCX"),
                OutputRequest::new("pptx").with_options("Impress MS PowerPoint 2007 XML"),
            ],
        )
        .with_checksum("ab".repeat(32));

        let json = serde_json::to_string(&job).expect("serialize ConversionJob");
        let decoded: ConversionJob = serde_json::from_str(&json).expect("deserialize ConversionJob");

        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.input_key, job.input_key);
        assert_eq!(decoded.expected_checksum, job.expected_checksum);
        assert_eq!(decoded.outputs.len(), 2);
        assert_eq!(decoded.outputs[0].format, "DOCX");
        assert_eq!(decoded.created_at, job.created_at);
    }

    #[test]
    fn output_request_normalizes_format() {
        let request = OutputRequest::new("  DocX ");
        assert_eq!(request.normalized_format(), "docx");
        assert_eq!(request.convert_target(), "docx");
    }

    #[test]
    fn output_request_appends_filter_options() {
        let request = OutputRequest::new("PDF").with_options("writer_pdf_Export");
        assert_eq!(request.convert_target(), "pdf:writer_pdf_Export");
    }

    #[test]
    fn checksum_field_is_omitted_when_absent() {
        let job = ConversionJob::new("in/a.pdf", vec![OutputRequest::new("docx")]);
        let json = serde_json::to_string(&job).expect("serialize");
        assert!(!json.contains("expected_checksum"));
    }

    #[test]
    fn idempotency_key_is_stable_for_a_job() {
        let job = ConversionJob::new("in/a.pdf", vec![OutputRequest::new("docx")]);
        assert_eq!(job.idempotency_key(), job.idempotency_key());
        assert!(job.idempotency_key().starts_with("convert:"));
    }
}
