//! Job pipeline orchestration.
//!
//! Drives one conversion job end-to-end: workspace acquisition, input
//! fetch, integrity verification, per-format converter runs, artifact
//! upload, and unconditional workspace disposal.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use docmill_convert::{ConvertRunner, SofficeCommand};
use docmill_models::{ConversionJob, JobOutcome, ResultEntry};
use docmill_storage::{result_key, StorageClient, StorageError};

use crate::checksum;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::notify::Notifier;
use crate::workspace::Workspace;

/// Shared dependencies for job processing.
///
/// The storage client and notifier are read-mostly handles shared by all
/// worker slots; no slot-local mutable state lives here.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub storage: StorageClient,
    pub notifier: Notifier,
}

impl ProcessingContext {
    /// Build the context from configuration and environment.
    pub async fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let storage = StorageClient::from_env()?;
        if let Err(e) = storage.check_connectivity().await {
            warn!("Storage connectivity check failed (continuing): {}", e);
        }
        let notifier = Notifier::new(config.webhook_url.clone());
        Ok(Self {
            config,
            storage,
            notifier,
        })
    }

    /// Assemble a context from explicit parts.
    pub fn from_parts(config: WorkerConfig, storage: StorageClient, notifier: Notifier) -> Self {
        Self {
            config,
            storage,
            notifier,
        }
    }
}

/// Run one conversion job to exactly one outcome.
///
/// The returned value and the terminal notification always agree: `Ok`
/// carries `JobOutcome::Completed`, and every failure is notified with the
/// same taxonomy reason before the error is handed back to the queue layer
/// for its retry policy. The workspace is disposed on every path; disposal
/// failure is logged and never overrides the outcome.
pub async fn run_job(ctx: &ProcessingContext, job: &ConversionJob) -> WorkerResult<JobOutcome> {
    let logger = JobLogger::new(&job.job_id, "convert");
    logger.info(&format!(
        "starting: input '{}', {} requested output(s)",
        job.input_key,
        job.outputs.len()
    ));

    let workspace = match Workspace::create(&ctx.config.work_dir, &job.job_id).await {
        Ok(workspace) => workspace,
        Err(e) => {
            let err = WorkerError::AcquireWorkspace(e);
            let outcome = JobOutcome::Failed {
                reason: err.reason().to_string(),
            };
            ctx.notifier
                .outcome(&job.job_id, &outcome, Some(&err.to_string()))
                .await;
            logger.error(&err.to_string());
            return Err(err);
        }
    };

    let output = execute(ctx, job, &workspace, &logger)
        .await
        .map(|results| JobOutcome::Completed { results });

    match &output {
        Ok(outcome) => {
            ctx.notifier.outcome(&job.job_id, outcome, None).await;
            logger.info("all requested outputs converted and uploaded");
        }
        Err(e) => {
            let outcome = JobOutcome::Failed {
                reason: e.reason().to_string(),
            };
            ctx.notifier
                .outcome(&job.job_id, &outcome, Some(&e.to_string()))
                .await;
            logger.error(&format!("terminal failure ({}): {}", e.reason(), e));
        }
    }

    // Disposal is the final action on every path. Partial uploads made
    // before a failure stay in the blob store; a retry overwrites the same
    // deterministic result keys.
    if let Err(e) = workspace.dispose() {
        logger.warn(&format!("workspace disposal failed: {}", e));
    }

    output
}

/// Fetch, verify, convert, and upload. Any error aborts the remaining
/// output formats.
async fn execute(
    ctx: &ProcessingContext,
    job: &ConversionJob,
    workspace: &Workspace,
    logger: &JobLogger,
) -> WorkerResult<Vec<ResultEntry>> {
    let input_path = workspace.input_path(&job.input_key);
    ctx.storage
        .fetch_object(&job.input_key, &input_path)
        .await
        .map_err(WorkerError::Transfer)?;
    logger.info("input artifact downloaded");

    if let Some(expected) = &job.expected_checksum {
        // A digest read failure means the fetched artifact is unreadable,
        // so it reports as a transfer failure.
        let actual = checksum::sha256_file(&input_path)
            .await
            .map_err(|e| WorkerError::Transfer(StorageError::Io(e)))?;
        if actual != *expected {
            return Err(WorkerError::ChecksumMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        logger.info("input checksum verified");
    }

    let runner = ConvertRunner::new().with_timeout(ctx.config.convert_timeout);
    let mut results = Vec::new();

    for (index, request) in job.outputs.iter().enumerate() {
        let format = request.normalized_format();
        ctx.notifier.converting(&job.job_id, &format).await;

        let output_dir = workspace.output_dir(index, &format);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(WorkerError::AcquireWorkspace)?;

        let cmd = SofficeCommand::new(&input_path, &output_dir, request.convert_target())
            .with_program(&ctx.config.soffice_bin);
        let converted = runner.run(&cmd).await?;
        if !converted.stdout.trim().is_empty() {
            debug!(
                job_id = %job.job_id,
                format = %format,
                "converter stdout: {}",
                converted.stdout.trim()
            );
        }

        let produced = list_output_files(&output_dir)
            .await
            .map_err(WorkerError::AcquireWorkspace)?;
        if produced.is_empty() {
            return Err(WorkerError::NoOutput { format });
        }

        for file in produced {
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let storage_key = result_key(job.job_id.as_str(), &format, &filename);
            ctx.storage
                .store_object(&file, &storage_key)
                .await
                .map_err(WorkerError::Upload)?;
            let size_bytes = tokio::fs::metadata(&file)
                .await
                .map_err(|e| WorkerError::Upload(StorageError::Io(e)))?
                .len();
            results.push(ResultEntry {
                format: format.clone(),
                storage_key,
                filename,
                size_bytes,
            });
        }
        logger.info(&format!("format '{}' converted and uploaded", format));
    }

    Ok(results)
}

/// Enumerate regular files the converter wrote into an output directory,
/// sorted by name for deterministic result ordering.
async fn list_output_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    use serde_json::Value;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use docmill_models::OutputRequest;
    use docmill_storage::StorageConfig;

    fn write_script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // Path-style S3 stub: GET /{bucket}/{key}, PUT /{bucket}/{key}.
    fn stub_storage(server: &MockServer) -> StorageClient {
        StorageClient::new(StorageConfig {
            endpoint_url: Some(server.uri()),
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            bucket_name: "conversions".to_string(),
            region: "us-east-1".to_string(),
        })
    }

    fn stub_config(work_dir: &TempDir, soffice_bin: PathBuf) -> WorkerConfig {
        WorkerConfig {
            soffice_bin,
            work_dir: work_dir.path().to_path_buf(),
            convert_timeout: Duration::from_secs(30),
            ..WorkerConfig::default()
        }
    }

    async fn mount_input(server: &MockServer, key: &str) {
        Mock::given(method("GET"))
            .and(url_path(format!("/conversions/{}", key)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 stub".to_vec()))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn terminal_notification(webhook: &MockServer) -> Value {
        let requests = webhook.received_requests().await.unwrap();
        serde_json::from_slice(&requests.last().expect("at least one notification").body).unwrap()
    }

    #[tokio::test]
    async fn completed_job_uploads_to_deterministic_result_keys() {
        let s3 = MockServer::start().await;
        let webhook = MockServer::start().await;
        let scratch = TempDir::new().unwrap();
        // Converter args: --headless --convert-to <target> --outdir <dir> <input>
        let script = write_script(&scratch, "convert.sh", r#"printf converted > "$5/a.docx""#);

        let job = ConversionJob::new("in/a.pdf", vec![OutputRequest::new("DOCX")]);
        let storage_key = format!("results/{}/docx/a.docx", job.job_id);

        mount_input(&s3, "in/a.pdf").await;
        Mock::given(method("PUT"))
            .and(url_path(format!("/conversions/{}", storage_key)))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&s3)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&webhook)
            .await;

        let work_dir = TempDir::new().unwrap();
        let ctx = ProcessingContext::from_parts(
            stub_config(&work_dir, script),
            stub_storage(&s3),
            Notifier::new(Some(webhook.uri())),
        );

        let outcome = run_job(&ctx, &job).await.expect("job should complete");
        let results = match outcome {
            JobOutcome::Completed { results } => results,
            JobOutcome::Failed { reason } => panic!("job failed: {}", reason),
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].format, "docx");
        assert_eq!(results[0].storage_key, storage_key);
        assert_eq!(results[0].filename, "a.docx");
        assert_eq!(results[0].size_bytes, 9);

        // The terminal notification agrees with the returned outcome.
        let last = terminal_notification(&webhook).await;
        assert_eq!(last["status"], "completed");
        assert_eq!(last["jobId"], job.job_id.as_str());
        assert_eq!(last["results"][0]["storage_key"], storage_key.as_str());

        // Workspace disposed on success.
        assert!(std::fs::read_dir(work_dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn checksum_mismatch_fails_before_any_conversion() {
        let s3 = MockServer::start().await;
        let scratch = TempDir::new().unwrap();
        let marker = scratch.path().join("spawned");
        let script = write_script(&scratch, "convert.sh", &format!(": > {}", marker.display()));

        let job = ConversionJob::new("in/a.pdf", vec![OutputRequest::new("docx")])
            .with_checksum("0".repeat(64));

        mount_input(&s3, "in/a.pdf").await;

        let work_dir = TempDir::new().unwrap();
        let ctx = ProcessingContext::from_parts(
            stub_config(&work_dir, script),
            stub_storage(&s3),
            Notifier::new(None),
        );

        let err = run_job(&ctx, &job).await.expect_err("mismatch must fail the job");
        assert_eq!(err.reason(), "checksum_mismatch");
        assert!(!marker.exists(), "converter must not be spawned");
        assert!(std::fs::read_dir(work_dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn earlier_uploads_persist_when_a_later_format_fails() {
        let s3 = MockServer::start().await;
        let webhook = MockServer::start().await;
        let scratch = TempDir::new().unwrap();
        let script = write_script(
            &scratch,
            "convert.sh",
            concat!(
                "if [ \"$3\" = \"docx\" ]; then printf converted > \"$5/a.docx\"; exit 0; fi\n",
                "echo 'no export filter for target' >&2\n",
                "exit 1",
            ),
        );

        let job = ConversionJob::new(
            "in/a.pdf",
            vec![OutputRequest::new("docx"), OutputRequest::new("pptx")],
        );
        let docx_key = format!("results/{}/docx/a.docx", job.job_id);

        mount_input(&s3, "in/a.pdf").await;
        Mock::given(method("PUT"))
            .and(url_path(format!("/conversions/{}", docx_key)))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&s3)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&webhook)
            .await;

        let work_dir = TempDir::new().unwrap();
        let ctx = ProcessingContext::from_parts(
            stub_config(&work_dir, script),
            stub_storage(&s3),
            Notifier::new(Some(webhook.uri())),
        );

        let err = run_job(&ctx, &job).await.expect_err("pptx conversion fails the job");
        assert_eq!(err.reason(), "conversion_nonzero_exit");

        // The docx upload happened before the pptx failure and is never
        // rolled back (the PUT expectation verifies on drop). The terminal
        // notification carries the same reason as the returned error.
        let last = terminal_notification(&webhook).await;
        assert_eq!(last["status"], "failed");
        assert_eq!(last["reason"], "conversion_nonzero_exit");
        assert_eq!(last["jobId"], job.job_id.as_str());

        assert!(std::fs::read_dir(work_dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn converter_writing_nothing_is_a_distinct_failure() {
        let s3 = MockServer::start().await;
        let scratch = TempDir::new().unwrap();
        let script = write_script(&scratch, "convert.sh", "exit 0");

        let job = ConversionJob::new("in/a.pdf", vec![OutputRequest::new("docx")]);
        mount_input(&s3, "in/a.pdf").await;

        let work_dir = TempDir::new().unwrap();
        let ctx = ProcessingContext::from_parts(
            stub_config(&work_dir, script),
            stub_storage(&s3),
            Notifier::new(None),
        );

        let err = run_job(&ctx, &job).await.expect_err("no output must fail the job");
        assert_eq!(err.reason(), "conversion_no_output");
    }

    #[tokio::test]
    async fn list_output_files_is_sorted_and_skips_dirs() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("b.docx"), b"b").await.unwrap();
        tokio::fs::write(dir.path().join("a.docx"), b"a").await.unwrap();
        tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();

        let files = list_output_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.docx"]);
    }

    #[tokio::test]
    async fn empty_output_dir_yields_no_files() {
        let dir = TempDir::new().unwrap();
        assert!(list_output_files(dir.path()).await.unwrap().is_empty());
    }
}
