//! Per-job scratch workspaces.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use docmill_models::JobId;

/// Exclusively-owned scratch directory for one job invocation.
///
/// Each invocation gets a fresh randomized directory under the configured
/// work dir, so a stale retry racing a new attempt for the same job can
/// never share scratch files. The directory and all descendants are
/// removed by `dispose`; if the worker dies first, the `TempDir` drop is a
/// best-effort secondary safeguard.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace for a job.
    pub async fn create(work_dir: &Path, job_id: &JobId) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(work_dir).await?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(work_dir)?;
        Ok(Self { dir })
    }

    /// Root of the workspace.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Local path the input artifact is downloaded to, named after the
    /// final component of its storage key.
    pub fn input_path(&self, input_key: &str) -> PathBuf {
        let filename = Path::new(input_key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        self.root().join("input").join(filename)
    }

    /// Output directory for one requested format. The index keeps
    /// duplicate format requests from sharing a directory.
    pub fn output_dir(&self, index: usize, format: &str) -> PathBuf {
        self.root().join(format!("out-{}-{}", index, format))
    }

    /// Remove the workspace and all descendant files.
    pub fn dispose(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
