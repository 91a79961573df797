//! Result key derivation and content-type mapping.

/// Derive the deterministic object key for a produced file.
///
/// Keys follow `results/{jobId}/{format}/{filename}`, so a retry of the
/// same job reproduces and overwrites the same keys.
pub fn result_key(job_id: &str, format: &str, filename: &str) -> String {
    format!("results/{}/{}/{}", job_id, format, filename)
}

/// Guess a content type from a filename extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "odt" => "application/vnd.oasis.opendocument.text",
        "odp" => "application/vnd.oasis.opendocument.presentation",
        "ods" => "application/vnd.oasis.opendocument.spreadsheet",
        "html" => "text/html",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
