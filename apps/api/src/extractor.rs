//! Text-extractor collaborator: uploaded document bytes in, plain text out.
//!
//! The pipeline treats extraction as a black box. A file that cannot be
//! extracted fails individually; the orchestrating handler skips it and
//! processes the rest of the batch.

use tracing::info;

use crate::errors::AppError;

/// Extracts plain text from an uploaded CV, dispatching on file extension.
/// Supported: .pdf, .txt.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let extension = file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AppError::Extraction(format!("failed to extract PDF '{file_name}': {e}"))
        })?,
        "txt" => String::from_utf8_lossy(bytes).into_owned(),
        other => {
            return Err(AppError::Extraction(format!(
                "unsupported file format '.{other}' for '{file_name}'"
            )))
        }
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction(format!(
            "no text content in '{file_name}'"
        )));
    }

    info!("Extracted {} characters from {file_name}", text.len());
    Ok(text)
}
