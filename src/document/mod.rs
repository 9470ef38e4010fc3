use reqwest::Client;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Text extraction failed: {0}")]
    Extract(String),
    #[error("Invalid document URL: {0}")]
    InvalidUrl(String),
    #[error("Download failed: {0}")]
    Download(String),
}

/// Raw text pulled out of a source file, before any cleaning.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: String,
    pub text: String,
}

/// Extract text from a local file, dispatching on extension. PDF parsing is
/// CPU-bound, so it runs off the async runtime.
pub async fn extract_text(path: &Path) -> Result<Document, DocumentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => {
            let bytes = tokio::fs::read(path).await?;
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| DocumentError::Extract(e.to_string()))?
                .map_err(|e| DocumentError::Extract(e.to_string()))?
        }
        "txt" | "md" => tokio::fs::read_to_string(path).await?,
        other => return Err(DocumentError::UnsupportedFormat(other.to_string())),
    };

    Ok(Document {
        source: path.display().to_string(),
        text,
    })
}

/// Download a document to a temp file and return its path. The extension is
/// taken from the response content type, falling back to the URL path.
pub async fn download_document(client: &Client, url: &str) -> Result<PathBuf, DocumentError> {
    let parsed = Url::parse(url).map_err(|e| DocumentError::InvalidUrl(e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(DocumentError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let response = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| DocumentError::Download(e.to_string()))?
        .error_for_status()
        .map_err(|e| DocumentError::Download(e.to_string()))?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let extension = extension_for(&content_type, parsed.path());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocumentError::Download(e.to_string()))?;

    let path = std::env::temp_dir().join(format!("{}.{}", Uuid::new_v4(), extension));
    tokio::fs::write(&path, &bytes).await?;
    log::info!("Downloaded {} bytes from {} to {:?}", bytes.len(), url, path);
    Ok(path)
}

fn extension_for(content_type: &str, url_path: &str) -> String {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match mime.as_str() {
        "application/pdf" => "pdf".to_string(),
        "text/plain" => "txt".to_string(),
        "text/markdown" => "md".to_string(),
        _ => Path::new(url_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "pdf".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extracts_plain_text_file() {
        let path = std::env::temp_dir().join(format!("{}.txt", Uuid::new_v4()));
        tokio::fs::write(&path, "Machine learning is a subset of AI.")
            .await
            .unwrap();
        let document = extract_text(&path).await.unwrap();
        assert_eq!(document.text, "Machine learning is a subset of AI.");
        assert!(document.source.ends_with(".txt"));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let path = std::env::temp_dir().join(format!("{}.docx", Uuid::new_v4()));
        let err = extract_text(&path).await.unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_http_url() {
        let client = Client::new();
        let err = download_document(&client, "ftp://example.com/doc.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidUrl(_)));
    }

    #[test]
    fn test_extension_from_content_type() {
        assert_eq!(extension_for("application/pdf", "/doc"), "pdf");
        assert_eq!(extension_for("text/plain; charset=utf-8", "/doc"), "txt");
        assert_eq!(extension_for("application/octet-stream", "/files/notes.md"), "md");
        assert_eq!(extension_for("", "/doc"), "pdf");
    }
}
