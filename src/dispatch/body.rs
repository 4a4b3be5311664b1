//! Response body resolution.

use axum::body::Bytes;

/// Prefix marking a body spec as a file reference.
pub const FILE_MARKER: &str = "!file:";

/// Resolve a body spec to the bytes to send.
///
/// `!file:<path>` reads the whole file on every call. A failed read never
/// errors: the diagnostic becomes the body instead and is logged.
pub async fn resolve(spec: &str) -> Bytes {
    let Some(path) = spec.strip_prefix(FILE_MARKER) else {
        return Bytes::copy_from_slice(spec.as_bytes());
    };

    match tokio::fs::read(path).await {
        Ok(contents) => Bytes::from(contents),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Error reading response file");
            Bytes::from(format!("Error reading response file: {path} [{e}]"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn literal_bodies_pass_through() {
        let body = resolve("I shall now mock you").await;
        assert_eq!(&body[..], b"I shall now mock you");
    }

    #[tokio::test]
    async fn file_bodies_are_read() {
        let path = std::env::temp_dir().join(format!("stub-body-{}.txt", std::process::id()));
        std::fs::write(&path, b"from disk").unwrap();

        let body = resolve(&format!("{FILE_MARKER}{}", path.display())).await;
        assert_eq!(&body[..], b"from disk");

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[tokio::test]
    async fn missing_file_yields_diagnostic() {
        let spec = "!file:missing.txt";
        let body = resolve(spec).await;
        assert!(!body.is_empty());
        assert_ne!(&body[..], spec.as_bytes());
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("Error reading response file: missing.txt ["));
    }
}
