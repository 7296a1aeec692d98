//! Image upload conversion to `data:` URLs.
//!
//! Profile and product images are stored inline as base64 data URLs, the
//! same way the browser's `FileReader.readAsDataURL` would hand them over.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Errors converting an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode `bytes` as a `data:<mime>;base64,...` URL.
///
/// # Errors
///
/// Returns an error for empty or oversized input, or when the type is
/// neither recognizable from the bytes nor from `file_name`.
pub fn to_data_url(bytes: &[u8], file_name: &str, max_bytes: usize) -> Result<String, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    let mime = sniff_mime(bytes)
        .or_else(|| mime_from_extension(file_name))
        .ok_or_else(|| ImageError::UnsupportedType(file_name.to_string()))?;

    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Read the file at `path` and encode it with [`to_data_url`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails [`to_data_url`].
pub async fn read_data_url(path: &Path, max_bytes: usize) -> Result<String, ImageError> {
    let size = tokio::fs::metadata(path).await?.len();
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    if size > max_bytes {
        return Err(ImageError::TooLarge {
            size,
            max: max_bytes,
        });
    }
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    to_data_url(&bytes, file_name, max_bytes)
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
        Some("image/webp")
    } else {
        None
    }
}

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
