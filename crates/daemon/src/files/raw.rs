//! Opening resolved files for streaming.

use std::fs::Metadata;

use tokio::fs::File;

use super::browser::BrowserError;
use super::guard::SafePath;

/// An open regular file ready to be streamed to a client.
#[derive(Debug)]
pub struct RawFile {
    /// The open handle. Dropping it closes the file.
    pub file: File,
    /// Size in bytes at open time, when the filesystem reports a usable one.
    /// `None` for pseudo files such as those under `/proc` and `/sys`.
    pub len: Option<u64>,
    /// File name for `Content-Disposition`.
    pub name: String,
    /// MIME type inferred from the file extension.
    pub content_type: String,
}

/// Open `target` for reading.
///
/// A missing target is [`BrowserError::NotFound`] and a directory is
/// [`BrowserError::IsADirectory`]; anything else that fails is an I/O error.
pub async fn open(target: &SafePath) -> Result<RawFile, BrowserError> {
    let metadata = tokio::fs::metadata(target.as_path())
        .await
        .map_err(BrowserError::from_io)?;

    if metadata.is_dir() {
        return Err(BrowserError::IsADirectory);
    }

    let file = File::open(target.as_path())
        .await
        .map_err(BrowserError::from_io)?;

    let content_type = mime_guess::from_path(target.as_path())
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(RawFile {
        file,
        len: reported_len(&metadata),
        name: target.file_name().unwrap_or("download").to_string(),
        content_type,
    })
}

/// The stat size, if it can be sent as `Content-Length`.
///
/// Pseudo filesystems report 0 or a page size regardless of content and
/// allocate no blocks.
fn reported_len(metadata: &Metadata) -> Option<u64> {
    if !metadata.is_file() || metadata.len() == 0 {
        return None;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if metadata.blocks() == 0 {
            return None;
        }
    }

    Some(metadata.len())
}
