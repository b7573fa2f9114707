use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::difficulty::Difficulty;
use crate::error::DownloadError;
use crate::http::Fetch;
use crate::listing::Attachment;

/// Every attachment is saved with this extension; the content is not checked.
pub const FILE_EXTENSION: &str = "pdf";

/// Turn an attachment title into a file name.
pub fn sanitize_filename(title: &str) -> String {
    let stem = title.replace(&[' ', '/', '\\'][..], "_");
    format!("{}.{}", stem, FILE_EXTENSION)
}

/// Create `dir` and any missing parents. A no-op if it already exists.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Download one attachment into `dest_dir` and return the written path.
pub fn download<F: Fetch + ?Sized>(
    client: &F,
    attachment: &Attachment,
    subject: &str,
    difficulty: Difficulty,
    dest_dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let response = client.get(&attachment.link)?;

    let path = dest_dir.join(sanitize_filename(&attachment.title));
    ensure_dir(dest_dir)
        .and_then(|_| fs::write(&path, &response.body))
        .map_err(|source| DownloadError::Save {
            path: path.clone(),
            source,
        })?;

    info!(
        "Downloaded: {} (Subject: {}, Difficulty: {})",
        attachment.title, subject, difficulty
    );
    Ok(path)
}
