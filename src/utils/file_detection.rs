//! Cheap guesses about a file's format, used to route content inspection.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Files larger than this are never sniffed; unknown large files count as binary.
const MAX_SNIFF_FILE_SIZE: u64 = 20 * 1024 * 1024;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "rst", "adoc", "org", "tex",
    "csv", "tsv", "psv", "json", "jsonl", "ndjson", "yaml", "yml", "toml", "ini", "cfg", "conf",
    "config", "properties", "env", "xml", "html", "htm", "css", "svg",
    "log", "out", "err", "trace", "diff", "patch",
    "rs", "py", "js", "ts", "java", "c", "h", "cpp", "hpp", "go", "rb", "php", "sh", "bash",
    "zsh", "ps1", "bat", "cmd", "sql", "pem", "key", "crt", "asc", "gpg",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "app", "deb", "rpm", "msi",
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar",
    "mp3", "mp4", "avi", "mkv", "mov", "wav", "flac",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods",
    "bin", "dat", "db", "sqlite", "sqlite3", "iso", "img",
];

fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Determines if a file is likely to be a plain text file.
///
/// Known extensions decide immediately. Unknown ones are sniffed: the first
/// kilobyte must be valid UTF-8 without NUL bytes.
pub fn is_text_file(path: &Path) -> io::Result<bool> {
    if let Some(ext) = lower_extension(path) {
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(true);
        }
        if BINARY_EXTENSIONS.contains(&ext.as_str()) || IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(false);
        }
    }

    if std::fs::metadata(path)?.len() > MAX_SNIFF_FILE_SIZE {
        return Ok(false);
    }

    check_file_content(path)
}

/// Determines if a file is an image, i.e. needs OCR to yield text.
pub fn is_image_file(path: &Path) -> bool {
    lower_extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn check_file_content(path: &Path) -> io::Result<bool> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buffer = [0; 1024];
    let bytes_read = reader.read(&mut buffer)?;

    if bytes_read == 0 {
        return Ok(true);
    }

    let head = &buffer[..bytes_read];
    if head.contains(&0) {
        tracing::debug!("Binary (null bytes) detected in {}", path.display());
        return Ok(false);
    }

    // A multi-byte character may straddle the 1 KiB boundary.
    match std::str::from_utf8(head) {
        Ok(_) => Ok(true),
        Err(e) => Ok(e.error_len().is_none() && bytes_read == buffer.len()),
    }
}
