//! Drives the pass sequence for a single file and unlinks it afterwards.

use super::error::{Result, ShredError};
use super::method::{Pass, PatternGenerator, ShredMethod};
use super::storage::{OsStorage, Storage};
use super::verify::verify_pass;
use std::fmt;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Default size of a single write or verification read.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// A single file to shred. Built per file and dropped once it is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShredJob {
    pub path: PathBuf,
    pub method: ShredMethod,
    pub verify: bool,
}

impl ShredJob {
    pub fn new(path: impl Into<PathBuf>, method: ShredMethod, verify: bool) -> Self {
        Self {
            path: path.into(),
            method,
            verify,
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShredOutcome {
    Success,
    Failure(String),
}

impl ShredOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ShredOutcome::Success)
    }
}

/// Where a file is in its shredding lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShredState {
    NotStarted,
    Writing { pass: u32, total: u32 },
    Verifying { pass: u32, total: u32 },
    Deleting,
    Done,
}

impl fmt::Display for ShredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShredState::NotStarted => f.write_str("not started"),
            ShredState::Writing { pass, total } => write!(f, "writing pass {}/{}", pass, total),
            ShredState::Verifying { pass, total } => {
                write!(f, "verifying pass {}/{}", pass, total)
            }
            ShredState::Deleting => f.write_str("deleting"),
            ShredState::Done => f.write_str("done"),
        }
    }
}

/// Keeps per-file progress monotonic and inside [0, 1].
struct FileProgress<F: FnMut(f64)> {
    sink: F,
    total_passes: f64,
    verify: bool,
    last: f64,
}

impl<F: FnMut(f64)> FileProgress<F> {
    fn new(sink: F, total_passes: u32, verify: bool) -> Self {
        Self {
            sink,
            total_passes: f64::from(total_passes.max(1)),
            verify,
            last: 0.0,
        }
    }

    fn emit(&mut self, value: f64) {
        let value = value.clamp(0.0, 1.0);
        if value >= self.last {
            self.last = value;
            (self.sink)(value);
        }
    }

    /// `fraction` of the pass's bytes have been written.
    fn writing(&mut self, pass: u32, fraction: f64) {
        let share = if self.verify { 0.5 } else { 1.0 };
        self.emit((f64::from(pass - 1) + share * fraction) / self.total_passes);
    }

    /// `fraction` of the pass's bytes have been read back.
    fn verifying(&mut self, pass: u32, fraction: f64) {
        self.emit((f64::from(pass - 1) + 0.5 + 0.5 * fraction) / self.total_passes);
    }

    fn finish(&mut self) {
        self.emit(1.0);
    }
}

/// Overwrites files pass by pass and removes them once every pass is done.
///
/// Failures never escape `shred`: they are logged and returned as
/// `ShredOutcome::Failure` so callers can move on to the next file.
#[derive(Debug)]
pub struct OverwriteEngine<S: Storage = OsStorage> {
    storage: S,
    generator: PatternGenerator,
    chunk_size: usize,
}

impl Default for OverwriteEngine<OsStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl OverwriteEngine<OsStorage> {
    pub fn new() -> Self {
        Self::with_storage(OsStorage)
    }
}

impl<S: Storage> OverwriteEngine<S> {
    pub fn with_storage(storage: S) -> Self {
        Self {
            storage,
            generator: PatternGenerator,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Shreds one file, reporting progress as a fraction in [0, 1].
    pub fn shred<F>(&self, job: &ShredJob, on_progress: F) -> ShredOutcome
    where
        F: FnMut(f64),
    {
        let mut state = ShredState::NotStarted;
        let mut progress = FileProgress::new(on_progress, job.method.pass_count(), job.verify);
        progress.emit(0.0);

        match self.run(job, &mut state, &mut progress) {
            Ok(()) => {
                progress.finish();
                ShredOutcome::Success
            }
            Err(ShredError::Io(e, path))
                if e.kind() == io::ErrorKind::NotFound && state == ShredState::NotStarted =>
            {
                tracing::warn!("File not found: {}", path.display());
                ShredOutcome::Failure("file not found".to_string())
            }
            Err(e) => {
                tracing::error!(
                    "Error shredding file {} while {}: {}",
                    job.path.display(),
                    state,
                    e
                );
                ShredOutcome::Failure(e.to_string())
            }
        }
    }

    fn run<F: FnMut(f64)>(
        &self,
        job: &ShredJob,
        state: &mut ShredState,
        progress: &mut FileProgress<F>,
    ) -> Result<()> {
        let path = job.path.as_path();
        let len = self.storage.file_len(path).map_err(|e| io_err(e, path))?;

        if len == 0 {
            *state = ShredState::Deleting;
            self.storage.remove(path).map_err(|e| io_err(e, path))?;
            *state = ShredState::Done;
            tracing::info!("Removed empty file: {}", path.display());
            return Ok(());
        }

        for pass in job.method.pass_sequence() {
            *state = ShredState::Writing {
                pass: pass.index,
                total: pass.total,
            };
            let mut handle = self.storage.open_rw(path).map_err(|e| io_err(e, path))?;
            self.write_pass(&mut handle, path, pass, len, progress)?;

            if job.verify {
                *state = ShredState::Verifying {
                    pass: pass.index,
                    total: pass.total,
                };
                verify_pass(&mut handle, path, pass, len, self.chunk_size, |checked| {
                    progress.verifying(pass.index, checked as f64 / len as f64)
                })?;
            }

            tracing::debug!(
                "Completed pass {}/{} ({}) for {}",
                pass.index,
                pass.total,
                pass.pattern,
                path.display()
            );
        }

        *state = ShredState::Deleting;
        self.storage.remove(path).map_err(|e| io_err(e, path))?;
        *state = ShredState::Done;
        tracing::info!(
            "Successfully shredded file: {} ({})",
            path.display(),
            job.method
        );
        Ok(())
    }

    fn write_pass<F: FnMut(f64)>(
        &self,
        handle: &mut S::Handle,
        path: &Path,
        pass: Pass,
        len: u64,
        progress: &mut FileProgress<F>,
    ) -> Result<()> {
        handle
            .seek(SeekFrom::Start(0))
            .map_err(|e| io_err(e, path))?;

        let buf_len = (self.chunk_size as u64).min(len) as usize;
        let mut buf = vec![0u8; buf_len];
        if pass.pattern.is_deterministic() {
            self.generator.fill(pass.pattern, &mut buf);
        }

        let mut written: u64 = 0;
        while written < len {
            let this_chunk = (len - written).min(buf_len as u64) as usize;
            let chunk = &mut buf[..this_chunk];
            if !pass.pattern.is_deterministic() {
                self.generator.fill(pass.pattern, chunk);
            }
            handle.write_all(chunk).map_err(|e| io_err(e, path))?;
            written += this_chunk as u64;
            progress.writing(pass.index, written as f64 / len as f64);
        }

        self.storage.sync(handle).map_err(|e| io_err(e, path))
    }
}

fn io_err(e: io::Error, path: &Path) -> ShredError {
    ShredError::Io(e, path.to_path_buf())
}
