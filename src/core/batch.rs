//! Runs the overwrite engine over a fixed list of files, one at a time.

use super::method::ShredMethod;
use super::overwrite::{OverwriteEngine, ShredJob, ShredOutcome};
use super::storage::{OsStorage, Storage};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tally of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.successful + self.failed
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Success: {}, Failed: {}", self.successful, self.failed)
    }
}

/// Shreds files strictly in list order with a single method and verify setting.
pub struct BatchShredder<S: Storage = OsStorage> {
    engine: OverwriteEngine<S>,
    method: ShredMethod,
    verify: bool,
}

impl<S: Storage> BatchShredder<S> {
    pub fn new(engine: OverwriteEngine<S>, method: ShredMethod, verify: bool) -> Self {
        Self {
            engine,
            method,
            verify,
        }
    }

    pub fn method(&self) -> ShredMethod {
        self.method
    }

    pub fn engine(&self) -> &OverwriteEngine<S> {
        &self.engine
    }

    /// Shreds every file in `files`.
    ///
    /// `on_progress` receives the overall fraction in [0, 1] and the file being
    /// processed. `on_complete` is called exactly once per file with its outcome.
    /// A failing file never stops the batch.
    pub fn shred_files<P, C>(
        &self,
        files: &[PathBuf],
        mut on_progress: P,
        mut on_complete: C,
    ) -> BatchSummary
    where
        P: FnMut(f64, &Path),
        C: FnMut(&Path, &ShredOutcome),
    {
        let mut summary = BatchSummary::default();
        let total_files = files.len();
        if total_files == 0 {
            return summary;
        }

        let span = tracing::info_span!("shred_batch", files = total_files, method = %self.method);
        let _enter = span.enter();

        for (i, path) in files.iter().enumerate() {
            let job = ShredJob::new(path.clone(), self.method, self.verify);
            let outcome = self.engine.shred(&job, |file_progress| {
                on_progress((i as f64 + file_progress) / total_files as f64, path)
            });

            if outcome.is_success() {
                summary.successful += 1;
            } else {
                summary.failed += 1;
            }
            on_complete(path, &outcome);
        }

        tracing::info!("Shredding complete. {}", summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_batch_does_nothing() {
        let batch = BatchShredder::new(OverwriteEngine::new(), ShredMethod::default(), true);
        let mut progress_calls = 0;
        let mut complete_calls = 0;
        let summary = batch.shred_files(
            &[],
            |_, _| progress_calls += 1,
            |_, _| complete_calls += 1,
        );
        assert_eq!(summary, BatchSummary::default());
        assert_eq!((progress_calls, complete_calls), (0, 0));
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let missing = dir.path().join("missing.txt");
        let c = dir.path().join("c.txt");
        fs::write(&a, "alpha").unwrap();
        fs::write(&c, "gamma").unwrap();

        let batch = BatchShredder::new(OverwriteEngine::new(), ShredMethod::basic(2), true);
        let mut completed = Vec::new();
        let mut overall = Vec::new();
        let summary = batch.shred_files(
            &[a.clone(), missing.clone(), c.clone()],
            |p, _| overall.push(p),
            |path, outcome| completed.push((path.to_path_buf(), outcome.is_success())),
        );

        assert_eq!(summary, BatchSummary { successful: 2, failed: 1 });
        assert_eq!(summary.total(), 3);
        assert_eq!(
            completed,
            vec![(a.clone(), true), (missing, false), (c.clone(), true)]
        );
        assert!(!a.exists() && !c.exists());
        assert!(overall.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(overall.last().copied(), Some(1.0));
    }

    #[test]
    fn test_summary_display() {
        let summary = BatchSummary {
            successful: 4,
            failed: 1,
        };
        assert_eq!(summary.to_string(), "Success: 4, Failed: 1");
    }
}
