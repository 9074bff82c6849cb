//! In-process backend for tests and dry runs.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use shift_core::backend::{Backend, BackendFuture};
use shift_core::error::ShiftError;
use shift_core::migration::{Checkpoint, Migration};

#[derive(Debug, Default)]
struct State {
    checkpoint: Checkpoint,
    history: Vec<Checkpoint>,
    executed: Vec<Vec<u8>>,
    attempts: usize,
    checkpoint_writes: usize,
}

/// Backend that keeps the checkpoint in memory and records every payload.
///
/// Failures can be injected to exercise the stop-on-error path.
#[derive(Debug)]
pub struct MemoryBackend {
    extension: String,
    state: Mutex<State>,
    fail_execution_at: Option<usize>,
    fail_checkpoint_at: Option<usize>,
    unavailable: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_checkpoint(Checkpoint::default())
    }

    /// Start from an existing checkpoint.
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            extension: "sql".to_string(),
            state: Mutex::new(State {
                checkpoint,
                ..Default::default()
            }),
            fail_execution_at: None,
            fail_checkpoint_at: None,
            unavailable: false,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Fail the execution attempt with this zero-based index.
    pub fn fail_execution_at(mut self, attempt: usize) -> Self {
        self.fail_execution_at = Some(attempt);
        self
    }

    /// Fail the checkpoint write with this zero-based index.
    pub fn fail_checkpoint_at(mut self, write: usize) -> Self {
        self.fail_checkpoint_at = Some(write);
        self
    }

    /// Make every checkpoint read fail.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Current checkpoint.
    pub fn current(&self) -> Checkpoint {
        self.state().checkpoint.clone()
    }

    /// Every checkpoint written, oldest first.
    pub fn history(&self) -> Vec<Checkpoint> {
        self.state().history.clone()
    }

    /// Payloads that executed successfully, in order.
    pub fn executed(&self) -> Vec<Vec<u8>> {
        self.state().executed.clone()
    }

    /// Number of execution attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.state().attempts
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn checkpoint(&self) -> BackendFuture<'_, Checkpoint> {
        Box::pin(async move {
            if self.unavailable {
                return Err(ShiftError::Backend("memory backend is unavailable".into()));
            }
            Ok(self.current())
        })
    }

    fn set_checkpoint<'a>(
        &'a self,
        migration: &'a Migration,
        _duration: Duration,
    ) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state();
            let write = state.checkpoint_writes;
            state.checkpoint_writes += 1;

            if self.fail_checkpoint_at == Some(write) {
                return Err(ShiftError::Backend(format!(
                    "injected checkpoint failure for {}",
                    migration.file_name()
                )));
            }

            let checkpoint = Checkpoint::after(migration);
            state.history.push(checkpoint.clone());
            state.checkpoint = checkpoint;
            Ok(())
        })
    }

    fn execute_migration<'a>(&'a self, payload: &'a [u8]) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut state = self.state();
            let attempt = state.attempts;
            state.attempts += 1;

            if self.fail_execution_at == Some(attempt) {
                return Err(ShiftError::Backend(format!(
                    "injected execution failure on attempt {}",
                    attempt
                )));
            }

            state.executed.push(payload.to_vec());
            Ok(())
        })
    }
}
