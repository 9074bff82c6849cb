use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::migration::{Checkpoint, Migration};

/// Boxed future returned by [`Backend`] operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Target system that runs migration payloads and owns the checkpoint.
///
/// The engine never inspects payloads and never calls two operations
/// concurrently. Implementations that may be driven by more than one
/// process are responsible for their own locking.
pub trait Backend: Send + Sync {
    /// File extension for newly created migration pairs (without the dot).
    fn extension(&self) -> &str;

    /// Read the current checkpoint.
    fn checkpoint(&self) -> BackendFuture<'_, Checkpoint>;

    /// Durably record `migration` as the last applied one.
    fn set_checkpoint<'a>(
        &'a self,
        migration: &'a Migration,
        duration: Duration,
    ) -> BackendFuture<'a, ()>;

    /// Run a migration payload against the target.
    fn execute_migration<'a>(&'a self, payload: &'a [u8]) -> BackendFuture<'a, ()>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn checkpoint(&self) -> BackendFuture<'_, Checkpoint> {
        (**self).checkpoint()
    }

    fn set_checkpoint<'a>(
        &'a self,
        migration: &'a Migration,
        duration: Duration,
    ) -> BackendFuture<'a, ()> {
        (**self).set_checkpoint(migration, duration)
    }

    fn execute_migration<'a>(&'a self, payload: &'a [u8]) -> BackendFuture<'a, ()> {
        (**self).execute_migration(payload)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn extension(&self) -> &str {
        (**self).extension()
    }

    fn checkpoint(&self) -> BackendFuture<'_, Checkpoint> {
        (**self).checkpoint()
    }

    fn set_checkpoint<'a>(
        &'a self,
        migration: &'a Migration,
        duration: Duration,
    ) -> BackendFuture<'a, ()> {
        (**self).set_checkpoint(migration, duration)
    }

    fn execute_migration<'a>(&'a self, payload: &'a [u8]) -> BackendFuture<'a, ()> {
        (**self).execute_migration(payload)
    }
}
