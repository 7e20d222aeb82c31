//! Exclusive access to the shared browser surface.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{RenderError, RenderPage};

/// Singleton browser tab shared by every tier-2 attempt. Cloning shares the
/// same tab.
#[derive(Clone)]
pub struct RenderSurface {
    page: Arc<Mutex<Box<dyn RenderPage>>>,
    leases: Arc<AtomicUsize>,
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("active_leases", &self.active_leases())
            .finish()
    }
}

impl RenderSurface {
    pub fn new(page: impl RenderPage + 'static) -> Self {
        Self::from_boxed(Box::new(page))
    }

    pub fn from_boxed(page: Box<dyn RenderPage>) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            leases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait up to `timeout` for exclusive use of the surface.
    pub async fn acquire(&self, timeout: Duration) -> Result<RenderLease, RenderError> {
        let guard = tokio::time::timeout(timeout, Arc::clone(&self.page).lock_owned())
            .await
            .map_err(|_| RenderError::SurfaceBusy(timeout))?;

        self.leases.fetch_add(1, Ordering::SeqCst);
        Ok(RenderLease {
            guard,
            leases: Arc::clone(&self.leases),
        })
    }

    /// Leases currently held. Never exceeds one.
    pub fn active_leases(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }
}

/// Exclusive handle on the surface, released on drop.
pub struct RenderLease {
    guard: OwnedMutexGuard<Box<dyn RenderPage>>,
    leases: Arc<AtomicUsize>,
}

impl std::fmt::Debug for RenderLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLease").finish_non_exhaustive()
    }
}

impl Deref for RenderLease {
    type Target = dyn RenderPage;

    fn deref(&self) -> &Self::Target {
        &**self.guard
    }
}

impl DerefMut for RenderLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.guard
    }
}

impl Drop for RenderLease {
    fn drop(&mut self) {
        self.leases.fetch_sub(1, Ordering::SeqCst);
    }
}
