use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Owns the host engine and hands out exclusive, scoped access to it.
///
/// All interaction with the host happens while holding an [`AffinityGuard`].
/// Requests that overlap are queued in arrival order on the inner mutex, so
/// host calls from two requests never run at the same time.
pub struct HostAffinity<H> {
    host: Arc<Mutex<H>>,
}

impl<H> Clone for HostAffinity<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H> HostAffinity<H> {
    pub fn new(host: H) -> Self {
        Self {
            host: Arc::new(Mutex::new(host)),
        }
    }

    /// Waits for the affinity context and enters it.
    pub async fn enter(&self) -> AffinityGuard<'_, H> {
        let guard = self.host.lock().await;
        trace!("entered host affinity context");
        AffinityGuard {
            guard,
            entered_at: Instant::now(),
        }
    }
}

/// Exclusive access to the host; leaving scope releases the affinity context.
pub struct AffinityGuard<'a, H> {
    guard: MutexGuard<'a, H>,
    entered_at: Instant,
}

impl<H> Deref for AffinityGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.guard
    }
}

impl<H> DerefMut for AffinityGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.guard
    }
}

impl<H> Drop for AffinityGuard<'_, H> {
    fn drop(&mut self) {
        trace!(held = ?self.entered_at.elapsed(), "left host affinity context");
    }
}
