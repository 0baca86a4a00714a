//! Process-wide shared resources
//!
//! Two pieces of state are shared by every [`Bitmap`](crate::Bitmap) in the
//! process:
//!
//! - a pool of [`NMONITORS`] mutexes, so that per-raster locking does not
//!   cost one mutex allocation per instance.  Each raster is assigned a pool
//!   slot from its creation identity; two distinct rasters may share a slot.
//! - a zero-filled guard buffer handed out by [`zeroes`], grown geometrically
//!   and rounded up to a page multiple.  Rasters keep a handle to the buffer
//!   they were sized against so the backing allocation outlives them.
//!
//! Both are initialized on first use and never torn down.  All access goes
//! through the accessor functions below; the statics are private.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

/// Number of pooled mutexes shared by all rasters
pub(crate) const NMONITORS: usize = 8;

static MONITORS: LazyLock<[Mutex<()>; NMONITORS]> =
    LazyLock::new(|| std::array::from_fn(|_| Mutex::new(())));

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(0);

/// Allocate a stable identity for a new raster and derive its pool slot.
pub(crate) fn assign_slot() -> usize {
    let id = NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed);
    (id as usize) % NMONITORS
}

/// Lock a single pool slot, tolerating poisoning.
pub(crate) fn lock(slot: usize) -> MutexGuard<'static, ()> {
    MONITORS[slot].lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock two pool slots in slot order.
///
/// Acquiring in ascending slot order makes the discipline deadlock-free, and
/// when both rasters resolve to the same pooled mutex only one guard is
/// taken.
pub(crate) fn lock_pair(
    a: usize,
    b: usize,
) -> (MutexGuard<'static, ()>, Option<MutexGuard<'static, ()>>) {
    if a == b {
        (lock(a), None)
    } else {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        (lock(lo), Some(lock(hi)))
    }
}

const ZERO_INITIAL: usize = 4096;

static ZERO_BUFFER: LazyLock<Mutex<Arc<Vec<u8>>>> =
    LazyLock::new(|| Mutex::new(Arc::new(vec![0u8; ZERO_INITIAL])));

/// Obtain a shared zero buffer at least `required` bytes long.
///
/// The buffer only ever grows; callers hold the returned handle for as long
/// as they rely on the guard bytes.
pub(crate) fn zeroes(required: usize) -> Arc<Vec<u8>> {
    let mut guard = ZERO_BUFFER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if guard.len() < required {
        let mut size = guard.len();
        while size < required {
            size <<= 1;
        }
        size = (size + 0xfff) & !0xfff;
        *guard = Arc::new(vec![0u8; size]);
    }
    Arc::clone(&guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroes_grows_and_stays_zero() {
        let a = zeroes(16);
        assert!(a.len() >= 16);
        assert!(a.iter().all(|&b| b == 0));
        let big = zeroes(100_000);
        assert!(big.len() >= 100_000);
        assert_eq!(big.len() % 0x1000, 0);
        assert!(big.iter().all(|&b| b == 0));
        // requests below the current size reuse the grown buffer
        let again = zeroes(50_000);
        assert!(again.len() >= 50_000);
    }

    #[test]
    fn test_slots_cycle_through_pool() {
        let slot = assign_slot();
        assert!(slot < NMONITORS);
    }

    #[test]
    fn test_lock_pair_same_slot() {
        // Must not deadlock when both identities map to the same slot.
        let (_a, b) = lock_pair(3, 3);
        assert!(b.is_none());
    }
}
