use std::cell::Cell;

/// Holds the engine's transfer lock until dropped.
///
/// Dropping releases the lock, so every exit path of the guarded operation (early error
/// returns included) leaves the engine unlocked.
#[derive(Debug)]
pub(in crate::engine) struct ReentrancyGuard<'a> {
    locked: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    /// Takes the lock, or returns [`None`] if it is already held.
    pub(in crate::engine) fn acquire(locked: &'a Cell<bool>) -> Option<Self> {
        if locked.replace(true) {
            return None;
        }
        Some(Self { locked })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.locked.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_rejects_nested_attempt_and_releases_on_drop() {
        let locked = Cell::new(false);

        let guard = ReentrancyGuard::acquire(&locked);
        assert!(guard.is_some());
        assert!(locked.get());
        assert!(ReentrancyGuard::acquire(&locked).is_none());

        drop(guard);
        assert!(!locked.get());
        assert!(ReentrancyGuard::acquire(&locked).is_some());
    }
}
