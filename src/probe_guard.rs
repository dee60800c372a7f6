//! Debug-only guard against reentering the key index.
//!
//! The index calls user `Eq`/`Hash` implementations while it is probing or
//! relinking slots. A key whose `eq` reaches back into the same map would
//! observe a half-updated index, so debug builds panic on nested entry.
//! Release builds carry a zero-sized marker and no check.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-index busy flag. Keeps the owning map `!Send`/`!Sync`.
#[derive(Debug)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    _single_thread: PhantomData<*mut ()>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    /// Mark the index busy until the returned token is dropped.
    #[inline]
    pub(crate) fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "orderedmap: key Eq/Hash reentered the map while its index was busy"
            );
            Busy { flag: &self.busy }
        }

        #[cfg(not(debug_assertions))]
        {
            Busy { _lt: PhantomData }
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProbeGuard {
    // A cloned map starts idle regardless of the source's state.
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII token returned by [`ProbeGuard::enter`].
pub(crate) struct Busy<'a> {
    #[cfg(debug_assertions)]
    flag: &'a Cell<bool>,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::ProbeGuard;

    #[test]
    fn sequential_entries_are_allowed() {
        let g = ProbeGuard::new();
        drop(g.enter());
        drop(g.enter());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let g = ProbeGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter();
            let _inner = g.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn clone_of_busy_guard_is_idle() {
        let g = ProbeGuard::new();
        let _outer = g.enter();
        let c = g.clone();
        let _ok = c.enter();
    }
}
