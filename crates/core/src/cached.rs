//! Lazily computed values attached to a game state.
//!
//! Game states are cloned and mutated thousands of times per search. Derived
//! facts such as "who has won" or "which moves are legal" are expensive to
//! recompute, so states keep them in [`CachedSlot`]s:
//!
//! - the first read computes and stores the value,
//! - every mutation of the owning state calls [`Invalidate::invalidate`],
//! - cloning the owning state clones populated slots instead of recomputing.
//!
//! ```
//! use uct_core::{CachedSlot, Invalidate};
//!
//! let mut slot: CachedSlot<u32> = CachedSlot::new();
//! assert_eq!(*slot.get_or_compute(|| 6 * 7), 42);
//! assert_eq!(*slot.get_or_compute(|| unreachable!()), 42);
//!
//! slot.invalidate();
//! assert!(!slot.is_populated());
//! ```

use once_cell::unsync::OnceCell;
use std::fmt;

/// Something holding cached values that must be dropped after a mutation.
pub trait Invalidate {
    /// Forget every cached value.
    fn invalidate(&mut self);
}

/// A lazily computed, explicitly invalidated value.
///
/// `Clone` is the deep-copy hook: cloning a slot clones the cached value, so a
/// cloned state never shares mutable structure with the original.
#[derive(Clone, PartialEq)]
pub struct CachedSlot<T> {
    cell: OnceCell<T>,
}

impl<T> CachedSlot<T> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the cached value, computing and storing it on first access.
    pub fn get_or_compute<F>(&self, compute: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(compute)
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute).
    /// Nothing is stored if `compute` fails.
    pub fn get_or_try_compute<F, E>(&self, compute: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.cell.get_or_try_init(compute)
    }

    /// The cached value, if populated.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether a value is currently stored.
    pub fn is_populated(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Remove and return the cached value.
    pub fn take(&mut self) -> Option<T> {
        self.cell.take()
    }

    /// Mirror `other` into this slot, deep-copying its value when populated.
    pub fn copy_from(&mut self, other: &Self)
    where
        T: Clone,
    {
        self.cell = other.cell.clone();
    }
}

impl<T> Invalidate for CachedSlot<T> {
    fn invalidate(&mut self) {
        self.cell.take();
    }
}

impl<T> Default for CachedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for CachedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("CachedSlot").field(value).finish(),
            None => f.write_str("CachedSlot(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_computes_once() {
        let calls = Cell::new(0);
        let slot: CachedSlot<Vec<u8>> = CachedSlot::new();

        for _ in 0..3 {
            let value = slot.get_or_compute(|| {
                calls.set(calls.get() + 1);
                vec![1, 2, 3]
            });
            assert_eq!(value, &vec![1, 2, 3]);
        }

        assert_eq!(calls.get(), 1);
        assert!(slot.is_populated());
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let mut slot = CachedSlot::new();
        assert_eq!(*slot.get_or_compute(|| 1), 1);

        slot.invalidate();
        assert!(!slot.is_populated());
        assert_eq!(slot.get(), None);

        assert_eq!(*slot.get_or_compute(|| 2), 2);
    }

    #[test]
    fn test_failed_compute_leaves_slot_empty() {
        let slot: CachedSlot<u8> = CachedSlot::new();

        let result: Result<&u8, &str> = slot.get_or_try_compute(|| Err("nope"));
        assert!(result.is_err());
        assert!(!slot.is_populated());

        let result: Result<&u8, &str> = slot.get_or_try_compute(|| Ok(7));
        assert_eq!(result, Ok(&7));
    }

    #[test]
    fn test_clone_is_deep() {
        let original: CachedSlot<Vec<u8>> = CachedSlot::new();
        original.get_or_compute(|| vec![1, 2]);

        let mut copy = original.clone();
        if let Some(mut value) = copy.take() {
            value.push(3);
        }

        // Mutating the copy's value never leaks into the original.
        assert_eq!(original.get(), Some(&vec![1, 2]));
        assert!(!copy.is_populated());
    }

    #[test]
    fn test_copy_from() {
        let source: CachedSlot<String> = CachedSlot::new();
        source.get_or_compute(|| "cached".to_string());

        let mut target = CachedSlot::new();
        target.copy_from(&source);
        assert_eq!(target.get().map(String::as_str), Some("cached"));

        let empty = CachedSlot::new();
        target.copy_from(&empty);
        assert!(!target.is_populated());
    }

    #[test]
    fn test_debug_format() {
        let slot: CachedSlot<u8> = CachedSlot::new();
        assert_eq!(format!("{:?}", slot), "CachedSlot(<empty>)");
        slot.get_or_compute(|| 5);
        assert_eq!(format!("{:?}", slot), "CachedSlot(5)");
    }
}
