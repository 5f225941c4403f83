//! Caller-owned side tables.
//!
//! The kernel never stores payload on its records; data such as positions,
//! colors or labels lives in an [`Attributes`] table keyed by a handle type.
//! Tables are dense over slot numbers and grow on demand, so handles created
//! by Euler operators after the table was filled simply read as unset.

use std::marker::PhantomData;

use super::index::Handle;

/// Dense map from handles of type `H` to values of type `T`.
#[derive(Debug, Clone)]
pub struct Attributes<H: Handle, T> {
    values: Vec<Option<T>>,
    _marker: PhantomData<H>,
}

impl<H: Handle, T> Default for Attributes<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T> Attributes<H, T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Create an empty table with room for `slots` handles.
    pub fn with_capacity(slots: usize) -> Self {
        Self {
            values: Vec::with_capacity(slots),
            _marker: PhantomData,
        }
    }

    /// Value stored for a handle.
    #[inline]
    pub fn get(&self, h: H) -> Option<&T> {
        self.values.get(h.slot()).and_then(Option::as_ref)
    }

    /// Mutable value stored for a handle.
    #[inline]
    pub fn get_mut(&mut self, h: H) -> Option<&mut T> {
        self.values.get_mut(h.slot()).and_then(Option::as_mut)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, h: H, value: T) -> Option<T> {
        let slot = h.slot();
        if slot >= self.values.len() {
            self.values.resize_with(slot + 1, || None);
        }
        self.values[slot].replace(value)
    }

    /// Remove the value for a handle.
    pub fn remove(&mut self, h: H) -> Option<T> {
        self.values.get_mut(h.slot()).and_then(Option::take)
    }

    /// Check if a value is stored for a handle.
    #[inline]
    pub fn contains(&self, h: H) -> bool {
        self.get(h).is_some()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Check if no value is stored.
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Iterate over stored values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (H::from_slot(i), v)))
    }
}

impl<H: Handle, T: Clone> Attributes<H, T> {
    /// Table with `value` stored for each of `handles`.
    pub fn filled(handles: impl IntoIterator<Item = H>, value: T) -> Self {
        let mut table = Self::new();
        for h in handles {
            table.insert(h, value.clone());
        }
        table
    }
}

impl<H: Handle, T> FromIterator<(H, T)> for Attributes<H, T> {
    fn from_iter<It: IntoIterator<Item = (H, T)>>(iter: It) -> Self {
        let mut table = Self::new();
        for (h, v) in iter {
            table.insert(h, v);
        }
        table
    }
}

impl<H: Handle, T> Extend<(H, T)> for Attributes<H, T> {
    fn extend<It: IntoIterator<Item = (H, T)>>(&mut self, iter: It) {
        for (h, v) in iter {
            self.insert(h, v);
        }
    }
}

impl<H: Handle, T> std::ops::Index<H> for Attributes<H, T> {
    type Output = T;

    /// # Panics
    /// Panics if no value is stored for the handle.
    fn index(&self, h: H) -> &T {
        match self.get(h) {
            Some(v) => v,
            None => panic!("no attribute stored for {:?}", h),
        }
    }
}
