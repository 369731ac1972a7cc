//! Typed generational handles.
//!
//! A `Handle<T>` names a slot in an [`Arena<T>`](super::Arena) together with the
//! generation that slot had when the value was inserted. Once the value is
//! removed the slot's generation moves on, so stale handles resolve to `None`
//! instead of aliasing whatever is stored there next.

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// A non-owning, copyable reference to a value stored in an arena.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// The slot index, usable as an opaque integer identifier.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The generation of the slot at insertion time.
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls so `T` needs no bounds.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let short_name = full_name.rsplit("::").next().unwrap_or(full_name);
        write!(f, "{}#{}v{}", short_name, self.index, self.generation)
    }
}
