//! C1 — the bump allocator every stub, AST node, and opcode lives in for
//! the lifetime of one compilation.
//!
//! The source system this was distilled from used a raw linear allocator
//! handing out pointers. The spec's own design notes call that out as the
//! one pattern that should not translate literally to Rust: represent the
//! arena as typed slots indexed by a small integer handle instead of
//! pointers. `IdArena<Id, T>` is that translation — a monotonic `Vec<T>`
//! with no removal API, so its lifetime really is "for as long as the
//! compilation holds the arena", and every cross-reference (owner, base,
//! resolved type, …) is a `Copy` id rather than a borrow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A `Copy` handle into an [`IdArena`]. Implemented by the newtype id
/// types in [`crate::stubs::ids`] and [`crate::function_ast`].
pub trait ArenaId: Copy {
    fn from_index(index: u32) -> Self;
    fn index(self) -> u32;
}

/// Defines a `Copy` newtype id over `u32` that implements [`ArenaId`].
#[macro_export]
macro_rules! define_arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub struct $name(u32);

        impl $crate::arena::ArenaId for $name {
            #[inline]
            fn from_index(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            fn index(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

/// Append-only, index-addressed storage for one stub/AST-node/opcode kind.
///
/// No entry is ever freed individually; the whole arena is dropped at
/// once when the owning compilation ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + for<'de2> Deserialize<'de2>")]
pub struct IdArena<Id, T> {
    slots: Vec<T>,
    #[serde(skip)]
    _id: PhantomData<fn() -> Id>,
}

impl<Id, T> Default for IdArena<Id, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            _id: PhantomData,
        }
    }
}

impl<Id: ArenaId, T> IdArena<Id, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `value`, returning its stable id.
    pub fn alloc(&mut self, value: T) -> Id {
        let id = Id::from_index(self.slots.len() as u32);
        self.slots.push(value);
        id
    }

    pub fn get(&self, id: Id) -> &T {
        &self.slots[id.index() as usize]
    }

    pub fn get_mut(&mut self, id: Id) -> &mut T {
        &mut self.slots[id.index() as usize]
    }

    pub fn try_get(&self, id: Id) -> Option<&T> {
        self.slots.get(id.index() as usize)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn iter_with_ids(&self) -> impl Iterator<Item = (Id, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (Id::from_index(i as u32), v))
    }

    pub fn ids(&self) -> impl Iterator<Item = Id> {
        (0..self.slots.len() as u32).map(Id::from_index)
    }
}

impl<Id: ArenaId, T> std::ops::Index<Id> for IdArena<Id, T> {
    type Output = T;

    fn index(&self, id: Id) -> &T {
        self.get(id)
    }
}

impl<Id: ArenaId, T> std::ops::IndexMut<Id> for IdArena<Id, T> {
    fn index_mut(&mut self, id: Id) -> &mut T {
        self.get_mut(id)
    }
}

impl<Id: fmt::Debug, T> IdArena<Id, T> {
    pub fn debug_label() -> &'static str {
        std::any::type_name::<T>()
    }
}
