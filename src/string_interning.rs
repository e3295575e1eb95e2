//! Centralized string interning, shared by the stub library and every
//! function AST so names are compared as `u32`s instead of `str`s once
//! parsing is done.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Initial reservation for a fresh [`StringTable`]; sized for a small
/// module's worth of identifiers so early compilation doesn't pay for
/// reallocation on every declaration.
const MINIMUM_STRING_TABLE_CAPACITY: usize = 256;

/// A unique identifier for an interned string, represented as a u32 for memory efficiency.
/// This provides type safety to prevent mixing string IDs with other integer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringId(u32);

impl StringId {
    /// Convert the StringId to its underlying u32 value for serialization
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a StringId from a u32 value for deserialization
    #[inline]
    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }

    /// Compare this interned string with a string slice efficiently without allocation.
    /// Requires access to the StringTable that created this ID.
    #[inline]
    pub fn eq_str(self, table: &StringTable, other: &str) -> bool {
        table.strings[self.0 as usize].as_ref() == other
    }

    /// Resolve this interned string using the provided StringTable.
    #[inline]
    pub fn resolve<'a>(self, table: &'a StringTable) -> &'a str {
        table.resolve(self)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// A centralized string interning system that stores unique strings only once in memory.
///
/// Dual-mapping: a `Vec<Box<str>>` for O(1) ID→string resolution, and an
/// `FxHashMap<&str, StringId>` for O(1) string→ID lookup during interning.
#[derive(Debug, Clone)]
pub struct StringTable {
    /// Primary storage: ID → String mapping for fast resolution.
    strings: Vec<Box<str>>,

    /// Reverse lookup: String → ID mapping, keyed by borrowed references
    /// into `strings` to avoid duplicating string data.
    string_to_id: FxHashMap<&'static str, StringId>,

    next_id: u32,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: 0,
            strings: Vec::with_capacity(capacity + MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Intern a string slice, returning its unique ID. Returns the existing
    /// ID if the string was already interned.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }
        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.next_id);
        self.next_id += 1;

        let boxed: Box<str> = s.into();

        // SAFETY: the table owns `boxed` for the rest of its lifetime and
        // never reallocates or removes entries, so this heap address stays
        // valid as long as `self.strings` does.
        let static_ref: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(boxed.as_ref()) };

        self.string_to_id.insert(static_ref, new_id);
        self.strings.push(boxed);

        new_id
    }

    /// Resolve an interned string ID back to its content.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        // SAFETY: StringIds are only ever handed out by this table, so the
        // index is always in bounds.
        unsafe { self.strings.get_unchecked(id.0 as usize).as_ref() }
    }

    /// Intern an owned `String`, avoiding a reallocation on the new-string
    /// path.
    #[inline]
    pub fn get_or_intern(&mut self, s: String) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s.as_str()) {
            return existing_id;
        }
        self.intern_new_owned(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new_owned(&mut self, s: String) -> StringId {
        let new_id = StringId(self.next_id);
        self.next_id += 1;

        let boxed: Box<str> = s.into_boxed_str();

        // SAFETY: same reasoning as `intern_new`.
        let static_ref: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(boxed.as_ref()) };

        self.string_to_id.insert(static_ref, new_id);
        self.strings.push(boxed);

        new_id
    }

    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_ref())
    }

    /// Looks up a string without interning it.
    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    #[cfg(debug_assertions)]
    pub fn dump_strings(&self) -> Vec<(StringId, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(idx, s)| (StringId(idx as u32), s.as_ref()))
            .collect()
    }
}

/// Serializes as the plain ordered string list; `string_to_id` is a
/// derived lookup index, not part of the table's actual content, and
/// holds `&'static str` keys that can't be deserialized directly.
impl Serialize for StringTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.strings.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StringTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;
        let mut table = StringTable::with_capacity(strings.len());
        for s in strings {
            table.intern(&s);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_string_twice_returns_same_id() {
        let mut table = StringTable::new();
        let a = table.intern("Vector3");
        let b = table.intern("Vector3");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
        assert_eq!(table.resolve(a), "foo");
        assert_eq!(table.resolve(b), "bar");
    }

    #[test]
    fn get_existing_does_not_insert() {
        let mut table = StringTable::new();
        assert_eq!(table.get_existing("missing"), None);
        assert_eq!(table.len(), 0);
        table.intern("missing");
        assert!(table.get_existing("missing").is_some());
    }
}
