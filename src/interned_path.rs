//! Interned qualified names: the dotted chain of enclosing module /
//! class / namespace names used for scope lookups during name
//! resolution (§4.3.1) and for rendering qualified names in diagnostics.

use crate::string_interning::{StringId, StringTable};
use serde::{Deserialize, Serialize};

/// A sequence of interned path components, e.g. `Game::Entity::position`
/// stored as three `StringId`s rather than a formatted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InternedPath {
    components: Vec<StringId>,
}

impl InternedPath {
    pub fn new() -> Self {
        Self { components: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { components: Vec::with_capacity(capacity) }
    }

    pub fn from_components(components: Vec<StringId>) -> Self {
        Self { components }
    }

    pub fn from_single_str(entry: &str, string_table: &mut StringTable) -> Self {
        Self { components: vec![string_table.intern(entry)] }
    }

    pub fn push(&mut self, component: StringId) {
        self.components.push(component);
    }

    pub fn push_str(&mut self, component: &str, string_table: &mut StringTable) {
        let id = string_table.intern(component);
        self.components.push(id);
    }

    pub fn pop(&mut self) -> Option<StringId> {
        self.components.pop()
    }

    pub fn parent(&self) -> Option<InternedPath> {
        if self.components.is_empty() {
            None
        } else {
            let mut parent_components = self.components.clone();
            parent_components.pop();
            Some(InternedPath { components: parent_components })
        }
    }

    pub fn join(&self, other: &InternedPath) -> InternedPath {
        let mut new_components = self.components.clone();
        new_components.extend_from_slice(&other.components);
        InternedPath { components: new_components }
    }

    pub fn append(&self, new: StringId) -> Self {
        let mut new_components = self.components.clone();
        new_components.push(new);
        Self { components: new_components }
    }

    pub fn join_str(&self, component: &str, string_table: &mut StringTable) -> InternedPath {
        let mut new_path = self.clone();
        new_path.push_str(component, string_table);
        new_path
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The last component — the name being looked up, as opposed to the
    /// scope it's being looked up in.
    pub fn name(&self) -> Option<StringId> {
        self.components.last().copied()
    }

    pub fn name_str<'a>(&self, string_table: &'a StringTable) -> Option<&'a str> {
        self.name().map(|id| string_table.resolve(id))
    }

    pub fn components(&self) -> impl Iterator<Item = StringId> + '_ {
        self.components.iter().copied()
    }

    pub fn as_components(&self) -> &[StringId] {
        &self.components
    }

    pub fn starts_with(&self, prefix: &InternedPath) -> bool {
        if prefix.components.len() > self.components.len() {
            return false;
        }
        self.components.iter().zip(prefix.components.iter()).all(|(a, b)| a == b)
    }

    pub fn ends_with(&self, suffix: &InternedPath) -> bool {
        if suffix.components.len() > self.components.len() {
            return false;
        }
        let start_idx = self.components.len() - suffix.components.len();
        self.components[start_idx..].iter().zip(suffix.components.iter()).all(|(a, b)| a == b)
    }

    pub fn relative_to(&self, base: &InternedPath) -> Option<InternedPath> {
        if !self.starts_with(base) {
            return None;
        }
        Some(InternedPath { components: self.components[base.components.len()..].to_vec() })
    }

    /// Renders the fully qualified name with `::` separators, for
    /// diagnostics (§4.2a) and for the `candidates` list in
    /// `CompilerMessage::OverloadAmbiguity`.
    pub fn to_qualified_string(&self, string_table: &StringTable) -> String {
        self.components
            .iter()
            .map(|&id| string_table.resolve(id))
            .collect::<Vec<_>>()
            .join("::")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_string_joins_with_double_colon() {
        let mut table = StringTable::new();
        let mut path = InternedPath::from_single_str("Game", &mut table);
        path.push_str("Entity", &mut table);
        path.push_str("position", &mut table);
        assert_eq!(path.to_qualified_string(&table), "Game::Entity::position");
    }

    #[test]
    fn parent_strips_last_component() {
        let mut table = StringTable::new();
        let mut path = InternedPath::from_single_str("Game", &mut table);
        path.push_str("Entity", &mut table);
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_qualified_string(&table), "Game");
        assert_eq!(InternedPath::new().parent(), None);
    }

    #[test]
    fn starts_with_and_relative_to_round_trip() {
        let mut table = StringTable::new();
        let mut base = InternedPath::from_single_str("Game", &mut table);
        base.push_str("Entity", &mut table);
        let full = base.join_str("position", &mut table);
        assert!(full.starts_with(&base));
        let rel = full.relative_to(&base).unwrap();
        assert_eq!(rel.to_qualified_string(&table), "position");
    }
}
