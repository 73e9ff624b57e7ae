use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a script-exposed name comes from, as reported by the script
/// analysis that runs before template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BindingKind {
    /// Declared component prop.
    Prop,
    /// Prop destructured or renamed locally; reads go through the alias.
    AliasedProp,
    /// `const` initialized with a literal: constant for the component's
    /// whole lifetime, but the value is only known at runtime.
    LiteralConst,
    /// Plain mutable local.
    LocalMutable,
    /// Reactive box whose payload lives behind `.value`.
    Ref,
    /// Imported from another module.
    Imported,
}

/// Binding metadata for one component's script, keyed by exposed name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bindings {
    map: HashMap<String, BindingKind>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: BindingKind) {
        self.map.insert(name.into(), kind);
    }

    pub fn get(&self, name: &str) -> Option<BindingKind> {
        self.map.get(name).copied()
    }

    /// Whether reads of this name need a `.value` unwrap in generated code.
    pub fn needs_value_unwrap(&self, name: &str) -> bool {
        self.get(name) == Some(BindingKind::Ref)
    }

    /// Whether the name is constant across renders. Such names keep an
    /// expression hoistable even though its value cannot be folded into a
    /// string at compile time.
    pub fn is_constant(&self, name: &str) -> bool {
        matches!(self.get(name), Some(BindingKind::LiteralConst))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, BindingKind)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
