//! Service identity and lifetime policy.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies a registered construction recipe: the declared type, optionally
/// qualified by a name.
///
/// Two keys are equal when both the type and the name match. The type name is
/// carried along for diagnostics only.
#[derive(Clone)]
pub struct ServiceKey {
  type_id: TypeId,
  type_name: &'static str,
  name: Option<String>,
}

impl ServiceKey {
  /// The unnamed key for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
      name: None,
    }
  }

  /// The key for `T` qualified by `name`.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: type_name::<T>(),
      name: Some(name.to_owned()),
    }
  }

  pub fn for_name<T: ?Sized + Any>(name: Option<&str>) -> Self {
    match name {
      Some(n) => Self::named::<T>(n),
      None => Self::of::<T>(),
    }
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }
}

impl PartialEq for ServiceKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.name == other.name
  }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.name.hash(state);
  }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Key(Type({}), Name({}))", self.type_name, name),
      None => write!(f, "Key(Type({}))", self.type_name),
    }
  }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{}(\"{}\")", self.type_name, name),
      None => f.write_str(self.type_name),
    }
  }
}

/// How long a resolved instance lives and who owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
  /// One instance per `Container`, shared by every resolver and finalized
  /// when the container is dropped.
  Singleton,
  /// A fresh instance per resolution, owned by the caller.
  Transient,
  /// One instance per `Scope`, finalized when the scope closes.
  Scoped,
}

impl Lifetime {
  pub fn is_singleton(&self) -> bool {
    matches!(self, Lifetime::Singleton)
  }

  pub fn is_transient(&self) -> bool {
    matches!(self, Lifetime::Transient)
  }

  pub fn is_scoped(&self) -> bool {
    matches!(self, Lifetime::Scoped)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Lifetime::Singleton => "singleton",
      Lifetime::Transient => "transient",
      Lifetime::Scoped => "scoped",
    }
  }
}

impl fmt::Display for Lifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  struct Probe;

  #[test]
  fn keys_compare_by_type_and_name() {
    assert_eq!(ServiceKey::of::<Probe>(), ServiceKey::of::<Probe>());
    assert_eq!(ServiceKey::named::<Probe>("a"), ServiceKey::for_name::<Probe>(Some("a")));
    assert_ne!(ServiceKey::of::<Probe>(), ServiceKey::named::<Probe>("a"));
    assert_ne!(ServiceKey::named::<Probe>("a"), ServiceKey::named::<Probe>("b"));
    assert_ne!(ServiceKey::of::<Probe>(), ServiceKey::of::<String>());

    let set: HashSet<_> = [
      ServiceKey::of::<Probe>(),
      ServiceKey::of::<Probe>(),
      ServiceKey::named::<Probe>("a"),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn key_display_includes_name() {
    let key = ServiceKey::named::<String>("greeting");
    assert!(key.to_string().ends_with("String(\"greeting\")"));
    assert_eq!(ServiceKey::of::<u32>().to_string(), "u32");
    assert_eq!(key.name(), Some("greeting"));
  }

  #[test]
  fn lifetime_display() {
    assert_eq!(Lifetime::Singleton.to_string(), "singleton");
    assert_eq!(Lifetime::Transient.to_string(), "transient");
    assert_eq!(Lifetime::Scoped.to_string(), "scoped");
    assert!(Lifetime::Scoped.is_scoped());
    assert!(!Lifetime::Scoped.is_singleton());
  }
}
