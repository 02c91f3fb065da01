//! The context-bound resolution capability handed to factories, hooks and
//! `Lazy` fields.

use crate::core::Instance;
use crate::error::{ResolveError, Result};
use crate::key::ServiceKey;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Something that can turn a key into an instance: the container registry or
/// a scope.
pub(crate) trait ResolveContext: Send + Sync {
  fn resolve_key(&self, key: &ServiceKey) -> Result<Instance>;

  fn is_scope(&self) -> bool;
}

/// A handle to the context (container or scope) that is building an instance.
///
/// Everything wired while constructing a service goes through the resolver of
/// the context doing the construction. `Lazy` fields keep a clone of it, so a
/// deferred lookup made later from inside a scoped instance still lands in
/// that scope rather than in the container.
///
/// The context is held weakly: a resolver never keeps a container or scope
/// alive, and using one after its context is gone fails with
/// [`ResolveError::ContextClosed`].
#[derive(Clone)]
pub struct Resolver {
  context: Weak<dyn ResolveContext>,
}

impl Resolver {
  pub(crate) fn new(context: Weak<dyn ResolveContext>) -> Self {
    Self { context }
  }

  pub(crate) fn resolve_key(&self, key: &ServiceKey) -> Result<Instance> {
    let context = self
      .context
      .upgrade()
      .ok_or_else(|| ResolveError::ContextClosed(key.clone()))?;
    context.resolve_key(key)
  }

  pub(crate) fn resolve_as<T: Any + Send + Sync>(&self, key: &ServiceKey) -> Result<Arc<T>> {
    let instance = self.resolve_key(key)?;
    downcast(key, instance)
  }

  /// Resolves `T` through the bound context.
  pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve_as(&ServiceKey::of::<T>())
  }

  /// Resolves `T` registered under `name` through the bound context.
  pub fn resolve_named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve_as(&ServiceKey::named::<T>(name))
  }

  /// Whether this resolver is bound to a scope. Returns `false` once the
  /// context has been dropped.
  pub fn is_scope(&self) -> bool {
    self
      .context
      .upgrade()
      .map_or(false, |context| context.is_scope())
  }

  /// Whether the bound context is still alive.
  pub fn is_open(&self) -> bool {
    self.context.strong_count() > 0
  }
}

impl fmt::Debug for Resolver {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolver")
      .field("open", &self.is_open())
      .field("scope", &self.is_scope())
      .finish()
  }
}

pub(crate) fn downcast<T: Any + Send + Sync>(key: &ServiceKey, instance: Instance) -> Result<Arc<T>> {
  instance
    .downcast::<T>()
    .map_err(|_| ResolveError::TypeMismatch(key.clone()))
}
