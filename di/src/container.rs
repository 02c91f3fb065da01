//! The main `Container` struct and its associated methods.

use crate::core::{Instance, ServiceEntry};
use crate::error::{BoxError, ResolveError, Result};
use crate::inject::Injectable;
use crate::key::{Lifetime, ServiceKey};
use crate::resolver::{downcast, ResolveContext, Resolver};
use crate::scope::Scope;
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// The shared state behind a `Container`. Scopes and resolvers point at it
/// weakly.
pub(crate) struct Registry {
  this: Weak<Registry>,
  entries: DashMap<ServiceKey, Arc<ServiceEntry>>,
  // Reentrant so a singleton's own dependencies can be resolved on the
  // constructing thread while the lock is held.
  singleton_lock: ReentrantMutex<()>,
  // Singletons in the order they were published.
  constructed: Mutex<Vec<Arc<ServiceEntry>>>,
  // Set once teardown starts; no new singleton is built after that.
  closing: AtomicBool,
}

impl Registry {
  fn new() -> Arc<Self> {
    Arc::new_cyclic(|this| Self {
      this: this.clone(),
      entries: DashMap::new(),
      singleton_lock: ReentrantMutex::new(()),
      constructed: Mutex::new(Vec::new()),
      closing: AtomicBool::new(false),
    })
  }

  pub(crate) fn resolver(&self) -> Resolver {
    let context: Weak<dyn ResolveContext> = self.this.clone();
    Resolver::new(context)
  }

  pub(crate) fn entry(&self, key: &ServiceKey) -> Result<Arc<ServiceEntry>> {
    self
      .entries
      .get(key)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| ResolveError::NotRegistered(key.clone()))
  }

  fn insert(&self, entry: ServiceEntry) {
    let key = entry.key.clone();
    debug!(
      service = %key,
      lifetime = %entry.lifetime,
      factory = entry.custom_factory,
      "registered service"
    );
    if let Some(previous) = self.entries.insert(key.clone(), Arc::new(entry)) {
      warn!(
        service = %key,
        previous_lifetime = %previous.lifetime,
        "registration replaced an existing entry"
      );
    }
  }

  /// Returns the cached singleton, constructing it on first use.
  ///
  /// The first check is lock free. On a miss the singleton lock is taken and
  /// the cache checked again, so concurrent first resolutions construct once
  /// and all observe the same instance. A failed construction publishes
  /// nothing. Once teardown has started, cached singletons are still handed
  /// out but a miss fails with [`ResolveError::ContextClosed`].
  pub(crate) fn resolve_singleton(&self, entry: &Arc<ServiceEntry>) -> Result<Instance> {
    if let Some(instance) = entry.cached.get() {
      trace!(service = %entry.key, "singleton cache hit");
      return Ok(instance.clone());
    }

    let _guard = self.singleton_lock.lock();
    if let Some(instance) = entry.cached.get() {
      return Ok(instance.clone());
    }
    if self.closing.load(Ordering::Acquire) {
      return Err(ResolveError::ContextClosed(entry.key.clone()));
    }

    let instance = entry.construct(&self.resolver())?;
    match entry.cached.try_insert(instance) {
      Ok(published) => {
        self.constructed.lock().push(entry.clone());
        debug!(service = %entry.key, "singleton constructed");
        Ok(published.clone())
      }
      // Published by a nested resolution on this thread while we were building.
      Err((existing, discarded)) => {
        trace!(service = %entry.key, "discarding singleton built by an outer resolution");
        entry.finalize(&discarded);
        Ok(existing.clone())
      }
    }
  }

  /// Finalizes every constructed singleton, most recent first, then drops
  /// all registrations.
  ///
  /// Finalizers may still resolve singletons that are already cached.
  fn teardown(&self) {
    self.closing.store(true, Ordering::Release);
    let constructed = self.constructed.lock().clone();
    for entry in constructed.iter().rev() {
      if let Some(instance) = entry.cached.get() {
        entry.finalize(instance);
      }
    }
    self.constructed.lock().clear();
    let registrations = self.entries.len();
    self.entries.clear();
    debug!(
      singletons = constructed.len(),
      registrations,
      "container torn down"
    );
  }
}

impl ResolveContext for Registry {
  fn resolve_key(&self, key: &ServiceKey) -> Result<Instance> {
    let entry = self.entry(key)?;
    match entry.lifetime {
      Lifetime::Singleton => self.resolve_singleton(&entry),
      Lifetime::Transient => entry.construct(&self.resolver()),
      Lifetime::Scoped => Err(ResolveError::LifetimeMismatch {
        key: key.clone(),
        lifetime: Lifetime::Scoped,
      }),
    }
  }

  fn is_scope(&self) -> bool {
    false
  }
}

/// The dependency injection container.
///
/// Holds the registrations for all services and owns every singleton it
/// builds. Registration takes `&self`, so a container can be shared while it
/// is being populated, but registration is expected to finish before
/// concurrent resolution starts.
///
/// Scoped services cannot be resolved here; open a [`Scope`] with
/// [`create_scope`](Container::create_scope).
///
/// Dropping the container finalizes every singleton it constructed exactly
/// once, most recently constructed first. Adopted instances (see
/// [`register_instance`](Container::register_instance)) are never finalized.
pub struct Container {
  registry: Arc<Registry>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self {
      registry: Registry::new(),
    }
  }

  // --- PRIVATE HELPERS ---

  fn register_internal<T: Injectable + Default>(&self, name: Option<&str>, lifetime: Lifetime) {
    let key = ServiceKey::for_name::<T>(name);
    self.registry.insert(ServiceEntry::for_type::<T>(key, lifetime));
  }

  fn register_factory_internal<T, F>(&self, name: Option<&str>, lifetime: Lifetime, factory: F)
  where
    T: Injectable,
    F: Fn(&Resolver) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    let key = ServiceKey::for_name::<T>(name);
    self
      .registry
      .insert(ServiceEntry::for_factory(key, lifetime, factory));
  }

  fn register_instance_internal<T: Injectable>(&self, name: Option<&str>, mut instance: T) -> Result<Arc<T>> {
    let key = ServiceKey::for_name::<T>(name);
    instance.inject(&self.registry.resolver())?;
    let instance = Arc::new(instance);
    self
      .registry
      .insert(ServiceEntry::adopted(key, instance.clone()));
    Ok(instance)
  }

  fn resolve_internal<T: Any + Send + Sync>(&self, name: Option<&str>) -> Result<Arc<T>> {
    let key = ServiceKey::for_name::<T>(name);
    let instance = self.registry.resolve_key(&key)?;
    downcast(&key, instance)
  }

  fn destroy_internal<T: Any + Send + Sync>(&self, name: Option<&str>, instance: Arc<T>) -> Result<()> {
    let key = ServiceKey::for_name::<T>(name);
    self.registry.entry(&key)?.destroy(instance)
  }

  // --- PUBLIC API ---

  // --- Registration ---

  /// Registers `T`, built from `T::default()` and then wired.
  ///
  /// Registering a key again replaces the previous entry. Singletons already
  /// built from the old entry are still finalized when the container drops.
  pub fn register<T: Injectable + Default>(&self, lifetime: Lifetime) {
    self.register_internal::<T>(None, lifetime);
  }

  pub fn register_named<T: Injectable + Default>(&self, name: &str, lifetime: Lifetime) {
    self.register_internal::<T>(Some(name), lifetime);
  }

  /// Registers `T` with a caller-supplied factory. The factory receives the
  /// resolver of the constructing context; dependency fields of the value it
  /// returns are injected afterwards, then the post-construction hook runs.
  pub fn register_factory<T, F>(&self, lifetime: Lifetime, factory: F)
  where
    T: Injectable,
    F: Fn(&Resolver) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    self.register_factory_internal(None, lifetime, factory);
  }

  pub fn register_factory_named<T, F>(&self, name: &str, lifetime: Lifetime, factory: F)
  where
    T: Injectable,
    F: Fn(&Resolver) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    self.register_factory_internal(Some(name), lifetime, factory);
  }

  /// Adopts an externally built instance as a singleton.
  ///
  /// Its dependency fields are injected immediately, so everything it depends
  /// on must already be registered. The container never runs `T::FINALIZE`
  /// for an adopted instance. Returns a handle to the adopted instance.
  pub fn register_instance<T: Injectable>(&self, instance: T) -> Result<Arc<T>> {
    self.register_instance_internal(None, instance)
  }

  pub fn register_instance_named<T: Injectable>(&self, name: &str, instance: T) -> Result<Arc<T>> {
    self.register_instance_internal(Some(name), instance)
  }

  // --- Introspection ---

  pub fn is_registered<T: Any>(&self) -> bool {
    self.registry.entries.contains_key(&ServiceKey::of::<T>())
  }

  pub fn is_registered_named<T: Any>(&self, name: &str) -> bool {
    self.registry.entries.contains_key(&ServiceKey::named::<T>(name))
  }

  /// The lifetime `T` was registered with, if any.
  pub fn lifetime_of<T: Any>(&self, name: Option<&str>) -> Option<Lifetime> {
    self
      .registry
      .entries
      .get(&ServiceKey::for_name::<T>(name))
      .map(|entry| entry.lifetime)
  }

  /// Number of registered keys.
  pub fn len(&self) -> usize {
    self.registry.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.entries.is_empty()
  }

  // --- Resolution ---

  /// Resolves a singleton or transient service.
  ///
  /// Fails with [`ResolveError::NotRegistered`] for unknown keys and with
  /// [`ResolveError::LifetimeMismatch`] for scoped services. Errors raised
  /// while building the service or any of its dependencies are returned
  /// unchanged, and nothing is cached, so the call can be retried.
  pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve_internal(None)
  }

  pub fn resolve_named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve_internal(Some(name))
  }

  /// A resolver bound to this container, for resolving from code that should
  /// not hold the container itself.
  pub fn resolver(&self) -> Resolver {
    self.registry.resolver()
  }

  /// Opens a scope backed by this container.
  pub fn create_scope(&self) -> Scope {
    Scope::new(Arc::downgrade(&self.registry))
  }

  // --- Destruction ---

  /// Finalizes a transient instance previously resolved from this container
  /// and releases the caller's handle.
  ///
  /// Singletons and scoped instances are owned by their context; passing one
  /// here fails with [`ResolveError::LifetimeMismatch`].
  pub fn destroy<T: Any + Send + Sync>(&self, instance: Arc<T>) -> Result<()> {
    self.destroy_internal(None, instance)
  }

  pub fn destroy_named<T: Any + Send + Sync>(&self, name: &str, instance: Arc<T>) -> Result<()> {
    self.destroy_internal(Some(name), instance)
  }
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for Container {
  fn drop(&mut self) {
    self.registry.teardown();
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("registrations", &self.registry.entries.len())
      .field("singletons", &self.registry.constructed.lock().len())
      .finish()
  }
}
