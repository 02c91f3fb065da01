//! Scopes: bounded-lifetime companions of a `Container`.

use crate::container::Registry;
use crate::core::{Instance, ServiceEntry};
use crate::error::{ResolveError, Result};
use crate::key::{Lifetime, ServiceKey};
use crate::resolver::{downcast, ResolveContext, Resolver};
use parking_lot::Mutex;
use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Scoped instances in construction order.
#[derive(Default)]
struct ScopeCache {
  slots: HashMap<ServiceKey, usize>,
  instances: Vec<(Arc<ServiceEntry>, Instance)>,
}

impl ScopeCache {
  fn get(&self, key: &ServiceKey) -> Option<Instance> {
    self
      .slots
      .get(key)
      .map(|&slot| self.instances[slot].1.clone())
  }

  fn insert(&mut self, entry: &Arc<ServiceEntry>, instance: Instance) {
    self.slots.insert(entry.key.clone(), self.instances.len());
    self.instances.push((entry.clone(), instance));
  }
}

pub(crate) struct ScopeState {
  id: u64,
  this: Weak<ScopeState>,
  registry: Weak<Registry>,
  cache: Mutex<ScopeCache>,
  closing: AtomicBool,
}

impl ScopeState {
  fn resolver(&self) -> Resolver {
    let context: Weak<dyn ResolveContext> = self.this.clone();
    Resolver::new(context)
  }

  fn registry(&self, key: &ServiceKey) -> Result<Arc<Registry>> {
    self
      .registry
      .upgrade()
      .ok_or_else(|| ResolveError::ContextClosed(key.clone()))
  }

  fn resolve_scoped(&self, entry: &Arc<ServiceEntry>) -> Result<Instance> {
    if let Some(instance) = self.cache.lock().get(&entry.key) {
      trace!(scope = self.id, service = %entry.key, "scoped cache hit");
      return Ok(instance);
    }
    if self.closing.load(Ordering::Acquire) {
      return Err(ResolveError::ContextClosed(entry.key.clone()));
    }

    // The lock is not held while building: construction re-enters this scope
    // for the instance's own dependencies.
    let instance = entry.construct(&self.resolver())?;

    let mut cache = self.cache.lock();
    let cached = cache.get(&entry.key);
    if let Some(existing) = cached {
      // A nested resolution on this thread cached the key first.
      drop(cache);
      trace!(
        scope = self.id,
        service = %entry.key,
        "discarding scoped instance built by an outer resolution"
      );
      entry.finalize(&instance);
      return Ok(existing);
    }
    cache.insert(entry, instance.clone());
    debug!(scope = self.id, service = %entry.key, "scoped instance constructed");
    Ok(instance)
  }

  /// Finalizes every cached instance, most recently constructed first.
  ///
  /// The cache stays readable while finalizers run, so a finalizer reaching
  /// another scoped instance gets the cached one. Nothing new is built.
  fn close(&self) {
    self.closing.store(true, Ordering::Release);
    let instances = self.cache.lock().instances.clone();
    for (entry, instance) in instances.iter().rev() {
      entry.finalize(instance);
    }
    *self.cache.lock() = ScopeCache::default();
    debug!(scope = self.id, finalized = instances.len(), "scope closed");
  }
}

impl ResolveContext for ScopeState {
  fn resolve_key(&self, key: &ServiceKey) -> Result<Instance> {
    let registry = self.registry(key)?;
    let entry = registry.entry(key)?;
    match entry.lifetime {
      Lifetime::Singleton => registry.resolve_singleton(&entry),
      Lifetime::Transient => entry.construct(&self.resolver()),
      Lifetime::Scoped => self.resolve_scoped(&entry),
    }
  }

  fn is_scope(&self) -> bool {
    true
  }
}

/// A unit of work (a request, a job) with its own scoped instances.
///
/// - Singletons are delegated to the container and never cached here.
/// - Scoped services are built at most once per scope and shared within it.
/// - Transients are built fresh on every call and belong to the caller.
///
/// Closing the scope, explicitly with [`close`](Scope::close) or by dropping
/// it, finalizes each scoped instance exactly once in reverse order of
/// construction. Singletons are left to the container.
///
/// A scope is meant to be used from one thread at a time: it can be moved to
/// another thread but not shared between threads.
///
/// ```
/// use fibre_di::{injectable, Container, Lifetime};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct RequestContext;
/// injectable!(RequestContext);
///
/// let container = Container::new();
/// container.register::<RequestContext>(Lifetime::Scoped);
///
/// let scope = container.create_scope();
/// let a = scope.resolve::<RequestContext>().unwrap();
/// let b = scope.resolve::<RequestContext>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let other = container.create_scope();
/// assert!(!Arc::ptr_eq(&a, &other.resolve::<RequestContext>().unwrap()));
/// ```
pub struct Scope {
  state: Arc<ScopeState>,
  _not_sync: PhantomData<Cell<()>>,
}

impl Scope {
  pub(crate) fn new(registry: Weak<Registry>) -> Self {
    let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
    trace!(scope = id, "scope opened");
    let state = Arc::new_cyclic(|this| ScopeState {
      id,
      this: this.clone(),
      registry,
      cache: Mutex::new(ScopeCache::default()),
      closing: AtomicBool::new(false),
    });
    Self {
      state,
      _not_sync: PhantomData,
    }
  }

  // --- PRIVATE HELPERS ---

  fn resolve_internal<T: Any + Send + Sync>(&self, name: Option<&str>) -> Result<Arc<T>> {
    let key = ServiceKey::for_name::<T>(name);
    let instance = self.state.resolve_key(&key)?;
    downcast(&key, instance)
  }

  fn destroy_internal<T: Any + Send + Sync>(&self, name: Option<&str>, instance: Arc<T>) -> Result<()> {
    let key = ServiceKey::for_name::<T>(name);
    self.state.registry(&key)?.entry(&key)?.destroy(instance)
  }

  // --- PUBLIC API ---

  /// Process-unique identifier, used in log output.
  pub fn id(&self) -> u64 {
    self.state.id
  }

  /// Resolves a service of any lifetime.
  ///
  /// Fails with [`ResolveError::ContextClosed`] if the container backing this
  /// scope has been dropped.
  pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve_internal(None)
  }

  pub fn resolve_named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve_internal(Some(name))
  }

  /// A resolver bound to this scope.
  pub fn resolver(&self) -> Resolver {
    self.state.resolver()
  }

  /// Finalizes a transient instance resolved through this scope.
  pub fn destroy<T: Any + Send + Sync>(&self, instance: Arc<T>) -> Result<()> {
    self.destroy_internal(None, instance)
  }

  pub fn destroy_named<T: Any + Send + Sync>(&self, name: &str, instance: Arc<T>) -> Result<()> {
    self.destroy_internal(Some(name), instance)
  }

  /// Number of scoped instances currently cached.
  pub fn len(&self) -> usize {
    self.state.cache.lock().instances.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Closes the scope, finalizing its scoped instances.
  pub fn close(self) {
    drop(self);
  }
}

impl Drop for Scope {
  fn drop(&mut self) {
    self.state.close();
  }
}

impl fmt::Debug for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("id", &self.state.id)
      .field("cached", &self.len())
      .finish()
  }
}
