//! Declaring how a type is wired: dependency fields, the post-construction
//! hook and the finalizer.

use crate::error::{BoxError, ResolveError, Result};
use crate::key::ServiceKey;
use crate::resolver::Resolver;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// A type the container knows how to wire.
///
/// Building an instance always follows the same steps, whichever context does
/// the resolving:
///
/// 1. the value is created (`Default` for plain registrations, the caller's
///    closure for factories);
/// 2. [`inject`](Injectable::inject) binds every dependency field through the
///    resolver of the context doing the construction;
/// 3. [`POST_CONSTRUCT`](Injectable::POST_CONSTRUCT) runs, if declared;
/// 4. the value is handed to the context, which caches it according to its
///    lifetime.
///
/// Most implementations come from the [`injectable!`](crate::injectable) macro.
///
/// ```
/// use fibre_di::{injectable, Container, Injected, Lifetime};
///
/// #[derive(Default)]
/// struct Clock;
/// injectable!(Clock);
///
/// #[derive(Default)]
/// struct Scheduler {
///   clock: Injected<Clock>,
/// }
/// injectable!(Scheduler { clock });
///
/// let container = Container::new();
/// container.register::<Clock>(Lifetime::Singleton);
/// container.register::<Scheduler>(Lifetime::Transient);
///
/// let scheduler = container.resolve::<Scheduler>().unwrap();
/// let clock = container.resolve::<Clock>().unwrap();
/// assert!(std::sync::Arc::ptr_eq(scheduler.clock.get(), &clock));
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
  /// Hook invoked once all dependency fields are bound.
  const POST_CONSTRUCT: Option<PostConstruct<Self>> = None;

  /// Run by the owning context when the instance is released: at container
  /// drop for singletons, scope close for scoped instances, `destroy` for
  /// transients.
  const FINALIZE: Option<fn(&Self)> = None;

  /// Binds every dependency field of `self` through `resolver`.
  fn inject(&mut self, resolver: &Resolver) -> Result<()> {
    let _ = resolver;
    Ok(())
  }
}

/// The supported post-construction hook shapes. Every shape may fail; the
/// error becomes the resolution's [`ResolveError::Construction`].
pub enum PostConstruct<T> {
  /// Takes no arguments.
  Notify(fn() -> Result<(), BoxError>),
  /// Mutates the freshly wired instance.
  Mutate(fn(&mut T) -> Result<(), BoxError>),
  /// Mutates the instance with access to the constructing context.
  WithResolver(fn(&mut T, &Resolver) -> Result<(), BoxError>),
  /// Consumes the instance and returns its replacement. Dependency fields of
  /// the replacement are injected again before it is handed out.
  Replace(fn(T) -> Result<T, BoxError>),
}

impl<T> Clone for PostConstruct<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for PostConstruct<T> {}

impl<T> fmt::Debug for PostConstruct<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let shape = match self {
      PostConstruct::Notify(_) => "Notify",
      PostConstruct::Mutate(_) => "Mutate",
      PostConstruct::WithResolver(_) => "WithResolver",
      PostConstruct::Replace(_) => "Replace",
    };
    write!(f, "PostConstruct::{}", shape)
  }
}

/// Runs steps 2 and 3 of the build protocol on an already created value.
pub(crate) fn wire<T: Injectable>(key: &ServiceKey, mut value: T, resolver: &Resolver) -> Result<T> {
  value.inject(resolver)?;

  let hook = match T::POST_CONSTRUCT {
    Some(hook) => hook,
    None => return Ok(value),
  };
  let failed = |source: BoxError| ResolveError::Construction {
    key: key.clone(),
    source,
  };

  match hook {
    PostConstruct::Notify(hook) => hook().map_err(failed)?,
    PostConstruct::Mutate(hook) => hook(&mut value).map_err(failed)?,
    PostConstruct::WithResolver(hook) => hook(&mut value, resolver).map_err(failed)?,
    PostConstruct::Replace(hook) => {
      let mut replacement = hook(value).map_err(failed)?;
      replacement.inject(resolver)?;
      return Ok(replacement);
    }
  }
  Ok(value)
}

/// A field that can be bound to a resolution context.
///
/// This is what [`injectable!`](crate::injectable) calls for every listed
/// field; hand-written `inject` implementations call it the same way.
pub trait Dependency {
  fn bind(&mut self, resolver: &Resolver) -> Result<()>;
}

/// An eager dependency: resolved while its owner is being built.
pub struct Injected<T> {
  name: Option<&'static str>,
  instance: Option<Arc<T>>,
}

impl<T: Any + Send + Sync> Injected<T> {
  /// An unbound dependency on `T` registered under `name`.
  pub fn named(name: &'static str) -> Self {
    Self {
      name: Some(name),
      instance: None,
    }
  }

  pub fn key(&self) -> ServiceKey {
    ServiceKey::for_name::<T>(self.name)
  }

  /// The resolved dependency.
  ///
  /// # Panics
  ///
  /// Panics if unbound; use [`try_get`](Injected::try_get) to get an error instead.
  pub fn get(&self) -> &Arc<T> {
    match &self.instance {
      Some(instance) => instance,
      None => panic!("Injected dependency accessed before injection: {}", self.key()),
    }
  }

  pub fn try_get(&self) -> Result<&Arc<T>> {
    self
      .instance
      .as_ref()
      .ok_or_else(|| ResolveError::Unbound(self.key()))
  }

  pub fn is_bound(&self) -> bool {
    self.instance.is_some()
  }
}

impl<T: Any + Send + Sync> Dependency for Injected<T> {
  fn bind(&mut self, resolver: &Resolver) -> Result<()> {
    self.instance = Some(resolver.resolve_as::<T>(&self.key())?);
    Ok(())
  }
}

impl<T> Default for Injected<T> {
  fn default() -> Self {
    Self {
      name: None,
      instance: None,
    }
  }
}

impl<T> Clone for Injected<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name,
      instance: self.instance.clone(),
    }
  }
}

impl<T: Any + Send + Sync> Deref for Injected<T> {
  type Target = T;

  fn deref(&self) -> &T {
    self.get()
  }
}

impl<T> fmt::Debug for Injected<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Injected")
      .field("type", &std::any::type_name::<T>())
      .field("name", &self.name)
      .field("bound", &self.instance.is_some())
      .finish()
  }
}

/// A deferred dependency: resolved on each [`get`](Lazy::get) through the
/// context that built its owner.
///
/// `Lazy` caches nothing itself. Repeated calls are cheap when the target is a
/// singleton or scoped service, because the context keeps the instance; a
/// transient target yields a fresh instance per call.
pub struct Lazy<T> {
  name: Option<&'static str>,
  resolver: Option<Resolver>,
  _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: Any + Send + Sync> Lazy<T> {
  pub fn named(name: &'static str) -> Self {
    Self {
      name: Some(name),
      resolver: None,
      _target: PhantomData,
    }
  }

  pub fn key(&self) -> ServiceKey {
    ServiceKey::for_name::<T>(self.name)
  }

  /// Resolves the target through the captured context.
  pub fn get(&self) -> Result<Arc<T>> {
    let key = self.key();
    match &self.resolver {
      Some(resolver) => resolver.resolve_as::<T>(&key),
      None => Err(ResolveError::Unbound(key)),
    }
  }

  pub fn is_bound(&self) -> bool {
    self.resolver.is_some()
  }

  /// The captured resolver, if the owner has been wired.
  pub fn resolver(&self) -> Option<&Resolver> {
    self.resolver.as_ref()
  }
}

impl<T: Any + Send + Sync> Dependency for Lazy<T> {
  fn bind(&mut self, resolver: &Resolver) -> Result<()> {
    self.resolver = Some(resolver.clone());
    Ok(())
  }
}

impl<T> Default for Lazy<T> {
  fn default() -> Self {
    Self {
      name: None,
      resolver: None,
      _target: PhantomData,
    }
  }
}

impl<T> Clone for Lazy<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name,
      resolver: self.resolver.clone(),
      _target: PhantomData,
    }
  }
}

impl<T> fmt::Debug for Lazy<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Lazy")
      .field("type", &std::any::type_name::<T>())
      .field("name", &self.name)
      .field("bound", &self.resolver.is_some())
      .finish()
  }
}
