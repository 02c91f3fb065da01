//! Core, non-public data structures for the container.

use crate::error::{BoxError, ResolveError, Result};
use crate::inject::{wire, Injectable};
use crate::key::{Lifetime, ServiceKey};
use crate::resolver::Resolver;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

/// A type-erased, shared service instance.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type ConstructFn = Box<dyn Fn(&Resolver) -> Result<Instance> + Send + Sync>;
type FinalizeFn = Box<dyn Fn(&Instance) + Send + Sync>;

/// The registered recipe for one key.
///
/// `cached` is only ever filled for singletons; scoped instances live in the
/// scope that built them.
pub(crate) struct ServiceEntry {
  pub(crate) key: ServiceKey,
  pub(crate) lifetime: Lifetime,
  pub(crate) custom_factory: bool,
  pub(crate) cached: OnceCell<Instance>,
  construct: ConstructFn,
  finalize: Option<FinalizeFn>,
}

impl ServiceEntry {
  /// Builds instances from `T::default()`.
  pub(crate) fn for_type<T: Injectable + Default>(key: ServiceKey, lifetime: Lifetime) -> Self {
    let construct_key = key.clone();
    Self {
      key,
      lifetime,
      custom_factory: false,
      cached: OnceCell::new(),
      construct: Box::new(move |resolver: &Resolver| {
        let value = wire(&construct_key, T::default(), resolver)?;
        Ok(Arc::new(value) as Instance)
      }),
      finalize: finalizer::<T>(),
    }
  }

  /// Builds instances from a caller-supplied factory. The produced value is
  /// still wired like any other.
  pub(crate) fn for_factory<T, F>(key: ServiceKey, lifetime: Lifetime, factory: F) -> Self
  where
    T: Injectable,
    F: Fn(&Resolver) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    let construct_key = key.clone();
    Self {
      key,
      lifetime,
      custom_factory: true,
      cached: OnceCell::new(),
      construct: Box::new(move |resolver: &Resolver| {
        let value = factory(resolver).map_err(|source| ResolveError::Construction {
          key: construct_key.clone(),
          source,
        })?;
        let value = wire(&construct_key, value, resolver)?;
        Ok(Arc::new(value) as Instance)
      }),
      finalize: finalizer::<T>(),
    }
  }

  /// An externally built singleton. It is published up front and has no
  /// finalizer: the caller keeps ownership of its teardown.
  pub(crate) fn adopted(key: ServiceKey, instance: Instance) -> Self {
    let adopted = instance.clone();
    Self {
      key,
      lifetime: Lifetime::Singleton,
      custom_factory: false,
      cached: OnceCell::with_value(instance),
      construct: Box::new(move |_: &Resolver| Ok(adopted.clone())),
      finalize: None,
    }
  }

  pub(crate) fn construct(&self, resolver: &Resolver) -> Result<Instance> {
    (self.construct)(resolver)
  }

  pub(crate) fn finalize(&self, instance: &Instance) {
    if let Some(finalize) = &self.finalize {
      finalize(instance);
    }
  }

  /// Finalizes a caller-owned instance. Only transients belong to the caller;
  /// singletons and scoped instances are finalized by their owning context.
  pub(crate) fn destroy(&self, instance: Instance) -> Result<()> {
    if !self.lifetime.is_transient() {
      return Err(ResolveError::LifetimeMismatch {
        key: self.key.clone(),
        lifetime: self.lifetime,
      });
    }
    self.finalize(&instance);
    Ok(())
  }
}

fn finalizer<T: Injectable>() -> Option<FinalizeFn> {
  let finalize = T::FINALIZE?;
  Some(Box::new(move |instance: &Instance| {
    if let Some(value) = (**instance).downcast_ref::<T>() {
      finalize(value);
    }
  }))
}
