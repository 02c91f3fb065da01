//! Errors surfaced by registration, resolution and teardown.

use crate::key::{Lifetime, ServiceKey};
use thiserror::Error;

/// The error type produced by user factories and post-construction hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ResolveError {
  /// No entry exists for the requested key.
  #[error("service not registered: {0}")]
  NotRegistered(ServiceKey),

  /// The key's lifetime cannot be served by this context, e.g. a scoped
  /// service requested directly from the container.
  #[error("{key} is registered as {lifetime} and cannot be served here")]
  LifetimeMismatch { key: ServiceKey, lifetime: Lifetime },

  /// A custom factory or post-construction hook failed. `source` is the
  /// error exactly as the factory or hook returned it.
  #[error("failed to construct {key}")]
  Construction {
    key: ServiceKey,
    #[source]
    source: BoxError,
  },

  /// A deferred handle was used after the scope or container it was bound
  /// to had been dropped.
  #[error("resolution context for {0} has been closed")]
  ContextClosed(ServiceKey),

  /// A dependency wrapper was read before its owner was wired.
  #[error("dependency {0} has not been injected")]
  Unbound(ServiceKey),

  #[error("registry returned an instance of the wrong type for {0}")]
  TypeMismatch(ServiceKey),
}

impl ResolveError {
  /// The key the failure is about.
  pub fn key(&self) -> &ServiceKey {
    match self {
      ResolveError::NotRegistered(key)
      | ResolveError::ContextClosed(key)
      | ResolveError::Unbound(key)
      | ResolveError::TypeMismatch(key) => key,
      ResolveError::LifetimeMismatch { key, .. } | ResolveError::Construction { key, .. } => key,
    }
  }

  pub fn is_not_registered(&self) -> bool {
    matches!(self, ResolveError::NotRegistered(_))
  }

  pub fn is_lifetime_mismatch(&self) -> bool {
    matches!(self, ResolveError::LifetimeMismatch { .. })
  }
}
