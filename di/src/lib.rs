//! # Fibre DI
//!
//! A lifetime-aware dependency injection engine for Rust.
//!
//! Fibre DI builds fully wired instances on demand. Each registered type
//! declares its dependency fields, and the engine resolves them recursively
//! through whichever context is doing the construction, caching the results
//! according to the registered lifetime.
//!
//! ## Core Concepts
//!
//! - **Container**: owns the registrations and every singleton. Dropping it
//!   finalizes the singletons it built.
//! - **Scope**: a unit of work created from a container. Caches one instance
//!   per scoped service and finalizes them when closed.
//! - **Lifetimes**: `Singleton` (one per container), `Transient` (one per
//!   resolution, owned by the caller) and `Scoped` (one per scope).
//! - **Eager and lazy fields**: [`Injected<T>`] is resolved while its owner is
//!   built; [`Lazy<T>`] captures a [`Resolver`] for the constructing context
//!   and resolves on first access.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{injectable, Container, Injected, Lazy, Lifetime};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Default)]
//! struct Logger;
//! injectable!(Logger);
//!
//! #[derive(Default)]
//! struct Database {
//!   queries: AtomicU64,
//! }
//! injectable!(Database);
//!
//! #[derive(Default)]
//! struct UserService {
//!   logger: Injected<Logger>,
//!   db: Lazy<Database>,
//! }
//! injectable!(UserService { logger, db });
//!
//! let container = Container::new();
//! container.register::<Logger>(Lifetime::Singleton);
//! container.register::<Database>(Lifetime::Scoped);
//! container.register::<UserService>(Lifetime::Transient);
//!
//! // Scoped services are only available through a scope.
//! assert!(container.resolve::<Database>().is_err());
//!
//! let scope = container.create_scope();
//! let users = scope.resolve::<UserService>().unwrap();
//! let db = users.db.get().unwrap();
//! db.queries.fetch_add(1, Ordering::Relaxed);
//!
//! // The lazy field resolved through the scope that built `users`.
//! assert!(Arc::ptr_eq(&db, &scope.resolve::<Database>().unwrap()));
//! assert!(Arc::ptr_eq(users.logger.get(), &container.resolve::<Logger>().unwrap()));
//! ```

mod container;
mod core;
mod error;
mod inject;
mod key;
mod macros;
mod resolver;
mod scope;

pub use container::Container;
pub use error::{BoxError, ResolveError, Result};
pub use inject::{Dependency, Injectable, Injected, Lazy, PostConstruct};
pub use key::{Lifetime, ServiceKey};
pub use resolver::Resolver;
pub use scope::Scope;
