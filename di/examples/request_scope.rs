//! A request-per-scope setup with a lazily wired, scoped database handle.
//!
//! Run with `RUST_LOG=debug` to see the engine's structured events.

use fibre_di::{injectable, BoxError, Container, Injected, Lazy, Lifetime, PostConstruct};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(12345);

#[derive(Default)]
struct AppLogger;
impl AppLogger {
  fn log(&self, message: &str) {
    println!("[app] {}", message);
  }
}
injectable!(AppLogger);

struct Database {
  connection_id: u64,
}
impl Database {
  fn close(&self) {
    println!("[db] closing connection {}", self.connection_id);
  }
}
injectable!(Database {} finalize = Database::close;);

#[derive(Default)]
struct Repository {
  logger: Injected<AppLogger>,
  db: Lazy<Database>,
}
impl Repository {
  fn ready(&mut self) -> Result<(), BoxError> {
    self.logger.log("repository wired");
    Ok(())
  }
}
injectable!(Repository { logger, db } post_construct = PostConstruct::Mutate(Repository::ready););

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let container = Container::new();
  container.register::<AppLogger>(Lifetime::Singleton);
  container.register_factory(Lifetime::Scoped, |_| {
    Ok(Database {
      connection_id: NEXT_CONNECTION.fetch_add(1, Ordering::SeqCst),
    })
  });
  container.register::<Repository>(Lifetime::Scoped);

  for request in 0..2 {
    let scope = container.create_scope();
    let repository = scope.resolve::<Repository>().unwrap();

    let first = repository.db.get().unwrap();
    let second = repository.db.get().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    repository
      .logger
      .log(&format!("request {} uses connection {}", request, first.connection_id));

    // Closing the scope finalizes the connection opened for this request.
    scope.close();
  }
}
