use fibre_di::{injectable, Container, Lifetime};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}
injectable!(RequestTracker);

// A thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn new_tracker() -> RequestTracker {
  RequestTracker {
    id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---
  // Built once per container.
  container.register_factory_named("singleton", Lifetime::Singleton, |_| {
    println!("Creating SINGLETON RequestTracker...");
    Ok(new_tracker())
  });
  // Built on every resolution.
  container.register_factory_named("transient", Lifetime::Transient, |_| {
    println!("Creating TRANSIENT RequestTracker...");
    Ok(new_tracker())
  });
  // Built once per scope.
  container.register_factory_named("scoped", Lifetime::Scoped, |_| {
    println!("Creating SCOPED RequestTracker...");
    Ok(new_tracker())
  });

  println!("--- Resolving Singletons ---");
  let s1 = container.resolve_named::<RequestTracker>("singleton").unwrap();
  let s2 = container.resolve_named::<RequestTracker>("singleton").unwrap();
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton instances should be identical");

  println!("\n--- Resolving Transients ---");
  let t1 = container.resolve_named::<RequestTracker>("transient").unwrap();
  let t2 = container.resolve_named::<RequestTracker>("transient").unwrap();
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert!(!Arc::ptr_eq(&t1, &t2), "Transient instances should be different");
  container.destroy_named("transient", t1).unwrap();
  container.destroy_named("transient", t2).unwrap();

  println!("\n--- Resolving Scoped ---");
  for request in 0..2 {
    let scope = container.create_scope();
    let a = scope.resolve_named::<RequestTracker>("scoped").unwrap();
    let b = scope.resolve_named::<RequestTracker>("scoped").unwrap();
    println!("Request {} (scope {}): tracker ID {}", request, scope.id(), a.id);
    assert!(Arc::ptr_eq(&a, &b), "Scoped instances are shared within a scope");
  }
}
