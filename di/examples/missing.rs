use fibre_di::{injectable, resolve_from, Container, Lifetime, ResolveError};
use std::panic;

struct Ghost;

#[derive(Default)]
struct Config;
injectable!(Config);

fn main() {
  let container = Container::new();
  container.register::<Config>(Lifetime::Scoped);

  // --- Using the fallible `resolve()` method ---
  println!("Attempting to resolve a service that was never registered...");
  match container.resolve::<Ghost>() {
    Err(ResolveError::NotRegistered(key)) => println!("Correctly received NotRegistered for {}.", key),
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("Should not have found the service!"),
  }

  println!("\nAttempting to resolve a scoped service without a scope...");
  match container.resolve::<Config>() {
    Err(err @ ResolveError::LifetimeMismatch { .. }) => println!("Correctly refused: {}.", err),
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("Scoped services must not resolve from the container!"),
  }

  // --- Using the panicking `resolve_from!` macro ---
  println!("\nNow, attempting to resolve with resolve_from!...");
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _service = resolve_from!(container, Ghost);
  }));

  assert!(result.is_err(), "resolve_from! should have panicked.");
  println!("Successfully caught the expected panic from resolve_from!.");
}
