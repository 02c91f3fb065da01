use fibre_di::{injectable, Container, Lifetime, ResolveError, ServiceKey};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, Default, PartialEq, Eq)]
struct SimpleService {
  id: u32,
}
injectable!(SimpleService);

// --- Basic Tests ---

#[test]
fn test_singleton_resolves_to_same_instance() {
  // Arrange
  let container = Container::new();
  container.register::<SimpleService>(Lifetime::Singleton);

  // Act
  let r1 = container.resolve::<SimpleService>().unwrap();
  let r2 = container.resolve::<SimpleService>().unwrap();

  // Assert
  assert_eq!(r1.id, 0);
  assert!(Arc::ptr_eq(&r1, &r2));
}

#[test]
fn test_named_singletons_are_distinct_keys() {
  let container = Container::new();
  container.register_factory_named("first", Lifetime::Singleton, |_| Ok(SimpleService { id: 1 }));
  container.register_factory_named("second", Lifetime::Singleton, |_| Ok(SimpleService { id: 2 }));

  let first = container.resolve_named::<SimpleService>("first").unwrap();
  let second = container.resolve_named::<SimpleService>("second").unwrap();

  assert_eq!(first.id, 1);
  assert_eq!(second.id, 2);
  assert!(Arc::ptr_eq(&first, &container.resolve_named::<SimpleService>("first").unwrap()));

  // The unnamed key was never registered.
  let err = container.resolve::<SimpleService>().unwrap_err();
  assert!(err.is_not_registered());
}

#[test]
fn test_transient_resolves_to_new_instances() {
  let container = Container::new();
  container.register_factory(Lifetime::Transient, |_| Ok(SimpleService { id: 303 }));

  let r1 = container.resolve::<SimpleService>().unwrap();
  let r2 = container.resolve::<SimpleService>().unwrap();

  assert_eq!(r1.id, 303);
  assert_eq!(r2.id, 303);
  assert!(!Arc::ptr_eq(&r1, &r2));

  // Each handle is released independently.
  container.destroy(r1).unwrap();
  assert_eq!(r2.id, 303);
  container.destroy(r2).unwrap();
}

#[test]
fn test_resolving_unregistered_service_fails() {
  #[derive(Debug)]
  struct Ghost;

  let container = Container::new();
  let err = container.resolve::<Ghost>().unwrap_err();

  match err {
    ResolveError::NotRegistered(key) => assert_eq!(key, ServiceKey::of::<Ghost>()),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_resolving_scoped_service_from_container_fails() {
  #[derive(Debug, Default)]
  struct Config;
  injectable!(Config);

  let container = Container::new();
  container.register::<Config>(Lifetime::Scoped);

  let err = container.resolve::<Config>().unwrap_err();
  match err {
    ResolveError::LifetimeMismatch { key, lifetime } => {
      assert_eq!(key, ServiceKey::of::<Config>());
      assert_eq!(lifetime, Lifetime::Scoped);
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_registered_instance_is_shared() {
  let container = Container::new();
  let handle = container
    .register_instance_named("adopted", SimpleService { id: 202 })
    .unwrap();

  let r1 = container.resolve_named::<SimpleService>("adopted").unwrap();
  let r2 = container.resolve_named::<SimpleService>("adopted").unwrap();

  assert_eq!(r1.id, 202);
  assert!(Arc::ptr_eq(&r1, &r2));
  assert!(Arc::ptr_eq(&handle, &r1));
  assert_eq!(
    container.lifetime_of::<SimpleService>(Some("adopted")),
    Some(Lifetime::Singleton)
  );
}

#[test]
fn test_registration_introspection() {
  let container = Container::new();
  assert!(container.is_empty());

  container.register::<SimpleService>(Lifetime::Transient);
  container.register_named::<SimpleService>("cached", Lifetime::Singleton);

  assert!(container.is_registered::<SimpleService>());
  assert!(container.is_registered_named::<SimpleService>("cached"));
  assert!(!container.is_registered_named::<SimpleService>("missing"));
  assert!(!container.is_registered::<String>());
  assert_eq!(container.lifetime_of::<SimpleService>(None), Some(Lifetime::Transient));
  assert_eq!(container.lifetime_of::<String>(None), None);
  assert_eq!(container.len(), 2);
}

#[test]
fn test_overwriting_registration_is_successful() {
  // The last registration for a given key wins.
  let container = Container::new();
  container.register_factory(Lifetime::Singleton, |_| Ok(SimpleService { id: 1 }));
  let first = container.resolve::<SimpleService>().unwrap();
  assert_eq!(first.id, 1);

  container.register_factory(Lifetime::Singleton, |_| Ok(SimpleService { id: 2 }));
  let second = container.resolve::<SimpleService>().unwrap();
  assert_eq!(second.id, 2);
  assert!(!Arc::ptr_eq(&first, &second));

  container.register::<SimpleService>(Lifetime::Transient);
  assert_eq!(container.lifetime_of::<SimpleService>(None), Some(Lifetime::Transient));
}

#[test]
fn test_custom_containers_are_isolated() {
  let a = Container::new();
  let b = Container::new();
  a.register_factory(Lifetime::Singleton, |_| Ok(SimpleService { id: 7 }));

  assert_eq!(a.resolve::<SimpleService>().unwrap().id, 7);
  assert!(b.resolve::<SimpleService>().unwrap_err().is_not_registered());
}
