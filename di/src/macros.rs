//! Public macros for declaring injectable types and resolving services.

/// Implements [`Injectable`](crate::Injectable) for a type.
///
/// List the dependency fields (each an [`Injected`](crate::Injected) or
/// [`Lazy`](crate::Lazy)) in braces; they are bound in the listed order.
/// A post-construction hook and a finalizer may follow.
///
/// # Examples
///
/// ```
/// use fibre_di::{injectable, BoxError, Injected, Lazy, PostConstruct};
///
/// #[derive(Default)]
/// struct Logger;
/// injectable!(Logger);
///
/// #[derive(Default)]
/// struct Database;
/// injectable!(Database);
///
/// #[derive(Default)]
/// struct Repository {
///   logger: Injected<Logger>,
///   db: Lazy<Database>,
///   ready: bool,
/// }
///
/// impl Repository {
///   fn start(&mut self) -> Result<(), BoxError> {
///     self.ready = true;
///     Ok(())
///   }
///
///   fn stop(&self) {}
/// }
///
/// injectable!(Repository { logger, db }
///   post_construct = PostConstruct::Mutate(Repository::start);
///   finalize = Repository::stop;
/// );
/// ```
#[macro_export]
macro_rules! injectable {
  (
    $type:ty { $($field:ident),* $(,)? }
    $(post_construct = $hook:expr;)?
    $(finalize = $finalize:expr;)?
  ) => {
    impl $crate::Injectable for $type {
      $(
        const POST_CONSTRUCT: ::core::option::Option<$crate::PostConstruct<Self>> =
          ::core::option::Option::Some($hook);
      )?
      $(
        const FINALIZE: ::core::option::Option<fn(&Self)> = ::core::option::Option::Some($finalize);
      )?

      fn inject(&mut self, resolver: &$crate::Resolver) -> $crate::Result<()> {
        let _ = resolver;
        $( $crate::Dependency::bind(&mut self.$field, resolver)?; )*
        ::core::result::Result::Ok(())
      }
    }
  };

  ($type:ty) => {
    impl $crate::Injectable for $type {}
  };
}

/// Resolves a service from a container, scope or resolver, panicking if it
/// cannot be resolved.
///
/// For a non-panicking version, call `resolve` / `resolve_named` directly.
///
/// # Examples
///
/// ```
/// use fibre_di::{injectable, resolve_from, Container, Lifetime};
///
/// #[derive(Default)]
/// struct Settings {
///   retries: u32,
/// }
/// injectable!(Settings);
///
/// let container = Container::new();
/// container.register_named::<Settings>("primary", Lifetime::Singleton);
///
/// let settings = resolve_from!(container, Settings, "primary");
/// assert_eq!(settings.retries, 0);
/// ```
#[macro_export]
macro_rules! resolve_from {
  ($context:expr, $type:ty) => {
    $context.resolve::<$type>().unwrap_or_else(|err| {
      panic!(
        "Failed to resolve required service {}: {}",
        ::std::any::type_name::<$type>(),
        err
      )
    })
  };

  ($context:expr, $type:ty, $name:expr) => {
    $context.resolve_named::<$type>($name).unwrap_or_else(|err| {
      panic!(
        "Failed to resolve required service {} with name '{}': {}",
        ::std::any::type_name::<$type>(),
        $name,
        err
      )
    })
  };
}
