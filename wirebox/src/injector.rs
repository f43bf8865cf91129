use tracing::{debug, debug_span, error};

use crate::{
    errors::InjectErrorKind,
    inject::SlotErrorKind,
    registry::{ComponentRegistry, Resolution},
};

/// Fills the dependency slots of every registered instance.
///
/// Runs once, after every candidate has been instantiated, so mutual and
/// cyclic dependencies between singletons resolve.
pub struct Injector<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> Injector<'a> {
    #[inline]
    #[must_use]
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Returns the number of filled slots.
    ///
    /// # Errors
    /// Returns the first failed required point. Injection stops there, earlier slots stay filled.
    pub fn inject_all(&self) -> Result<usize, InjectErrorKind> {
        let mut filled = 0;

        for instance in self.registry.iter() {
            let span = debug_span!("inject", component = instance.name());
            let _guard = span.enter();

            for point in instance.component.injection_points() {
                let Some((value, resolution)) = self.registry.resolve(&point.target) else {
                    if point.required {
                        let err = InjectErrorKind::MissingRequiredDependency {
                            owner: instance.name().to_owned(),
                            owner_type: instance.type_info().name,
                            dependency: point.target.name,
                            field: point.field,
                        };
                        error!("{}", err);
                        return Err(err);
                    }

                    debug!(dependency = point.target.name, field = point.field, "Optional dependency not found, skipped");
                    continue;
                };

                point.slot.fill(value).map_err(|kind| {
                    let err = match kind {
                        SlotErrorKind::IncorrectType => InjectErrorKind::IncorrectType {
                            owner: instance.name().to_owned(),
                            dependency: point.target.name,
                            field: point.field,
                        },
                        SlotErrorKind::AlreadySet => InjectErrorKind::AlreadyInjected {
                            owner: instance.name().to_owned(),
                            field: point.field,
                        },
                    };
                    error!("{}", err);
                    err
                })?;

                if resolution == Resolution::Assignable {
                    debug!(dependency = point.target.name, field = point.field, "Injected by assignability");
                } else {
                    debug!(dependency = point.target.name, field = point.field, ?resolution, "Injected");
                }
                filled += 1;
            }
        }

        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::Injector;
    use crate::{
        errors::{InjectErrorKind, InstantiateErrorKind},
        inject::{Autowired, InjectionPoint},
        registry::ComponentRegistry,
        Candidate, Component, Role,
    };

    use std::sync::Arc;
    use tracing_test::traced_test;

    trait Notifier: Send + Sync {
        fn channel(&self) -> &'static str;
    }

    #[derive(Default)]
    struct Mailer;

    impl Component for Mailer {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self)
        }
    }

    impl Notifier for Mailer {
        fn channel(&self) -> &'static str {
            "mail"
        }
    }

    #[derive(Default)]
    struct Audit;

    impl Component for Audit {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self)
        }
    }

    #[derive(Default)]
    struct Signup {
        notifier: Autowired<dyn Notifier>,
        mailer: Autowired<Mailer>,
        audit: Autowired<Audit>,
    }

    impl Component for Signup {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self::default())
        }

        fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
            vec![
                self.notifier.required().field("notifier"),
                self.mailer.required().field("mailer"),
                self.audit.optional().field("audit"),
            ]
        }
    }

    fn registry(with_mailer: bool) -> ComponentRegistry {
        let mut registry = ComponentRegistry::default();
        if with_mailer {
            registry
                .register(
                    Candidate::of::<Mailer>()
                        .role(Role::Service)
                        .capability::<dyn Notifier>(|it| it)
                        .build(),
                )
                .unwrap();
        }
        registry.register(Candidate::of::<Signup>().role(Role::Controller).build()).unwrap();
        registry
    }

    #[test]
    #[traced_test]
    fn test_inject_all() {
        let registry = registry(true);

        assert_eq!(Injector::new(&registry).inject_all().unwrap(), 2);

        let signup: Arc<Signup> = registry.by_name("signup").unwrap().downcast().unwrap();
        let mailer: Arc<Mailer> = registry.by_name("mailer").unwrap().downcast().unwrap();
        assert_eq!(signup.notifier.get().unwrap().channel(), "mail");
        assert!(Arc::ptr_eq(signup.mailer.get().unwrap(), &mailer));
        assert!(!signup.audit.is_set());
        assert!(logs_contain("Optional dependency not found, skipped"));
    }

    #[test]
    #[traced_test]
    fn test_missing_required() {
        let registry = registry(false);

        let err = Injector::new(&registry).inject_all().unwrap_err();
        let InjectErrorKind::MissingRequiredDependency {
            owner, dependency, field, ..
        } = &err
        else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(owner, "signup");
        assert_eq!(*field, "notifier");
        assert!(dependency.contains("Notifier"));
    }

    #[test]
    #[traced_test]
    fn test_inject_twice() {
        let registry = registry(true);
        let injector = Injector::new(&registry);
        injector.inject_all().unwrap();

        assert!(matches!(
            injector.inject_all(),
            Err(InjectErrorKind::AlreadyInjected { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_inject_by_assignability() {
        let mut registry = ComponentRegistry::default();
        registry
            .register(
                Candidate::of::<Mailer>()
                    .role(Role::Service)
                    .satisfies::<dyn Notifier>(|it| it)
                    .build(),
            )
            .unwrap();
        registry.register(Candidate::of::<Signup>().role(Role::Controller).build()).unwrap();

        assert_eq!(Injector::new(&registry).inject_all().unwrap(), 2);

        let signup: Arc<Signup> = registry.by_name("signup").unwrap().downcast().unwrap();
        assert_eq!(signup.notifier.get().unwrap().channel(), "mail");
        assert!(logs_contain("Injected by assignability"));
    }
}
