use core::fmt::{self, Debug, Formatter};
use std::collections::{btree_map::Entry, BTreeMap};
use tracing::{debug, debug_span, warn};

use crate::{
    advice::ErasedCall,
    errors::DispatchBuildErrorKind,
    failure::{Failure, FailureReply, FailureType},
    registry::ComponentRegistry,
};

/// A handler operation bound to the failure type it covers.
#[derive(Clone)]
pub struct FailureHandlerEntry {
    failure_type: FailureType,
    owner: String,
    owner_type: &'static str,
    operation: &'static str,
    call: ErasedCall,
}

impl FailureHandlerEntry {
    #[inline]
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        self.failure_type
    }

    /// Name of the advice component hosting the operation.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[inline]
    #[must_use]
    pub fn owner_type(&self) -> &'static str {
        self.owner_type
    }

    #[inline]
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Invokes the operation on its advice instance.
    #[inline]
    pub fn handle(&self, failure: &dyn Failure) -> FailureReply {
        (self.call)(failure)
    }
}

impl Debug for FailureHandlerEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureHandlerEntry")
            .field("failure_type", &self.failure_type)
            .field("owner", &self.owner)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Failure type to handler table, built once from the registered failure advice.
#[derive(Debug, Clone, Default)]
pub struct FailureDispatch {
    table: BTreeMap<FailureType, FailureHandlerEntry>,
}

impl FailureDispatch {
    /// Collects the handler operations of every failure advice in registration order.
    ///
    /// Malformed metadata never fails the build: every issue is logged, skipped and returned.
    /// When two operations cover the same failure type, the one registered last wins.
    #[must_use]
    pub fn build(registry: &ComponentRegistry) -> (Self, Vec<DispatchBuildErrorKind>) {
        let mut table = BTreeMap::new();
        let mut issues = Vec::new();

        for instance in registry.advice() {
            let span = debug_span!("advice", owner = instance.name());
            let _guard = span.enter();

            let Some(hook) = instance.advice else {
                let err = DispatchBuildErrorKind::MissingHandlers {
                    owner: instance.name().to_owned(),
                };
                warn!("{}", err);
                issues.push(err);
                continue;
            };
            let Some(operations) = hook(instance.object()) else {
                let err = DispatchBuildErrorKind::IncorrectAdviceType {
                    owner: instance.name().to_owned(),
                    type_name: instance.type_info().name,
                };
                warn!("{}", err);
                issues.push(err);
                continue;
            };

            for operation in operations {
                let covered = operation.covered_types();
                if covered.is_empty() {
                    let err = DispatchBuildErrorKind::NoFailureType {
                        owner: instance.name().to_owned(),
                        operation: operation.name,
                    };
                    warn!("{}", err);
                    issues.push(err);
                    continue;
                }

                for failure_type in covered {
                    let entry = FailureHandlerEntry {
                        failure_type,
                        owner: instance.name().to_owned(),
                        owner_type: instance.type_info().name,
                        operation: operation.name,
                        call: operation.call.clone(),
                    };
                    match table.entry(failure_type) {
                        Entry::Vacant(slot) => {
                            debug!(failure = failure_type.name(), operation = operation.name, "Handler bound");
                            slot.insert(entry);
                        }
                        Entry::Occupied(mut slot) => {
                            let previous = slot.insert(entry);
                            warn!(
                                failure = failure_type.name(),
                                previous = %format_args!("{}::{}", previous.owner, previous.operation),
                                next = %format_args!("{}::{}", instance.name(), operation.name),
                                "Failure type already handled, the later handler wins"
                            );
                        }
                    }
                }
            }
        }

        (Self { table }, issues)
    }

    /// Most specific handler for `failure_type`: exact match, then the nearest handled
    /// ancestor below the root, then the generic recoverable handler, then the root handler.
    #[must_use]
    pub fn resolve(&self, failure_type: &FailureType) -> Option<&FailureHandlerEntry> {
        if let Some(entry) = self.table.get(failure_type) {
            return Some(entry);
        }

        let root = FailureType::root();
        failure_type
            .supertypes()
            .filter(|ancestor| *ancestor != root)
            .find_map(|ancestor| self.table.get(&ancestor))
            .or_else(|| self.table.get(&FailureType::recoverable()))
            .or_else(|| self.table.get(&root))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Entries ordered by failure type identity.
    pub fn entries(&self) -> impl Iterator<Item = &FailureHandlerEntry> {
        self.table.values()
    }
}

#[cfg(test)]
mod tests {
    use super::FailureDispatch;
    use crate::{
        advice::{Caught, FailureAdvice, HandlerSet},
        errors::{DispatchBuildErrorKind, InstantiateErrorKind},
        failure::{Failure, FailureKind, FailureReply, FailureType, RecoverableFailure, RootFailure},
        registry::ComponentRegistry,
        Candidate, Component, Role,
    };

    use tracing_test::traced_test;

    #[derive(thiserror::Error, Debug)]
    #[error("illegal argument: {0}")]
    struct IllegalArgument(&'static str);

    impl FailureKind for IllegalArgument {
        type Parent = RecoverableFailure;
    }

    #[derive(thiserror::Error, Debug)]
    #[error("number format")]
    struct NumberFormat;

    impl FailureKind for NumberFormat {
        type Parent = IllegalArgument;
    }

    #[derive(thiserror::Error, Debug)]
    #[error("timeout")]
    struct Timeout;

    impl FailureKind for Timeout {
        type Parent = RecoverableFailure;
    }

    #[derive(thiserror::Error, Debug)]
    #[error("out of memory")]
    struct OutOfMemory;

    impl FailureKind for OutOfMemory {
        type Parent = RootFailure;
    }

    struct GlobalAdvice;

    impl Component for GlobalAdvice {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self)
        }
    }

    impl GlobalAdvice {
        fn illegal_argument(&self, caught: Caught<'_, IllegalArgument>) -> FailureReply {
            FailureReply::new(400, caught.message())
        }

        fn fallback(&self, failure: &dyn Failure) -> FailureReply {
            FailureReply::new(500, failure.to_string())
        }
    }

    impl FailureAdvice for GlobalAdvice {
        fn handlers(handlers: &mut HandlerSet<Self>) {
            handlers
                .on("illegal_argument", Self::illegal_argument)
                .covering("fallback", [FailureType::root()], Self::fallback)
                .covering("untyped", [], Self::fallback);
        }
    }

    struct RecoverableAdvice;

    impl Component for RecoverableAdvice {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self)
        }
    }

    impl FailureAdvice for RecoverableAdvice {
        fn handlers(handlers: &mut HandlerSet<Self>) {
            handlers
                .on("recoverable", |_: &Self, caught: Caught<'_, RecoverableFailure>| {
                    FailureReply::new(503, caught.message())
                })
                .on("illegal_argument", |_: &Self, _: Caught<'_, IllegalArgument>| {
                    FailureReply::new(422, "overridden")
                });
        }
    }

    fn dispatch(with_recoverable: bool) -> (FailureDispatch, Vec<DispatchBuildErrorKind>) {
        let mut registry = ComponentRegistry::default();
        registry.register(Candidate::of::<GlobalAdvice>().advice().build()).unwrap();
        if with_recoverable {
            registry.register(Candidate::of::<RecoverableAdvice>().advice().build()).unwrap();
        }
        FailureDispatch::build(&registry)
    }

    #[test]
    #[traced_test]
    fn test_resolve_exact_and_subtype() {
        let (dispatch, issues) = dispatch(false);

        assert_eq!(dispatch.len(), 2);
        assert_eq!(
            issues,
            vec![DispatchBuildErrorKind::NoFailureType {
                owner: "globalAdvice".to_owned(),
                operation: "untyped",
            }]
        );

        let entry = dispatch.resolve(&FailureType::of::<IllegalArgument>()).unwrap();
        assert_eq!(entry.operation(), "illegal_argument");
        assert_eq!(entry.owner(), "globalAdvice");

        let entry = dispatch.resolve(&FailureType::of::<NumberFormat>()).unwrap();
        assert_eq!(entry.operation(), "illegal_argument");
        assert_eq!(entry.handle(&NumberFormat), FailureReply::new(400, "number format"));
    }

    #[test]
    #[traced_test]
    fn test_resolve_root_fallback() {
        let (dispatch, _) = dispatch(false);

        let entry = dispatch.resolve(&FailureType::of::<Timeout>()).unwrap();
        assert_eq!(entry.operation(), "fallback");
        assert_eq!(entry.handle(&Timeout), FailureReply::new(500, "timeout"));
        assert_eq!(dispatch.resolve(&FailureType::root()).unwrap().operation(), "fallback");
    }

    #[test]
    #[traced_test]
    fn test_resolve_recoverable_before_root() {
        let (dispatch, _) = dispatch(true);

        assert_eq!(dispatch.resolve(&FailureType::of::<Timeout>()).unwrap().operation(), "recoverable");
        // the generic recoverable handler comes before the root one even outside its subtree
        assert_eq!(dispatch.resolve(&FailureType::of::<OutOfMemory>()).unwrap().operation(), "recoverable");
        assert_eq!(dispatch.resolve(&FailureType::root()).unwrap().operation(), "fallback");
    }

    #[test]
    #[traced_test]
    fn test_later_handler_wins() {
        let (dispatch, _) = dispatch(true);

        let entry = dispatch.resolve(&FailureType::of::<IllegalArgument>()).unwrap();
        assert_eq!(entry.owner(), "recoverableAdvice");
        assert_eq!(entry.handle(&IllegalArgument("x")), FailureReply::new(422, "overridden"));
        assert!(logs_contain("Failure type already handled, the later handler wins"));
    }

    #[test]
    #[traced_test]
    fn test_no_handlers() {
        let dispatch = FailureDispatch::default();

        assert!(dispatch.is_empty());
        assert!(dispatch.resolve(&FailureType::of::<IllegalArgument>()).is_none());
    }

    #[test]
    #[traced_test]
    fn test_advice_role_without_handlers() {
        let mut registry = ComponentRegistry::default();
        registry.register(Candidate::of::<GlobalAdvice>().role(Role::FailureAdvice).build()).unwrap();

        let (dispatch, issues) = FailureDispatch::build(&registry);
        assert!(dispatch.is_empty());
        assert!(matches!(issues[..], [DispatchBuildErrorKind::MissingHandlers { .. }]));
    }
}
