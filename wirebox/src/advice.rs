use core::marker::PhantomData;
use std::sync::Arc;

use crate::{
    any::{self, Shared},
    component::Component,
    failure::{Failure, FailureKind, FailureReply, FailureType},
};

/// A component hosting failure-handler operations for the whole application.
///
/// ```ignore
/// impl FailureAdvice for GlobalAdvice {
///     fn handlers(handlers: &mut HandlerSet<Self>) {
///         handlers
///             .on("illegal_argument", Self::illegal_argument)
///             .covering("fallback", [FailureType::root()], Self::fallback);
///     }
/// }
/// ```
pub trait FailureAdvice: Component {
    fn handlers(handlers: &mut HandlerSet<Self>)
    where
        Self: Sized;
}

/// Reported failure as seen by a typed handler operation.
///
/// `E` is the failure type the operation was registered for. The reported failure is `E`
/// itself or one of its subtypes, so [`Caught::exact`] only succeeds for the former.
pub struct Caught<'a, E> {
    failure: &'a dyn Failure,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E: FailureKind> Caught<'a, E> {
    #[inline]
    #[must_use]
    pub fn failure(&self) -> &'a dyn Failure {
        self.failure
    }

    #[inline]
    #[must_use]
    pub fn exact(&self) -> Option<&'a E> {
        self.failure.downcast_ref()
    }

    #[inline]
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        self.failure.failure_type()
    }

    #[inline]
    #[must_use]
    pub fn message(&self) -> String {
        self.failure.to_string()
    }
}

type Call<A> = Arc<dyn Fn(&A, &dyn Failure) -> FailureReply + Send + Sync>;

struct HandlerMethod<A> {
    name: &'static str,
    declared: Vec<FailureType>,
    inferred: Option<FailureType>,
    call: Call<A>,
}

pub struct HandlerSet<A> {
    methods: Vec<HandlerMethod<A>>,
}

impl<A: 'static> HandlerSet<A> {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { methods: Vec::new() }
    }

    /// Registers a handler operation. The covered failure type is inferred from the
    /// operation's [`Caught`] parameter.
    pub fn on<E, F>(&mut self, name: &'static str, handler: F) -> &mut Self
    where
        E: FailureKind,
        F: Fn(&A, Caught<'_, E>) -> FailureReply + Send + Sync + 'static,
    {
        self.methods.push(HandlerMethod {
            name,
            declared: Vec::new(),
            inferred: Some(FailureType::of::<E>()),
            call: Arc::new(move |advice: &A, failure: &dyn Failure| {
                handler(
                    advice,
                    Caught {
                        failure,
                        _marker: PhantomData,
                    },
                )
            }),
        });
        self
    }

    /// Registers a handler operation for an explicit list of failure types.
    /// An empty list leaves nothing to infer from, so the operation is skipped at build time.
    pub fn covering<F>(&mut self, name: &'static str, failure_types: impl IntoIterator<Item = FailureType>, handler: F) -> &mut Self
    where
        F: Fn(&A, &dyn Failure) -> FailureReply + Send + Sync + 'static,
    {
        self.methods.push(HandlerMethod {
            name,
            declared: failure_types.into_iter().collect(),
            inferred: None,
            call: Arc::new(handler),
        });
        self
    }

    /// Same as [`Self::on`], but the operation covers the explicitly listed types instead of
    /// the inferred one when the list isn't empty.
    pub fn on_each<E, F>(&mut self, name: &'static str, failure_types: impl IntoIterator<Item = FailureType>, handler: F) -> &mut Self
    where
        E: FailureKind,
        F: Fn(&A, Caught<'_, E>) -> FailureReply + Send + Sync + 'static,
    {
        self.on(name, handler);
        if let Some(method) = self.methods.last_mut() {
            method.declared = failure_types.into_iter().collect();
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

pub(crate) type ErasedCall = Arc<dyn Fn(&dyn Failure) -> FailureReply + Send + Sync>;

/// Handler operation bound to its advice instance.
#[derive(Clone)]
pub(crate) struct HandlerOperation {
    pub(crate) name: &'static str,
    pub(crate) declared: Vec<FailureType>,
    pub(crate) inferred: Option<FailureType>,
    pub(crate) call: ErasedCall,
}

impl HandlerOperation {
    /// Declared types win over the inferred one. Empty when neither is available.
    pub(crate) fn covered_types(&self) -> Vec<FailureType> {
        if self.declared.is_empty() {
            self.inferred.into_iter().collect()
        } else {
            self.declared.clone()
        }
    }
}

pub(crate) type AdviceHook = fn(&Shared) -> Option<Vec<HandlerOperation>>;

pub(crate) fn collect_handlers<A: FailureAdvice>(object: &Shared) -> Option<Vec<HandlerOperation>> {
    let advice = any::unshare::<A>(object)?;

    let mut handlers = HandlerSet::<A>::new();
    A::handlers(&mut handlers);

    let operations = handlers
        .methods
        .into_iter()
        .map(|HandlerMethod { name, declared, inferred, call }| {
            let advice = advice.clone();
            HandlerOperation {
                name,
                declared,
                inferred,
                call: Arc::new(move |failure: &dyn Failure| call(advice.as_ref(), failure)),
            }
        })
        .collect();

    Some(operations)
}

#[cfg(test)]
mod tests {
    use super::{collect_handlers, Caught, FailureAdvice, HandlerSet};
    use crate::{
        any::share,
        errors::InstantiateErrorKind,
        failure::{Failure, FailureKind, FailureReply, FailureType, RecoverableFailure},
        Component,
    };

    use std::sync::Arc;

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

    struct Advice {
        status: u16,
    }

    impl Component for Advice {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self { status: 400 })
        }
    }

    impl Advice {
        fn illegal_argument(&self, caught: Caught<'_, IllegalArgument>) -> FailureReply {
            match caught.exact() {
                Some(IllegalArgument(reason)) => FailureReply::new(self.status, *reason),
                None => FailureReply::new(self.status, caught.message()),
            }
        }

        fn anything(&self, failure: &dyn Failure) -> FailureReply {
            FailureReply::new(500, failure.to_string())
        }
    }

    impl FailureAdvice for Advice {
        fn handlers(handlers: &mut HandlerSet<Self>) {
            handlers
                .on("illegal_argument", Self::illegal_argument)
                .covering("anything", [FailureType::root(), FailureType::recoverable()], Self::anything)
                .covering("nothing", [], Self::anything)
                .on_each("both", [FailureType::of::<NumberFormat>()], Self::illegal_argument);
        }
    }

    #[test]
    fn test_collect_handlers() {
        let object = share(Arc::new(Advice::construct().unwrap()));
        let operations = collect_handlers::<Advice>(&object).unwrap();

        assert_eq!(operations.len(), 4);
        assert_eq!(operations[0].covered_types(), vec![FailureType::of::<IllegalArgument>()]);
        assert_eq!(operations[1].covered_types(), vec![FailureType::root(), FailureType::recoverable()]);
        assert!(operations[2].covered_types().is_empty());
        assert_eq!(operations[3].covered_types(), vec![FailureType::of::<NumberFormat>()]);
    }

    #[test]
    fn test_invoke_with_subtype() {
        let object = share(Arc::new(Advice::construct().unwrap()));
        let operations = collect_handlers::<Advice>(&object).unwrap();

        let exact = (operations[0].call)(&IllegalArgument("negative quantity"));
        assert_eq!(exact, FailureReply::new(400, "negative quantity"));

        let subtype = (operations[0].call)(&NumberFormat);
        assert_eq!(subtype, FailureReply::new(400, "number format"));
    }

    #[test]
    fn test_collect_handlers_incorrect_type() {
        let object = share(Arc::new(1u8));
        assert!(collect_handlers::<Advice>(&object).is_none());
    }
}
