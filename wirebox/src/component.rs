use core::{
    fmt::{self, Debug, Display, Formatter},
    marker::PhantomData,
};
use std::{borrow::Cow, sync::Arc};

use crate::{
    advice::{collect_handlers, AdviceHook, FailureAdvice},
    any::{self, Shared, TypeInfo},
    errors::{InstantiateErrorKind, InstantiationError},
    inject::InjectionPoint,
};

/// Role marker of a component. A candidate qualifies for registration only with exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Controller,
    Service,
    Repository,
    FailureAdvice,
}

impl Role {
    #[inline]
    #[must_use]
    pub const fn all() -> [Role; 4] {
        [Role::Controller, Role::Service, Role::Repository, Role::FailureAdvice]
    }

    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Service => "service",
            Role::Repository => "repository",
            Role::FailureAdvice => "failure-advice",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMarker {
    pub role: Role,
    pub name: Option<Cow<'static, str>>,
}

/// A managed component: a process-lifetime singleton built with a no-argument constructor.
///
/// Constructors must not depend on other components. Dependencies are declared as
/// [`crate::Autowired`] fields and reported through [`Component::injection_points`],
/// they're filled once every component exists.
pub trait Component: Send + Sync + 'static {
    fn construct() -> Result<Self, InstantiateErrorKind>
    where
        Self: Sized;

    fn injection_points(&self) -> Vec<InjectionPoint<'_>> {
        Vec::new()
    }
}

pub(crate) struct Constructed {
    pub(crate) object: Shared,
    pub(crate) component: Arc<dyn Component>,
}

pub(crate) type Constructor = fn() -> Result<Constructed, InstantiationError>;

fn construct<T: Component>() -> Result<Constructed, InstantiationError> {
    let value = T::construct().map_err(|source| InstantiationError::Constructor {
        type_name: TypeInfo::of::<T>().name,
        source,
    })?;
    let value = Arc::new(value);

    Ok(Constructed {
        object: any::share(value.clone()),
        component: value,
    })
}

pub(crate) type Upcast = Arc<dyn Fn(&Shared) -> Option<Shared> + Send + Sync>;

/// How a declared capability takes part in lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    Indexed,
    Primary,
    /// Recorded in the assignability table only.
    Implied,
}

#[derive(Clone)]
pub(crate) struct CapabilityDecl {
    pub(crate) type_info: TypeInfo,
    pub(crate) binding: Binding,
    pub(crate) upcast: Upcast,
}

/// Candidate type yielded by a discovery source.
#[derive(Clone)]
pub struct Candidate {
    pub(crate) type_info: TypeInfo,
    pub(crate) roles: Vec<RoleMarker>,
    pub(crate) constructor: Option<Constructor>,
    pub(crate) capabilities: Vec<CapabilityDecl>,
    pub(crate) advice: Option<AdviceHook>,
}

impl Candidate {
    #[inline]
    #[must_use]
    pub fn of<T: Component>() -> CandidateBuilder<T> {
        CandidateBuilder {
            candidate: Self {
                type_info: TypeInfo::of::<T>(),
                roles: Vec::new(),
                constructor: Some(construct::<T>),
                capabilities: Vec::new(),
                advice: None,
            },
            _marker: PhantomData,
        }
    }

    /// Candidate for a type that can't be constructed by the container.
    /// Registering it with a role marker fails with [`InstantiationError::MissingConstructor`].
    #[inline]
    #[must_use]
    pub fn without_constructor<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            roles: Vec::new(),
            constructor: None,
            capabilities: Vec::new(),
            advice: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(RoleMarker { role, name: None });
        self
    }

    #[inline]
    #[must_use]
    pub fn with_named_role(mut self, role: Role, name: impl Into<Cow<'static, str>>) -> Self {
        self.roles.push(RoleMarker {
            role,
            name: Some(name.into()),
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn module_path(&self) -> &'static str {
        self.type_info.module_path()
    }

    #[inline]
    #[must_use]
    pub fn roles(&self) -> &[RoleMarker] {
        &self.roles
    }

    #[must_use]
    pub fn capabilities(&self) -> Vec<TypeInfo> {
        self.capabilities.iter().map(|capability| capability.type_info).collect()
    }
}

impl Debug for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("type", &self.type_info.name)
            .field("roles", &self.roles)
            .field("constructible", &self.constructor.is_some())
            .field("capabilities", &self.capabilities())
            .finish_non_exhaustive()
    }
}

pub struct CandidateBuilder<T> {
    candidate: Candidate,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> CandidateBuilder<T> {
    #[inline]
    #[must_use]
    pub fn role(mut self, role: Role) -> Self {
        self.candidate = self.candidate.with_role(role);
        self
    }

    #[inline]
    #[must_use]
    pub fn named_role(mut self, role: Role, name: impl Into<Cow<'static, str>>) -> Self {
        self.candidate = self.candidate.with_named_role(role, name);
        self
    }

    /// Declares that the component satisfies capability `C`, usually a trait object.
    ///
    /// ```ignore
    /// Candidate::of::<CardGateway>()
    ///     .role(Role::Service)
    ///     .capability::<dyn PaymentGateway>(|it| it)
    /// ```
    #[inline]
    #[must_use]
    pub fn capability<C>(self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.add_capability(upcast, Binding::Indexed)
    }

    /// Same as [`Self::capability`], but the component wins capability lookups over
    /// non-primary implementers.
    #[inline]
    #[must_use]
    pub fn primary_capability<C>(self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.add_capability(upcast, Binding::Primary)
    }

    /// Records that the component satisfies `C` without binding it in the capability index.
    ///
    /// Such a type is found only by the assignability fallback, in registration order, and never
    /// takes part in capability collisions.
    #[inline]
    #[must_use]
    pub fn satisfies<C>(self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.add_capability(upcast, Binding::Implied)
    }

    #[inline]
    #[must_use]
    pub fn build(self) -> Candidate {
        self.candidate
    }

    fn add_capability<C>(mut self, upcast: fn(Arc<T>) -> Arc<C>, binding: Binding) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.candidate.capabilities.push(CapabilityDecl {
            type_info: TypeInfo::of::<C>(),
            binding,
            upcast: Arc::new(move |object: &Shared| any::unshare::<T>(object).map(|concrete| any::share(upcast(concrete)))),
        });
        self
    }
}

impl<T: FailureAdvice> CandidateBuilder<T> {
    /// Marks the component as failure advice and exposes its handler operations.
    #[inline]
    #[must_use]
    pub fn advice(mut self) -> Self {
        self.candidate.advice = Some(collect_handlers::<T>);
        self.role(Role::FailureAdvice)
    }

    #[inline]
    #[must_use]
    pub fn named_advice(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.candidate.advice = Some(collect_handlers::<T>);
        self.named_role(Role::FailureAdvice, name)
    }
}

impl<T> From<CandidateBuilder<T>> for Candidate {
    fn from(builder: CandidateBuilder<T>) -> Self {
        builder.candidate
    }
}

/// Default component name: the simple type name with its first letter lower-cased.
#[must_use]
pub fn default_name(type_info: &TypeInfo) -> String {
    let short_name = type_info.short_name();
    let mut chars = short_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{default_name, Candidate, Component, Role};
    use crate::{any::TypeInfo, errors::InstantiateErrorKind};

    use std::sync::Arc;

    trait PaymentGateway: Send + Sync {}

    struct OrderService;

    impl Component for OrderService {
        fn construct() -> Result<Self, InstantiateErrorKind> {
            Ok(Self)
        }
    }

    impl PaymentGateway for OrderService {}

    struct URLShortener;

    #[test]
    fn test_default_name() {
        assert_eq!(default_name(&TypeInfo::of::<OrderService>()), "orderService");
        assert_eq!(default_name(&TypeInfo::of::<URLShortener>()), "uRLShortener");
    }

    #[test]
    fn test_builder() {
        let candidate = Candidate::of::<OrderService>()
            .named_role(Role::Service, "orders")
            .capability::<dyn PaymentGateway>(|it| it)
            .build();

        assert_eq!(candidate.type_info(), TypeInfo::of::<OrderService>());
        assert_eq!(candidate.roles().len(), 1);
        assert_eq!(candidate.roles()[0].name.as_deref(), Some("orders"));
        assert_eq!(candidate.capabilities(), vec![TypeInfo::of::<dyn PaymentGateway>()]);
        assert!(candidate.constructor.is_some());
        assert!(candidate.advice.is_none());
    }

    #[test]
    fn test_capability_upcast() {
        let candidate = Candidate::of::<OrderService>()
            .role(Role::Service)
            .capability::<dyn PaymentGateway>(|it| it)
            .build();

        let constructed = (candidate.constructor.unwrap())().unwrap();
        let upcasted = (candidate.capabilities[0].upcast)(&constructed.object).unwrap();

        assert!(crate::any::unshare::<dyn PaymentGateway>(&upcasted).is_some());
        assert!(crate::any::unshare::<OrderService>(&upcasted).is_none());
        let _: Arc<OrderService> = crate::any::unshare(&constructed.object).unwrap();
    }

    #[test]
    fn test_without_constructor() {
        let candidate = Candidate::without_constructor::<URLShortener>().with_role(Role::Repository);

        assert!(candidate.constructor.is_none());
        assert_eq!(candidate.roles()[0].role, Role::Repository);
    }
}
