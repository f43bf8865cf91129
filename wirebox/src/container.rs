use core::fmt::{self, Display, Formatter};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};

use crate::{
    any::{self, TypeInfo},
    component::Role,
    config::Config,
    discovery::{self, DiscoverySource},
    dispatch::{FailureDispatch, FailureHandlerEntry},
    errors::BootstrapErrorKind,
    failure::{Failure, FailureReply, FailureType},
    injector::Injector,
    registry::{ComponentRegistry, ManagedInstance},
};

/// Lifecycle of a container bootstrap. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerState {
    Uninitialized,
    Discovering,
    Registering,
    Injecting,
    BuildingFailureTable,
    Ready,
    Failed,
}

impl ContainerState {
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl Display for ContainerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Discovering => "discovering",
            Self::Registering => "registering",
            Self::Injecting => "injecting",
            Self::BuildingFailureTable => "building failure table",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared view of a bootstrap's state, readable from other threads while it runs.
#[derive(Debug, Clone)]
pub struct StateProbe {
    state: Arc<Mutex<ContainerState>>,
}

impl StateProbe {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ContainerState::Uninitialized)),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> ContainerState {
        *self.state.lock()
    }

    /// Moves to `next` unless it's behind the current state or the current one is terminal.
    fn advance(&self, next: ContainerState) -> bool {
        let mut state = self.state.lock();
        if state.is_terminal() || *state >= next {
            return false;
        }
        debug!(from = %*state, to = %next, "State changed");
        *state = next;
        true
    }
}

/// Runs the startup sequence:
/// discovery, registration, injection, then the failure table build.
pub struct ContainerBuilder {
    config: Config,
    probe: StateProbe,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ContainerBuilder {
    #[inline]
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            probe: StateProbe::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn probe(&self) -> StateProbe {
        self.probe.clone()
    }

    /// # Errors
    /// Returns the first fatal error of the sequence. The probe ends in [`ContainerState::Failed`]
    /// and no container is produced.
    pub fn build(self, source: &dyn DiscoverySource) -> Result<Container, BootstrapErrorKind> {
        let span = info_span!("bootstrap", namespace = self.config.root_namespace);
        let _guard = span.enter();

        match self.run(source) {
            Ok(container) => Ok(container),
            Err(err) => {
                self.probe.advance(ContainerState::Failed);
                error!("Bootstrap failed: {}", err);
                Err(err)
            }
        }
    }

    fn run(&self, source: &dyn DiscoverySource) -> Result<Container, BootstrapErrorKind> {
        self.probe.advance(ContainerState::Discovering);
        let candidates = discovery::discover(source, self.config.root_namespace)?;

        self.probe.advance(ContainerState::Registering);
        let mut registry = ComponentRegistry::new(self.config);
        for candidate in candidates {
            registry.register(candidate)?;
        }
        registry.seal()?;

        self.probe.advance(ContainerState::Injecting);
        let injected = Injector::new(&registry).inject_all()?;

        self.probe.advance(ContainerState::BuildingFailureTable);
        let (dispatch, issues) = FailureDispatch::build(&registry);

        self.probe.advance(ContainerState::Ready);
        info!(
            components = registry.len(),
            controllers = registry.of_role(Role::Controller).count(),
            services = registry.of_role(Role::Service).count(),
            repositories = registry.of_role(Role::Repository).count(),
            advice = registry.of_role(Role::FailureAdvice).count(),
            injected,
            handlers = dispatch.len(),
            skipped_handlers = issues.len(),
            "Container ready"
        );

        Ok(Container {
            inner: Arc::new(ContainerInner { registry, dispatch }),
        })
    }
}

/// Facade over a fully wired set of components. Every container handed out is [`ContainerState::Ready`].
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    registry: ComponentRegistry,
    dispatch: FailureDispatch,
}

impl Container {
    /// Bootstraps with the given config.
    ///
    /// # Errors
    /// See [`ContainerBuilder::build`].
    #[inline]
    pub fn bootstrap(config: Config, source: &dyn DiscoverySource) -> Result<Self, BootstrapErrorKind> {
        ContainerBuilder::new(config).build(source)
    }

    #[inline]
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&ManagedInstance> {
        self.inner.registry.by_name(name)
    }

    /// Component registered under `name`, if it's of type `T` or declares capability `T`.
    #[inline]
    #[must_use]
    pub fn get_named<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_by_name(name)?.downcast()
    }

    /// Component of exact type `T`, otherwise the implementer bound to capability `T`,
    /// otherwise the first registered component that satisfies `T`.
    #[must_use]
    pub fn get_by_type<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (value, _) = self.inner.registry.resolve(&TypeInfo::of::<T>())?;
        any::unshare(value)
    }

    /// Every implementer of capability `C` in registration order.
    #[must_use]
    pub fn all_of_capability<C>(&self) -> Vec<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.inner
            .registry
            .implementers(&TypeInfo::of::<C>())
            .filter_map(|instance| instance.downcast::<C>())
            .collect()
    }

    pub fn all_of_role(&self, role: Role) -> impl Iterator<Item = &ManagedInstance> {
        self.inner.registry.of_role(role)
    }

    #[inline]
    #[must_use]
    pub fn resolve_failure_handler(&self, failure_type: &FailureType) -> Option<&FailureHandlerEntry> {
        self.inner.dispatch.resolve(failure_type)
    }

    /// Routes `failure` to its most specific handler. `None` when no handler applies.
    #[must_use]
    pub fn handle_failure(&self, failure: &dyn Failure) -> Option<FailureReply> {
        let failure_type = failure.failure_type();
        let Some(entry) = self.resolve_failure_handler(&failure_type) else {
            debug!(failure = failure_type.name(), "No failure handler");
            return None;
        };

        debug!(
            failure = failure_type.name(),
            handler = entry.failure_type().name(),
            operation = entry.operation(),
            "Handling failure"
        );
        Some(entry.handle(failure))
    }

    #[inline]
    #[must_use]
    pub fn dispatch(&self) -> &FailureDispatch {
        &self.inner.dispatch
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.registry.len()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    #[inline]
    #[must_use]
    pub fn contains_type<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.inner.registry.resolve(&TypeInfo::of::<T>()).is_some()
    }

    /// Component names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.registry.iter().map(ManagedInstance::name)
    }

    /// One line per component: name, role, type and capabilities.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut lines = Vec::with_capacity(self.count());
        for instance in self.inner.registry.iter() {
            let capabilities = instance.capabilities().map(|capability| capability.short_name()).collect::<Vec<_>>();
            let line = if capabilities.is_empty() {
                format!("{} [{}] {}", instance.name(), instance.role(), instance.type_info())
            } else {
                format!(
                    "{} [{}] {} as {}",
                    instance.name(),
                    instance.role(),
                    instance.type_info(),
                    capabilities.join(", ")
                )
            };
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Always [`ContainerState::Ready`]. Progress of a running bootstrap is read from
    /// [`ContainerBuilder::probe`].
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ContainerState {
        ContainerState::Ready
    }
}
