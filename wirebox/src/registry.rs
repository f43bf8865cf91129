use core::fmt::{self, Debug, Formatter};
use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, debug_span, error, warn};

use crate::{
    advice::AdviceHook,
    any::{self, Shared, TypeInfo},
    component::{default_name, Binding, CapabilityDecl, Component, Constructed, Role, RoleMarker},
    config::{CapabilityPolicy, Config, NameCollisionPolicy},
    errors::{InstantiationError, RegistryErrorKind},
    Candidate,
};

/// A constructed singleton owned by the registry for the process lifetime.
pub struct ManagedInstance {
    name: String,
    type_info: TypeInfo,
    role: Role,
    object: Shared,
    pub(crate) component: Arc<dyn Component>,
    capabilities: Vec<(TypeInfo, Shared)>,
    pub(crate) advice: Option<AdviceHook>,
}

impl ManagedInstance {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    #[must_use]
    pub(crate) fn object(&self) -> &Shared {
        &self.object
    }

    /// Declared capabilities in declaration order.
    pub fn capabilities(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.capabilities.iter().map(|(capability, _)| *capability)
    }

    /// The instance viewed as `T`, either its concrete type or one of its capabilities.
    #[must_use]
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.satisfies(&TypeInfo::of::<T>()).and_then(any::unshare)
    }

    /// Assignability check against the explicit capability table.
    #[must_use]
    pub(crate) fn satisfies(&self, target: &TypeInfo) -> Option<&Shared> {
        if self.type_info == *target {
            return Some(&self.object);
        }
        self.capabilities
            .iter()
            .find_map(|(capability, view)| (capability == target).then_some(view))
    }
}

impl Debug for ManagedInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedInstance")
            .field("name", &self.name)
            .field("type", &self.type_info.name)
            .field("role", &self.role)
            .field("capabilities", &self.capabilities().map(|capability| capability.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Index through which a dependency was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    Capability,
    /// First instance in registration order that satisfies the type, including
    /// implied capabilities the capability index doesn't hold.
    Assignable,
}

struct CapabilityBinding {
    index: usize,
    primary: bool,
    view: Shared,
}

/// Classifies candidates, instantiates them eagerly and indexes the instances
/// by name, by exact type and by capability.
pub struct ComponentRegistry {
    config: Config,
    instances: Vec<ManagedInstance>,
    by_name: BTreeMap<String, usize>,
    by_type: BTreeMap<TypeInfo, usize>,
    by_capability: BTreeMap<TypeInfo, CapabilityBinding>,
    implementers: BTreeMap<TypeInfo, Vec<usize>>,
    ambiguous: BTreeSet<TypeInfo>,
    advice: Vec<usize>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ComponentRegistry {
    #[inline]
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            instances: Vec::new(),
            by_name: BTreeMap::new(),
            by_type: BTreeMap::new(),
            by_capability: BTreeMap::new(),
            implementers: BTreeMap::new(),
            ambiguous: BTreeSet::new(),
            advice: Vec::new(),
        }
    }

    /// Registers a candidate. Returns `Ok(None)` for candidates without exactly one role marker.
    ///
    /// # Errors
    /// Every error is fatal to the bootstrap: the candidate couldn't be constructed,
    /// its type or name is already taken, or its capabilities conflict.
    pub fn register(&mut self, candidate: Candidate) -> Result<Option<&ManagedInstance>, RegistryErrorKind> {
        let span = debug_span!("register", component = candidate.type_info.name);
        let _guard = span.enter();

        let Candidate {
            type_info,
            roles,
            constructor,
            capabilities,
            advice,
        } = candidate;

        if roles.len() > 1 {
            warn!(
                component = type_info.name,
                markers = roles.len(),
                "Several role markers, candidate ignored"
            );
            return Ok(None);
        }
        let Some(RoleMarker { role, name }) = roles.into_iter().next() else {
            debug!("No role marker, candidate ignored");
            return Ok(None);
        };

        if self.by_type.contains_key(&type_info) {
            let err = RegistryErrorKind::DuplicateType { type_name: type_info.name };
            error!("{}", err);
            return Err(err);
        }

        let name = match name {
            Some(name) if !name.is_empty() => name.into_owned(),
            _ => default_name(&type_info),
        };
        if let Some(&existing) = self.by_name.get(&name) {
            let first = self.instances[existing].type_info.name;
            match self.config.name_collision {
                NameCollisionPolicy::Reject => {
                    let err = RegistryErrorKind::DuplicateName {
                        name,
                        first,
                        second: type_info.name,
                    };
                    error!("{}", err);
                    return Err(err);
                }
                NameCollisionPolicy::Overwrite => {
                    warn!(name = %name, previous = first, next = type_info.name, "Component name overwritten");
                }
            }
        }

        let Some(constructor) = constructor else {
            let err = RegistryErrorKind::from(InstantiationError::MissingConstructor { type_name: type_info.name });
            error!("{}", err);
            return Err(err);
        };
        let Constructed { object, component } = constructor().map_err(|err| {
            let err = RegistryErrorKind::from(err);
            error!("{}", err);
            err
        })?;

        let mut staged: Vec<(TypeInfo, Binding, Shared)> = Vec::with_capacity(capabilities.len());
        for CapabilityDecl {
            type_info: capability,
            binding,
            upcast,
        } in capabilities
        {
            if staged.iter().any(|(declared, ..)| *declared == capability) {
                let err = RegistryErrorKind::DuplicateCapability {
                    type_name: type_info.name,
                    capability: capability.name,
                };
                error!("{}", err);
                return Err(err);
            }
            let Some(view) = upcast(&object) else {
                let err = RegistryErrorKind::IncorrectUpcast {
                    type_name: type_info.name,
                    capability: capability.name,
                };
                error!("{}", err);
                return Err(err);
            };
            if binding == Binding::Primary {
                if let Some(current) = self.by_capability.get(&capability).filter(|current| current.primary) {
                    let err = RegistryErrorKind::ConflictingPrimary {
                        capability: capability.name,
                        first: self.instances[current.index].type_info.name,
                        second: type_info.name,
                    };
                    error!("{}", err);
                    return Err(err);
                }
            }
            staged.push((capability, binding, view));
        }

        let index = self.instances.len();
        let mut views = Vec::with_capacity(staged.len());
        for (capability, binding, view) in staged {
            match binding {
                Binding::Indexed => self.bind_capability(capability, type_info, index, false, view.clone()),
                Binding::Primary => self.bind_capability(capability, type_info, index, true, view.clone()),
                Binding::Implied => debug!(capability = capability.name, "Capability implied"),
            }
            views.push((capability, view));
        }

        if role == Role::FailureAdvice {
            self.advice.push(index);
        }
        self.by_name.insert(name.clone(), index);
        self.by_type.insert(type_info, index);
        self.instances.push(ManagedInstance {
            name,
            type_info,
            role,
            object,
            component,
            capabilities: views,
            advice,
        });

        let instance = &self.instances[index];
        debug!(name = %instance.name, role = %instance.role, "Registered");
        Ok(Some(instance))
    }

    /// Primary conflicts and repeated declarations are rejected before binding,
    /// so an occupied entry always points at an earlier instance.
    fn bind_capability(&mut self, capability: TypeInfo, implementer: TypeInfo, index: usize, primary: bool, view: Shared) {
        self.implementers.entry(capability).or_default().push(index);

        let binding = CapabilityBinding { index, primary, view };
        let mut entry = match self.by_capability.entry(capability) {
            Entry::Vacant(entry) => {
                entry.insert(binding);
                debug!(capability = capability.name, primary, "Capability bound");
                return;
            }
            Entry::Occupied(entry) => entry,
        };

        let current = self.instances[entry.get().index].type_info.name;
        match (entry.get().primary, primary) {
            (_, true) => {
                entry.insert(binding);
                self.ambiguous.remove(&capability);
                debug!(capability = capability.name, previous = current, "Primary implementer takes the capability over");
            }
            (true, false) => {
                debug!(capability = capability.name, kept = current, "Capability keeps its primary implementer");
            }
            (false, false) => match self.config.capability_policy {
                CapabilityPolicy::FirstWins => {
                    warn!(
                        capability = capability.name,
                        kept = current,
                        ignored = implementer.name,
                        "Capability already bound, keeping the first implementer"
                    );
                }
                CapabilityPolicy::LastWins => {
                    entry.insert(binding);
                    warn!(
                        capability = capability.name,
                        replaced = current,
                        next = implementer.name,
                        "Capability already bound, replacing the implementer"
                    );
                }
                CapabilityPolicy::RequirePrimary => {
                    self.ambiguous.insert(capability);
                    warn!(
                        capability = capability.name,
                        "Capability has several implementers, a primary one is required"
                    );
                }
            },
        }
    }

    /// Checks the indices once every candidate is registered.
    ///
    /// # Errors
    /// Returns [`RegistryErrorKind::AmbiguousCapability`] if a capability still has several
    /// implementers and none of them is primary under [`CapabilityPolicy::RequirePrimary`].
    pub fn seal(&self) -> Result<(), RegistryErrorKind> {
        let Some(capability) = self.ambiguous.first() else {
            return Ok(());
        };

        let err = RegistryErrorKind::AmbiguousCapability {
            capability: capability.name,
            implementers: self.implementers(capability).map(|instance| instance.type_info.name).collect(),
        };
        error!("{}", err);
        Err(err)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ManagedInstance> {
        self.instances.iter()
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ManagedInstance> {
        self.by_name.get(name).map(|&index| &self.instances[index])
    }

    #[must_use]
    pub fn by_type(&self, type_info: &TypeInfo) -> Option<&ManagedInstance> {
        self.by_type.get(type_info).map(|&index| &self.instances[index])
    }

    /// Instance bound to the capability under the configured policy.
    #[must_use]
    pub fn by_capability(&self, capability: &TypeInfo) -> Option<&ManagedInstance> {
        self.by_capability.get(capability).map(|binding| &self.instances[binding.index])
    }

    /// Every implementer of the capability in registration order.
    pub fn implementers(&self, capability: &TypeInfo) -> impl Iterator<Item = &ManagedInstance> {
        self.implementers
            .get(capability)
            .into_iter()
            .flatten()
            .map(|&index| &self.instances[index])
    }

    pub fn of_role(&self, role: Role) -> impl Iterator<Item = &ManagedInstance> {
        self.instances.iter().filter(move |instance| instance.role == role)
    }

    pub(crate) fn advice(&self) -> impl Iterator<Item = &ManagedInstance> {
        self.advice.iter().map(|&index| &self.instances[index])
    }

    /// Finds a value for `target`: exact type, then capability, then the first assignable instance.
    pub(crate) fn resolve(&self, target: &TypeInfo) -> Option<(&Shared, Resolution)> {
        if let Some(instance) = self.by_type(target) {
            return Some((&instance.object, Resolution::Exact));
        }
        if let Some(binding) = self.by_capability.get(target) {
            return Some((&binding.view, Resolution::Capability));
        }
        self.instances
            .iter()
            .find_map(|instance| instance.satisfies(target))
            .map(|view| (view, Resolution::Assignable))
    }
}
