pub(crate) mod advice;
pub(crate) mod any;
pub(crate) mod component;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod discovery;
pub(crate) mod dispatch;
pub(crate) mod errors;
pub(crate) mod failure;
pub(crate) mod inject;
pub(crate) mod injector;
pub(crate) mod registry;

pub use advice::{Caught, FailureAdvice, HandlerSet};
pub use any::TypeInfo;
pub use component::{default_name, Candidate, CandidateBuilder, Component, Role, RoleMarker};
pub use config::{CapabilityPolicy, Config, NameCollisionPolicy};
pub use container::{Container, ContainerBuilder, ContainerState, StateProbe};
pub use discovery::{discover, filter_namespace, in_namespace, validate_namespace, DiscoverySource, StaticSource};
pub use dispatch::{FailureDispatch, FailureHandlerEntry};
pub use errors::{
    BootstrapErrorKind, DiscoveryErrorKind, DispatchBuildErrorKind, InjectErrorKind, InstantiateErrorKind, InstantiationError,
    RegistryErrorKind,
};
pub use failure::{Failure, FailureKind, FailureReply, FailureType, RecoverableFailure, RootFailure, Supertypes};
pub use inject::{Autowired, InjectionPoint};
pub use injector::Injector;
pub use registry::{ComponentRegistry, ManagedInstance, Resolution};
