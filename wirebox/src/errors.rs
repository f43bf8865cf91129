mod container;
mod discovery;
mod dispatch;
mod inject;
mod instantiate;
mod registry;

pub use container::BootstrapErrorKind;
pub use discovery::DiscoveryErrorKind;
pub use dispatch::DispatchBuildErrorKind;
pub use inject::InjectErrorKind;
pub use instantiate::{InstantiateErrorKind, InstantiationError};
pub use registry::RegistryErrorKind;
