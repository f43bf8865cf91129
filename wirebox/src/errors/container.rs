use super::{discovery::DiscoveryErrorKind, inject::InjectErrorKind, registry::RegistryErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum BootstrapErrorKind {
    #[error(transparent)]
    Discovery(#[from] DiscoveryErrorKind),
    #[error(transparent)]
    Registry(#[from] RegistryErrorKind),
    #[error(transparent)]
    Inject(#[from] InjectErrorKind),
}
