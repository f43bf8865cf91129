use super::instantiate::InstantiationError;

#[derive(thiserror::Error, Debug)]
pub enum RegistryErrorKind {
    #[error(transparent)]
    Instantiation(#[from] InstantiationError),
    #[error("Component `{type_name}` is registered more than once")]
    DuplicateType { type_name: &'static str },
    #[error("Component name `{name}` is used by both `{first}` and `{second}`")]
    DuplicateName {
        name: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("Capability `{capability}` has two primary implementers: `{first}` and `{second}`")]
    ConflictingPrimary {
        capability: &'static str,
        first: &'static str,
        second: &'static str,
    },
    #[error("Capability `{capability}` has several implementers ({}) and none of them is primary", implementers.join(", "))]
    AmbiguousCapability {
        capability: &'static str,
        implementers: Vec<&'static str>,
    },
    #[error("Component `{type_name}` declares capability `{capability}` more than once")]
    DuplicateCapability {
        type_name: &'static str,
        capability: &'static str,
    },
    #[error("Component `{type_name}` can't be viewed as capability `{capability}`")]
    IncorrectUpcast {
        type_name: &'static str,
        capability: &'static str,
    },
}
