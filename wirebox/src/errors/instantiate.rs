/// Error returned by a component's no-argument constructor.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum InstantiationError {
    #[error("Component `{type_name}` has no no-argument constructor")]
    MissingConstructor { type_name: &'static str },
    #[error("Constructor of component `{type_name}` failed: {source}")]
    Constructor {
        type_name: &'static str,
        #[source]
        source: InstantiateErrorKind,
    },
}
