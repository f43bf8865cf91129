#[derive(thiserror::Error, Debug)]
pub enum InjectErrorKind {
    #[error("Missing required dependency `{dependency}` for component `{owner}` ({owner_type}), field `{field}`")]
    MissingRequiredDependency {
        owner: String,
        owner_type: &'static str,
        dependency: &'static str,
        field: &'static str,
    },
    #[error("Incorrect type resolved for `{dependency}` in component `{owner}`, field `{field}`")]
    IncorrectType {
        owner: String,
        dependency: &'static str,
        field: &'static str,
    },
    #[error("Field `{field}` of component `{owner}` is already injected")]
    AlreadyInjected { owner: String, field: &'static str },
}
