/// Malformed handler metadata. Never fatal: the offending entry is logged and skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchBuildErrorKind {
    #[error("Failure advice `{owner}` doesn't provide handler operations")]
    MissingHandlers { owner: String },
    #[error("Failure advice `{owner}` has unexpected instance type `{type_name}`")]
    IncorrectAdviceType { owner: String, type_name: &'static str },
    #[error("Handler `{owner}::{operation}` neither declares nor infers a failure type")]
    NoFailureType { owner: String, operation: &'static str },
}
