#[derive(thiserror::Error, Debug)]
pub enum DiscoveryErrorKind {
    #[error("Invalid root namespace `{namespace}`: expected `::`-separated identifiers")]
    InvalidNamespace { namespace: String },
    #[error("Candidate `{type_name}` is listed more than once")]
    DuplicateCandidate { type_name: &'static str },
    #[error("Candidate source failed: {0}")]
    Source(#[from] anyhow::Error),
}
