use std::collections::BTreeSet;
use tracing::{debug, error};

use crate::{component::Candidate, errors::DiscoveryErrorKind};

/// Source of candidate types for a bootstrap.
///
/// Implementations list every candidate they know about. Namespace filtering and
/// validation of the listing are applied by [`filter_namespace`].
pub trait DiscoverySource {
    /// # Errors
    /// Returns an error if the source can't be enumerated.
    fn list_candidates(&self, root_namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind>;
}

impl<F> DiscoverySource for F
where
    F: Fn(&str) -> Result<Vec<Candidate>, DiscoveryErrorKind>,
{
    #[inline]
    fn list_candidates(&self, root_namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind> {
        self(root_namespace)
    }
}

/// Fixed list of candidates, yielded in the given order.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    candidates: Vec<Candidate>,
}

impl StaticSource {
    #[inline]
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = impl Into<Candidate>>) -> Self {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, candidate: impl Into<Candidate>) -> Self {
        self.candidates.push(candidate.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl DiscoverySource for StaticSource {
    fn list_candidates(&self, _root_namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind> {
        Ok(self.candidates.clone())
    }
}

/// Checks that `namespace` is a valid module path prefix. Empty means no restriction.
///
/// # Errors
/// Returns [`DiscoveryErrorKind::InvalidNamespace`] for empty or malformed segments.
pub fn validate_namespace(namespace: &str) -> Result<(), DiscoveryErrorKind> {
    if namespace.is_empty() {
        return Ok(());
    }

    let valid = namespace.split("::").all(|segment| {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(first) if first == '_' || first.is_alphabetic())
            && chars.all(|char| char == '_' || char.is_alphanumeric())
    });
    if valid {
        Ok(())
    } else {
        Err(DiscoveryErrorKind::InvalidNamespace {
            namespace: namespace.to_owned(),
        })
    }
}

/// Whether `module_path` is `namespace` itself or nested in it.
#[must_use]
pub fn in_namespace(module_path: &str, namespace: &str) -> bool {
    if namespace.is_empty() {
        return true;
    }
    match module_path.strip_prefix(namespace) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

/// Lists the candidates of `source` that live under `root_namespace`, in source order.
///
/// # Errors
/// Returns an error if the namespace is invalid, the source fails, or the source lists
/// the same type twice.
pub fn discover(source: &dyn DiscoverySource, root_namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind> {
    validate_namespace(root_namespace).map_err(|err| {
        error!("{}", err);
        err
    })?;

    let candidates = source.list_candidates(root_namespace).map_err(|err| {
        error!("{}", err);
        err
    })?;
    filter_namespace(candidates, root_namespace)
}

/// Keeps the candidates under `namespace` and rejects duplicated types.
///
/// # Errors
/// Returns [`DiscoveryErrorKind::DuplicateCandidate`] if a type is listed twice.
pub fn filter_namespace(candidates: Vec<Candidate>, namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind> {
    let total = candidates.len();
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(total);

    for candidate in candidates {
        if !in_namespace(candidate.module_path(), namespace) {
            continue;
        }
        if !seen.insert(candidate.type_info()) {
            let err = DiscoveryErrorKind::DuplicateCandidate {
                type_name: candidate.type_info().name,
            };
            error!("{}", err);
            return Err(err);
        }
        kept.push(candidate);
    }

    debug!(namespace, total, kept = kept.len(), "Candidates discovered");
    Ok(kept)
}
