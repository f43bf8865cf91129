use tracing::debug;
use wirebox::{BootstrapErrorKind, Candidate, Config, Container, DiscoverySource, DiscoveryErrorKind, StaticSource};

use crate::entry_getters::__CANDIDATES;

/// Candidates registered at link time by `#[derive(Component)]`.
///
/// Listed by type name, link order isn't stable between builds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedSource;

impl LinkedSource {
    #[must_use]
    pub fn candidates() -> Vec<Candidate> {
        let mut candidates = __CANDIDATES.iter().map(|getter| getter()).collect::<Vec<_>>();
        candidates.sort_by(|a, b| a.type_info().name.cmp(b.type_info().name));
        candidates
    }
}

impl DiscoverySource for LinkedSource {
    fn list_candidates(&self, root_namespace: &str) -> Result<Vec<Candidate>, DiscoveryErrorKind> {
        let candidates = Self::candidates();
        debug!(root_namespace, linked = candidates.len(), "Linked candidates listed");
        Ok(candidates)
    }
}

pub trait AutoCandidates {
    /// Adds every linked candidate after the ones already present.
    #[must_use]
    fn with_auto_candidates(self) -> Self;
}

impl AutoCandidates for StaticSource {
    #[inline]
    fn with_auto_candidates(self) -> Self {
        LinkedSource::candidates()
            .into_iter()
            .fold(self, |source, candidate| source.with(candidate))
    }
}

/// Bootstraps a container from the linked candidates.
///
/// # Errors
/// See [`wirebox::ContainerBuilder::build`].
#[inline]
pub fn bootstrap(config: Config) -> Result<Container, BootstrapErrorKind> {
    Container::bootstrap(config, &LinkedSource)
}
