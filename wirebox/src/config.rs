/// Config for a container bootstrap
/// ## Fields
/// - `root_namespace`:
///   Module path prefix candidates must live under, e.g. `shop` or `shop::order`.
///   Empty means every candidate of the source.
///
/// - `capability_policy`:
///   Which implementer a capability lookup returns when several non-primary components declare it.
///
/// - `name_collision`:
///   What happens when two components end up with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub root_namespace: &'static str,
    pub capability_policy: CapabilityPolicy,
    pub name_collision: NameCollisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_namespace: "",
            capability_policy: CapabilityPolicy::FirstWins,
            name_collision: NameCollisionPolicy::Reject,
        }
    }
}

impl Config {
    #[inline]
    #[must_use]
    pub fn with_root_namespace(mut self, root_namespace: &'static str) -> Self {
        self.root_namespace = root_namespace;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_capability_policy(mut self, capability_policy: CapabilityPolicy) -> Self {
        self.capability_policy = capability_policy;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_name_collision(mut self, name_collision: NameCollisionPolicy) -> Self {
        self.name_collision = name_collision;
        self
    }
}

/// Collision policy for capability lookups.
///
/// A primary implementer always wins over non-primary ones, two primaries are an error.
/// The policy only decides between non-primary implementers, every implementer stays
/// reachable through the all-implementers index either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityPolicy {
    /// The first registered implementer is kept, later ones are logged as warnings.
    #[default]
    FirstWins,
    /// Every later implementer replaces the previous one, with a warning.
    LastWins,
    /// Several implementers without a primary one fail the bootstrap.
    RequirePrimary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameCollisionPolicy {
    /// A second component with an already used name fails the bootstrap.
    #[default]
    Reject,
    /// The later component takes the name over, with a warning.
    /// The earlier one stays reachable by type.
    Overwrite,
}
