use core::{
    any::Any,
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
};
use std::error::Error;

use crate::any::TypeInfo;

/// Upper bound for hierarchy walks, cyclic `Parent` declarations stop here.
const MAX_HIERARCHY_DEPTH: usize = 64;

/// A failure type with a declared position in the failure hierarchy.
///
/// Every failure names its parent; the chain ends at [`RootFailure`], which is its own parent.
///
/// ```
/// use wirebox::{FailureKind, RecoverableFailure};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("illegal argument: {0}")]
/// struct IllegalArgument(String);
///
/// impl FailureKind for IllegalArgument {
///     type Parent = RecoverableFailure;
/// }
/// ```
pub trait FailureKind: Error + Send + Sync + Sized + 'static {
    type Parent: FailureKind;
}

/// Object-safe view of a reported failure.
pub trait Failure: Error + Send + Sync + 'static {
    fn failure_type(&self) -> FailureType;

    fn as_any(&self) -> &dyn Any;
}

impl<F: FailureKind> Failure for F {
    #[inline]
    fn failure_type(&self) -> FailureType {
        FailureType::of::<F>()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Failure {
    #[inline]
    #[must_use]
    pub fn downcast_ref<F: Failure>(&self) -> Option<&F> {
        self.as_any().downcast_ref()
    }

    #[inline]
    #[must_use]
    pub fn is<F: Failure>(&self) -> bool {
        self.as_any().is::<F>()
    }
}

/// Identity of a failure type together with its parent link.
#[derive(Clone, Copy)]
pub struct FailureType {
    info: TypeInfo,
    parent: fn() -> FailureType,
}

impl FailureType {
    #[inline]
    #[must_use]
    pub fn of<F: FailureKind>() -> Self {
        Self {
            info: TypeInfo::of::<F>(),
            parent: Self::of::<F::Parent>,
        }
    }

    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self::of::<RootFailure>()
    }

    #[inline]
    #[must_use]
    pub fn recoverable() -> Self {
        Self::of::<RecoverableFailure>()
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        (self.parent)().info == self.info
    }

    #[must_use]
    pub fn parent(&self) -> Option<FailureType> {
        let parent = (self.parent)();
        (parent.info != self.info).then_some(parent)
    }

    /// Ancestors from the direct parent up to and including the root.
    #[must_use]
    pub fn supertypes(&self) -> Supertypes {
        Supertypes {
            next: self.parent(),
            depth: 0,
        }
    }

    #[must_use]
    pub fn is_subtype_of(&self, other: &FailureType) -> bool {
        self == other || self.supertypes().any(|ancestor| ancestor == *other)
    }
}

impl PartialEq for FailureType {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

impl Eq for FailureType {}

impl PartialOrd for FailureType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FailureType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.info.cmp(&other.info)
    }
}

impl Debug for FailureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FailureType").field(&self.info.name).finish()
    }
}

impl Display for FailureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.info.name)
    }
}

pub struct Supertypes {
    next: Option<FailureType>,
    depth: usize,
}

impl Iterator for Supertypes {
    type Item = FailureType;

    fn next(&mut self) -> Option<Self::Item> {
        if self.depth >= MAX_HIERARCHY_DEPTH {
            return None;
        }
        let current = self.next.take()?;
        self.next = current.parent();
        self.depth += 1;
        Some(current)
    }
}

/// Root of the failure hierarchy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RootFailure {
    pub message: String,
}

impl RootFailure {
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl FailureKind for RootFailure {
    type Parent = RootFailure;
}

/// Generic category of failures a request can recover from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RecoverableFailure {
    pub message: String,
}

impl RecoverableFailure {
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl FailureKind for RecoverableFailure {
    type Parent = RootFailure;
}

/// Reply produced by a failure handler for the request-handling layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReply {
    pub status: u16,
    pub message: String,
}

impl FailureReply {
    #[inline]
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Failure, FailureKind, FailureType, RecoverableFailure, RootFailure};

    #[derive(thiserror::Error, Debug)]
    #[error("illegal argument")]
    struct IllegalArgument;

    impl FailureKind for IllegalArgument {
        type Parent = RecoverableFailure;
    }

    #[derive(thiserror::Error, Debug)]
    #[error("number format")]
    struct NumberFormat;

    impl FailureKind for NumberFormat {
        type Parent = IllegalArgument;
    }

    #[derive(thiserror::Error, Debug)]
    #[error("loop a")]
    struct LoopA;

    #[derive(thiserror::Error, Debug)]
    #[error("loop b")]
    struct LoopB;

    impl FailureKind for LoopA {
        type Parent = LoopB;
    }

    impl FailureKind for LoopB {
        type Parent = LoopA;
    }

    #[test]
    fn test_root() {
        assert!(FailureType::root().is_root());
        assert!(FailureType::root().parent().is_none());
        assert!(!FailureType::recoverable().is_root());
        assert_eq!(FailureType::recoverable().parent(), Some(FailureType::root()));
    }

    #[test]
    fn test_supertypes_most_specific_first() {
        let chain = FailureType::of::<NumberFormat>().supertypes().collect::<Vec<_>>();

        assert_eq!(
            chain,
            vec![
                FailureType::of::<IllegalArgument>(),
                FailureType::recoverable(),
                FailureType::root(),
            ]
        );
    }

    #[test]
    fn test_is_subtype_of() {
        let number_format = FailureType::of::<NumberFormat>();

        assert!(number_format.is_subtype_of(&number_format));
        assert!(number_format.is_subtype_of(&FailureType::of::<IllegalArgument>()));
        assert!(number_format.is_subtype_of(&FailureType::root()));
        assert!(!FailureType::of::<IllegalArgument>().is_subtype_of(&number_format));
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        assert_eq!(FailureType::of::<LoopA>().supertypes().count(), 64);
    }

    #[test]
    fn test_dyn_downcast() {
        let failure: &dyn Failure = &NumberFormat;

        assert_eq!(failure.failure_type(), FailureType::of::<NumberFormat>());
        assert!(failure.is::<NumberFormat>());
        assert!(failure.downcast_ref::<IllegalArgument>().is_none());
        assert_eq!(RootFailure::new("boom").to_string(), "boom");
    }
}
