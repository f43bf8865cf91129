use core::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};

use crate::any::{self, Shared, TypeInfo};

/// Injection slot for a dependency on another managed component.
///
/// The slot is empty after construction and filled exactly once by the injection pass,
/// after every component has been instantiated. `T` is either a concrete component type
/// or a capability trait object such as `dyn PaymentGateway`.
pub struct Autowired<T: ?Sized> {
    cell: OnceLock<Arc<T>>,
}

impl<T: ?Sized> Autowired<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { cell: OnceLock::new() }
    }

    /// Injected dependency, `None` until injection ran or if an optional point found nothing.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Autowired<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Injection point that aborts startup when nothing satisfies it.
    #[inline]
    #[must_use]
    pub fn required(&self) -> InjectionPoint<'_> {
        InjectionPoint::new(self, TypeInfo::of::<T>(), true)
    }

    /// Injection point that stays unset when nothing satisfies it.
    #[inline]
    #[must_use]
    pub fn optional(&self) -> InjectionPoint<'_> {
        InjectionPoint::new(self, TypeInfo::of::<T>(), false)
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Debug for Autowired<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired").field("set", &self.is_set()).finish()
    }
}

pub(crate) enum SlotErrorKind {
    IncorrectType,
    AlreadySet,
}

pub(crate) trait Slot: Send + Sync {
    fn fill(&self, value: &Shared) -> Result<(), SlotErrorKind>;
}

impl<T> Slot for Autowired<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn fill(&self, value: &Shared) -> Result<(), SlotErrorKind> {
        let value = any::unshare::<T>(value).ok_or(SlotErrorKind::IncorrectType)?;
        self.cell.set(value).map_err(|_| SlotErrorKind::AlreadySet)
    }
}

/// Declared dependency slot of a managed instance, consumed once by the injection pass.
pub struct InjectionPoint<'a> {
    pub(crate) target: TypeInfo,
    pub(crate) required: bool,
    pub(crate) field: &'static str,
    pub(crate) slot: &'a dyn Slot,
}

impl<'a> InjectionPoint<'a> {
    #[inline]
    fn new(slot: &'a dyn Slot, target: TypeInfo, required: bool) -> Self {
        Self {
            target,
            required,
            field: "",
            slot,
        }
    }

    /// Names the field for diagnostics.
    #[inline]
    #[must_use]
    pub fn field(mut self, field: &'static str) -> Self {
        self.field = field;
        self
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> TypeInfo {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }
}
