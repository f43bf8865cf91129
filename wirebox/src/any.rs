use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Type name without module path, generic arguments and `dyn` prefix.
    ///
    /// `shop::order::OrderService<shop::Db>` becomes `OrderService`,
    /// `dyn shop::PaymentGateway` becomes `PaymentGateway`.
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let name = self.name.split_once('<').map_or(self.name, |(head, _)| head);
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        name.rsplit_once("::").map_or(name, |(_, name)| name)
    }

    /// Module path the type is declared in, empty for types declared at a crate root
    /// without a path (primitives, for example).
    #[inline]
    #[must_use]
    pub fn module_path(&self) -> &'static str {
        let name = self.name.split_once('<').map_or(self.name, |(head, _)| head);
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        name.rsplit_once("::").map_or("", |(path, _)| path)
    }
}

/// Type-erased shared value. The payload is always an `Arc<T>`, so both sized
/// components and capability trait objects travel through the same channel.
pub(crate) type Shared = Arc<dyn Any + Send + Sync>;

#[inline]
pub(crate) fn share<T>(value: Arc<T>) -> Shared
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

#[inline]
pub(crate) fn unshare<T>(shared: &Shared) -> Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    shared.downcast_ref::<Arc<T>>().cloned()
}
