use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
};
use std::sync::Arc;

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;

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

    /// Type name without the module path of the outermost type
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let outer = self.name.split_once('<').map_or(self.name, |(outer, _)| outer);
        match outer.rsplit_once("::") {
            Some((path, _)) => &self.name[path.len() + 2..],
            None => self.name,
        }
    }
}
