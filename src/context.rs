use core::fmt::{self, Debug, Formatter};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    any::{RcAny, TypeInfo},
    errors::ResolveErrorKind,
};

/// Resolved dependencies of a factory, teardown or handler, keyed by dependency name
#[derive(Clone, Default)]
pub struct Context {
    map: Arc<BTreeMap<&'static str, RcAny>>,
}

impl Context {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (&'static str, RcAny)>) -> Self {
        Self {
            map: Arc::new(entries.into_iter().collect()),
        }
    }

    /// # Errors
    /// - [`ResolveErrorKind::NotInContext`] if there is no dependency with the name
    /// - [`ResolveErrorKind::IncorrectType`] if the dependency has another type
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
    {
        let value = self
            .map
            .get(name)
            .ok_or_else(|| ResolveErrorKind::NotInContext { name: name.to_owned() })?;

        value.clone().downcast::<T>().map_err(|_| ResolveErrorKind::IncorrectType {
            name: name.to_owned(),
            expected: TypeInfo::of::<T>(),
        })
    }

    #[must_use]
    pub fn get_optional<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(name).ok()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.map.keys().copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}
