use futures::future::{BoxFuture, Shared};
use std::collections::{BTreeMap, VecDeque};

use crate::{
    any::RcAny,
    context::Context,
    errors::ResolveErrorKind,
    injectable::{AnyInjectable, InjectableId},
};

/// In-flight resolution shared between every concurrent resolver of the same injectable
pub(crate) type Resolution = Shared<BoxFuture<'static, Result<RcAny, ResolveErrorKind>>>;

pub(crate) struct Resolved {
    pub(crate) injectable: AnyInjectable,
    pub(crate) dependency: RcAny,
    /// Context the factory was called with, empty for provided values
    pub(crate) context: Context,
}

#[derive(Default)]
pub(crate) struct Cache {
    map: BTreeMap<InjectableId, Resolved>,
    resolved: ResolvedSet,
    pending: BTreeMap<InjectableId, Resolution>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, id: &InjectableId) -> Option<RcAny> {
        self.map.get(id).map(|resolved| resolved.dependency.clone())
    }

    /// Value with the context it was instantiated with
    #[must_use]
    pub(crate) fn get_with_context(&self, id: &InjectableId) -> Option<(RcAny, Context)> {
        self.map
            .get(id)
            .map(|resolved| (resolved.dependency.clone(), resolved.context.clone()))
    }

    /// Replaces the value, keeping the first insertion position
    pub(crate) fn insert(&mut self, injectable: AnyInjectable, dependency: RcAny, context: Context) -> Option<RcAny> {
        let id = injectable.id();
        match self.map.insert(id, Resolved { injectable, dependency, context }) {
            Some(previous) => Some(previous.dependency),
            None => {
                self.resolved.push(id);
                None
            }
        }
    }

    pub(crate) fn remove(&mut self, id: &InjectableId) -> Option<Resolved> {
        let resolved = self.map.remove(id)?;
        self.resolved.remove(id);
        Some(resolved)
    }

    /// Cached or being resolved
    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, id: &InjectableId) -> bool {
        self.map.contains_key(id) || self.pending.contains_key(id)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get_pending(&self, id: &InjectableId) -> Option<Resolution> {
        self.pending.get(id).cloned()
    }

    #[inline]
    pub(crate) fn insert_pending(&mut self, id: InjectableId, resolution: Resolution) {
        self.pending.insert(id, resolution);
    }

    #[inline]
    pub(crate) fn remove_pending(&mut self, id: &InjectableId) {
        self.pending.remove(id);
    }

    /// Snapshot of cached injectables, the most recently inserted first
    #[must_use]
    pub(crate) fn resolved_rev(&self) -> Vec<AnyInjectable> {
        self.resolved
            .iter()
            .rev()
            .filter_map(|id| self.map.get(id))
            .map(|resolved| resolved.injectable.clone())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.resolved.clear();
        self.pending.clear();
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

#[derive(Default)]
pub(crate) struct ResolvedSet(VecDeque<InjectableId>);

impl ResolvedSet {
    #[inline]
    pub(crate) fn push(&mut self, id: InjectableId) {
        self.0.push_back(id);
    }

    pub(crate) fn remove(&mut self, id: &InjectableId) {
        self.0.retain(|resolved| resolved != id);
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl DoubleEndedIterator<Item = &InjectableId> {
        self.0.iter()
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Cache;
    use crate::{any::RcAny, context::Context, injectable::Injectable};

    use futures::FutureExt as _;
    use std::sync::Arc;

    #[test]
    fn test_insert_keeps_first_position() {
        let a = Injectable::value(1u8);
        let b = Injectable::value(2u8);
        let mut cache = Cache::new();

        assert!(cache.insert(a.as_any().clone(), Arc::new(1u8), Context::new()).is_none());
        assert!(cache.insert(b.as_any().clone(), Arc::new(2u8), Context::new()).is_none());
        let previous = cache.insert(a.as_any().clone(), Arc::new(3u8), Context::new()).unwrap();

        assert_eq!(*previous.downcast::<u8>().unwrap(), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.resolved_rev(), [b.as_any().clone(), a.as_any().clone()]);
        assert_eq!(*cache.get(&a.as_any().id()).unwrap().downcast::<u8>().unwrap(), 3);
    }

    #[test]
    fn test_context_kept_with_value() {
        let a = Injectable::value(1u8);
        let context = Context::from_entries([("a", Arc::new(1u8) as RcAny)]);
        let mut cache = Cache::new();

        cache.insert(a.as_any().clone(), Arc::new(2u8), context);

        let (value, context) = cache.get_with_context(&a.as_any().id()).unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 2);
        assert_eq!(*context.get::<u8>("a").unwrap(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let a = Injectable::value(1u8);
        let b = Injectable::value(2u8);
        let mut cache = Cache::new();

        cache.insert(a.as_any().clone(), Arc::new(1u8), Context::new());
        cache.insert(b.as_any().clone(), Arc::new(2u8), Context::new());

        assert!(cache.remove(&a.as_any().id()).is_some());
        assert!(!cache.contains(&a.as_any().id()));
        assert_eq!(cache.resolved_rev(), [b.as_any().clone()]);

        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(cache.resolved_rev().is_empty());
    }

    #[test]
    fn test_pending() {
        let a = Injectable::value(1u8);
        let id = a.as_any().id();
        let mut cache = Cache::new();

        let resolution = async { Ok(Arc::new(1u8) as RcAny) }.boxed().shared();
        cache.insert_pending(id, resolution);

        assert!(cache.contains(&id));
        assert!(cache.get(&id).is_none());
        assert!(cache.get_pending(&id).is_some());

        cache.remove_pending(&id);
        assert!(!cache.contains(&id));
    }
}
