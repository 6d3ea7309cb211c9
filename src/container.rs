use core::fmt::{self, Debug, Formatter};
use futures::{
    future::{try_join_all, BoxFuture},
    FutureExt as _,
};
use parking_lot::Mutex;
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, debug_span, error, Instrument as _};

use crate::{
    any::{RcAny, TypeInfo},
    cache::{Cache, Resolution},
    context::Context,
    dependency::{Dependant, Dependencies},
    errors::{InstantiatorErrorKind, ResolveErrorKind},
    injectable::{AnyInjectable, Injectable, InjectableKind},
    instantiator::BoxedCloneInstantiator,
    registry::Registry,
    scope::Scope,
    service::Service as _,
};

/// Scoped holder of resolved values.
///
/// Containers form a tree: each one is forked from a parent with a stricter or equal scope.
/// A child keeps its parent alive and may read from it, a parent knows nothing about its children.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    scope: Scope,
    parent: Option<Container>,
    registry: Arc<Registry>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    cache: Cache,
    /// Injectables reachable from the registered dependants, filled by [`Container::load`]
    known: BTreeSet<AnyInjectable>,
    disposing: bool,
}

enum Lookup {
    Ready(RcAny),
    Pending(Resolution),
    Parent(Container),
}

impl Container {
    /// Creates a root container of [`Scope::Global`] scope
    #[must_use]
    pub fn new(registry: impl Into<Arc<Registry>>) -> Self {
        Self::with_parent(Scope::Global, None, registry.into())
    }

    /// Creates a child container with the same registry.
    /// The scope is not validated against the parent's one.
    #[must_use]
    pub fn fork(&self, scope: Scope) -> Self {
        debug!(parent = %self.scope(), %scope, "Fork container");
        Self::with_parent(scope, Some(self.clone()), self.inner.registry.clone())
    }

    fn with_parent(scope: Scope, parent: Option<Container>, registry: Arc<Registry>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                scope,
                parent,
                registry,
                state: Mutex::new(State::default()),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.inner.scope
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Installs a value for the injectable into this container, bypassing its factory
    pub fn provide<T>(&self, injectable: &Injectable<T>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.provide_rc(injectable, Arc::new(value));
    }

    pub fn provide_rc<T>(&self, injectable: &Injectable<T>, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        debug!(injectable = injectable.label(), scope = %self.scope(), "Provide");
        self.inner.state.lock().cache.insert(injectable.as_any().clone(), value, Context::new());
    }

    /// Cached or being resolved in this container, ancestors are not checked
    #[must_use]
    pub fn contains(&self, injectable: &AnyInjectable) -> bool {
        self.inner.state.lock().cache.contains(&injectable.id())
    }

    /// Cached or being resolved in this container or in any of its ancestors
    #[must_use]
    pub fn is_resolved(&self, injectable: &AnyInjectable) -> bool {
        self.contains(injectable) || self.inner.parent.as_ref().is_some_and(|parent| parent.is_resolved(injectable))
    }

    /// Returns an already resolved value without instantiating anything.
    /// Values of value injectables are always available, transient ones never are.
    #[must_use]
    pub fn get<T>(&self, injectable: &Injectable<T>) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_any(injectable.as_any())?.downcast().ok()
    }

    fn get_any(&self, injectable: &AnyInjectable) -> Option<RcAny> {
        if let InjectableKind::Value(value) = injectable.kind() {
            return Some(value.clone());
        }
        if injectable.scope() == Scope::Transient {
            return None;
        }
        if let Some(value) = self.inner.state.lock().cache.get(&injectable.id()) {
            return Some(value);
        }
        self.inner.parent.as_ref()?.get_any(injectable)
    }

    /// Resolves the injectable.
    ///
    /// Concurrent resolutions of the same non-transient injectable in the same container share a single
    /// factory call. A value is cached in this container when its scope is broader than or equal to the container's one.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::MissingDependency`] if a placeholder wasn't provided
    /// - [`ResolveErrorKind::Instantiator`] if a factory or a dependency resolution failed
    /// - [`ResolveErrorKind::Disposing`] if the container is being disposed
    /// - [`ResolveErrorKind::IncorrectType`] if a value of another type was installed for the injectable
    pub async fn resolve<T>(&self, injectable: &Injectable<T>) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
    {
        let value = self.resolve_any(injectable.as_any()).await?;
        value.downcast().map_err(|_| ResolveErrorKind::IncorrectType {
            name: injectable.label().to_owned(),
            expected: TypeInfo::of::<T>(),
        })
    }

    pub(crate) fn resolve_any(&self, injectable: &AnyInjectable) -> BoxFuture<'static, Result<RcAny, ResolveErrorKind>> {
        let span = debug_span!("resolve", injectable = injectable.label(), scope = %self.scope());
        let container = self.clone();
        let injectable = injectable.clone();

        async move {
            match container.lookup(&injectable)? {
                Lookup::Ready(value) => Ok(value),
                Lookup::Pending(resolution) => resolution.await,
                Lookup::Parent(parent) => {
                    debug!("Delegate to parent container");
                    parent.resolve_any(&injectable).await
                }
            }
        }
        .instrument(span)
        .boxed()
    }

    fn lookup(&self, injectable: &AnyInjectable) -> Result<Lookup, ResolveErrorKind> {
        let id = injectable.id();
        let mut state = self.inner.state.lock();

        if let Some(value) = state.cache.get(&id) {
            debug!("Found in cache");
            return Ok(Lookup::Ready(value));
        }
        if let Some(resolution) = state.cache.get_pending(&id) {
            debug!("Join pending resolution");
            return Ok(Lookup::Pending(resolution));
        }

        if let InjectableKind::Value(value) = injectable.kind() {
            return Ok(Lookup::Ready(value.clone()));
        }
        if let Some(parent) = self.inner.parent.as_ref().filter(|parent| parent.is_resolved(injectable)) {
            return Ok(Lookup::Parent(parent.clone()));
        }
        if state.disposing {
            return Err(ResolveErrorKind::Disposing);
        }
        let InjectableKind::Factory { instantiator, .. } = injectable.kind() else {
            let err = ResolveErrorKind::MissingDependency {
                label: injectable.label().to_owned(),
            };
            error!("{}", err);
            return Err(err);
        };

        debug!("Not found in cache");
        let resolution = self.clone().instantiate(injectable.clone(), instantiator.clone()).boxed().shared();
        // Transient values are never shared, not even between concurrent resolvers
        if injectable.scope() != Scope::Transient {
            state.cache.insert_pending(id, resolution.clone());
        }
        Ok(Lookup::Pending(resolution))
    }

    async fn instantiate(self, injectable: AnyInjectable, mut instantiator: BoxedCloneInstantiator) -> Result<RcAny, ResolveErrorKind> {
        let result = match self.create_context(injectable.dependencies()).await {
            Ok(context) => match instantiator.call(context.clone()).await {
                Ok(value) => Ok((value, context)),
                Err(err) => Err(ResolveErrorKind::Instantiator(InstantiatorErrorKind::Factory(err))),
            },
            Err(err) => Err(ResolveErrorKind::Instantiator(InstantiatorErrorKind::Deps(Box::new(err)))),
        };

        let id = injectable.id();
        let mut state = self.inner.state.lock();
        if injectable.scope() != Scope::Transient {
            state.cache.remove_pending(&id);
        }

        match result {
            Ok((value, context)) => {
                if self.scope().can_cache(injectable.scope()) {
                    state.cache.insert(injectable, value.clone(), context);
                    debug!("Cached");
                } else {
                    debug!("Not cached, container scope is broader");
                }
                Ok(value)
            }
            Err(err) => {
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves every dependency concurrently and builds a context from them
    ///
    /// # Errors
    /// Returns the first failed dependency resolution
    pub async fn create_context(&self, dependencies: &Dependencies) -> Result<Context, ResolveErrorKind> {
        let resolutions = dependencies.iter().map(|(name, dependency)| {
            let resolution = self.resolve_any(dependency.injectable());
            async move { resolution.await.map(|value| (name, value)) }
        });

        Ok(Context::from_entries(try_join_all(resolutions).await?))
    }

    /// Walks the dependency graph of every registered dependant and resolves each injectable
    /// whose effective scope equals the container's scope.
    /// Placeholders are skipped, they get their values from [`Container::provide`].
    ///
    /// # Errors
    /// Returns the first failed resolution
    pub async fn load(&self) -> Result<(), ResolveErrorKind> {
        let injectables = {
            let mut state = self.inner.state.lock();
            for dependant in self.inner.registry.dependants() {
                if let Some(injectable) = dependant.as_injectable() {
                    state.known.insert(injectable.clone());
                }
                collect_known(dependant.dependencies(), &mut state.known);
            }
            state
                .known
                .iter()
                .filter(|injectable| !injectable.is_placeholder() && injectable.effective_scope() == self.scope())
                .cloned()
                .collect::<Vec<_>>()
        };

        debug!(scope = %self.scope(), count = injectables.len(), "Load");
        try_join_all(injectables.iter().map(|injectable| self.resolve_any(injectable))).await?;
        Ok(())
    }

    /// Runs teardowns of the cached values in reverse insertion order and clears the container.
    ///
    /// A teardown receives the context its value was instantiated with, an empty one for provided values.
    /// Errors of teardowns are logged and don't stop the disposal of the remaining values.
    /// Resolutions that would instantiate something new fail with [`ResolveErrorKind::Disposing`] meanwhile.
    pub async fn dispose(&self) {
        let resolved = {
            let mut state = self.inner.state.lock();
            state.disposing = true;
            state.cache.resolved_rev()
        };
        debug!(scope = %self.scope(), count = resolved.len(), "Dispose container");

        for injectable in resolved {
            let id = injectable.id();
            if let Some(mut finalizer) = injectable.finalizer().cloned() {
                let resolved = self.inner.state.lock().cache.get_with_context(&id);
                if let Some(resolved) = resolved {
                    match finalizer.call(resolved).await {
                        Ok(()) => debug!(injectable = injectable.label(), "Finalizer called"),
                        Err(err) => {
                            error!(injectable = injectable.label(), "Injectable disposal error. Potential memory leak: {err:#}");
                        }
                    }
                }
            }
            self.inner.state.lock().cache.remove(&id);
        }

        let mut state = self.inner.state.lock();
        state.cache.clear();
        state.known.clear();
        state.disposing = false;
    }
}

fn collect_known(dependencies: &Dependencies, known: &mut BTreeSet<AnyInjectable>) {
    for injectable in dependencies.injectables() {
        if known.insert(injectable.clone()) {
            collect_known(injectable.dependencies(), known);
        }
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.inner.scope)
            .field("cached", &self.inner.state.lock().cache.len())
            .field("parent", &self.inner.parent)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Container;
    use crate::{
        api::{Namespace, Procedure},
        context::Context,
        dependency::Dependencies,
        errors::{InstantiatorErrorKind, ResolveErrorKind},
        injectable::Injectable,
        registry::Registry,
        scope::Scope,
    };

    use core::{
        sync::atomic::{AtomicU8, Ordering},
        time::Duration,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing::debug;
    use tracing_test::traced_test;

    struct Config(u8);
    struct Pool(Arc<Config>);

    fn counted<T>(scope: Scope, dependencies: Dependencies, count: &Arc<AtomicU8>, make: fn() -> T) -> Injectable<T>
    where
        T: Send + Sync + 'static,
    {
        let count = count.clone();
        Injectable::factory(scope, dependencies, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            async move { Ok(make()) }
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn test_scoped_get() {
        let config = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(1)) });
        let pool = Injectable::factory(
            Scope::Connection,
            Dependencies::new().with("config", &config),
            |context: Context| async move { Ok(Pool(context.get("config")?)) },
        );

        let root = Container::new(Registry::new());
        let connection = root.fork(Scope::Connection);
        let call = connection.fork(Scope::Call);

        let pool_value = call.resolve(&pool).await.unwrap();
        assert_eq!(pool_value.0 .0, 1);
        assert!(Arc::ptr_eq(&pool_value, &call.resolve(&pool).await.unwrap()));

        // Cached where resolved: the call container is stricter than both scopes
        assert!(call.contains(config.as_any()));
        assert!(call.contains(pool.as_any()));
        assert!(!root.contains(config.as_any()));
        assert!(!connection.is_resolved(pool.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_stricter_scope_not_cached() {
        let count = Arc::new(AtomicU8::new(0));
        let per_call = counted(Scope::Call, Dependencies::new(), &count, || Config(1));

        let root = Container::new(Registry::new());
        let first = root.resolve(&per_call).await.unwrap();
        let second = root.resolve(&per_call).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!root.contains(per_call.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transient_get() {
        let count = Arc::new(AtomicU8::new(0));
        let transient = counted(Scope::Transient, Dependencies::new(), &count, || Config(1));

        let call = Container::new(Registry::new()).fork(Scope::Call);
        let first = call.resolve(&transient).await.unwrap();
        let second = call.resolve(&transient).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(call.get(&transient).is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_concurrent_resolutions_deduplicated() {
        let count = Arc::new(AtomicU8::new(0));
        let slow = {
            let count = count.clone();
            Injectable::factory(Scope::Global, Dependencies::new(), move |_| {
                let count = count.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(Config(1))
                }
            })
        };

        let root = Container::new(Registry::new());
        let (first, second) = tokio::join!(root.resolve(&slow), root.resolve(&slow));

        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_concurrent_transient_resolutions_not_deduplicated() {
        let count = Arc::new(AtomicU8::new(0));
        let transient = counted(Scope::Transient, Dependencies::new(), &count, || Config(1));

        let root = Container::new(Registry::new());
        let (first, second) = tokio::join!(root.resolve(&transient), root.resolve(&transient));

        assert!(!Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_parent_delegation() {
        let count = Arc::new(AtomicU8::new(0));
        let config = counted(Scope::Global, Dependencies::new(), &count, || Config(1));

        let root = Container::new(Registry::new());
        let from_root = root.resolve(&config).await.unwrap();

        let call = root.fork(Scope::Connection).fork(Scope::Call);
        let from_call = call.resolve(&config).await.unwrap();

        assert!(Arc::ptr_eq(&from_root, &from_call));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!call.contains(config.as_any()));
        assert!(call.is_resolved(config.as_any()));
        assert!(call.get(&config).is_some());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_dependency() {
        let placeholder = Injectable::<Config>::placeholder(Scope::Call);
        let pool = Injectable::factory(
            Scope::Call,
            Dependencies::new().with("config", &placeholder),
            |context: Context| async move { Ok(Pool(context.get("config")?)) },
        );

        let call = Container::new(Registry::new()).fork(Scope::Call);

        assert!(matches!(
            call.resolve(&placeholder).await,
            Err(ResolveErrorKind::MissingDependency { label }) if label == "Config"
        ));
        let Err(ResolveErrorKind::Instantiator(InstantiatorErrorKind::Deps(err))) = call.resolve(&pool).await else {
            panic!("dependency error expected");
        };
        assert!(matches!(*err, ResolveErrorKind::MissingDependency { .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_provide() {
        let count = Arc::new(AtomicU8::new(0));
        let connection_id = Injectable::<u8>::placeholder(Scope::Connection);
        let config = counted(Scope::Global, Dependencies::new(), &count, || Config(1));

        let root = Container::new(Registry::new());
        let connection = root.fork(Scope::Connection);
        let call = connection.fork(Scope::Call);

        connection.provide(&connection_id, 7);
        call.provide(&config, Config(2));

        assert_eq!(*call.resolve(&connection_id).await.unwrap(), 7);
        assert_eq!(call.resolve(&config).await.unwrap().0, 2);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!call.contains(connection_id.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_value() {
        let value = Injectable::value(Config(3));
        let call = Container::new(Registry::new()).fork(Scope::Call);

        assert_eq!(call.resolve(&value).await.unwrap().0, 3);
        assert_eq!(call.get(&value).unwrap().0, 3);
        assert!(!call.contains(value.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_failed_resolution_not_pinned() {
        let count = Arc::new(AtomicU8::new(0));
        let flaky = {
            let count = count.clone();
            Injectable::factory(Scope::Global, Dependencies::new(), move |_| {
                let attempt = count.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        return Err(anyhow::anyhow!("first attempt fails").into());
                    }
                    Ok(Config(attempt))
                }
            })
        };

        let root = Container::new(Registry::new());

        assert!(root.resolve(&flaky).await.is_err());
        assert!(!root.contains(flaky.as_any()));
        assert_eq!(root.resolve(&flaky).await.unwrap().0, 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_load() {
        let config_count = Arc::new(AtomicU8::new(0));
        let pool_count = Arc::new(AtomicU8::new(0));
        let config = counted(Scope::Global, Dependencies::new(), &config_count, || Config(1));
        let per_call = counted(
            Scope::Call,
            Dependencies::new().with("config", &config),
            &pool_count,
            || Config(2),
        );
        let connection_id = Injectable::<u8>::placeholder(Scope::Global);

        let mut registry = Registry::new();
        registry
            .register_namespace(
                Namespace::new("users").with_procedure(
                    Procedure::new("get", |_, _| async { Ok(()) }).with_dependencies(
                        Dependencies::new()
                            .with("per_call", &per_call)
                            .with("connection_id", &connection_id),
                    ),
                ),
            )
            .unwrap();

        let root = Container::new(registry);
        root.load().await.unwrap();

        assert_eq!(config_count.load(Ordering::SeqCst), 1);
        assert_eq!(pool_count.load(Ordering::SeqCst), 0);
        assert!(root.contains(config.as_any()));

        let call = root.fork(Scope::Call);
        call.load().await.unwrap();
        assert_eq!(pool_count.load(Ordering::SeqCst), 1);
        assert_eq!(config_count.load(Ordering::SeqCst), 1);
        assert!(call.contains(per_call.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut injectables: Vec<Injectable<u8>> = Vec::new();
        for id in 1..=5u8 {
            let dependencies = match injectables.last() {
                Some(previous) => Dependencies::new().with("previous", previous),
                None => Dependencies::new(),
            };
            let order = order.clone();
            let injectable = Injectable::factory(Scope::Global, dependencies, move |_| async move { Ok(id) }).with_dispose(
                move |value: Arc<u8>, _| {
                    let order = order.clone();
                    async move {
                        order.lock().push(*value);
                        debug!(value = *value, "Finalizer called");
                        Ok(())
                    }
                },
            );
            injectables.push(injectable);
        }

        let root = Container::new(Registry::new());
        root.resolve(&injectables[4]).await.unwrap();
        root.dispose().await;

        assert_eq!(*order.lock(), [5, 4, 3, 2, 1]);
        assert!(injectables.iter().all(|injectable| !root.contains(injectable.as_any())));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_receives_context() {
        let seen = Arc::new(AtomicU8::new(0));
        let config = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(9)) });
        let pool = Injectable::factory(
            Scope::Call,
            Dependencies::new().with("config", &config),
            |context: Context| async move { Ok(Pool(context.get("config")?)) },
        )
        .with_dispose({
            let seen = seen.clone();
            move |_, context| {
                let seen = seen.clone();
                async move {
                    seen.store(context.get::<Config>("config")?.0, Ordering::SeqCst);
                    Ok(())
                }
            }
        });

        let call = Container::new(Registry::new()).fork(Scope::Call);
        call.resolve(&pool).await.unwrap();
        call.dispose().await;

        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    fn torn_down<T>(injectable: Injectable<T>, seen: &Arc<AtomicU8>) -> Injectable<T>
    where
        T: Send + Sync + 'static,
    {
        let seen = seen.clone();
        injectable.with_dispose(move |_, context| {
            let seen = seen.clone();
            async move {
                seen.store(context.get::<Config>("config")?.0, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_with_transient_dependency() {
        let seen = Arc::new(AtomicU8::new(0));
        let config = Injectable::factory(Scope::Transient, Dependencies::new(), |_| async { Ok(Config(3)) });
        let pool = torn_down(
            Injectable::factory(
                Scope::Call,
                Dependencies::new().with("config", &config),
                |context: Context| async move { Ok(Pool(context.get("config")?)) },
            ),
            &seen,
        );

        let call = Container::new(Registry::new()).fork(Scope::Call);
        call.resolve(&pool).await.unwrap();
        assert!(!call.contains(config.as_any()));
        call.dispose().await;

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(!logs_contain("Injectable disposal error"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_with_uncached_stricter_dependency() {
        let seen = Arc::new(AtomicU8::new(0));
        let config = Injectable::factory(Scope::Call, Dependencies::new(), |_| async { Ok(Config(4)) });
        let pool = torn_down(
            Injectable::factory(
                Scope::Global,
                Dependencies::new().with("config", &config),
                |context: Context| async move { Ok(Pool(context.get("config")?)) },
            ),
            &seen,
        );

        let root = Container::new(Registry::new());
        root.resolve(&pool).await.unwrap();
        assert!(root.contains(pool.as_any()));
        assert!(!root.contains(config.as_any()));
        root.dispose().await;

        assert_eq!(seen.load(Ordering::SeqCst), 4);
        assert!(!logs_contain("Injectable disposal error"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_provided_value_with_empty_context() {
        let names = Arc::new(AtomicU8::new(u8::MAX));
        let config = Injectable::factory(Scope::Call, Dependencies::new(), |_| async { Ok(Config(5)) }).with_dispose({
            let names = names.clone();
            move |_, context: Context| {
                let names = names.clone();
                async move {
                    names.store(u8::try_from(context.len())?, Ordering::SeqCst);
                    Ok(())
                }
            }
        });

        let call = Container::new(Registry::new()).fork(Scope::Call);
        call.provide(&config, Config(6));
        call.dispose().await;

        assert_eq!(names.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispose_error_isolated() {
        let disposed = Arc::new(AtomicU8::new(0));
        let healthy = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(1)) }).with_dispose({
            let disposed = disposed.clone();
            move |_, _| {
                let disposed = disposed.clone();
                async move {
                    disposed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        });
        let broken = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(2)) })
            .with_dispose(|_, _| async { Err(anyhow::anyhow!("connection reset")) });

        let root = Container::new(Registry::new());
        root.resolve(&healthy).await.unwrap();
        root.resolve(&broken).await.unwrap();
        root.dispose().await;

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Injectable disposal error. Potential memory leak"));
        assert!(!root.contains(broken.as_any()));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_no_new_resolutions_while_disposing() {
        let root = Container::new(Registry::new());
        let other = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(1)) });
        let result = Arc::new(Mutex::new(None));

        let first = Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(Config(2)) }).with_dispose({
            let root = root.clone();
            let other = other.clone();
            let result = result.clone();
            move |_, _| {
                let root = root.clone();
                let other = other.clone();
                let result = result.clone();
                async move {
                    let resolved = root.resolve(&other).await.map(|_| ());
                    *result.lock() = Some(resolved);
                    Ok(())
                }
            }
        });

        root.resolve(&first).await.unwrap();
        root.dispose().await;

        assert!(matches!(*result.lock(), Some(Err(ResolveErrorKind::Disposing))));
        assert!(root.resolve(&other).await.is_ok());
    }
}
