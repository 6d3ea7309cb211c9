use core::{
    cmp::Ordering,
    fmt::{self, Debug, Formatter},
    future::Future,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::Deref,
};
use std::{borrow::Cow, sync::Arc};
use tracing::warn;

use crate::{
    any::{RcAny, TypeInfo},
    context::Context,
    dependency::{Dependant, Dependencies},
    errors::InstantiateErrorKind,
    finalizer::{boxed_finalizer, BoxedCloneFinalizer, Finalizer},
    instantiator::{boxed_instantiator, BoxedCloneInstantiator, Instantiator},
    scope::Scope,
};

#[derive(Clone)]
pub(crate) enum InjectableKind {
    /// Pre-built value, shared by every container
    Value(RcAny),
    /// Must be provided into a container before it can be resolved
    Placeholder,
    Factory {
        instantiator: BoxedCloneInstantiator,
        finalizer: Option<BoxedCloneFinalizer>,
    },
}

#[derive(Clone)]
pub(crate) struct InjectableInner {
    label: Cow<'static, str>,
    scope: Scope,
    dependencies: Dependencies,
    kind: InjectableKind,
}

/// Identity of an injectable definition.
/// Two clones of the same definition share it, two separately built definitions never do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct InjectableId(usize);

/// Type-erased injectable definition
#[derive(Clone)]
pub struct AnyInjectable {
    inner: Arc<InjectableInner>,
}

impl AnyInjectable {
    #[inline]
    pub(crate) fn id(&self) -> InjectableId {
        InjectableId(Arc::as_ptr(&self.inner) as usize)
    }

    #[inline]
    pub(crate) fn kind(&self) -> &InjectableKind {
        &self.inner.kind
    }

    #[inline]
    pub(crate) fn finalizer(&self) -> Option<&BoxedCloneFinalizer> {
        match &self.inner.kind {
            InjectableKind::Factory { finalizer, .. } => finalizer.as_ref(),
            InjectableKind::Value(_) | InjectableKind::Placeholder => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Declared scope
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.inner.scope
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.inner.dependencies
    }

    /// Strictest scope among the injectable itself and all of its transitive dependencies
    #[must_use]
    pub fn effective_scope(&self) -> Scope {
        self.scope().strictest(self.inner.dependencies.effective_scope())
    }

    #[inline]
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self.inner.kind, InjectableKind::Value(_))
    }

    #[inline]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.inner.kind, InjectableKind::Placeholder)
    }

    #[inline]
    #[must_use]
    pub fn has_dispose(&self) -> bool {
        self.finalizer().is_some()
    }
}

impl Dependant for AnyInjectable {
    #[inline]
    fn dependencies(&self) -> &Dependencies {
        &self.inner.dependencies
    }

    #[inline]
    fn as_injectable(&self) -> Option<&AnyInjectable> {
        Some(self)
    }
}

impl PartialEq for AnyInjectable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for AnyInjectable {}

impl PartialOrd for AnyInjectable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AnyInjectable {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}

impl Hash for AnyInjectable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl Debug for AnyInjectable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match self.inner.kind {
            InjectableKind::Value(_) => "value",
            InjectableKind::Placeholder => "placeholder",
            InjectableKind::Factory { .. } => "factory",
        };
        f.debug_struct("Injectable")
            .field("label", &self.inner.label)
            .field("scope", &self.inner.scope)
            .field("kind", &kind)
            .field("dependencies", &self.inner.dependencies.len())
            .finish()
    }
}

/// Definition of how a value of `T` is obtained and how long it lives.
///
/// Definitions are compared by identity: cloning keeps it, building a new one with the
/// same arguments does not.
pub struct Injectable<T> {
    any: AnyInjectable,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Injectable<T>
where
    T: Send + Sync + 'static,
{
    /// Injectable that always resolves to `value`. Always [`Scope::Global`].
    #[must_use]
    pub fn value(value: T) -> Self {
        Self::from_kind(Scope::Global, Dependencies::new(), InjectableKind::Value(Arc::new(value)))
    }

    /// Injectable without a factory, its value must be provided into a container
    #[must_use]
    pub fn placeholder(scope: Scope) -> Self {
        Self::from_kind(scope, Dependencies::new(), InjectableKind::Placeholder)
    }

    #[must_use]
    pub fn factory<F, Fut>(scope: Scope, dependencies: Dependencies, factory: F) -> Self
    where
        F: Fn(Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, InstantiateErrorKind>> + Send + 'static,
    {
        Self::from_instantiator(scope, dependencies, factory)
    }

    #[must_use]
    pub fn from_instantiator<Inst>(scope: Scope, dependencies: Dependencies, instantiator: Inst) -> Self
    where
        Inst: Instantiator<T>,
    {
        Self::from_kind(
            scope,
            dependencies,
            InjectableKind::Factory {
                instantiator: boxed_instantiator(instantiator),
                finalizer: None,
            },
        )
    }

    /// Sets the teardown called when the container holding the value is disposed.
    /// The teardown receives the context the value was instantiated with.
    ///
    /// Only factories support teardown, for other kinds it's ignored.
    #[must_use]
    pub fn with_dispose<F, Fut>(self, finalizer: F) -> Self
    where
        F: Fn(Arc<T>, Context) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.with_finalizer(finalizer)
    }

    #[must_use]
    pub fn with_finalizer<Fin>(self, finalizer: Fin) -> Self
    where
        Fin: Finalizer<T>,
    {
        self.map_inner(|inner| match &mut inner.kind {
            InjectableKind::Factory { finalizer: slot, .. } => *slot = Some(boxed_finalizer(finalizer)),
            InjectableKind::Value(_) | InjectableKind::Placeholder => {
                warn!(injectable = %inner.label, "Teardown is only supported by factories, ignored");
            }
        })
    }

    #[must_use]
    pub fn with_label(self, label: impl Into<Cow<'static, str>>) -> Self {
        let label = label.into();
        self.map_inner(|inner| inner.label = label)
    }

    fn from_kind(scope: Scope, dependencies: Dependencies, kind: InjectableKind) -> Self {
        Self {
            any: AnyInjectable {
                inner: Arc::new(InjectableInner {
                    label: Cow::Borrowed(TypeInfo::of::<T>().short_name()),
                    scope,
                    dependencies,
                    kind,
                }),
            },
            _marker: PhantomData,
        }
    }

    /// Builder methods produce a new definition, the identity is not kept
    fn map_inner(self, f: impl FnOnce(&mut InjectableInner)) -> Self {
        let mut inner = Arc::try_unwrap(self.any.inner).unwrap_or_else(|shared| (*shared).clone());
        f(&mut inner);
        Self {
            any: AnyInjectable { inner: Arc::new(inner) },
            _marker: PhantomData,
        }
    }
}

impl<T> Injectable<T> {
    #[inline]
    #[must_use]
    pub fn as_any(&self) -> &AnyInjectable {
        &self.any
    }

    #[inline]
    #[must_use]
    pub fn into_any(self) -> AnyInjectable {
        self.any
    }
}

impl<T> Deref for Injectable<T> {
    type Target = AnyInjectable;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.any
    }
}

impl<T> Dependant for Injectable<T> {
    #[inline]
    fn dependencies(&self) -> &Dependencies {
        self.any.dependencies()
    }

    #[inline]
    fn as_injectable(&self) -> Option<&AnyInjectable> {
        Some(&self.any)
    }
}

impl<T> Clone for Injectable<T> {
    fn clone(&self) -> Self {
        Self {
            any: self.any.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Injectable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.any == other.any
    }
}

impl<T> Eq for Injectable<T> {}

impl<T> Debug for Injectable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.any.fmt(f)
    }
}
