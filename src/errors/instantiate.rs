use std::sync::Arc;

use super::ResolveErrorKind;

/// Error produced by a factory.
///
/// Factory errors are shared between every waiter of a deduplicated resolution,
/// so the source error is kept behind an [`Arc`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum InstantiateErrorKind {
    #[error("{0:#}")]
    Custom(Arc<anyhow::Error>),
}

impl InstantiateErrorKind {
    #[inline]
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Custom(err) => err.downcast_ref(),
        }
    }
}

impl From<anyhow::Error> for InstantiateErrorKind {
    fn from(err: anyhow::Error) -> Self {
        Self::Custom(Arc::new(err))
    }
}

impl From<ResolveErrorKind> for InstantiateErrorKind {
    fn from(err: ResolveErrorKind) -> Self {
        Self::Custom(Arc::new(err.into()))
    }
}
