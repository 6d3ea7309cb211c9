use std::sync::Arc;

use super::{connection::Connection, namespace::Namespace, procedure::Procedure};
use crate::container::Container;

/// Frozen description of a call, passed to guards and middlewares
#[derive(Clone, Debug)]
pub struct CallContext {
    connection: Arc<Connection>,
    container: Container,
    namespace: Arc<Namespace>,
    procedure: Arc<Procedure>,
}

impl CallContext {
    pub(crate) fn new(connection: Arc<Connection>, container: Container, namespace: Arc<Namespace>, procedure: Arc<Procedure>) -> Self {
        Self {
            connection,
            container,
            namespace,
            procedure,
        }
    }

    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Call-scoped container of the call
    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    #[inline]
    #[must_use]
    pub fn procedure(&self) -> &Arc<Procedure> {
        &self.procedure
    }
}
