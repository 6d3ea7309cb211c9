use core::{
    fmt::{self, Debug, Formatter},
    time::Duration,
};
use std::sync::Arc;

use super::{guard::GuardInjectable, middleware::MiddlewareInjectable, procedure::Procedure};

/// Named group of procedures sharing guards, middlewares and a timeout
pub struct Namespace {
    name: String,
    procedures: Vec<Arc<Procedure>>,
    guards: Vec<GuardInjectable>,
    middlewares: Vec<MiddlewareInjectable>,
    timeout: Option<Duration>,
}

impl Namespace {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            procedures: Vec::new(),
            guards: Vec::new(),
            middlewares: Vec::new(),
            timeout: None,
        }
    }

    /// Procedure names are checked for uniqueness on registration
    #[must_use]
    pub fn with_procedure(mut self, procedure: Procedure) -> Self {
        self.procedures.push(Arc::new(procedure));
        self
    }

    #[must_use]
    pub fn with_guard(mut self, guard: &GuardInjectable) -> Self {
        self.guards.push(guard.clone());
        self
    }

    #[must_use]
    pub fn with_middleware(mut self, middleware: &MiddlewareInjectable) -> Self {
        self.middlewares.push(middleware.clone());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn procedure(&self, name: &str) -> Option<&Arc<Procedure>> {
        self.procedures.iter().find(|procedure| procedure.name() == name)
    }

    #[inline]
    #[must_use]
    pub fn procedures(&self) -> &[Arc<Procedure>] {
        &self.procedures
    }

    #[inline]
    #[must_use]
    pub fn guards(&self) -> &[GuardInjectable] {
        &self.guards
    }

    #[inline]
    #[must_use]
    pub fn middlewares(&self) -> &[MiddlewareInjectable] {
        &self.middlewares
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Debug for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("procedures", &self.procedures.iter().map(|procedure| procedure.name()).collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
