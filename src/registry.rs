use core::fmt::{self, Debug, Display, Formatter};
use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::debug;

use crate::{
    any::TypeInfo,
    api::{FilterInjectable, GuardInjectable, MiddlewareInjectable, Namespace, Procedure},
    dependency::Dependant,
    errors::{RegistryErrorKind, ScopeErrorKind},
    scope::Scope,
    task::Task,
};

/// Filter registered for errors of a single type
pub(crate) struct FilterEntry {
    error: TypeInfo,
    matches: fn(&anyhow::Error) -> bool,
    filter: FilterInjectable,
}

impl FilterEntry {
    #[inline]
    pub(crate) fn matches(&self, err: &anyhow::Error) -> bool {
        (self.matches)(err)
    }

    #[inline]
    pub(crate) fn error_name(&self) -> &'static str {
        self.error.short_name()
    }

    #[inline]
    pub(crate) fn filter(&self) -> &FilterInjectable {
        &self.filter
    }
}

/// Everything the application registers: namespaces with their procedures, tasks,
/// and the global filters, guards and middlewares.
#[derive(Default)]
pub struct Registry {
    filters: Vec<FilterEntry>,
    guards: Vec<GuardInjectable>,
    middlewares: Vec<MiddlewareInjectable>,
    namespaces: BTreeMap<String, Arc<Namespace>>,
    tasks: BTreeMap<String, Arc<Task>>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter for errors of type `E`. Filters are tried in registration order.
    ///
    /// # Errors
    /// Returns [`RegistryErrorKind::Scope`] if the filter isn't of [`Scope::Global`] effective scope
    pub fn register_filter<E>(&mut self, filter: &FilterInjectable) -> Result<(), RegistryErrorKind>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        ensure_global("Filter", filter.effective_scope())?;
        self.filters.push(FilterEntry {
            error: TypeInfo::of::<E>(),
            matches: anyhow::Error::is::<E>,
            filter: filter.clone(),
        });
        debug!(error = TypeInfo::of::<E>().short_name(), "Filter registered");
        Ok(())
    }

    /// # Errors
    /// Returns [`RegistryErrorKind::Scope`] if the guard isn't of [`Scope::Global`] effective scope
    pub fn register_guard(&mut self, guard: &GuardInjectable) -> Result<(), RegistryErrorKind> {
        ensure_global("Guard", guard.effective_scope())?;
        self.guards.push(guard.clone());
        Ok(())
    }

    /// # Errors
    /// Returns [`RegistryErrorKind::Scope`] if the middleware isn't of [`Scope::Global`] effective scope
    pub fn register_middleware(&mut self, middleware: &MiddlewareInjectable) -> Result<(), RegistryErrorKind> {
        ensure_global("Middleware", middleware.effective_scope())?;
        self.middlewares.push(middleware.clone());
        Ok(())
    }

    /// # Errors
    /// - [`RegistryErrorKind::DuplicateNamespace`] if a namespace with the name is already registered
    /// - [`RegistryErrorKind::DuplicateProcedure`] if the namespace has procedures with the same name
    pub fn register_namespace(&mut self, namespace: Namespace) -> Result<(), RegistryErrorKind> {
        let mut names = BTreeSet::new();
        for procedure in namespace.procedures() {
            if !names.insert(procedure.name()) {
                return Err(RegistryErrorKind::DuplicateProcedure {
                    namespace: namespace.name().to_owned(),
                    name: procedure.name().to_owned(),
                });
            }
        }

        match self.namespaces.entry(namespace.name().to_owned()) {
            Entry::Occupied(entry) => Err(RegistryErrorKind::DuplicateNamespace { name: entry.key().clone() }),
            Entry::Vacant(entry) => {
                debug!(namespace = namespace.name(), procedures = namespace.procedures().len(), "Namespace registered");
                entry.insert(Arc::new(namespace));
                Ok(())
            }
        }
    }

    /// # Errors
    /// - [`RegistryErrorKind::DuplicateTask`] if a task with the name is already registered
    /// - [`RegistryErrorKind::Scope`] if the task's dependencies aren't of [`Scope::Global`] effective scope
    pub fn register_task(&mut self, task: Task) -> Result<(), RegistryErrorKind> {
        ensure_global("Task", task.dependencies().effective_scope())?;
        match self.tasks.entry(task.name().to_owned()) {
            Entry::Occupied(entry) => Err(RegistryErrorKind::DuplicateTask { name: entry.key().clone() }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(task));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Arc<Namespace>> {
        self.namespaces.get(name)
    }

    #[must_use]
    pub fn find(&self, namespace: &str, procedure: &str) -> Option<(Arc<Namespace>, Arc<Procedure>)> {
        let namespace = self.namespaces.get(namespace)?;
        let procedure = namespace.procedure(procedure)?;
        Some((namespace.clone(), procedure.clone()))
    }

    #[must_use]
    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    #[inline]
    pub(crate) fn filters(&self) -> &[FilterEntry] {
        &self.filters
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

    /// Every registered dependant: filters, middlewares, guards, tasks, then per namespace
    /// its guards, middlewares and procedures with their own guards and middlewares
    #[must_use]
    pub fn dependants(&self) -> Vec<&dyn Dependant> {
        let mut dependants: Vec<&dyn Dependant> = Vec::new();
        dependants.extend(self.filters.iter().map(|entry| &entry.filter as &dyn Dependant));
        dependants.extend(self.middlewares.iter().map(|middleware| middleware as &dyn Dependant));
        dependants.extend(self.guards.iter().map(|guard| guard as &dyn Dependant));
        dependants.extend(self.tasks.values().map(|task| &**task as &dyn Dependant));

        for namespace in self.namespaces.values() {
            dependants.extend(namespace.guards().iter().map(|guard| guard as &dyn Dependant));
            dependants.extend(namespace.middlewares().iter().map(|middleware| middleware as &dyn Dependant));
            for procedure in namespace.procedures() {
                dependants.extend(procedure.guards().iter().map(|guard| guard as &dyn Dependant));
                dependants.extend(procedure.middlewares().iter().map(|middleware| middleware as &dyn Dependant));
                dependants.push(&**procedure);
            }
        }

        dependants
    }
}

fn ensure_global(dependant: &str, actual: Scope) -> Result<(), ScopeErrorKind> {
    if actual == Scope::Global {
        return Ok(());
    }
    Err(ScopeErrorKind::InvalidScope {
        dependant: dependant.to_owned(),
        expected: Scope::Global,
        actual,
    })
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("filters", &self.filters.len())
            .field("guards", &self.guards.len())
            .field("middlewares", &self.middlewares.len())
            .field("namespaces", &self.namespaces.keys().collect::<Vec<_>>())
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}
