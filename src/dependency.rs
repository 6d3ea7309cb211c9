use std::collections::BTreeMap;

use crate::{
    injectable::{AnyInjectable, Injectable},
    scope::Scope,
};

/// Named reference from a dependant to an injectable
#[derive(Clone, Debug)]
pub struct Dependency {
    injectable: AnyInjectable,
    optional: bool,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn injectable(&self) -> &AnyInjectable {
        &self.injectable
    }

    /// Optional dependencies are a typing hint only: they are resolved like the required ones
    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dependencies {
    entries: BTreeMap<&'static str, Dependency>,
}

impl Dependencies {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Adds a dependency, replacing an existing one with the same name
    #[inline]
    #[must_use]
    pub fn with<T>(mut self, name: &'static str, injectable: &Injectable<T>) -> Self {
        self.entries.insert(
            name,
            Dependency {
                injectable: injectable.as_any().clone(),
                optional: false,
            },
        );
        self
    }

    #[inline]
    #[must_use]
    pub fn with_optional<T>(mut self, name: &'static str, injectable: &Injectable<T>) -> Self {
        self.entries.insert(
            name,
            Dependency {
                injectable: injectable.as_any().clone(),
                optional: true,
            },
        );
        self
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Dependency)> {
        self.entries.iter().map(|(name, dependency)| (*name, dependency))
    }

    #[inline]
    pub fn injectables(&self) -> impl Iterator<Item = &AnyInjectable> {
        self.entries.values().map(Dependency::injectable)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.entries.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strictest effective scope among the dependencies, [`Scope::Global`] if there are none
    #[must_use]
    pub fn effective_scope(&self) -> Scope {
        self.injectables()
            .map(AnyInjectable::effective_scope)
            .fold(Scope::Global, Scope::strictest)
    }
}

/// Anything that declares dependencies: injectables, procedures, tasks.
pub trait Dependant {
    fn dependencies(&self) -> &Dependencies;

    /// Dependant that is an injectable itself, preloaded together with its dependencies
    fn as_injectable(&self) -> Option<&AnyInjectable> {
        None
    }
}

impl Dependant for Dependencies {
    #[inline]
    fn dependencies(&self) -> &Dependencies {
        self
    }
}
