pub(crate) mod any;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod dependency;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod injectable;
pub(crate) mod instantiator;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod service;
pub(crate) mod task;

pub mod api;

pub use any::TypeInfo;
pub use config::ApiConfig;
pub use container::Container;
pub use context::Context;
pub use dependency::{Dependant, Dependencies, Dependency};
pub use errors::{
    InstantiateErrorKind, InstantiatorErrorKind, RegistryErrorKind, ResolveErrorKind, ScopeErrorKind, TaskErrorKind,
};
pub use finalizer::Finalizer;
pub use injectable::{AnyInjectable, Injectable};
pub use instantiator::Instantiator;
pub use registry::Registry;
pub use scope::Scope;
pub use task::{Task, TaskExecution, Tasks};
