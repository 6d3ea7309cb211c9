mod container;
mod dependency_resolver;
mod instantiate;
mod instantiator;
mod registry;
mod task;

pub use container::ScopeErrorKind;
pub use dependency_resolver::ResolveErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use registry::RegistryErrorKind;
pub use task::TaskErrorKind;
