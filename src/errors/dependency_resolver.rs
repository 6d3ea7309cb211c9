use super::{InstantiateErrorKind, InstantiatorErrorKind};
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug, Clone)]
pub enum ResolveErrorKind {
    #[error("Missing dependency `{label}`: no factory and no provided value")]
    MissingDependency { label: String },
    #[error("Dependency `{name}` not found in context")]
    NotInContext { name: String },
    #[error("Dependency `{name}` has incorrect type, expected `{}`", expected.name)]
    IncorrectType { name: String, expected: TypeInfo },
    #[error("Container is being disposed")]
    Disposing,
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}
