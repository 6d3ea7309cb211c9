use super::ScopeErrorKind;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryErrorKind {
    #[error(transparent)]
    Scope(#[from] ScopeErrorKind),
    #[error("Namespace `{name}` already registered")]
    DuplicateNamespace { name: String },
    #[error("Procedure `{name}` already registered in namespace `{namespace}`")]
    DuplicateProcedure { namespace: String, name: String },
    #[error("Task `{name}` already registered")]
    DuplicateTask { name: String },
}
