use crate::scope::Scope;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeErrorKind {
    #[error("{dependant} must be a {expected} scope (including all nested dependencies), actual: {actual}")]
    InvalidScope {
        dependant: String,
        expected: Scope,
        actual: Scope,
    },
}
