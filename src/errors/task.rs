use super::ResolveErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum TaskErrorKind {
    #[error("Task `{name}` not found")]
    NotFound { name: String },
    #[error("Task execution aborted")]
    Aborted,
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
    #[error("Task execution error: {0:#}")]
    Handler(anyhow::Error),
    #[error("Task execution panicked")]
    Panicked,
}
