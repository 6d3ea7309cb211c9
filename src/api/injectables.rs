use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use crate::{injectable::Injectable, scope::Scope};

static CONNECTION: LazyLock<Injectable<Connection>> =
    LazyLock::new(|| Injectable::placeholder(Scope::Connection).with_label("connection"));
static SIGNAL: LazyLock<Injectable<CancellationToken>> = LazyLock::new(|| Injectable::placeholder(Scope::Call).with_label("signal"));
static CLIENT_SIGNAL: LazyLock<Injectable<CancellationToken>> =
    LazyLock::new(|| Injectable::placeholder(Scope::Call).with_label("client_signal"));
static TASK_SIGNAL: LazyLock<Injectable<CancellationToken>> =
    LazyLock::new(|| Injectable::placeholder(Scope::Global).with_label("task_signal"));

/// Values provided by the runtime: into every call container before the middlewares run,
/// and into every task container before the task handler runs
pub struct CallInjectables;

impl CallInjectables {
    /// Connection the call arrived on
    #[must_use]
    pub fn connection() -> &'static Injectable<Connection> {
        &CONNECTION
    }

    /// Cancelled when the call times out or once it has ended
    #[must_use]
    pub fn signal() -> &'static Injectable<CancellationToken> {
        &SIGNAL
    }

    /// Cancelled when the client aborts the call
    #[must_use]
    pub fn client_signal() -> &'static Injectable<CancellationToken> {
        &CLIENT_SIGNAL
    }

    /// Cancelled when a task execution is aborted, provided into the task's container
    #[must_use]
    pub fn task_signal() -> &'static Injectable<CancellationToken> {
        &TASK_SIGNAL
    }
}
