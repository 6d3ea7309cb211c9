mod codec;
mod connection;
mod context;
mod error;
mod filter;
mod guard;
mod injectables;
mod middleware;
mod namespace;
mod pipeline;
mod procedure;
mod response;

pub use codec::{AnyCodec, Codec, CodecError, Issue, SerdeCodec};
pub use connection::Connection;
pub use context::CallContext;
pub use error::{ApiError, ErrorCode};
pub use filter::{create_filter, Filter, FilterInjectable};
pub use guard::{create_guard, Guard, GuardInjectable};
pub use injectables::CallInjectables;
pub use middleware::{create_middleware, Middleware, MiddlewareInjectable, Next};
pub use namespace::Namespace;
pub use procedure::Procedure;
pub use response::{CallResult, IterableResponse, Response};

use core::time::Duration;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, warn, Instrument as _};

use crate::{config::ApiConfig, container::Container, errors::ResolveErrorKind, registry::Registry, scope::Scope};
use pipeline::{handle_output, Chain};

/// Call request handed over by a transport
#[derive(Debug)]
pub struct CallOptions {
    pub connection: Arc<Connection>,
    /// Container already forked to [`Scope::Call`]. The transport disposes it once the call completes.
    pub container: Container,
    pub payload: Value,
    /// Cancelled by the transport when the client aborts the call
    pub signal: CancellationToken,
    pub namespace: String,
    pub procedure: String,
}

/// Executes calls of the procedures registered in the root container's registry
#[derive(Clone, Debug)]
pub struct Api {
    container: Container,
    config: ApiConfig,
}

impl Api {
    /// `container` is the root container, filters are resolved from it
    #[must_use]
    pub fn new(container: Container, config: ApiConfig) -> Self {
        Self { container, config }
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        self.container.registry()
    }

    /// # Errors
    /// Returns [`ErrorCode::NotFound`] error if there is no such namespace or procedure
    pub fn find(&self, namespace: &str, procedure: &str) -> Result<(Arc<Namespace>, Arc<Procedure>), ApiError> {
        self.registry().find(namespace, procedure).ok_or_else(ApiError::not_found)
    }

    /// Runs a call through the middlewares, the guards, the input codec, the handler and the output codec.
    ///
    /// # Errors
    /// Every failure is returned as an [`ApiError`]: typed ones as is or as replaced by a matching filter,
    /// untyped ones as [`ErrorCode::InternalServerError`] without any detail.
    ///
    /// # Panics
    /// Panics if the container of the call is not of [`Scope::Call`] scope
    pub async fn call(&self, options: CallOptions) -> Result<CallResult, ApiError> {
        let span = debug_span!("call", namespace = %options.namespace, procedure = %options.procedure);
        self.call_inner(options).instrument(span).await
    }

    async fn call_inner(&self, options: CallOptions) -> Result<CallResult, ApiError> {
        let CallOptions {
            connection,
            container,
            payload,
            signal,
            namespace,
            procedure,
        } = options;

        let (namespace, procedure) = match self.find(&namespace, &procedure) {
            Ok(found) => found,
            Err(err) => return Err(self.handle_error(err.into()).await),
        };

        assert_eq!(container.scope(), Scope::Call, "Invalid container scope, expected to be `call`");

        let timeout = effective_timeout([procedure.timeout(), namespace.timeout(), self.config.timeout]);
        let timeout_source = CancellationToken::new();
        let timeout_signal = match timeout {
            Some(timeout) => deadline_signal(&timeout_source, timeout),
            None => timeout_source.child_token(),
        };

        container.provide(CallInjectables::signal(), timeout_signal);
        container.provide(CallInjectables::client_signal(), signal);
        container.provide_rc(CallInjectables::connection(), connection.clone());

        let context = CallContext::new(connection, container, namespace, procedure);
        let result = self.execute(&context, payload, timeout, &timeout_source).await;
        // Releases the deadline timer of calls that ended before it
        timeout_source.cancel();
        match result {
            Ok(result) => Ok(result),
            Err(err) => Err(self.handle_error(err).await),
        }
    }

    async fn execute(
        &self,
        context: &CallContext,
        payload: Value,
        timeout: Option<Duration>,
        timeout_source: &CancellationToken,
    ) -> anyhow::Result<CallResult> {
        let chain = Chain::new(context, self.registry(), timeout, timeout_source).await?;
        let response = chain.run(0, payload).await?;
        handle_output(context.procedure(), response)
    }

    /// Passes the error through the matching filters, the first produced [`ApiError`] wins
    async fn handle_error(&self, err: anyhow::Error) -> ApiError {
        if !err.is::<ResolveErrorKind>() {
            for entry in self.registry().filters() {
                if !entry.matches(&err) {
                    continue;
                }
                let filter = match self.container.resolve(entry.filter()).await {
                    Ok(filter) => filter,
                    Err(resolve_err) => {
                        error!(error = entry.error_name(), "Filter resolution error: {resolve_err}");
                        continue;
                    }
                };
                match filter.catch(&err).await {
                    Some(api_error) => {
                        debug!(error = entry.error_name(), "Error handled by filter");
                        return api_error;
                    }
                    None => warn!(error = entry.error_name(), "Filter didn't produce an API error"),
                }
            }
        }

        match err.downcast::<ApiError>() {
            Ok(api_error) => api_error,
            Err(err) => {
                error!("Unhandled error: {err:?}");
                ApiError::internal()
            }
        }
    }
}

/// The first non-zero timeout
fn effective_timeout(timeouts: impl IntoIterator<Item = Option<Duration>>) -> Option<Duration> {
    timeouts.into_iter().flatten().find(|timeout| !timeout.is_zero())
}

/// Signal cancelled by `source` or after `timeout`, whichever comes first
fn deadline_signal(source: &CancellationToken, timeout: Duration) -> CancellationToken {
    let signal = source.child_token();
    let deadline = signal.clone();
    let source = source.clone();

    tokio::spawn(async move {
        tokio::select! {
            () = tokio::time::sleep(timeout) => deadline.cancel(),
            () = source.cancelled() => {}
        }
    });

    signal
}
