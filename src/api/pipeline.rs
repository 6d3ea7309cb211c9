use core::time::Duration;
use futures::future::{try_join_all, BoxFuture, FutureExt as _};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    context::CallContext,
    error::ApiError,
    guard::Guard,
    middleware::{Middleware, Next},
    procedure::{Handler, Procedure},
    response::{CallResult, Response},
};
use crate::{container::Container, dependency::Dependant as _, errors::ResolveErrorKind, injectable::Injectable, registry::Registry};

/// Middlewares of a call followed by the guards and the handler
pub(crate) struct Chain<'a> {
    context: &'a CallContext,
    registry: &'a Registry,
    middlewares: Vec<Arc<Box<dyn Middleware>>>,
    timeout: Option<Duration>,
    timeout_source: &'a CancellationToken,
}

impl<'a> Chain<'a> {
    pub(crate) async fn new(
        context: &'a CallContext,
        registry: &'a Registry,
        timeout: Option<Duration>,
        timeout_source: &'a CancellationToken,
    ) -> Result<Self, ResolveErrorKind> {
        let namespace = context.namespace();
        let procedure = context.procedure();
        let injectables = registry
            .middlewares()
            .iter()
            .chain(namespace.middlewares())
            .chain(procedure.middlewares());
        let middlewares = resolve_all(context.container(), injectables).await?;

        Ok(Self {
            context,
            registry,
            middlewares,
            timeout,
            timeout_source,
        })
    }

    /// Runs the middleware at `index`, or the guards and the handler once the middlewares are exhausted
    pub(crate) fn run(&'a self, index: usize, payload: Value) -> BoxFuture<'a, anyhow::Result<Response>> {
        async move {
            match self.middlewares.get(index) {
                Some(middleware) => {
                    let next = Next::new(self, index + 1, payload.clone());
                    middleware.handle(self.context, next, payload).await
                }
                None => self.invoke(payload).await,
            }
        }
        .boxed()
    }

    async fn invoke(&self, payload: Value) -> anyhow::Result<Response> {
        let context = self.context;
        let namespace = context.namespace();
        let procedure = context.procedure();

        let injectables = self.registry.guards().iter().chain(namespace.guards()).chain(procedure.guards());
        let guards: Vec<Arc<Box<dyn Guard>>> = resolve_all(context.container(), injectables).await?;
        for guard in &guards {
            if !guard.can(context).await? {
                debug!("Rejected by guard");
                return Err(ApiError::forbidden().into());
            }
        }

        let input = decode_input(procedure, payload)?;
        let dependencies = context.container().create_context(procedure.dependencies()).await?;

        match procedure.handler() {
            Handler::Sync(handler) => handler(dependencies, input),
            Handler::Async(handler) => {
                let response = handler(dependencies, input);
                let Some(timeout) = self.timeout else {
                    return response.await;
                };
                let result = tokio::time::timeout(timeout, response).await;
                self.timeout_source.cancel();
                match result {
                    Ok(response) => response,
                    Err(_) => {
                        debug!(?timeout, "Handler timed out");
                        Err(ApiError::request_timeout().into())
                    }
                }
            }
        }
    }
}

async fn resolve_all<'i, T>(
    container: &Container,
    injectables: impl Iterator<Item = &'i Injectable<T>>,
) -> Result<Vec<Arc<T>>, ResolveErrorKind>
where
    T: Send + Sync + 'static,
{
    try_join_all(injectables.map(|injectable| container.resolve(injectable))).await
}

fn decode_input(procedure: &Procedure, payload: Value) -> anyhow::Result<Value> {
    let Some(codec) = procedure.input() else {
        return Ok(Value::Null);
    };
    codec.decode(payload).map_err(|err| ApiError::validation(&err).into())
}

fn encode_output(procedure: &Procedure, output: Value) -> anyhow::Result<Option<Value>> {
    let Some(codec) = procedure.output() else {
        return Ok(None);
    };
    Ok(Some(codec.encode(output)?))
}

pub(crate) fn handle_output(procedure: &Procedure, response: Response) -> anyhow::Result<CallResult> {
    if procedure.is_stream() {
        let Response::Iterable(response) = response else {
            anyhow::bail!(
                "Invalid response of streaming procedure `{}`. Use `IterableResponse`",
                procedure.name()
            );
        };
        let (output, iterable) = response.into_parts();
        return Ok(CallResult {
            output: encode_output(procedure, output)?,
            iterable: Some(iterable),
        });
    }

    match response {
        Response::Value(output) => Ok(CallResult {
            output: encode_output(procedure, output)?,
            iterable: None,
        }),
        Response::Iterable(_) => anyhow::bail!(
            "Invalid response of procedure `{}`. `IterableResponse` requires a streaming procedure",
            procedure.name()
        ),
    }
}
