use core::fmt::{self, Debug, Formatter};
use futures::stream::{BoxStream, Stream, StreamExt as _};
use serde_json::Value;

/// Output of a streaming procedure: an immediate output and a stream of chunks
pub struct IterableResponse {
    output: Value,
    iterable: BoxStream<'static, Value>,
}

impl IterableResponse {
    #[must_use]
    pub fn new<S>(output: Value, iterable: S) -> Self
    where
        S: Stream<Item = Value> + Send + 'static,
    {
        Self {
            output,
            iterable: iterable.boxed(),
        }
    }

    #[inline]
    #[must_use]
    pub fn output(&self) -> &Value {
        &self.output
    }

    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Value, BoxStream<'static, Value>) {
        (self.output, self.iterable)
    }
}

impl Debug for IterableResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterableResponse").field("output", &self.output).finish_non_exhaustive()
    }
}

/// Value produced by a handler or a middleware
#[derive(Debug)]
pub enum Response {
    Value(Value),
    Iterable(IterableResponse),
}

impl Response {
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Response::Value(value) => Some(value),
            Response::Iterable(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Response::Value(value) => Some(value),
            Response::Iterable(_) => None,
        }
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        Response::Value(value)
    }
}

impl From<IterableResponse> for Response {
    fn from(response: IterableResponse) -> Self {
        Response::Iterable(response)
    }
}

impl From<()> for Response {
    fn from((): ()) -> Self {
        Response::Value(Value::Null)
    }
}

/// Result of a call as seen by the transport
pub struct CallResult {
    pub output: Option<Value>,
    pub iterable: Option<BoxStream<'static, Value>>,
}

impl Debug for CallResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallResult")
            .field("output", &self.output)
            .field("iterable", &self.iterable.is_some())
            .finish()
    }
}
