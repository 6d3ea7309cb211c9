use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single problem found while decoding or encoding a value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub struct CodecError {
    issues: Vec<Issue>,
}

impl CodecError {
    #[must_use]
    pub fn new(issues: impl IntoIterator<Item = Issue>) -> Self {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut issues = self.issues.iter();
        match issues.next() {
            Some(Issue { path, message }) => write!(f, "{path}: {message}")?,
            None => return f.write_str("invalid value"),
        }
        for Issue { path, message } in issues {
            write!(f, "; {path}: {message}")?;
        }
        Ok(())
    }
}

/// Input decoding and output encoding of a procedure
pub trait Codec: Send + Sync {
    /// # Errors
    /// Returns the issues found in the payload
    fn decode(&self, value: Value) -> Result<Value, CodecError>;

    /// # Errors
    /// Returns the issues found in the handler's output
    fn encode(&self, value: Value) -> Result<Value, CodecError>;
}

/// Accepts any value as is
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyCodec;

impl Codec for AnyCodec {
    #[inline]
    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }

    #[inline]
    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Ok(value)
    }
}

/// Round-trips values through `T`, rejecting the ones that don't deserialize into it
pub struct SerdeCodec<T> {
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: core::marker::PhantomData,
        }
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SerdeCodec<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn round_trip(value: Value) -> Result<Value, CodecError> {
        let typed = serde_json::from_value::<T>(value).map_err(|err| CodecError::new([Issue::new("", err.to_string())]))?;
        serde_json::to_value(typed).map_err(|err| CodecError::new([Issue::new("", err.to_string())]))
    }
}

impl<T> Codec for SerdeCodec<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn decode(&self, value: Value) -> Result<Value, CodecError> {
        Self::round_trip(value)
    }

    fn encode(&self, value: Value) -> Result<Value, CodecError> {
        Self::round_trip(value)
    }
}
