use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client connection a call arrives on
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    id: String,
    #[serde(default)]
    data: Value,
}

impl Connection {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: Value::Null,
        }
    }

    /// Transport-defined data, e.g. headers or an authenticated principal
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }
}
