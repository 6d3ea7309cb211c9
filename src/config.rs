use core::time::Duration;
use serde::{Deserialize, Deserializer};

/// Config of an [`crate::api::Api`]
/// ## Fields
/// - `timeout`:
///   Deadline of every async handler, used when neither the procedure nor its namespace sets one.
///   `None` or zero means no deadline. Deserialized from `timeout_ms` in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    #[serde(default, rename = "timeout_ms", deserialize_with = "deserialize_millis")]
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    #[inline]
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

#[cfg(test)]
mod tests {
    use super::ApiConfig;

    use core::time::Duration;
    use serde_json::json;

    #[test]
    fn test_deserialize() {
        let config: ApiConfig = serde_json::from_value(json!({ "timeout_ms": 50 })).unwrap();
        assert_eq!(config.timeout, Some(Duration::from_millis(50)));

        let config: ApiConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, ApiConfig::default());

        let config: ApiConfig = serde_json::from_value(json!({ "timeout_ms": null })).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_with_timeout() {
        assert_eq!(
            ApiConfig::default().with_timeout(Duration::from_secs(1)).timeout,
            Some(Duration::from_secs(1))
        );
    }
}
