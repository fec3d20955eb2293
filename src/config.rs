//! # Config
//!
//! Repository tuning shared by every entity repository.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Repository configuration.
///
/// Deserializes from camelCase keys with every field optional, for example
/// `{"queryTimeout": 5, "maxLimit": 100}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Time allowed for a store call when the request context carries no
    /// deadline of its own. Expressed in seconds when serialized.
    #[serde(with = "seconds", skip_serializing_if = "Option::is_none")]
    pub query_timeout: Option<Duration>,

    /// Upper bound applied to every list limit, including unbounded lists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<u64>,
}

impl Config {
    /// Set the default store call timeout.
    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the upper bound for list limits.
    #[must_use]
    pub const fn max_limit(mut self, max_limit: u64) -> Self {
        self.max_limit = Some(max_limit);
        self
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>, serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_f64(duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let Some(secs) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        Duration::try_from_secs_f64(secs).map(Some).map_err(serde::de::Error::custom)
    }
}
