use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::annotations::DEFAULT_LABEL_SELECTOR;
use crate::error::Result;

/// Runtime settings for the aggregation engine.
///
/// Durations are whole seconds in the serialized form.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Server-side selector restricting listings to Spinnaker-managed objects.
    pub label_selector: String,
    #[serde(deserialize_with = "seconds")]
    pub list_timeout: Duration,
    #[serde(deserialize_with = "seconds")]
    pub project_list_timeout: Duration,
    #[serde(deserialize_with = "seconds")]
    pub get_timeout: Duration,
    #[serde(deserialize_with = "seconds")]
    pub namespace_timeout: Duration,
    /// Upper bound for a whole fan-out; whatever arrived by then is returned.
    #[serde(deserialize_with = "seconds")]
    pub request_deadline: Duration,
    pub channel_capacity: usize,
    pub accounts: Vec<AccountConfig>,
    pub projects: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountConfig {
    pub name: String,
    /// Kubeconfig context; the account name is used when unset.
    pub context: Option<String>,
    /// Restricts every listing on this account to a single namespace.
    pub namespace: Option<String>,
    /// Applications deployed to this account. Empty means all of them.
    pub applications: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            list_timeout: Duration::from_secs(10),
            project_list_timeout: Duration::from_secs(30),
            get_timeout: Duration::from_secs(10),
            namespace_timeout: Duration::from_secs(5),
            request_deadline: Duration::from_secs(60),
            channel_capacity: 10_000,
            accounts: Vec::new(),
            projects: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    #[tracing::instrument]
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }
}

fn seconds<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}
