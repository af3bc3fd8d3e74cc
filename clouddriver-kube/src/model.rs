//! Entity views rendered back to Spinnaker.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sort::SortFields;

pub const CLOUD_PROVIDER: &str = "kubernetes";

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Moniker {
    pub app: String,
    pub cluster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

/// Account name to sorted cluster names.
pub type Clusters = BTreeMap<String, Vec<String>>;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub cluster_names: Clusters,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCluster {
    pub application: String,
    pub clusters: Clusters,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerGroupManager {
    pub account: String,
    pub account_name: String,
    pub api_version: String,
    pub cloud_provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    pub display_name: String,
    pub kind: String,
    pub labels: BTreeMap<String, String>,
    pub moniker: Moniker,
    /// `"deployment <name>"`
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub server_groups: Vec<ServerGroupManagerServerGroup>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerGroupManagerServerGroup {
    pub account: String,
    pub moniker: Moniker,
    pub name: String,
    pub namespace: String,
    pub region: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub desired: i64,
    pub min: i64,
    pub max: i64,
    pub pinned: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCounts {
    pub down: i64,
    pub out_of_service: i64,
    pub starting: i64,
    pub total: i64,
    pub unknown: i64,
    pub up: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub images: Vec<String>,
}

/// Reference from a server group to the manager that owns it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerRef {
    pub account: String,
    pub location: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerGroup {
    pub account: String,
    pub account_name: String,
    pub api_version: String,
    pub build_info: BuildInfo,
    pub capacity: Capacity,
    pub cloud_provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    pub display_name: String,
    pub instance_counts: InstanceCounts,
    pub instances: Vec<Instance>,
    pub is_disabled: bool,
    pub kind: String,
    pub labels: BTreeMap<String, String>,
    pub load_balancers: Vec<String>,
    pub moniker: Moniker,
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub server_group_managers: Vec<ManagerRef>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HealthState {
    Up,
    Down,
}

impl HealthState {
    pub fn from_phase(phase: Option<&str>) -> Self {
        match phase {
            Some("Running") | Some("Succeeded") => HealthState::Up,
            _ => HealthState::Down,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub account: String,
    pub api_version: String,
    pub cloud_provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    pub display_name: String,
    pub health_state: HealthState,
    pub kind: String,
    pub labels: BTreeMap<String, String>,
    pub moniker: Moniker,
    /// `"pod <name>"`
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub uid: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub account: String,
    pub account_name: String,
    pub api_version: String,
    pub cloud_provider: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,
    pub display_name: String,
    pub kind: String,
    pub labels: BTreeMap<String, String>,
    pub moniker: Moniker,
    pub name: String,
    pub namespace: String,
    pub region: String,
    pub server_groups: Vec<LoadBalancerServerGroup>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerServerGroup {
    pub account: String,
    pub cloud_provider: &'static str,
    pub instances: Vec<LoadBalancerInstance>,
    pub name: String,
    pub namespace: String,
    pub region: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerInstance {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub health: LoadBalancerHealth,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerHealth {
    pub platform: &'static str,
    pub source: &'static str,
    pub state: HealthState,
}

impl LoadBalancerHealth {
    pub fn container(state: HealthState) -> Self {
        Self {
            platform: "platform",
            source: "Container",
            state,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConsoleOutput {
    pub name: String,
    pub output: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstanceConsole {
    pub output: Vec<ConsoleOutput>,
}

impl SortFields for Application {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for ProjectCluster {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" | "application" => Some(&self.application),
            _ => None,
        }
    }
}

impl SortFields for ServerGroupManager {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "kind" => Some(&self.kind),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for ServerGroupManagerServerGroup {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for ServerGroup {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "kind" => Some(&self.kind),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for Instance {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "kind" => Some(&self.kind),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for LoadBalancer {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "kind" => Some(&self.kind),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for LoadBalancerServerGroup {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "account" => Some(&self.account),
            "namespace" => Some(&self.namespace),
            "region" => Some(&self.region),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for LoadBalancerInstance {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "region" | "zone" => Some(&self.zone),
            "name" => Some(&self.name),
            _ => None,
        }
    }
}

impl SortFields for ConsoleOutput {
    fn sort_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            _ => None,
        }
    }
}
