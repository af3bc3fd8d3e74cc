//! Per-account cluster access and the account store the engine reads from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject};

use crate::error::Result;

pub mod accounts;
pub mod cluster;

pub use accounts::{Account, AccountFilter, AccountStore, StaticAccountStore};
pub use cluster::{KubeClusterClient, KubeconfigClientProvider};

/// Server-side filters and time budget for one list call.
#[derive(Clone, Debug)]
pub struct ListOptions {
    pub label_selector: String,
    pub namespace: Option<String>,
    pub timeout: Duration,
}

/// Handle on one account's cluster.
///
/// `discover` must complete before `list` or `get` run; implementations
/// reject calls made before that.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    fn account(&self) -> &str;

    async fn discover(&self) -> Result<()>;

    async fn list(&self, kind: &str, options: &ListOptions) -> Result<Vec<DynamicObject>>;

    async fn get(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        timeout: Duration,
    ) -> Result<DynamicObject>;

    async fn gvr_for_kind(&self, kind: &str) -> Result<ApiResource>;

    async fn logs(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        timeout: Duration,
    ) -> Result<String>;
}

#[async_trait]
pub trait ClientProvider: Send + Sync {
    async fn client_for(&self, account: &Account) -> Result<Arc<dyn ClusterClient>>;
}
