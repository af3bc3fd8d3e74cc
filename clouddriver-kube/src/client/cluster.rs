use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ApiResource, DynamicObject, ListParams, LogParams, ResourceExt},
    config::KubeConfigOptions,
    core::TypeMeta,
    discovery::{ApiCapabilities, Discovery, Scope},
    Client, Config,
};
use tokio::sync::RwLock;
use tokio::time::timeout;

use super::{Account, ClientProvider, ClusterClient, ListOptions};
use crate::error::{Error, Result};

/// [`ClusterClient`] over a kube-rs [`Client`].
///
/// Kind resolution reads a discovery snapshot taken once by `discover`; no
/// listing or lookup is attempted before that snapshot exists.
pub struct KubeClusterClient {
    account: String,
    client: Client,
    discovery: RwLock<Option<Arc<Discovery>>>,
}

impl KubeClusterClient {
    pub fn new(account: impl Into<String>, client: Client) -> Self {
        Self {
            account: account.into(),
            client,
            discovery: RwLock::new(None),
        }
    }

    #[tracing::instrument]
    pub async fn from_account(account: &Account) -> Result<Self> {
        let options = KubeConfigOptions {
            context: account.context.clone(),
            cluster: None,
            user: None,
        };
        let config = Config::from_kubeconfig(&options).await?;
        let client = Client::try_from(config)?;
        Ok(Self::new(account.name.clone(), client))
    }

    async fn resolve(&self, kind: &str) -> Result<(ApiResource, ApiCapabilities)> {
        let guard = self.discovery.read().await;
        let discovery = guard
            .as_ref()
            .ok_or_else(|| Error::NotDiscovered(self.account.clone()))?;
        resolve_api_resource(discovery, kind).ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }
}

/// Finds a served resource by kind or plural name, case-insensitively.
/// Core, `apps` and `networking.k8s.io` win over legacy groups such as
/// `extensions` serving the same kind.
fn resolve_api_resource(
    discovery: &Discovery,
    name: &str,
) -> Option<(ApiResource, ApiCapabilities)> {
    discovery
        .groups()
        .flat_map(|group| group.recommended_resources())
        .filter(|(ar, _)| {
            ar.kind.eq_ignore_ascii_case(name) || ar.plural.eq_ignore_ascii_case(name)
        })
        .min_by(|(a, _), (b, _)| group_rank(&a.group).cmp(&group_rank(&b.group)))
}

fn group_rank(group: &str) -> (u8, &str) {
    match group {
        "" => (0, group),
        "apps" => (1, group),
        "networking.k8s.io" => (2, group),
        _ => (3, group),
    }
}

fn dynamic_api(
    ar: &ApiResource,
    caps: &ApiCapabilities,
    client: Client,
    namespace: Option<&str>,
) -> Api<DynamicObject> {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) if caps.scope == Scope::Namespaced => Api::namespaced_with(client, ns, ar),
        _ => Api::all_with(client, ar),
    }
}

fn normalize_listed(obj: &mut DynamicObject, ar: &ApiResource) {
    obj.managed_fields_mut().clear();
    if obj.types.is_none() {
        obj.types = Some(TypeMeta {
            kind: ar.kind.clone(),
            api_version: ar.api_version.clone(),
        });
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    fn account(&self) -> &str {
        &self.account
    }

    #[tracing::instrument(skip(self), fields(account = %self.account))]
    async fn discover(&self) -> Result<()> {
        let mut guard = self.discovery.write().await;
        if guard.is_some() {
            return Ok(());
        }
        let discovery = Discovery::new(self.client.clone()).run().await?;
        *guard = Some(Arc::new(discovery));
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(account = %self.account))]
    async fn list(&self, kind: &str, options: &ListOptions) -> Result<Vec<DynamicObject>> {
        let (ar, caps) = self.resolve(kind).await?;
        let api = dynamic_api(&ar, &caps, self.client.clone(), options.namespace.as_deref());

        let mut params = ListParams::default();
        if !options.label_selector.is_empty() {
            params = params.labels(&options.label_selector);
        }

        let mut list = timeout(options.timeout, api.list(&params))
            .await
            .map_err(|_| Error::timeout(format!("list {kind}"), options.timeout))??;

        for obj in &mut list.items {
            normalize_listed(obj, &ar);
        }
        Ok(list.items)
    }

    #[tracing::instrument(skip(self), fields(account = %self.account))]
    async fn get(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        timeout_after: Duration,
    ) -> Result<DynamicObject> {
        let (ar, caps) = self.resolve(kind).await?;
        let api = dynamic_api(&ar, &caps, self.client.clone(), Some(namespace));

        let mut obj = timeout(timeout_after, api.get(name))
            .await
            .map_err(|_| Error::timeout(format!("get {kind} {name}"), timeout_after))??;
        normalize_listed(&mut obj, &ar);
        Ok(obj)
    }

    async fn gvr_for_kind(&self, kind: &str) -> Result<ApiResource> {
        self.resolve(kind).await.map(|(ar, _)| ar)
    }

    #[tracing::instrument(skip(self), fields(account = %self.account))]
    async fn logs(
        &self,
        pod: &str,
        namespace: &str,
        container: &str,
        timeout_after: Duration,
    ) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            ..LogParams::default()
        };
        let text = timeout(timeout_after, pods.logs(pod, &params))
            .await
            .map_err(|_| Error::timeout(format!("logs {pod}/{container}"), timeout_after))??;
        Ok(text)
    }
}

/// Builds one fresh [`KubeClusterClient`] per account and request from the
/// account's kubeconfig context.
#[derive(Clone, Debug, Default)]
pub struct KubeconfigClientProvider;

#[async_trait]
impl ClientProvider for KubeconfigClientProvider {
    async fn client_for(&self, account: &Account) -> Result<Arc<dyn ClusterClient>> {
        let client = KubeClusterClient::from_account(account).await?;
        Ok(Arc::new(client))
    }
}
