//! Read operations over every configured account.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::timeout;
use tracing::warn;

use crate::builders::{
    applications, clusters, load_balancers, server_group_managers, server_groups,
};
use crate::client::{
    Account, AccountFilter, AccountStore, ClientProvider, KubeconfigClientProvider,
    StaticAccountStore,
};
use crate::collector::{collect, CollectRequest, Collection};
use crate::config::Config;
use crate::document;
use crate::error::{Error, Result};
use crate::kinds::{self, SpinnakerKind};
use crate::model::{
    Application, Clusters, ConsoleOutput, InstanceConsole, LoadBalancer, ProjectCluster,
    ServerGroup, ServerGroupManager,
};
use crate::resolver::{traffic, Relationships};
use crate::resource::TaggedResource;
use crate::sort::sort_by_fields;

const MANAGER_KINDS: &[&str] = &[kinds::DEPLOYMENT, kinds::REPLICA_SET];
const SERVER_GROUP_KINDS: &[&str] = &[
    kinds::REPLICA_SET,
    kinds::DAEMON_SET,
    kinds::STATEFUL_SET,
    kinds::POD,
    kinds::SERVICE,
];
const LOAD_BALANCER_KINDS: &[&str] = &[
    kinds::SERVICE,
    kinds::INGRESS,
    kinds::REPLICA_SET,
    kinds::STATEFUL_SET,
    kinds::POD,
];
const CLUSTER_KINDS: &[&str] = &[
    kinds::DEPLOYMENT,
    kinds::REPLICA_SET,
    kinds::STATEFUL_SET,
    kinds::DAEMON_SET,
    kinds::SERVICE,
    kinds::INGRESS,
];

/// Splits `"<kind> <name>"`.
pub fn parse_name(name: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [kind, name] => Ok((*kind, *name)),
        _ => Err(Error::invalid(
            "name",
            format!("expected \"<kind> <name>\", got {name:?}"),
        )),
    }
}

fn is_kind_of(kind: &str, category: SpinnakerKind) -> bool {
    kinds::classify(kind) == category
}

/// Store errors other than caller mistakes fail the whole request as
/// unavailable.
fn store_failure(error: Error) -> Error {
    if error.is_client_error() {
        error
    } else {
        Error::AccountStore(error.to_string())
    }
}

pub struct Aggregator {
    config: Config,
    accounts: Arc<dyn AccountStore>,
    clients: Arc<dyn ClientProvider>,
}

impl Aggregator {
    pub fn new(
        config: Config,
        accounts: Arc<dyn AccountStore>,
        clients: Arc<dyn ClientProvider>,
    ) -> Self {
        Self {
            config,
            accounts,
            clients,
        }
    }

    /// Accounts from the config, clusters from the local kubeconfig.
    pub fn from_config(config: Config) -> Self {
        let accounts = Arc::new(StaticAccountStore::from_config(&config));
        Self::new(config, accounts, Arc::new(KubeconfigClientProvider))
    }

    async fn resolve_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let names = self
            .accounts
            .list_accounts(filter)
            .await
            .map_err(store_failure)?;
        let mut accounts = Vec::with_capacity(names.len());
        for name in names {
            accounts.push(self.accounts.get_account(&name).await.map_err(store_failure)?);
        }
        Ok(accounts)
    }

    async fn gather(
        &self,
        filter: AccountFilter,
        kinds: &[&str],
        applications: Vec<String>,
        list_timeout: Duration,
    ) -> Result<Collection> {
        let accounts = self.resolve_accounts(&filter).await?;
        let request =
            CollectRequest::new(kinds, accounts, list_timeout).for_applications(applications);
        Ok(collect(Arc::clone(&self.clients), request, &self.config).await)
    }

    async fn gather_application(&self, application: &str, kinds: &[&str]) -> Result<Collection> {
        self.gather(
            AccountFilter::Application(application.to_string()),
            kinds,
            vec![application.to_string()],
            self.config.list_timeout,
        )
        .await
    }

    /// Every object of `kinds` in one namespace of one account. A
    /// namespace-scoped account only answers for its own namespace.
    async fn gather_namespace(
        &self,
        account: &str,
        namespace: &str,
        kinds: &[&str],
    ) -> Result<Option<Collection>> {
        let account = self
            .accounts
            .get_account(account)
            .await
            .map_err(store_failure)?;
        let scoped = account.namespace.is_some();
        if scoped && account.namespace.as_deref() != Some(namespace) {
            return Ok(None);
        }
        let account = if scoped {
            account
        } else {
            account.with_namespace(namespace)
        };
        let request = CollectRequest::new(kinds, vec![account], self.config.list_timeout);
        Ok(Some(
            collect(Arc::clone(&self.clients), request, &self.config).await,
        ))
    }

    #[tracing::instrument(skip(self))]
    pub async fn applications(&self) -> Result<Vec<Application>> {
        let collection = self
            .gather(AccountFilter::All, CLUSTER_KINDS, Vec::new(), self.config.list_timeout)
            .await?;
        Ok(applications::build(&collection.resources))
    }

    #[tracing::instrument(skip(self))]
    pub async fn server_group_managers(
        &self,
        application: &str,
    ) -> Result<Vec<ServerGroupManager>> {
        let collection = self.gather_application(application, MANAGER_KINDS).await?;
        let relationships = Relationships::resolve(&collection.resources);
        Ok(server_group_managers::build(&collection.resources, &relationships))
    }

    #[tracing::instrument(skip(self))]
    pub async fn server_groups(&self, application: &str) -> Result<Vec<ServerGroup>> {
        let collection = self.gather_application(application, SERVER_GROUP_KINDS).await?;
        let relationships = Relationships::resolve(&collection.resources);
        let groups = collection
            .resources
            .iter()
            .filter(|r| server_groups::is_server_group(r));
        let disabled =
            traffic::disabled_server_groups(groups, &collection.clients, self.config.get_timeout)
                .await;
        Ok(server_groups::build(&collection.resources, &relationships, &disabled))
    }

    #[tracing::instrument(skip(self))]
    pub async fn server_group(
        &self,
        account: &str,
        namespace: &str,
        name: &str,
    ) -> Result<ServerGroup> {
        let (kind, name) = parse_name(name)?;
        if !is_kind_of(kind, SpinnakerKind::ServerGroups) {
            return Err(Error::invalid("name", format!("{kind} is not a server group kind")));
        }
        let collection = self
            .gather_namespace(account, namespace, SERVER_GROUP_KINDS)
            .await?
            .ok_or_else(|| not_found(account, namespace, kind, name))?;
        let group = find(&collection.resources, kind, name, namespace)
            .ok_or_else(|| not_found(account, namespace, kind, name))?;

        let relationships = Relationships::resolve(&collection.resources);
        let disabled =
            traffic::disabled_server_groups([group], &collection.clients, self.config.get_timeout)
                .await;
        Ok(server_groups::build_one(group, &relationships, &disabled))
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_balancers(&self, application: &str) -> Result<Vec<LoadBalancer>> {
        let collection = self.gather_application(application, LOAD_BALANCER_KINDS).await?;
        let relationships = Relationships::resolve(&collection.resources);
        Ok(load_balancers::build(&collection.resources, &relationships))
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_balancer(
        &self,
        account: &str,
        namespace: &str,
        name: &str,
    ) -> Result<LoadBalancer> {
        let (kind, name) = parse_name(name)?;
        if !is_kind_of(kind, SpinnakerKind::LoadBalancers) {
            return Err(Error::invalid("name", format!("{kind} is not a load balancer kind")));
        }
        let collection = self
            .gather_namespace(account, namespace, LOAD_BALANCER_KINDS)
            .await?
            .ok_or_else(|| not_found(account, namespace, kind, name))?;
        let balancer = find(&collection.resources, kind, name, namespace)
            .ok_or_else(|| not_found(account, namespace, kind, name))?;

        let relationships = Relationships::resolve(&collection.resources);
        Ok(load_balancers::build_one(balancer, &relationships))
    }

    #[tracing::instrument(skip(self))]
    pub async fn clusters(&self, application: &str) -> Result<Clusters> {
        let collection = self.gather_application(application, CLUSTER_KINDS).await?;
        Ok(clusters::build(&collection.resources))
    }

    /// Clusters of every application in the project, under the longer
    /// project list timeout.
    #[tracing::instrument(skip(self))]
    pub async fn project_clusters(&self, project: &str) -> Result<Vec<ProjectCluster>> {
        let applications = self
            .accounts
            .project_applications(project)
            .await
            .map_err(store_failure)?;
        let collection = self
            .gather(
                AccountFilter::Project(project.to_string()),
                CLUSTER_KINDS,
                applications.clone(),
                self.config.project_list_timeout,
            )
            .await?;
        Ok(clusters::by_application(&collection.resources, &applications))
    }

    /// Logs of every container of a pod, sorted by container name. A
    /// container whose logs cannot be read reports the error as its output.
    #[tracing::instrument(skip(self))]
    pub async fn instance_console(
        &self,
        account: &str,
        namespace: &str,
        name: &str,
    ) -> Result<InstanceConsole> {
        let (kind, pod) = parse_name(name)?;
        if !kind.eq_ignore_ascii_case(kinds::POD) {
            return Err(Error::invalid("name", format!("{kind} is not a pod")));
        }
        let account = self.accounts.get_account(account).await.map_err(store_failure)?;
        let client = self.clients.client_for(&account).await?;
        timeout(self.config.namespace_timeout, client.discover())
            .await
            .map_err(|_| Error::timeout("discovery", self.config.namespace_timeout))??;

        let get_timeout = self.config.get_timeout;
        let manifest = client.get(kinds::POD, pod, namespace, get_timeout).await?;

        let mut reads: FuturesUnordered<_> = document::container_names(&manifest)
            .into_iter()
            .map(|container| {
                let client = Arc::clone(&client);
                async move {
                    let output = match client.logs(pod, namespace, &container, get_timeout).await {
                        Ok(text) => text,
                        Err(error) => {
                            warn!(%container, %error, "container logs unavailable");
                            format!("failed to read logs: {error}")
                        }
                    };
                    ConsoleOutput {
                        name: container,
                        output,
                    }
                }
            })
            .collect();

        let mut output = Vec::new();
        while let Some(console) = reads.next().await {
            output.push(console);
        }
        sort_by_fields(&mut output, &["name"]);
        Ok(InstanceConsole { output })
    }
}

fn find<'a>(
    resources: &'a [TaggedResource],
    kind: &str,
    name: &str,
    namespace: &str,
) -> Option<&'a TaggedResource> {
    resources
        .iter()
        .find(|r| r.is_kind(kind) && r.name() == name && r.namespace() == namespace)
}

fn not_found(account: &str, namespace: &str, kind: &str, name: &str) -> Error {
    Error::NotFound {
        account: account.to_string(),
        namespace: namespace.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::annotations::{APPLICATION, CLUSTER, DEPLOYMENT_REVISION, LOAD_BALANCERS};
    use crate::client::ClusterClient;
    use crate::config::AccountConfig;
    use crate::testing::{
        annotate, deployment, in_namespace, pod, replica_set, service, with_owners, FakeCluster,
        FakeProvider,
    };
    use async_trait::async_trait;
    use http::StatusCode;
    use k8s_openapi::serde_json::json;

    fn store(accounts: &[&str]) -> Arc<StaticAccountStore> {
        Arc::new(StaticAccountStore::new(
            accounts
                .iter()
                .map(|name| AccountConfig {
                    name: name.to_string(),
                    ..AccountConfig::default()
                })
                .collect(),
            BTreeMap::from([("shop".to_string(), vec!["web".to_string(), "api".to_string()])]),
        ))
    }

    fn aggregator(clusters: Vec<FakeCluster>) -> Aggregator {
        let names: Vec<String> = clusters.iter().map(|c| c.account().to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let store = store(&names);
        let provider = FakeProvider::new(clusters.into_iter().map(Arc::new));
        Aggregator::new(Config::default(), store, Arc::new(provider))
    }

    fn web_replica_set() -> kube::api::DynamicObject {
        annotate(
            with_owners(
                replica_set("web-rs1", "r1", json!({ "app": "web", "version": "1" })),
                &[("Deployment", "web", "d1")],
            ),
            DEPLOYMENT_REVISION,
            "3",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn manager_survives_unreachable_account() {
        let a = FakeCluster::new("a")
            .with(deployment("web", "d1"))
            .with(web_replica_set());
        let b = FakeCluster::new("b")
            .with(deployment("web", "d2"))
            .slow(Duration::from_secs(60));

        let managers = aggregator(vec![a, b]).server_group_managers("web").await.unwrap();

        assert_eq!(managers.len(), 1);
        let manager = &managers[0];
        assert_eq!(manager.account, "a");
        assert_eq!(manager.display_name, "web");
        assert_eq!(manager.server_groups.len(), 1);
        assert_eq!(manager.server_groups[0].name, "replicaSet web-rs1");
        assert_eq!(manager.server_groups[0].moniker.sequence, Some(3));
    }

    #[tokio::test]
    async fn server_groups_flag_disabled_traffic() {
        let canary = annotate(
            replica_set("web-rs2", "r2", json!({ "app": "web", "version": "2" })),
            LOAD_BALANCERS,
            r#"["service web"]"#,
        );
        let a = FakeCluster::new("a")
            .with(annotate(web_replica_set(), LOAD_BALANCERS, r#"["service web"]"#))
            .with(canary)
            .with(service("web", "s1", json!({ "app": "web", "version": "1" })))
            .with(with_owners(
                pod("web-rs1-x", "p1", "Running"),
                &[("ReplicaSet", "web-rs1", "r1")],
            ));

        let groups = aggregator(vec![a]).server_groups("web").await.unwrap();

        let summary: Vec<_> = groups
            .iter()
            .map(|g| (g.name.as_str(), g.is_disabled, g.instances.len()))
            .collect();
        assert_eq!(
            summary,
            vec![("replicaSet web-rs1", false, 1), ("replicaSet web-rs2", true, 0)]
        );
        assert_eq!(groups[0].load_balancers, vec!["service web"]);
    }

    #[tokio::test]
    async fn single_server_group_lookup() {
        let a = FakeCluster::new("a")
            .with(deployment("web", "d1"))
            .with(web_replica_set());
        let aggregator = aggregator(vec![a]);

        let group = aggregator
            .server_group("a", "default", "replicaSet web-rs1")
            .await
            .unwrap();
        assert_eq!(group.moniker.sequence, Some(3));

        let missing = aggregator
            .server_group("a", "default", "replicaSet web-rs9")
            .await
            .unwrap_err();
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        for bad in ["web-rs1", "replicaSet web rs1", "", "deployment web"] {
            let err = aggregator.server_group("a", "default", bad).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{bad:?}");
        }

        let unknown = aggregator
            .server_group("nope", "default", "replicaSet web-rs1")
            .await
            .unwrap_err();
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn scoped_account_answers_only_for_its_namespace() {
        let cluster = FakeCluster::new("scoped")
            .with(web_replica_set())
            .with(in_namespace(
                replica_set("web-rs1", "r9", json!({ "app": "web" })),
                "team-a",
            ));
        let store = Arc::new(StaticAccountStore::new(
            vec![AccountConfig {
                name: "scoped".into(),
                namespace: Some("team-a".into()),
                ..AccountConfig::default()
            }],
            BTreeMap::new(),
        ));
        let provider = Arc::new(FakeProvider::new([Arc::new(cluster)]));
        let aggregator = Aggregator::new(Config::default(), store, provider);

        let outside = aggregator
            .server_group("scoped", "default", "replicaSet web-rs1")
            .await
            .unwrap_err();
        assert_eq!(outside.status_code(), StatusCode::NOT_FOUND);

        let inside = aggregator
            .server_group("scoped", "team-a", "replicaSet web-rs1")
            .await
            .unwrap();
        assert_eq!(inside.namespace, "team-a");

        let balancer = aggregator
            .load_balancer("scoped", "default", "service web")
            .await
            .unwrap_err();
        assert_eq!(balancer.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn single_load_balancer_lookup() {
        let a = FakeCluster::new("a")
            .with(web_replica_set())
            .with(service("web", "s1", json!({ "app": "web" })));

        let balancer = aggregator(vec![a])
            .load_balancer("a", "default", "service web")
            .await
            .unwrap();

        assert_eq!(balancer.name, "service web");
        assert_eq!(balancer.server_groups[0].name, "replicaSet web-rs1");
    }

    #[tokio::test]
    async fn applications_and_clusters_span_accounts() {
        let a = FakeCluster::new("a")
            .with(annotate(deployment("web", "d1"), CLUSTER, "deployment web"))
            .with(annotate(
                annotate(deployment("api", "d2"), APPLICATION, "api"),
                CLUSTER,
                "deployment api",
            ));
        let b = FakeCluster::new("b").with(annotate(
            deployment("web", "d3"),
            CLUSTER,
            "deployment web",
        ));
        let aggregator = aggregator(vec![a, b]);

        let apps = aggregator.applications().await.unwrap();
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["api", "web"]);
        assert_eq!(apps[1].cluster_names.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let clusters = aggregator.clusters("web").await.unwrap();
        assert_eq!(clusters["a"], vec!["deployment web"]);
        assert_eq!(clusters["b"], vec!["deployment web"]);

        let projects = aggregator.project_clusters("shop").await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].application, "api");
        assert_eq!(projects[0].clusters["a"], vec!["deployment api"]);
        assert_eq!(projects[1].clusters.len(), 2);

        let err = aggregator.project_clusters("missing").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn console_output_sorted_by_container() {
        let a = FakeCluster::new("a")
            .with(pod("web-1", "p1", "Running"))
            .with_logs("web-1", "web", "listening on :8080");
        let console = aggregator(vec![a])
            .instance_console("a", "default", "pod web-1")
            .await
            .unwrap();

        let names: Vec<_> = console.output.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["envoy", "web"]);
        assert!(console.output[0].output.starts_with("failed to read logs"));
        assert_eq!(console.output[1].output, "listening on :8080");
    }

    struct BrokenStore;

    #[async_trait]
    impl AccountStore for BrokenStore {
        async fn list_accounts(&self, _filter: &AccountFilter) -> Result<Vec<String>> {
            Err(Error::Io(std::io::Error::other("connection reset")))
        }

        async fn get_account(&self, name: &str) -> Result<Account> {
            Err(Error::AccountStore(format!("cannot load {name}")))
        }

        async fn project_applications(&self, _project: &str) -> Result<Vec<String>> {
            Err(Error::AccountStore("down".into()))
        }
    }

    #[tokio::test]
    async fn account_store_outage_fails_request() {
        let aggregator = Aggregator::new(
            Config::default(),
            Arc::new(BrokenStore),
            Arc::new(FakeProvider::default()),
        );
        let err = aggregator.server_group_managers("web").await.unwrap_err();
        assert!(matches!(err, Error::AccountStore(_)));
        assert!(err.status_code().is_server_error());
    }

    #[test]
    fn parses_composite_names() {
        assert_eq!(parse_name("replicaSet web-rs1").unwrap(), ("replicaSet", "web-rs1"));
        assert!(parse_name("replicaSet").is_err());
        assert!(parse_name("a b c").is_err());
    }
}
