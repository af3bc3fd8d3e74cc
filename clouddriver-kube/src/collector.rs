//! Concurrent fan-out over accounts and kinds.
//!
//! One task per account runs discovery, then spawns one task per kind. Every
//! task holds a clone of the same bounded sender, so the receiver sees the
//! channel close exactly when the last account and the last kind are done.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use kube::api::DynamicObject;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::annotations;
use crate::client::{Account, ClientProvider, ClusterClient, ListOptions};
use crate::config::Config;
use crate::resource::TaggedResource;

#[derive(Clone, Debug)]
pub struct CollectRequest {
    pub kinds: Vec<String>,
    pub accounts: Vec<Account>,
    /// Applications to keep. Empty keeps every object, tagged with its own
    /// application annotation.
    pub applications: Vec<String>,
    pub list_timeout: Duration,
}

impl CollectRequest {
    pub fn new(kinds: &[&str], accounts: Vec<Account>, list_timeout: Duration) -> Self {
        Self {
            kinds: kinds.iter().map(|k| k.to_string()).collect(),
            accounts,
            applications: Vec::new(),
            list_timeout,
        }
    }

    pub fn for_applications(mut self, applications: Vec<String>) -> Self {
        self.applications = applications;
        self
    }
}

/// Everything one fan-out produced, in arrival order.
#[derive(Default)]
pub struct Collection {
    pub resources: Vec<TaggedResource>,
    /// Discovered clients by account, for follow-up lookups.
    pub clients: BTreeMap<String, Arc<dyn ClusterClient>>,
}

enum Message {
    Discovered {
        account: String,
        client: Arc<dyn ClusterClient>,
    },
    Resource(TaggedResource),
}

struct Shared {
    request: CollectRequest,
    label_selector: String,
    discovery_timeout: Duration,
}

#[tracing::instrument(skip_all, fields(accounts = request.accounts.len(), kinds = ?request.kinds))]
pub async fn collect(
    provider: Arc<dyn ClientProvider>,
    request: CollectRequest,
    config: &Config,
) -> Collection {
    let deadline = Instant::now() + config.request_deadline;
    let (tx, mut rx) = mpsc::channel(config.channel_capacity.max(1));
    let cancel = CancellationToken::new();

    let shared = Arc::new(Shared {
        request,
        label_selector: config.label_selector.clone(),
        discovery_timeout: config.namespace_timeout,
    });

    for account in shared.request.accounts.iter().cloned() {
        let provider = Arc::clone(&provider);
        let shared = Arc::clone(&shared);
        let cancel = cancel.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = collect_account(provider, account, shared, tx) => {}
            }
        });
    }
    drop(tx);

    let mut collection = Collection::default();
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(Message::Discovered { account, client })) => {
                collection.clients.insert(account, client);
            }
            Ok(Some(Message::Resource(resource))) => collection.resources.push(resource),
            Ok(None) => break,
            Err(_) => {
                warn!(
                    received = collection.resources.len(),
                    "request deadline reached, returning partial results"
                );
                break;
            }
        }
    }
    cancel.cancel();

    debug!(resources = collection.resources.len(), "collection complete");
    collection
}

#[tracing::instrument(skip_all, fields(account = %account.name))]
async fn collect_account(
    provider: Arc<dyn ClientProvider>,
    account: Account,
    shared: Arc<Shared>,
    tx: mpsc::Sender<Message>,
) {
    let client = match provider.client_for(&account).await {
        Ok(client) => client,
        Err(error) => {
            warn!(account = %account.name, %error, "no client for account, skipping");
            return;
        }
    };

    match timeout(shared.discovery_timeout, client.discover()).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            warn!(account = %account.name, %error, "discovery failed, skipping account");
            return;
        }
        Err(_) => {
            warn!(
                account = %account.name,
                after = ?shared.discovery_timeout,
                "discovery timed out, skipping account"
            );
            return;
        }
    }

    let discovered = Message::Discovered {
        account: account.name.clone(),
        client: Arc::clone(&client),
    };
    if tx.send(discovered).await.is_err() {
        return;
    }

    let options = ListOptions {
        label_selector: shared.label_selector.clone(),
        namespace: account.namespace.clone(),
        timeout: shared.request.list_timeout,
    };

    let mut tasks = JoinSet::new();
    for kind in &shared.request.kinds {
        tasks.spawn(collect_kind(
            Arc::clone(&client),
            kind.clone(),
            options.clone(),
            Arc::clone(&shared),
            tx.clone(),
        ));
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(error) = joined {
            warn!(account = %account.name, %error, "kind task aborted");
        }
    }
}

async fn collect_kind(
    client: Arc<dyn ClusterClient>,
    kind: String,
    options: ListOptions,
    shared: Arc<Shared>,
    tx: mpsc::Sender<Message>,
) {
    let account = client.account().to_string();
    let objects = match client.list(&kind, &options).await {
        Ok(objects) => objects,
        Err(error) => {
            warn!(%account, %kind, %error, "list failed, omitting kind");
            return;
        }
    };
    debug!(%account, %kind, count = objects.len(), "listed");

    for mut obj in objects {
        annotations::normalize(&mut obj);
        let Some(resource) = tag(&account, &shared.request.applications, obj) else {
            continue;
        };
        if tx.send(Message::Resource(resource)).await.is_err() {
            return;
        }
    }
}

/// Tags an object with its account and the requested application it belongs
/// to, or drops it when it belongs to none of them.
fn tag(account: &str, applications: &[String], obj: DynamicObject) -> Option<TaggedResource> {
    let owner = annotations::application(&obj).unwrap_or_default().to_string();
    if applications.is_empty() {
        return Some(TaggedResource::new(account, owner, obj));
    }
    applications
        .iter()
        .find(|app| **app == owner)
        .map(|app| TaggedResource::new(account, app.clone(), obj))
}
