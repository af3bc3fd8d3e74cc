//! Disabled server group detection through the traffic annotation.
//!
//! A server group declares the services meant to route to it. When a declared
//! service exists but its selector no longer covers the group's pod-template
//! labels, traffic has been cut off and the group is disabled.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use k8s_openapi::serde_json;
use kube::api::DynamicObject;
use tracing::warn;

use super::selectors::selector_matches;
use crate::annotations;
use crate::client::ClusterClient;
use crate::document;
use crate::kinds;
use crate::resource::TaggedResource;

/// Service names listed in the load-balancers annotation. Entries that are
/// not exactly `"service <name>"` are ignored.
pub fn declared_load_balancers(group: &TaggedResource) -> Vec<String> {
    let Some(raw) = annotations::load_balancers(&group.object) else {
        return Vec::new();
    };
    let entries: Vec<String> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(
                account = %group.account,
                name = %group.display_name(),
                %error,
                "malformed load balancer annotation"
            );
            return Vec::new();
        }
    };
    entries
        .iter()
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split_whitespace().collect();
            match parts.as_slice() {
                [kind, name] if kind.eq_ignore_ascii_case(kinds::SERVICE) => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}

pub fn disables(service: &DynamicObject, group: &TaggedResource) -> bool {
    let selector = document::selector(service).unwrap_or_default();
    let labels = document::template_labels(&group.object).unwrap_or_default();
    !selector_matches(&selector, &labels)
}

/// Keys of the groups cut off from at least one declared service. Services
/// that cannot be fetched are skipped.
#[tracing::instrument(skip_all)]
pub async fn disabled_server_groups<'a>(
    groups: impl IntoIterator<Item = &'a TaggedResource>,
    clients: &BTreeMap<String, Arc<dyn ClusterClient>>,
    timeout: Duration,
) -> HashSet<(&'a str, &'a str)> {
    let mut lookups = FuturesUnordered::new();
    for group in groups {
        let Some(client) = clients.get(&group.account) else {
            continue;
        };
        for name in declared_load_balancers(group) {
            let client = Arc::clone(client);
            lookups.push(async move {
                match client.get(kinds::SERVICE, &name, group.namespace(), timeout).await {
                    Ok(service) => disables(&service, group).then(|| group.key()),
                    Err(error) => {
                        warn!(
                            account = %group.account,
                            service = %name,
                            %error,
                            "declared load balancer unavailable"
                        );
                        None
                    }
                }
            });
        }
    }

    let mut disabled = HashSet::new();
    while let Some(found) = lookups.next().await {
        disabled.extend(found);
    }
    disabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::LOAD_BALANCERS;
    use crate::testing::{annotate, replica_set, service, tagged, FakeCluster};
    use k8s_openapi::serde_json::json;

    fn group(name: &str, uid: &str, declared: &str) -> TaggedResource {
        tagged(
            "a",
            annotate(
                replica_set(name, uid, json!({ "app": "web", "version": "1" })),
                LOAD_BALANCERS,
                declared,
            ),
        )
    }

    #[test]
    fn only_service_entries_are_declared() {
        let declared =
            r#"["service web", "ingress web", "service", "Service  canary", "a b c"]"#;
        let g = group("web-rs1", "r1", declared);
        assert_eq!(declared_load_balancers(&g), vec!["web", "canary"]);
        assert!(declared_load_balancers(&group("web-rs2", "r2", "service web")).is_empty());
    }

    #[tokio::test]
    async fn mismatching_service_disables_group() {
        let cluster = FakeCluster::new("a")
            .with(service("web", "s1", json!({ "app": "web" })))
            .with(service("web-v2", "s2", json!({ "app": "web", "version": "2" })));
        cluster.discover().await.unwrap();
        let clients: BTreeMap<String, Arc<dyn ClusterClient>> =
            BTreeMap::from([("a".to_string(), Arc::new(cluster) as Arc<dyn ClusterClient>)]);

        let groups = vec![
            group("enabled", "r1", r#"["service web"]"#),
            group("disabled", "r2", r#"["service web", "service web-v2"]"#),
            group("ingress-only", "r3", r#"["ingress web-v2"]"#),
            group("missing", "r4", r#"["service gone"]"#),
            group("malformed", "r5", "service web-v2"),
        ];

        let disabled = disabled_server_groups(&groups, &clients, Duration::from_secs(10)).await;

        assert_eq!(disabled, HashSet::from([("a", "r2")]));
    }
}
