use std::collections::HashSet;

use crate::document;
use crate::kinds::{self, SpinnakerKind};
use crate::model::{
    BuildInfo, Capacity, InstanceCounts, ManagerRef, ServerGroup, CLOUD_PROVIDER,
};
use crate::resolver::Relationships;
use crate::resource::TaggedResource;
use crate::sort::{sort_by_fields, SERVER_GROUP_ORDER};

use super::{api_version, instance, moniker, owning_deployment};

pub fn is_server_group(resource: &TaggedResource) -> bool {
    kinds::classify(resource.kind()) == SpinnakerKind::ServerGroups
}

pub fn build(
    resources: &[TaggedResource],
    relationships: &Relationships,
    disabled: &HashSet<(&str, &str)>,
) -> Vec<ServerGroup> {
    let mut groups: Vec<_> = resources
        .iter()
        .filter(|r| is_server_group(r))
        .map(|g| build_one(g, relationships, disabled))
        .collect();
    sort_by_fields(&mut groups, SERVER_GROUP_ORDER);
    groups
}

struct Counts {
    desired: i64,
    total: i64,
    up: i64,
}

fn counts(group: &TaggedResource) -> Counts {
    let obj = &group.object;
    if group.is_kind(kinds::DAEMON_SET) {
        let desired =
            document::i64_at(obj, &["status", "desiredNumberScheduled"]).unwrap_or_default();
        Counts {
            desired,
            total: desired,
            up: document::i64_at(obj, &["status", "numberReady"]).unwrap_or_default(),
        }
    } else {
        Counts {
            desired: document::i64_at(obj, &["spec", "replicas"]).unwrap_or_default(),
            total: document::i64_at(obj, &["status", "replicas"]).unwrap_or_default(),
            up: document::i64_at(obj, &["status", "readyReplicas"]).unwrap_or_default(),
        }
    }
}

pub fn build_one(
    group: &TaggedResource,
    relationships: &Relationships,
    disabled: &HashSet<(&str, &str)>,
) -> ServerGroup {
    let Counts { desired, total, up } = counts(group);

    let mut instances: Vec<_> = relationships
        .owners
        .pods(group)
        .into_iter()
        .map(instance)
        .collect();
    sort_by_fields(&mut instances, SERVER_GROUP_ORDER);

    let mut load_balancers: Vec<_> = relationships
        .selectors
        .fronting(group)
        .iter()
        .map(|lb| lb.display_name())
        .collect();
    load_balancers.sort();
    load_balancers.dedup();

    let mut server_group_managers: Vec<_> = group
        .owner_names(kinds::DEPLOYMENT)
        .map(|name| ManagerRef {
            account: group.account.clone(),
            location: group.namespace().to_string(),
            name: name.to_string(),
        })
        .collect();
    server_group_managers.sort_by(|a, b| a.name.cmp(&b.name));

    let cluster = annotated_or_owner_cluster(group);

    ServerGroup {
        account: group.account.clone(),
        account_name: group.account.clone(),
        api_version: api_version(group),
        build_info: BuildInfo {
            images: document::template_images(&group.object),
        },
        capacity: Capacity {
            desired,
            min: desired,
            max: desired,
            pinned: false,
        },
        cloud_provider: CLOUD_PROVIDER,
        created_time: group.created_time(),
        display_name: group.name().to_string(),
        instance_counts: InstanceCounts {
            down: (total - up).max(0),
            total,
            up,
            ..InstanceCounts::default()
        },
        instances,
        is_disabled: disabled.contains(&group.key()),
        kind: group.spinnaker_kind(),
        labels: group.labels(),
        load_balancers,
        moniker: moniker(group, cluster),
        name: group.display_name(),
        namespace: group.namespace().to_string(),
        region: group.namespace().to_string(),
        server_group_managers,
    }
}

/// Cluster annotation, else the owning Deployment, else the group itself.
fn annotated_or_owner_cluster(group: &TaggedResource) -> String {
    crate::annotations::cluster(&group.object)
        .map(str::to_string)
        .or_else(|| owning_deployment(group))
        .unwrap_or_else(|| group.display_name())
}
