use crate::kinds;
use crate::model::{ServerGroupManager, ServerGroupManagerServerGroup, CLOUD_PROVIDER};
use crate::resolver::Relationships;
use crate::resource::TaggedResource;
use crate::sort::{sort_by_fields, SERVER_GROUP_ORDER};

use super::{api_version, moniker};

/// One manager per Deployment, with the ReplicaSets it owns.
pub fn build(
    resources: &[TaggedResource],
    relationships: &Relationships,
) -> Vec<ServerGroupManager> {
    let mut managers: Vec<_> = resources
        .iter()
        .filter(|r| r.is_kind(kinds::DEPLOYMENT))
        .map(|d| build_one(d, relationships))
        .collect();
    sort_by_fields(&mut managers, SERVER_GROUP_ORDER);
    managers
}

fn build_one(deployment: &TaggedResource, relationships: &Relationships) -> ServerGroupManager {
    let cluster = deployment.display_name();

    let mut server_groups: Vec<_> = relationships
        .owners
        .children_of_kind(deployment, kinds::REPLICA_SET)
        .into_iter()
        .map(|rs| ServerGroupManagerServerGroup {
            account: rs.account.clone(),
            moniker: moniker(rs, cluster.clone()),
            name: rs.display_name(),
            namespace: rs.namespace().to_string(),
            region: rs.namespace().to_string(),
        })
        .collect();
    sort_by_fields(&mut server_groups, SERVER_GROUP_ORDER);

    ServerGroupManager {
        account: deployment.account.clone(),
        account_name: deployment.account.clone(),
        api_version: api_version(deployment),
        cloud_provider: CLOUD_PROVIDER,
        created_time: deployment.created_time(),
        display_name: deployment.name().to_string(),
        kind: deployment.spinnaker_kind(),
        labels: deployment.labels(),
        moniker: moniker(deployment, cluster.clone()),
        name: cluster,
        namespace: deployment.namespace().to_string(),
        region: deployment.namespace().to_string(),
        server_groups,
    }
}
