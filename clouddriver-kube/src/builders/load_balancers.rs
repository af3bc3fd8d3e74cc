use crate::document;
use crate::kinds::{self, SpinnakerKind};
use crate::model::{
    HealthState, LoadBalancer, LoadBalancerHealth, LoadBalancerInstance, LoadBalancerServerGroup,
    CLOUD_PROVIDER,
};
use crate::resolver::Relationships;
use crate::resource::TaggedResource;
use crate::sort::{sort_by_fields, LOAD_BALANCER_ORDER, SERVER_GROUP_ORDER};

use super::{api_version, moniker};

pub fn is_load_balancer(resource: &TaggedResource) -> bool {
    kinds::classify(resource.kind()) == SpinnakerKind::LoadBalancers
}

pub fn build(resources: &[TaggedResource], relationships: &Relationships) -> Vec<LoadBalancer> {
    let mut balancers: Vec<_> = resources
        .iter()
        .filter(|r| is_load_balancer(r))
        .map(|lb| build_one(lb, relationships))
        .collect();
    sort_by_fields(&mut balancers, LOAD_BALANCER_ORDER);
    balancers
}

pub fn build_one(balancer: &TaggedResource, relationships: &Relationships) -> LoadBalancer {
    let mut server_groups: Vec<_> = relationships
        .selectors
        .fronted_by(balancer)
        .iter()
        .map(|group| server_group(group, relationships))
        .collect();
    sort_by_fields(&mut server_groups, SERVER_GROUP_ORDER);

    LoadBalancer {
        account: balancer.account.clone(),
        account_name: balancer.account.clone(),
        api_version: api_version(balancer),
        cloud_provider: CLOUD_PROVIDER,
        created_time: balancer.created_time(),
        display_name: balancer.name().to_string(),
        kind: balancer.spinnaker_kind(),
        labels: balancer.labels(),
        moniker: moniker(balancer, balancer.cluster()),
        name: balancer.display_name(),
        namespace: balancer.namespace().to_string(),
        region: balancer.namespace().to_string(),
        server_groups,
    }
}

fn server_group(group: &TaggedResource, relationships: &Relationships) -> LoadBalancerServerGroup {
    let mut instances: Vec<_> = relationships
        .owners
        .pods(group)
        .into_iter()
        .map(|pod| LoadBalancerInstance {
            id: pod.uid().to_string(),
            name: pod.name().to_string(),
            zone: pod.namespace().to_string(),
            health: LoadBalancerHealth::container(HealthState::from_phase(document::pod_phase(
                &pod.object,
            ))),
        })
        .collect();
    sort_by_fields(&mut instances, &["zone", "name"]);

    LoadBalancerServerGroup {
        account: group.account.clone(),
        cloud_provider: CLOUD_PROVIDER,
        instances,
        name: group.display_name(),
        namespace: group.namespace().to_string(),
        region: group.namespace().to_string(),
    }
}
