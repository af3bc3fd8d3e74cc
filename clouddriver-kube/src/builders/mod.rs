//! Pure functions from a collection and its relationships to entity views.

pub mod applications;
pub mod clusters;
pub mod load_balancers;
pub mod server_group_managers;
pub mod server_groups;

use crate::model::{HealthState, Instance, Moniker, CLOUD_PROVIDER};
use crate::resource::TaggedResource;
use crate::{document, kinds};

fn api_version(resource: &TaggedResource) -> String {
    resource
        .object
        .types
        .as_ref()
        .map(|t| t.api_version.clone())
        .unwrap_or_default()
}

fn moniker(resource: &TaggedResource, cluster: String) -> Moniker {
    Moniker {
        app: resource.moniker_app().to_string(),
        cluster,
        sequence: resource.sequence(),
    }
}

/// `"deployment <name>"` of the first Deployment owning `resource`.
fn owning_deployment(resource: &TaggedResource) -> Option<String> {
    resource
        .owner_names(kinds::DEPLOYMENT)
        .next()
        .map(|name| format!("{} {name}", kinds::DEPLOYMENT))
}

fn instance(pod: &TaggedResource) -> Instance {
    Instance {
        account: pod.account.clone(),
        api_version: api_version(pod),
        cloud_provider: CLOUD_PROVIDER,
        created_time: pod.created_time(),
        display_name: pod.name().to_string(),
        health_state: HealthState::from_phase(document::pod_phase(&pod.object)),
        kind: pod.spinnaker_kind(),
        labels: pod.labels(),
        moniker: moniker(pod, pod.cluster()),
        name: pod.display_name(),
        namespace: pod.namespace().to_string(),
        region: pod.namespace().to_string(),
        uid: pod.uid().to_string(),
    }
}
