use std::collections::BTreeMap;

use crate::annotations;
use crate::model::{Clusters, ProjectCluster};
use crate::resource::TaggedResource;
use crate::sort::{sort_by_fields, APPLICATION_ORDER};

/// Account to cluster names, from objects carrying a cluster annotation.
pub fn build<'a>(resources: impl IntoIterator<Item = &'a TaggedResource>) -> Clusters {
    let mut clusters = Clusters::new();
    for resource in resources {
        if let Some(cluster) = annotations::cluster(&resource.object) {
            clusters
                .entry(resource.account.clone())
                .or_default()
                .push(cluster.to_string());
        }
    }
    for names in clusters.values_mut() {
        names.sort();
        names.dedup();
    }
    clusters
}

/// Clusters per project application. Every application is listed, with or
/// without clusters.
pub fn by_application(
    resources: &[TaggedResource],
    applications: &[String],
) -> Vec<ProjectCluster> {
    let mut grouped: BTreeMap<&str, Vec<&TaggedResource>> = applications
        .iter()
        .map(|app| (app.as_str(), Vec::new()))
        .collect();
    for resource in resources {
        if let Some(bucket) = grouped.get_mut(resource.application.as_str()) {
            bucket.push(resource);
        }
    }

    let mut projects: Vec<_> = grouped
        .into_iter()
        .map(|(application, resources)| ProjectCluster {
            application: application.to_string(),
            clusters: build(resources),
        })
        .collect();
    sort_by_fields(&mut projects, APPLICATION_ORDER);
    projects
}
