use std::collections::BTreeMap;

use crate::model::Application;
use crate::resource::TaggedResource;
use crate::sort::{sort_by_fields, APPLICATION_ORDER};

use super::clusters;

/// Applications named by the collected objects, with their cluster names
/// per account.
pub fn build(resources: &[TaggedResource]) -> Vec<Application> {
    let mut grouped: BTreeMap<&str, Vec<&TaggedResource>> = BTreeMap::new();
    for resource in resources {
        let app = resource.moniker_app();
        if !app.is_empty() {
            grouped.entry(app).or_default().push(resource);
        }
    }

    let mut applications: Vec<_> = grouped
        .into_iter()
        .map(|(name, resources)| Application {
            name: name.to_string(),
            attributes: BTreeMap::from([("name".to_string(), name.to_string())]),
            cluster_names: clusters::build(resources),
        })
        .collect();
    sort_by_fields(&mut applications, APPLICATION_ORDER);
    applications
}
