use std::collections::{HashMap, HashSet};

use crate::resource::TaggedResource;

/// Parent UID to the children that name it in `ownerReferences`.
///
/// A child with several owner references is indexed under each of them.
/// Lookups only return children from the parent's own account.
#[derive(Debug, Default)]
pub struct OwnerIndex<'a> {
    children: HashMap<&'a str, Vec<&'a TaggedResource>>,
}

impl<'a> OwnerIndex<'a> {
    pub fn build(resources: impl IntoIterator<Item = &'a TaggedResource>) -> Self {
        let mut children: HashMap<&'a str, Vec<&'a TaggedResource>> = HashMap::new();
        for resource in resources {
            for uid in resource.owner_uids() {
                children.entry(uid).or_default().push(resource);
            }
        }
        Self { children }
    }

    pub fn children(
        &self,
        parent: &TaggedResource,
    ) -> impl Iterator<Item = &'a TaggedResource> + '_ {
        let account = parent.account.clone();
        let uid = parent.uid();
        let found = if uid.is_empty() {
            None
        } else {
            self.children.get(uid)
        };
        found
            .into_iter()
            .flatten()
            .copied()
            .filter(move |child| child.account == account)
    }

    pub fn children_of_kind(&self, parent: &TaggedResource, kind: &str) -> Vec<&'a TaggedResource> {
        self.children(parent).filter(|c| c.is_kind(kind)).collect()
    }

    /// Pods owned by `parent`, de-duplicated by UID.
    pub fn pods(&self, parent: &TaggedResource) -> Vec<&'a TaggedResource> {
        dedup_pods(self.children_of_kind(parent, "pod"))
    }
}

/// Sorts pods by `(namespace, name)` and keeps the first pod seen per UID.
pub fn dedup_pods(mut pods: Vec<&TaggedResource>) -> Vec<&TaggedResource> {
    pods.sort_by(|a, b| (a.namespace(), a.name()).cmp(&(b.namespace(), b.name())));
    let mut seen = HashSet::new();
    pods.retain(|pod| seen.insert(pod.uid().to_string()));
    pods
}
