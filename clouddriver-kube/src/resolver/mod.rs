//! Relationship reconstruction between loosely typed objects.

pub mod owners;
pub mod selectors;
pub mod traffic;

pub use owners::{dedup_pods, OwnerIndex};
pub use selectors::{selector_matches, SelectorIndex};

use crate::resource::TaggedResource;

/// Ownership and routing relations over one collection.
#[derive(Debug, Default)]
pub struct Relationships<'a> {
    pub owners: OwnerIndex<'a>,
    pub selectors: SelectorIndex<'a>,
}

impl<'a> Relationships<'a> {
    pub fn resolve(resources: &'a [TaggedResource]) -> Self {
        Self {
            owners: OwnerIndex::build(resources),
            selectors: SelectorIndex::build(resources),
        }
    }
}
