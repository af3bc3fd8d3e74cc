use std::cmp::Ordering;

/// Field lookup for key-tuple sorting.
pub trait SortFields {
    fn sort_field(&self, field: &str) -> Option<&str>;
}

pub const SERVER_GROUP_ORDER: &[&str] = &["account", "namespace", "kind", "name"];
pub const LOAD_BALANCER_ORDER: &[&str] = &["account", "region", "kind", "name"];
pub const APPLICATION_ORDER: &[&str] = &["name"];

/// Sorts ascending by the given fields in order; missing fields sort first.
pub fn sort_by_fields<T: SortFields>(data: &mut [T], fields: &[&str]) {
    data.sort_by(|a, b| {
        fields
            .iter()
            .map(|field| {
                let a_val = a.sort_field(field).unwrap_or_default();
                let b_val = b.sort_field(field).unwrap_or_default();
                a_val.cmp(b_val)
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
