/// Spinnaker category a Kubernetes kind is rendered as.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SpinnakerKind {
    Configs,
    Instances,
    LoadBalancers,
    SecurityGroups,
    ServerGroupManagers,
    ServerGroups,
    Unclassified,
}

pub const DEPLOYMENT: &str = "deployment";
pub const REPLICA_SET: &str = "replicaSet";
pub const STATEFUL_SET: &str = "statefulSet";
pub const DAEMON_SET: &str = "daemonSet";
pub const POD: &str = "pod";
pub const SERVICE: &str = "service";
pub const INGRESS: &str = "ingress";

/// Kind classification, keyed by the lower-camel kind name Spinnaker uses.
static KIND_TABLE: &[(&str, SpinnakerKind)] = &[
    ("configMap", SpinnakerKind::Configs),
    ("controllerRevision", SpinnakerKind::Unclassified),
    ("cronJob", SpinnakerKind::Unclassified),
    ("daemonSet", SpinnakerKind::ServerGroups),
    ("deployment", SpinnakerKind::ServerGroupManagers),
    ("event", SpinnakerKind::Unclassified),
    ("horizontalPodAutoscaler", SpinnakerKind::Unclassified),
    ("ingress", SpinnakerKind::LoadBalancers),
    ("job", SpinnakerKind::Unclassified),
    ("namespace", SpinnakerKind::Unclassified),
    ("networkPolicy", SpinnakerKind::SecurityGroups),
    ("persistentVolume", SpinnakerKind::Configs),
    ("persistentVolumeClaim", SpinnakerKind::Configs),
    ("pod", SpinnakerKind::Instances),
    ("podDisruptionBudget", SpinnakerKind::Unclassified),
    ("replicaSet", SpinnakerKind::ServerGroups),
    ("role", SpinnakerKind::Unclassified),
    ("roleBinding", SpinnakerKind::Unclassified),
    ("secret", SpinnakerKind::Configs),
    ("service", SpinnakerKind::LoadBalancers),
    ("serviceAccount", SpinnakerKind::Unclassified),
    ("statefulSet", SpinnakerKind::ServerGroups),
    ("storageClass", SpinnakerKind::Unclassified),
];

pub fn classify(kind: &str) -> SpinnakerKind {
    KIND_TABLE
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(kind))
        .map(|(_, c)| *c)
        .unwrap_or(SpinnakerKind::Unclassified)
}

/// `ReplicaSet` -> `replicaSet`, the spelling used in monikers and names.
pub fn lower_camel(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
