use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::quantity::Quantity;

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_PODS: &str = "pods";
pub const RESOURCE_NVIDIA_GPU: &str = "alpha.kubernetes.io/nvidia-gpu";

/// Prefix of operator defined resources which are counted as integers.
pub const OPAQUE_INT_RESOURCE_PREFIX: &str = "pod.alpha.kubernetes.io/opaque-int-resource-";

pub const DEFAULT_NAMESPACE: &str = "default";

/// Map from resource name to its quantity. Ordered to keep rendered reviews stable.
pub type ResourceList = BTreeMap<String, Quantity>;

pub fn is_opaque_int_resource_name(name: &str) -> bool {
    name.len() > OPAQUE_INT_RESOURCE_PREFIX.len() && name.starts_with(OPAQUE_INT_RESOURCE_PREFIX)
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    /// Set for namespaced objects only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::is_opaque_int_resource_name;

    #[test]
    fn test_opaque_int_resource_names() {
        assert!(is_opaque_int_resource_name(
            "pod.alpha.kubernetes.io/opaque-int-resource-foo"
        ));
        assert!(!is_opaque_int_resource_name(
            "pod.alpha.kubernetes.io/opaque-int-resource-"
        ));
        assert!(!is_opaque_int_resource_name("example.com/dongle"));
        assert!(!is_opaque_int_resource_name("cpu"));
    }
}
