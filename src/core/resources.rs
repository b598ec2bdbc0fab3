//! Aggregation of the resources a pod requests over all of its containers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::common::{
    is_opaque_int_resource_name, RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_NVIDIA_GPU,
};
use crate::core::pod::Pod;
use crate::core::quantity::{Quantity, QuantityFormat};

/// Aggregated resource vector of a pod. Only dimensions a capacity review reports are
/// collected, requests of any other resource are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDemand {
    pub cpu: Quantity,
    pub memory: Quantity,
    #[serde(rename = "nvidiaGPU")]
    pub nvidia_gpu: Quantity,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub opaque_int_resources: BTreeMap<String, u64>,
}

impl Default for ResourceDemand {
    fn default() -> Self {
        Self {
            cpu: Quantity::zero(QuantityFormat::DecimalSI),
            memory: Quantity::zero(QuantityFormat::BinarySI),
            nvidia_gpu: Quantity::zero(QuantityFormat::DecimalSI),
            opaque_int_resources: Default::default(),
        }
    }
}

impl ResourceDemand {
    pub fn of_pod(pod: &Pod) -> Self {
        let mut demand = Self::default();
        for container in pod.spec.containers.iter() {
            for (name, quantity) in container.resources.requests.iter() {
                match name.as_str() {
                    RESOURCE_CPU => demand.cpu.add(quantity),
                    RESOURCE_MEMORY => demand.memory.add(quantity),
                    RESOURCE_NVIDIA_GPU => demand.nvidia_gpu.add(quantity),
                    _ if is_opaque_int_resource_name(name) => {
                        let total = demand.opaque_int_resources.entry(name.clone()).or_default();
                        *total = total.saturating_add(quantity.value());
                    }
                    _ => {}
                }
            }
        }
        demand
    }

    pub fn add(&mut self, other: &ResourceDemand) {
        self.cpu.add(&other.cpu);
        self.memory.add(&other.memory);
        self.nvidia_gpu.add(&other.nvidia_gpu);
        for (name, value) in other.opaque_int_resources.iter() {
            let total = self.opaque_int_resources.entry(name.clone()).or_default();
            *total = total.saturating_add(*value);
        }
    }

    pub fn sub(&mut self, other: &ResourceDemand) {
        self.cpu.sub(&other.cpu);
        self.memory.sub(&other.memory);
        self.nvidia_gpu.sub(&other.nvidia_gpu);
        for (name, value) in other.opaque_int_resources.iter() {
            if let Some(total) = self.opaque_int_resources.get_mut(name) {
                *total = total.saturating_sub(*value);
            }
        }
        self.opaque_int_resources.retain(|_, total| *total > 0);
    }

    /// True if no dimension is requested at all.
    pub fn is_zero(&self) -> bool {
        self.cpu.is_zero()
            && self.memory.is_zero()
            && self.nvidia_gpu.is_zero()
            && self.opaque_int_resources.values().all(|value| *value == 0)
    }
}
