//! Hygon DCU adapter.
//!
//! Nodes advertise their DCUs in [`REGISTER_ANNOS`]; containers ask for
//! them through three extended resources (count, memory, cores) whose names
//! come from [`DcuConfig`]. Pods can narrow the eligible card models with
//! [`DCU_IN_USE`] or rule models out with [`DCU_NO_USE`].

use std::collections::BTreeMap;
use std::sync::Arc;

use accel_sched_core::{
    decode_node_devices, encode_node_devices, encode_pod_single_device, AnnotationRegistry,
    ContainerDeviceRequest, DeviceAnnotationKeys, DeviceInfo, DeviceUsage, PodDevices,
};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Node, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::{debug, error, info};

use crate::config::DcuConfig;
use crate::devices::{Devices, TypeCheck};
use crate::node::{self, NodeAnnotator};
use crate::quantity::{quantity_as_i64, saturate_i32};
use crate::{DeviceError, Result};

/// Node annotation carrying the DCU registration handshake.
pub const HANDSHAKE_ANNOS: &str = "hami.io/node-handshake-dcu";
/// Node annotation carrying the encoded DCU inventory.
pub const REGISTER_ANNOS: &str = "hami.io/node-dcu-register";
/// Device family name used in requests.
pub const DCU_DEVICE: &str = "DCU";
/// Family name used in the device table.
pub const DCU_COMMON_WORD: &str = "DCU";
/// Pod annotation listing card models to use.
pub const DCU_IN_USE: &str = "hygon.com/use-dcutype";
/// Pod annotation listing card models to avoid.
pub const DCU_NO_USE: &str = "hygon.com/nouse-dcutype";

/// Pod annotation for devices requested for allocation.
pub const IN_REQUEST_DEVICES_ANNOS: &str = "hami.io/vgpu-devices-to-allocate";
/// Pod annotation for devices allocated.
pub const SUPPORT_DEVICES_ANNOS: &str = "hami.io/vgpu-devices-allocated";

/// The DCU implementation of [`Devices`].
pub struct DcuDevices {
    config: DcuConfig,
    registry: Arc<AnnotationRegistry>,
    keys: DeviceAnnotationKeys,
    annotator: Arc<dyn NodeAnnotator>,
}

impl DcuDevices {
    /// Register the DCU annotation keys.
    ///
    /// Must run before the registry is shared.
    pub fn register(registry: &mut AnnotationRegistry) {
        registry.register(
            DCU_DEVICE,
            DeviceAnnotationKeys {
                in_request: IN_REQUEST_DEVICES_ANNOS.to_string(),
                supported: SUPPORT_DEVICES_ANNOS.to_string(),
                handshake: HANDSHAKE_ANNOS.to_string(),
            },
        );
    }

    /// Create the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnregisteredFamily`] if [`Self::register`] was
    /// not called on `registry`.
    pub fn new(
        config: DcuConfig,
        registry: Arc<AnnotationRegistry>,
        annotator: Arc<dyn NodeAnnotator>,
    ) -> Result<Self> {
        let keys = registry.keys(DCU_DEVICE)?.clone();
        Ok(Self {
            config,
            registry,
            keys,
            annotator,
        })
    }

    /// The resource names this adapter reads.
    #[must_use]
    pub fn config(&self) -> &DcuConfig {
        &self.config
    }
}

#[async_trait]
impl Devices for DcuDevices {
    fn common_word(&self) -> &'static str {
        DCU_COMMON_WORD
    }

    fn mutate_admission(&self, container: &Container) -> bool {
        container
            .resources
            .as_ref()
            .and_then(|r| r.limits.as_ref())
            .is_some_and(|limits| limits.contains_key(&self.config.resource_count))
    }

    fn get_node_devices(&self, node: &Node) -> Result<Vec<DeviceInfo>> {
        let node_name = node.metadata.name.as_deref().unwrap_or_default();

        let Some(encoded) = node
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(REGISTER_ANNOS))
        else {
            return Err(DeviceError::AnnotationNotFound {
                node: node_name.to_string(),
                key: REGISTER_ANNOS.to_string(),
            });
        };

        let devices = decode_node_devices(encoded).map_err(|source| {
            error!(
                node = node_name,
                annotation = %encoded,
                error = %source,
                "Failed to decode node devices"
            );
            DeviceError::Decode {
                node: node_name.to_string(),
                source,
            }
        })?;

        if devices.is_empty() {
            info!(node = node_name, annotation = %encoded, "No DCU device found");
            return Err(DeviceError::NoDevices {
                node: node_name.to_string(),
            });
        }

        debug!(
            node = node_name,
            devices = %encode_node_devices(&devices),
            "Node device information"
        );
        Ok(devices)
    }

    async fn node_cleanup(&self, node_name: &str) -> Result<()> {
        node::mark_annotations_to_delete(
            self.annotator.as_ref(),
            &self.registry,
            DCU_DEVICE,
            node_name,
        )
        .await
    }

    fn check_health(&self, device_type: &str, node: &Node) -> (bool, bool) {
        node::check_health(&self.registry, device_type, node)
    }

    fn check_type(
        &self,
        annotations: &BTreeMap<String, String>,
        device: &DeviceUsage,
        request: &ContainerDeviceRequest,
    ) -> TypeCheck {
        if request.device_type == DCU_DEVICE {
            TypeCheck {
                family_matches: true,
                device_eligible: check_dcu_type(annotations, &device.device_type),
                numeric_range: false,
            }
        } else {
            TypeCheck::default()
        }
    }

    fn generate_resource_requests(&self, container: &Container) -> ContainerDeviceRequest {
        info!("Counting dcu devices");
        let resources = container.resources.as_ref();

        let Some(nums) = resource_quantity(resources, &self.config.resource_count)
            .and_then(quantity_as_i64)
        else {
            return ContainerDeviceRequest::default();
        };
        info!(count = nums, "Found dcu devices");

        let memreq = resource_quantity(resources, &self.config.resource_memory)
            .and_then(quantity_as_i64)
            .unwrap_or(0);
        let coresreq = resource_quantity(resources, &self.config.resource_cores)
            .and_then(quantity_as_i64)
            .unwrap_or(0);

        let mem_percentagereq = if memreq == 0 { 100 } else { 0 };

        ContainerDeviceRequest {
            nums: saturate_i32(nums),
            device_type: DCU_DEVICE.to_string(),
            memreq: saturate_i32(memreq),
            mem_percentagereq,
            coresreq: saturate_i32(coresreq),
        }
    }

    fn patch_annotations(
        &self,
        annotations: &mut BTreeMap<String, String>,
        pod_devices: &PodDevices,
    ) -> BTreeMap<String, String> {
        if let Some(devices) = pod_devices.get(DCU_DEVICE).filter(|d| !d.is_empty()) {
            let encoded = encode_pod_single_device(devices);
            annotations.insert(self.keys.in_request.clone(), encoded.clone());
            annotations.insert(self.keys.supported.clone(), encoded.clone());
            debug!(key = %self.keys.in_request, value = %encoded, "Pod add annotation");
            debug!(key = %self.keys.supported, value = %encoded, "Pod add annotation");
        }
        annotations.clone()
    }
}

/// Decide whether a card model is eligible under a pod's type filters.
///
/// [`DCU_IN_USE`], when present, decides alone: the card must contain one of
/// its comma-separated tokens. Otherwise [`DCU_NO_USE`] rules out cards that
/// contain any of its tokens. Without either annotation every card is
/// eligible. Containment is case-insensitive and substring-based, so `K1`
/// matches both `K100` and `K10`.
#[must_use]
pub fn check_dcu_type(annotations: &BTreeMap<String, String>, card_type: &str) -> bool {
    let card_type = card_type.to_uppercase();
    let contains_any = |list: &str| {
        list.split(',')
            .any(|token| card_type.contains(&token.to_uppercase()))
    };

    if let Some(in_use) = annotations.get(DCU_IN_USE) {
        return contains_any(in_use);
    }
    if let Some(no_use) = annotations.get(DCU_NO_USE) {
        return !contains_any(no_use);
    }
    true
}

/// Look up a resource in limits, falling back to requests.
fn resource_quantity<'a>(
    resources: Option<&'a ResourceRequirements>,
    name: &str,
) -> Option<&'a Quantity> {
    let resources = resources?;
    resources
        .limits
        .as_ref()
        .and_then(|l| l.get(name))
        .or_else(|| resources.requests.as_ref().and_then(|r| r.get(name)))
}
