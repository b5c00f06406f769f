//! The capability contract every device adapter implements.

use std::collections::BTreeMap;

use accel_sched_core::{ContainerDeviceRequest, DeviceInfo, DeviceUsage, PodDevices};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Node};

use crate::Result;

/// Outcome of matching a container request against one physical device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCheck {
    /// The request names this adapter's device family.
    pub family_matches: bool,
    /// The physical device passes the request's type filters.
    pub device_eligible: bool,
    /// The device falls in a requested numeric type range.
    ///
    /// Reserved for adapters that match on model numbers.
    pub numeric_range: bool,
}

impl TypeCheck {
    /// Whether the device can serve the request.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.family_matches && self.device_eligible
    }
}

/// The `Devices` trait is the interface one vendor's device family exposes
/// to the scheduler and the admission webhook.
///
/// Everything except node cleanup is a synchronous computation over its
/// arguments plus configuration fixed at construction.
#[async_trait]
pub trait Devices: Send + Sync {
    /// The family name this adapter is registered under.
    fn common_word(&self) -> &'static str;

    /// Whether the container declares a limit for this family's count
    /// resource, i.e. whether the webhook should mutate it.
    fn mutate_admission(&self, container: &Container) -> bool;

    /// Decode the node's registered inventory for this family.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DeviceError::AnnotationNotFound`] if the node never
    /// registered, [`crate::DeviceError::Decode`] if the registration is
    /// malformed, and [`crate::DeviceError::NoDevices`] if it lists nothing.
    fn get_node_devices(&self, node: &Node) -> Result<Vec<DeviceInfo>>;

    /// Mark this family's node annotations for deletion.
    ///
    /// # Errors
    ///
    /// Propagates the annotator's error unchanged.
    async fn node_cleanup(&self, node_name: &str) -> Result<()>;

    /// Evaluate the node's registration handshake.
    ///
    /// Returns `(healthy, needs_update)`.
    fn check_health(&self, device_type: &str, node: &Node) -> (bool, bool);

    /// Match a container request against one physical device.
    fn check_type(
        &self,
        annotations: &BTreeMap<String, String>,
        device: &DeviceUsage,
        request: &ContainerDeviceRequest,
    ) -> TypeCheck;

    /// Derive the container's request for this family.
    ///
    /// Returns the default record when the container does not use it.
    fn generate_resource_requests(&self, container: &Container) -> ContainerDeviceRequest;

    /// Record the pod's assigned devices of this family in `annotations`.
    ///
    /// Returns a copy of the resulting map.
    fn patch_annotations(
        &self,
        annotations: &mut BTreeMap<String, String>,
        pod_devices: &PodDevices,
    ) -> BTreeMap<String, String>;
}
