//! Node annotation collaborators.
//!
//! Adapters read node state from the `Node` objects the scheduler hands
//! them; the only write they perform is marking their handshake annotation
//! when a node is cleaned up. Writes go through [`NodeAnnotator`] so the
//! adapters can be exercised without a cluster.

use std::collections::BTreeMap;

use accel_sched_core::AnnotationRegistry;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use tracing::{debug, info};

use crate::{DeviceError, Result};

/// Timestamp layout used inside handshake annotation values.
pub const HANDSHAKE_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// How long a node may stay in the `Requesting` state before it is unhealthy.
pub const HANDSHAKE_TIMEOUT_SECS: i64 = 60;

/// Writes annotations onto Kubernetes nodes.
#[async_trait]
pub trait NodeAnnotator: Send + Sync {
    /// Merge `annotations` into the node's existing annotations.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be patched.
    async fn patch_node_annotations(
        &self,
        node_name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<()>;
}

/// [`NodeAnnotator`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeNodeAnnotator {
    client: Client,
}

impl KubeNodeAnnotator {
    /// Create an annotator with a pre-configured client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn nodes_api(&self) -> Api<Node> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl NodeAnnotator for KubeNodeAnnotator {
    async fn patch_node_annotations(
        &self,
        node_name: &str,
        annotations: BTreeMap<String, String>,
    ) -> Result<()> {
        let patch = serde_json::json!({
            "metadata": { "annotations": annotations }
        });

        self.nodes_api()
            .patch(node_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!(node = node_name, ?annotations, "Patched node annotations");
        Ok(())
    }
}

/// Mark a device family's handshake annotation on a node as deleted.
///
/// # Errors
///
/// Returns [`DeviceError::UnregisteredFamily`] if the family has no
/// handshake key, or the annotator's error.
pub async fn mark_annotations_to_delete(
    annotator: &dyn NodeAnnotator,
    registry: &AnnotationRegistry,
    device_type: &str,
    node_name: &str,
) -> Result<()> {
    let key = registry
        .handshake_key(device_type)
        .ok_or_else(|| DeviceError::UnregisteredFamily(device_type.to_string()))?;

    let value = format!("Deleted_{}", Utc::now().format(HANDSHAKE_TIME_FORMAT));
    let mut patch = BTreeMap::new();
    patch.insert(key.to_string(), value);

    annotator.patch_node_annotations(node_name, patch).await?;

    info!(
        node = node_name,
        device_type,
        annotation = key,
        "Marked device annotations for deletion"
    );
    Ok(())
}

/// Evaluate a node's handshake annotation for a device family.
///
/// Returns `(healthy, needs_update)`:
/// - `Requesting_<time>`: healthy until the request is older than
///   [`HANDSHAKE_TIMEOUT_SECS`]; no update needed.
/// - `Deleted...`: healthy, no update needed.
/// - anything else, including no annotation: healthy, needs an update.
#[must_use]
pub fn check_health(registry: &AnnotationRegistry, device_type: &str, node: &Node) -> (bool, bool) {
    check_health_at(registry, device_type, node, Utc::now())
}

/// [`check_health`] evaluated at a fixed instant.
#[must_use]
pub fn check_health_at(
    registry: &AnnotationRegistry,
    device_type: &str,
    node: &Node,
    now: DateTime<Utc>,
) -> (bool, bool) {
    let handshake = registry
        .handshake_key(device_type)
        .and_then(|key| node.metadata.annotations.as_ref()?.get(key))
        .map_or("", String::as_str);

    if handshake.contains("Requesting") {
        let requested_at = handshake
            .split('_')
            .nth(1)
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, HANDSHAKE_TIME_FORMAT).ok())
            .map(|t| t.and_utc());
        let healthy = requested_at
            .is_some_and(|t| now < t + TimeDelta::seconds(HANDSHAKE_TIMEOUT_SECS));
        (healthy, false)
    } else if handshake.contains("Deleted") {
        (true, false)
    } else {
        (true, true)
    }
}

/// An in-memory annotator for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// A mock annotator that records patches per node.
    #[derive(Default)]
    pub struct MockNodeAnnotator {
        nodes: Mutex<HashMap<String, BTreeMap<String, String>>>,
        patch_count: Mutex<usize>,
        fail_with: Option<String>,
    }

    impl MockNodeAnnotator {
        /// Create a new mock annotator.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose patches always fail with `message`.
        #[must_use]
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                fail_with: Some(message.into()),
                ..Self::default()
            }
        }

        /// Annotations written to a node so far.
        #[must_use]
        pub fn annotations(&self, node_name: &str) -> BTreeMap<String, String> {
            self.nodes.lock().get(node_name).cloned().unwrap_or_default()
        }

        /// Number of successful patches.
        #[must_use]
        pub fn patch_count(&self) -> usize {
            *self.patch_count.lock()
        }
    }

    #[async_trait]
    impl NodeAnnotator for MockNodeAnnotator {
        async fn patch_node_annotations(
            &self,
            node_name: &str,
            annotations: BTreeMap<String, String>,
        ) -> Result<()> {
            if let Some(message) = &self.fail_with {
                return Err(DeviceError::PatchFailed(message.clone()));
            }
            self.nodes
                .lock()
                .entry(node_name.to_string())
                .or_default()
                .extend(annotations);
            *self.patch_count.lock() += 1;
            Ok(())
        }
    }
}
