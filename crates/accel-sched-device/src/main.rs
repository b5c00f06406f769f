//! Accel Sched device inspector.
//!
//! Registers every device adapter the way a scheduler does at startup, then
//! walks the cluster's nodes and reports what each adapter sees: the decoded
//! inventory, why a node was skipped, and the handshake health.
//!
//! # Flags
//!
//! - `--node <name>`: inspect a single node instead of all nodes
//! - `--dcu-name`, `--dcu-memory`, `--dcu-cores`: DCU resource names

use std::sync::Arc;

use accel_sched_device::{DeviceConfig, DeviceTable, KubeNodeAnnotator};
use clap::Parser;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inspect accelerator registrations on cluster nodes.
#[derive(Parser, Debug)]
#[command(name = "accel-sched-device")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Only inspect this node.
    #[arg(long, env = "NODE_NAME")]
    node: Option<String>,

    #[command(flatten)]
    devices: DeviceConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Adapters must be configured before anything else touches them
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,accel_sched=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        dcu_name = %args.devices.dcu.resource_count,
        dcu_memory = %args.devices.dcu.resource_memory,
        dcu_cores = %args.devices.dcu.resource_cores,
        "Loaded device configuration"
    );

    let client = Client::try_default().await?;
    tracing::info!("Connected to Kubernetes cluster");

    let annotator = Arc::new(KubeNodeAnnotator::with_client(client.clone()));
    let table = DeviceTable::init(&args.devices, annotator)?;

    let nodes_api: Api<Node> = Api::all(client);
    let nodes = match &args.node {
        Some(name) => vec![nodes_api.get(name).await?],
        None => nodes_api.list(&ListParams::default()).await?.items,
    };

    for node in &nodes {
        let node_name = node.metadata.name.as_deref().unwrap_or("unknown");

        for (family, device) in table.iter() {
            let (healthy, needs_update) = device.check_health(family, node);

            match device.get_node_devices(node) {
                Ok(devices) => {
                    for d in &devices {
                        tracing::info!(
                            node = node_name,
                            family,
                            id = %d.id,
                            device_type = %d.device_type,
                            devmem = d.devmem,
                            devcore = d.devcore,
                            health = d.health,
                            "Device"
                        );
                    }
                    tracing::info!(
                        node = node_name,
                        family,
                        count = devices.len(),
                        healthy,
                        needs_update,
                        "Node inventory"
                    );
                }
                Err(e) if e.is_skippable() => {
                    tracing::debug!(node = node_name, family, reason = %e, "Skipping node");
                }
                Err(e) => {
                    tracing::error!(
                        node = node_name,
                        family,
                        error = %e,
                        "Node device state is unreadable"
                    );
                }
            }
        }
    }

    Ok(())
}
