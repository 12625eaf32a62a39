//! # Relay Runtime Integration Tests
//!
//! Runs the full local mesh (nodes 1..=9 over the in-memory bus) from an
//! image file on disk, with a text codec standing in for barcodes.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use node_runtime::container::config::{NotifierConfig, TransportMode};
use node_runtime::{NodeConfig, NodeRuntime, ServiceContainer};
use relay_engine::{
    CodecError, NodeIdentity, Notifier, NotifyError, ProtocolVariant, Token, TokenCodec,
};

/// "Image" bytes are the token text itself.
struct TextCodec;

impl TokenCodec for TextCodec {
    fn decode(&self, image: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(image.to_vec()).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, token: &str) -> Result<Vec<u8>, CodecError> {
        Ok(token.as_bytes().to_vec())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    delivered: Mutex<Vec<(u8, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, node: NodeIdentity, token: &Token) -> Result<(), NotifyError> {
        self.delivered
            .lock()
            .unwrap()
            .push((node.get(), token.to_string()));
        Ok(())
    }
}

/// Notifier that never completes, like a mail API that stopped answering.
struct HangingNotifier;

#[async_trait]
impl Notifier for HangingNotifier {
    async fn notify(&self, _node: NodeIdentity, _token: &Token) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

fn mesh_config(image: &Path, start: u32, variant: ProtocolVariant) -> NodeConfig {
    let mut config = NodeConfig::new(NodeIdentity::new(start).unwrap(), image);
    config.relay = config.relay.with_variant(variant);
    config.notifier = NotifierConfig::Log;
    config.transport.mode = TransportMode::Memory;
    config
}

fn mesh_runtime(
    image: &Path,
    start: u32,
    variant: ProtocolVariant,
) -> (NodeRuntime, Arc<RecordingNotifier>) {
    let config = mesh_config(image, start, variant);
    let notifier = Arc::new(RecordingNotifier::default());
    let container = ServiceContainer::with_parts(config, Arc::new(TextCodec), notifier.clone());
    (NodeRuntime::new(container), notifier)
}

fn hanging_runtime(image: &Path) -> NodeRuntime {
    let config = mesh_config(image, 1, ProtocolVariant::Counter);
    let container =
        ServiceContainer::with_parts(config, Arc::new(TextCodec), Arc::new(HangingNotifier));
    NodeRuntime::new(container)
}

async fn run_until_stopped(runtime: NodeRuntime) -> anyhow::Result<()> {
    timeout(
        Duration::from_secs(3),
        runtime.run_until(tokio::time::sleep(Duration::from_millis(200))),
    )
    .await
    .expect("shutdown should not wait for a hanging notifier")
}

fn write_image(dir: &tempfile::TempDir, token: &str) -> std::path::PathBuf {
    let path = dir.path().join("token.jpg");
    std::fs::write(&path, token).unwrap();
    path
}

async fn run_to_completion(runtime: NodeRuntime) -> anyhow::Result<()> {
    timeout(
        Duration::from_secs(5),
        runtime.run_until(std::future::pending()),
    )
    .await
    .expect("mesh should finish on its own")
}

#[tokio::test]
async fn test_mesh_two_hop_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "1205000001");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Counter);

    run_to_completion(runtime).await.unwrap();

    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(*delivered, vec![(2, "1205000002".to_string())]);
}

#[tokio::test]
async fn test_mesh_multi_hop_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "3142000000");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Counter);

    run_to_completion(runtime).await.unwrap();

    // 3 -> 1 -> 4 -> 2, one increment per hop.
    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(*delivered, vec![(2, "3142000003".to_string())]);
}

#[tokio::test]
async fn test_mesh_plain_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "3142");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Plain);

    run_to_completion(runtime).await.unwrap();

    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(*delivered, vec![(2, "3142".to_string())]);
}

#[tokio::test]
async fn test_origin_without_next_hop_notifies_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "7000041");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Counter);

    run_to_completion(runtime).await.unwrap();

    let delivered = notifier.delivered.lock().unwrap();
    assert_eq!(*delivered, vec![(7, "7000041".to_string())]);
}

#[tokio::test]
async fn test_malformed_image_token_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "12ab000001");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Counter);

    assert!(run_to_completion(runtime).await.is_err());
    assert!(notifier.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_counter_overflow_at_origin_fails() {
    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "12999999");
    let (runtime, notifier) = mesh_runtime(&image, 1, ProtocolVariant::Counter);

    assert!(run_to_completion(runtime).await.is_err());
    assert!(notifier.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_image_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.jpg");
    let (runtime, _notifier) = mesh_runtime(&missing, 1, ProtocolVariant::Counter);

    let err = run_to_completion(runtime).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read image"));
}

#[tokio::test]
async fn test_shutdown_during_hanging_origin_notification() {
    let dir = tempfile::tempdir().unwrap();
    // Single-hop route: the origin notifies before any handler runs.
    let image = write_image(&dir, "7000041");

    run_until_stopped(hanging_runtime(&image)).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_during_hanging_terminal_delivery() {
    let dir = tempfile::tempdir().unwrap();
    // Node 2 terminates inside its relay handler and never finishes notifying.
    let image = write_image(&dir, "1205000001");

    run_until_stopped(hanging_runtime(&image)).await.unwrap();
}
