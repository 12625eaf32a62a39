//! # Traversal Tests
//!
//! Full traversals across the nine-node mesh.
//!
//! ## Flows Tested
//!
//! 1. Origin forwards, relays increment once per hop, terminal notifies
//! 2. Plain tokens travel unchanged
//! 3. Malformed payloads and counter overflow stop the receiving node only
//! 4. Concurrent deliveries at one node never interfere

use std::collections::BTreeSet;

use relay_engine::{
    HopReport, ProtocolVariant, RelayError, RelayOutcome, TopicTemplate,
};

use super::mesh::{evaluate_at, Delivery, Mesh};

fn delivery(node: u8, token: &str) -> Delivery {
    Delivery {
        node,
        token: token.to_string(),
    }
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[tokio::test]
async fn test_two_hop_counter_traversal() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    let reports = mesh.originate("1205000001").await;

    assert!(matches!(&reports[0], HopReport::Forwarded { next, .. } if next.get() == 2));
    assert!(reports[1..].iter().all(|r| *r == HopReport::Idle));
    assert_eq!(mesh.next_delivery().await, delivery(2, "1205000002"));
    mesh.assert_quiet().await;
}

#[tokio::test]
async fn test_full_route_visits_every_node() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    mesh.originate("123456789000000").await;

    // Eight hops, eight increments; node 9 holds the last digit.
    assert_eq!(mesh.next_delivery().await, delivery(9, "123456789000008"));
    mesh.assert_quiet().await;
}

#[tokio::test]
async fn test_plain_traversal_is_unchanged() {
    let mut mesh = Mesh::start(ProtocolVariant::Plain);

    mesh.originate("3142").await;

    assert_eq!(mesh.next_delivery().await, delivery(2, "3142"));
    mesh.assert_quiet().await;
}

#[tokio::test]
async fn test_origin_without_next_hop_notifies_locally() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    let reports = mesh.originate("7000041").await;

    assert!(reports[6].is_terminal());
    assert_eq!(mesh.next_delivery().await, delivery(7, "7000041"));
}

#[tokio::test]
async fn test_foreign_token_terminates_at_receiver() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    mesh.inject(5, b"1205000001").await;

    assert_eq!(mesh.next_delivery().await, delivery(5, "1205000001"));
}

#[tokio::test]
async fn test_custom_topic_template() {
    let topics = TopicTemplate::parse("relay/{node}/inbox").unwrap();
    let mut mesh = Mesh::start_with(ProtocolVariant::Counter, topics);

    mesh.originate("31000000").await;

    assert_eq!(mesh.next_delivery().await, delivery(1, "31000001"));
}

#[tokio::test]
async fn test_mesh_agrees_with_pure_evaluation() {
    for (raw, variant) in [
        ("2468000000", ProtocolVariant::Counter),
        ("9187000123", ProtocolVariant::Counter),
        ("5132", ProtocolVariant::Plain),
    ] {
        // Walk the route with the pure engine.
        let mut node = raw.as_bytes()[0] - b'0';
        let mut current = raw.to_string();
        let expected = loop {
            match evaluate_at(node, &current, variant) {
                RelayOutcome::Forward { next, token } => {
                    node = next.get();
                    current = token.to_string();
                }
                RelayOutcome::Terminate { token } => break delivery(node, &token.to_string()),
            }
        };

        let mut mesh = Mesh::start(variant);
        mesh.originate(raw).await;
        assert_eq!(mesh.next_delivery().await, expected, "route {raw}");
        mesh.shutdown().await;
    }
}

// =============================================================================
// FAILURE MODES
// =============================================================================

#[tokio::test]
async fn test_malformed_payload_stops_receiving_node() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    mesh.inject(2, b"12ab000001").await;

    let (node, result) = mesh.next_handler_exit().await;
    assert_eq!(node, 2);
    assert!(matches!(result, Err(RelayError::MalformedToken { .. })));

    // Other nodes keep relaying.
    mesh.inject(3, b"3000007").await;
    assert_eq!(mesh.next_delivery().await, delivery(3, "3000007"));
}

#[tokio::test]
async fn test_non_utf8_payload_is_malformed() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    mesh.inject(4, &[0xFF, 0xFE, 0x34]).await;

    let (node, result) = mesh.next_handler_exit().await;
    assert_eq!(node, 4);
    assert!(matches!(result, Err(RelayError::MalformedToken { .. })));
}

#[tokio::test]
async fn test_revisiting_route_ends_in_counter_overflow() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    // Node 1 always honors its first occurrence, so 1 -> 2 -> 1 -> 2 ...
    mesh.originate("121999990").await;

    let (_, result) = mesh.next_handler_exit().await;
    assert!(matches!(
        result,
        Err(RelayError::CounterOverflow { value: 999_999, .. })
    ));
    mesh.assert_quiet().await;
}

#[tokio::test]
async fn test_overflow_on_relay_is_not_forwarded() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    mesh.inject(1, b"12999999").await;

    let (node, result) = mesh.next_handler_exit().await;
    assert_eq!(node, 1);
    assert!(matches!(result, Err(RelayError::CounterOverflow { .. })));
    mesh.assert_quiet().await;
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test]
async fn test_concurrent_deliveries_are_independent() {
    let mut mesh = Mesh::start(ProtocolVariant::Counter);

    for counter in 0..20 {
        mesh.inject(6, format!("6{counter:06}").as_bytes()).await;
    }

    let mut seen = BTreeSet::new();
    for _ in 0..20 {
        let got = mesh.next_delivery().await;
        assert_eq!(got.node, 6);
        seen.insert(got.token);
    }
    let expected: BTreeSet<String> = (0..20).map(|c| format!("6{c:06}")).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_shutdown_stops_every_handler() {
    let mesh = Mesh::start(ProtocolVariant::Counter);
    assert_eq!(mesh.service(3).config().node.get(), 3);

    let exits = mesh.shutdown().await;

    assert_eq!(exits.len(), 9);
    assert!(exits.iter().all(|(_, result)| result.is_ok()));
}
