//! # Addressing Tests
//!
//! Publisher and subscriber must derive the same topic for a node, in
//! separate processes, from the template alone.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::timeout;

use node_runtime::adapters::BusTransport;
use relay_engine::{NodeIdentity, TokenPublisher, TopicTemplate};
use shared_bus::InMemoryBus;

#[tokio::test]
async fn test_each_topic_reaches_exactly_its_node() {
    let transport = BusTransport::new(Arc::new(InMemoryBus::new()));
    let template = TopicTemplate::default();

    let mut inboxes = Vec::new();
    for node in NodeIdentity::all() {
        let (inbox, _task) = transport.spawn_inbox(&template.address_for(node), 8);
        inboxes.push(inbox);
    }

    // A publisher with its own copy of the template.
    let publisher_side = TopicTemplate::parse("PATRONES2024/GRUPO{node}").unwrap();
    let target = NodeIdentity::new(4).unwrap();
    transport
        .publish(&publisher_side.address_for(target), b"4000001".to_vec())
        .await
        .unwrap();

    for (index, inbox) in inboxes.iter_mut().enumerate() {
        let received = timeout(Duration::from_millis(50), inbox.recv()).await;
        if index == 3 {
            assert_eq!(received.unwrap().unwrap(), b"4000001".to_vec());
        } else {
            assert!(received.is_err(), "node {} got a foreign message", index + 1);
        }
    }
}

proptest! {
    #[test]
    fn prop_custom_templates_are_injective(
        prefix in "[a-zA-Z0-9/_-]{0,16}",
        suffix in "[a-zA-Z0-9/_-]{0,16}",
    ) {
        let template = TopicTemplate::parse(&format!("{prefix}{{node}}{suffix}")).unwrap();

        let topics: Vec<String> = NodeIdentity::all()
            .map(|node| template.address_for(node).to_string())
            .collect();
        for (i, a) in topics.iter().enumerate() {
            for b in &topics[i + 1..] {
                prop_assert_ne!(a, b);
            }
        }
    }
}
