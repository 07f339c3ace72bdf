use std::sync::Arc;
use std::time::{Duration, Instant};

use fish_lake::adapter::{
    decode_fish, encode_fish, start_node, LocalBus, NodeAddress, NodeConfig, Subscription,
    SystemClock, Transport,
};
use fish_lake::core::{decode_batch, Fish, Frame, MoveRules};
use fish_lake::types::{FishKind, NodeId};

const BASE: &str = "/test/lake/";

fn node(id: u8) -> NodeId {
    NodeId::new(id).unwrap()
}

fn calm_config(id: u8) -> NodeConfig {
    let mut config = NodeConfig::new(NodeAddress::new(BASE, node(id)).prefix());
    config.moves = MoveRules {
        y_chance: 0.0,
        ..MoveRules::default()
    };
    config
}

/// Poll `subs` until one yields a message or `limit` passes.
async fn first_message(
    subs: &[Subscription],
    limit: Duration,
) -> Option<fish_lake::adapter::Request> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        for sub in subs {
            if let Some(request) = sub.try_recv() {
                return Some(request);
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fish_crossing_the_boundary_is_forwarded_to_the_next_node() {
    let bus = Arc::new(LocalBus::new());
    // Node 2 is not running; this test stands in for its lake workers.
    let node2_lake = bus.subscribe(&NodeAddress::new(BASE, node(2)).lake()).unwrap();

    let handle = start_node(&calm_config(0), bus.clone(), Arc::new(SystemClock)).unwrap();

    let mut fish = Fish {
        spawn_node: node(0),
        kind: FishKind::Bass,
        facing_min: false,
        view: String::new(),
        view_width: 0,
        view_center: 0,
        x: 17,
        y: 1,
        move_interval_ms: 500,
        move_epoch_ms: None,
        move_steps: 0,
        drift_min: false,
    };
    fish.refresh_view();
    // Centre cell x = 14: still node 0, two steps from the boundary.
    assert_eq!(fish.x - fish.view_center as i32, 14);

    let trans_id = bus
        .send(&handle.address().lake(), encode_fish(&fish).unwrap(), 60_000)
        .unwrap();

    let request = first_message(&[node2_lake], Duration::from_secs(10))
        .await
        .expect("fish was never handed to node 2");
    assert_eq!(request.trans_id, trans_id);
    assert!(request.timeout_ms < 60_000);

    let arrived = decode_fish(&request.payload).unwrap();
    assert_eq!(arrived.x - arrived.view_center as i32, 16);
    assert_eq!(arrived.y, 1);
    assert_eq!(arrived.move_epoch_ms, None);
    assert_eq!(arrived.spawn_node, node(0));

    handle.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hatched_fish_reach_a_display() {
    let bus = Arc::new(LocalBus::new());
    let merges: Vec<Subscription> = NodeId::ALL
        .iter()
        .map(|&n| bus.subscribe(&NodeAddress::new(BASE, n).merge()).unwrap())
        .collect();
    let displays: Vec<Subscription> = NodeId::ALL
        .iter()
        .map(|&n| bus.subscribe(&NodeAddress::new(BASE, n).display()).unwrap())
        .collect();

    let mut handles = Vec::new();
    for id in 0..4 {
        let mut config = calm_config(id);
        config.hatch.rate_secs = 1;
        handles.push(start_node(&config, bus.clone(), Arc::new(SystemClock)).unwrap());
    }

    // Every node blanks its display at startup.
    for sub in &displays {
        let blank = sub.try_recv().expect("missing startup display");
        assert_eq!(&blank.payload[..3], &[0xff, 0, 0]);
    }

    let batch = first_message(&merges, Duration::from_secs(15))
        .await
        .expect("no frames reached any display");
    let frames = decode_batch(&batch.payload).unwrap();
    assert!(!frames.is_empty());
    for merge in &frames {
        assert!(merge.mask.is_power_of_two());
        let frame = Frame::from_bytes(16, 2, &merge.bytes).unwrap();
        assert!(frame.cells().iter().any(|&c| c != '\0'));
    }

    for handle in handles {
        handle.shutdown().await;
    }
}
