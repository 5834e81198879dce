//! Full traversals through an in-process four-node ring

use futures::future::join_all;
use magnet_e2e_tests::RingHarness;
use magnet_types::CollectorAck;
use std::time::Duration;

#[tokio::test]
async fn test_golden_path_terminates_at_ordinal_two() {
    let ring = RingHarness::builder(4).start().await.unwrap();

    let response = ring.send_hop(0, r#"{"end": 2, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");

    let ack: CollectorAck = response.json().await.unwrap();
    assert_eq!(ack.experiment_label, "CAKE");
    assert_eq!(ack.end, Some(2));
    assert_eq!(ack.current, 2);
    assert_eq!(ack.origin_ordinal, Some(2));
    assert_eq!(ack.origin_name, "magnet-2");
    assert_eq!(ack.message, "All kubrons successfully collided 🎂");
}

#[tokio::test]
async fn test_traversal_wraps_past_last_ordinal() {
    let ring = RingHarness::builder(4)
        .base_name("kubron")
        .start()
        .await
        .unwrap();

    // 3 -> 0 -> 1 -> 2 -> 3 -> 0 -> 1, six hops
    let response = ring.send_hop(3, r#"{"end": 6, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 200);

    let ack: CollectorAck = response.json().await.unwrap();
    assert_eq!(ack.current, 6);
    assert_eq!(ack.origin_ordinal, Some(1));
    assert_eq!(ack.origin_name, "kubron-1");
}

#[tokio::test]
async fn test_completed_message_reports_from_entry_node() {
    let ring = RingHarness::builder(4).start().await.unwrap();

    let response = ring.send_hop(1, r#"{"end": 3, "current": 5}"#).await.unwrap();
    assert_eq!(response.status(), 200);

    let ack: CollectorAck = response.json().await.unwrap();
    assert_eq!(ack.end, Some(3));
    assert_eq!(ack.current, 5);
    assert_eq!(ack.origin_name, "magnet-1");
}

#[tokio::test]
async fn test_dead_member_surfaces_as_bad_gateway_to_origin() {
    let ring = RingHarness::builder(4)
        .without_node(2)
        .hop_timeout(Duration::from_secs(2))
        .start()
        .await
        .unwrap();

    // 0 -> 1 -> (2 is down): node 1 answers 502, node 0 proxies it verbatim
    let response = ring.send_hop(0, r#"{"end": 3, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 502);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    let body = response.text().await.unwrap();
    assert!(
        body.starts_with("next magnet request failed: "),
        "unexpected body {:?}",
        body
    );
}

#[tokio::test]
async fn test_invalid_requests_rejected_at_entry() {
    let ring = RingHarness::builder(4).max_laps(1).start().await.unwrap();

    let response = ring.send_hop(0, r#"{"end": -1, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "'end' must be >= 0\n");

    let response = ring.send_hop(0, r#"{"end": 5, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 400);

    let response = ring.send_hop(0, r#"{"end": 4, "current": 0}"#).await.unwrap();
    assert_eq!(response.status(), 200);
    let ack: CollectorAck = response.json().await.unwrap();
    assert_eq!(ack.origin_name, "magnet-0");
}

#[tokio::test]
async fn test_concurrent_traversals_are_independent() {
    let ring = RingHarness::builder(4).start().await.unwrap();

    let requests = (0..8u32).map(|i| {
        let body = format!(r#"{{"end": {}, "current": 0}}"#, i);
        let ring = &ring;
        async move {
            let response = ring.send_hop(i % 4, &body).await.unwrap();
            assert_eq!(response.status(), 200);
            let ack: CollectorAck = response.json().await.unwrap();
            (i, ack)
        }
    });

    for (i, ack) in join_all(requests).await {
        assert_eq!(ack.current, i as i64);
        assert_eq!(ack.origin_ordinal, Some((i % 4 + i) % 4));
    }
}
