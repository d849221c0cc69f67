mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};

use quorumgate_cluster::{
    cluster_from_remote_peers, is_member_bootstrapped, PeerTransport, CLUSTER_ID_HEADER,
};
use quorumgate_common::{ClusterError, ClusterId, ClusterView, Member, MemberId};

use common::{counted, dead_url, member, serve};

const CLUSTER_ID_HEX: &str = "cdf818194e3a8c32";

/// A peer that answers `/members` correctly.
fn good_peer(members: Vec<Member>) -> Router {
    Router::new().route(
        "/members",
        get(move || {
            let members = members.clone();
            async move { ([(CLUSTER_ID_HEADER, CLUSTER_ID_HEX)], Json(members)) }
        }),
    )
}

#[tokio::test]
async fn test_discovery_stops_at_first_healthy_peer() {
    let probed = Arc::new(AtomicUsize::new(0));
    let untouched = Arc::new(AtomicUsize::new(0));

    // First candidate serves garbage, second is healthy, third must never
    // be contacted.
    let garbage = serve(counted(
        Router::new().route("/members", get(|| async { "not json" })),
        probed.clone(),
    ))
    .await;
    let healthy = serve(good_peer(vec![
        member(1, "n1", &["http://peer-1:2380"], &[]),
        member(2, "n2", &["http://peer-2:2380"], &[]),
    ]))
    .await;
    let spare = serve(counted(good_peer(vec![member(3, "n3", &[], &[])]), untouched.clone())).await;

    let urls = vec![dead_url().await, garbage, healthy, spare];
    let view = cluster_from_remote_peers(&urls, &PeerTransport::new())
        .await
        .unwrap();

    assert_eq!(view.cluster_id(), CLUSTER_ID_HEX.parse::<ClusterId>().unwrap());
    assert_eq!(view.len(), 2);
    assert_eq!(view.member(MemberId(2)).unwrap().name, "n2");
    assert_eq!(probed.load(Ordering::SeqCst), 1);
    assert_eq!(untouched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_discovery_empty_member_list_is_a_hard_stop() {
    let untouched = Arc::new(AtomicUsize::new(0));

    let empty = serve(good_peer(Vec::new())).await;
    let healthy = serve(counted(
        good_peer(vec![member(1, "n1", &[], &[])]),
        untouched.clone(),
    ))
    .await;

    let err = cluster_from_remote_peers(&[empty, healthy], &PeerTransport::new())
        .await
        .unwrap_err();

    // The empty list signals "this peer believes the cluster is invalid";
    // later candidates must not mask it.
    assert!(matches!(err, ClusterError::EmptyCluster));
    assert_eq!(untouched.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_discovery_exhausts_unusable_candidates() {
    // A peer that responds but never sets the cluster-ID header.
    let headerless = serve(Router::new().route(
        "/members",
        get(|| async { Json(vec![member(1, "n1", &[], &[])]) }),
    ))
    .await;

    let err = cluster_from_remote_peers(
        &[dead_url().await, headerless],
        &PeerTransport::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ClusterError::ExhaustedCandidates));
}

#[tokio::test]
async fn test_discovery_missing_header_falls_through_to_next_peer() {
    let headerless = serve(Router::new().route(
        "/members",
        get(|| async { Json(vec![member(9, "bad", &[], &[])]) }),
    ))
    .await;
    let healthy = serve(good_peer(vec![member(1, "n1", &[], &[])])).await;

    let view = cluster_from_remote_peers(&[headerless, healthy], &PeerTransport::new())
        .await
        .unwrap();
    assert_eq!(view.member(MemberId(1)).unwrap().name, "n1");
}

#[tokio::test]
async fn test_discovery_does_not_follow_redirects() {
    let hijack = Arc::new(AtomicUsize::new(0));

    // A would-be hijack target; following the redirect would reach it.
    let target = serve(counted(good_peer(vec![member(5, "evil", &[], &[])]), hijack.clone())).await;
    let redirecting = {
        let location = format!("{target}/members");
        serve(Router::new().route(
            "/members",
            get(move || {
                let location = location.clone();
                async move { Redirect::temporary(&location) }
            }),
        ))
        .await
    };
    let healthy = serve(good_peer(vec![member(1, "n1", &[], &[])])).await;

    let view = cluster_from_remote_peers(&[redirecting, healthy], &PeerTransport::new())
        .await
        .unwrap();

    // The redirect response itself is treated as final (and unusable), the
    // next candidate wins, and the redirect target is never contacted.
    assert_eq!(view.member(MemberId(1)).unwrap().name, "n1");
    assert_eq!(hijack.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bootstrap_probe() {
    let local_view = |peer_url: &str| {
        ClusterView::from_members(
            ClusterId(1),
            vec![
                member(1, "joiner", &["http://unused:2380"], &[]),
                member(2, "n2", &[peer_url], &[]),
            ],
        )
        .unwrap()
    };
    let timeout = Duration::from_secs(2);
    let transport = PeerTransport::new();

    // Peers already list a client URL for the joiner: bootstrapped.
    let peer = serve(good_peer(vec![
        member(1, "joiner", &["http://unused:2380"], &["http://client:2379"]),
        member(2, "n2", &[], &[]),
    ]))
    .await;
    assert!(is_member_bootstrapped(&local_view(&peer), "joiner", &transport, timeout).await);

    // No client URLs registered yet: not bootstrapped.
    let peer = serve(good_peer(vec![
        member(1, "joiner", &["http://unused:2380"], &[]),
        member(2, "n2", &[], &[]),
    ]))
    .await;
    assert!(!is_member_bootstrapped(&local_view(&peer), "joiner", &transport, timeout).await);

    // Unreachable peers: the probe absorbs the failure and reports false.
    let dead = dead_url().await;
    assert!(!is_member_bootstrapped(&local_view(&dead), "joiner", &transport, timeout).await);

    // Unknown member name: false without any network traffic.
    let view = local_view(&dead);
    assert!(!is_member_bootstrapped(&view, "stranger", &transport, timeout).await);
}

#[tokio::test]
async fn test_discovery_skips_error_status_with_unparsable_body() {
    let broken = serve(Router::new().route(
        "/members",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let healthy = serve(good_peer(vec![member(1, "n1", &[], &[])])).await;

    let view = cluster_from_remote_peers(&[broken, healthy], &PeerTransport::new())
        .await
        .unwrap();
    assert_eq!(view.len(), 1);
}
