//! Endpoint pool rotation behavior through the public API.

use std::sync::Arc;
use std::time::Duration;

use arb_rpc::{EndpointPool, RpcError};

fn pool_with(urls: &[&str]) -> Result<EndpointPool, RpcError> {
    EndpointPool::new(
        "testnet",
        137,
        urls.iter().map(|u| u.to_string()).collect(),
        None,
        Duration::from_secs(4),
    )
}

#[test]
fn five_failures_walk_the_candidate_ring() {
    let pool = pool_with(&[
        "http://one.invalid",
        "http://two.invalid",
        "http://three.invalid",
    ])
    .unwrap();
    assert_eq!(pool.cursor(), 0, "first candidate is preferred at startup");

    let mut visited = Vec::new();
    for _ in 0..5 {
        pool.rotate();
        visited.push(pool.cursor());
    }
    assert_eq!(visited, vec![1, 2, 0, 1, 2]);
}

#[test]
fn no_endpoints_is_a_startup_failure() {
    assert!(matches!(pool_with(&[]), Err(RpcError::Config(_))));
}

#[test]
fn connection_is_withheld_during_the_settle_window() {
    let pool = pool_with(&["http://one.invalid", "http://two.invalid"]).unwrap();
    assert!(pool.connection().is_some());

    assert!(pool.rotate());
    assert!(pool.is_settling());
    assert!(
        pool.connection().is_none(),
        "scans must be skipped while the fresh endpoint settles"
    );
}

#[test]
fn concurrent_triggers_collapse_to_single_advances() {
    let pool = Arc::new(
        pool_with(&[
            "http://one.invalid",
            "http://two.invalid",
            "http://three.invalid",
        ])
        .unwrap(),
    );

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || pool.rotate())
        })
        .collect();
    let performed: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();

    assert!(performed >= 1);
    assert_eq!(
        pool.cursor(),
        performed,
        "cursor advances exactly once per performed rotation"
    );
}

#[test]
fn malformed_candidate_does_not_break_the_ring() {
    // The middle candidate never parses; rotation walks past it while
    // the previous connection stays usable.
    let pool = pool_with(&["http://one.invalid", "not a url", "http://three.invalid"]).unwrap();

    assert!(pool.rotate());
    assert_eq!(pool.cursor(), 1);
    assert!(
        !pool.is_settling(),
        "a failed replacement must not start a settle window"
    );

    assert!(pool.rotate());
    assert_eq!(pool.cursor(), 2);
    assert!(pool.is_settling());
}
