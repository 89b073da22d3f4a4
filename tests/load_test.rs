//! Concurrent load through the balancer.

use std::collections::HashMap;

mod common;

#[tokio::test]
async fn test_concurrent_requests_spread_evenly() {
    let a = common::start_named_backend("a").await;
    let b = common::start_named_backend("b").await;
    let c = common::start_named_backend("c").await;
    let balancer = common::start_balancer(common::config_for(&[a, b, c])).await;

    let concurrency = 20;
    let requests_per_task = 30;
    let client = common::client();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = balancer.url("/");
        tasks.push(tokio::spawn(async move {
            let mut bodies = Vec::new();
            for _ in 0..requests_per_task {
                let res = client.get(&url).send().await.unwrap();
                assert!(res.status().is_success());
                bodies.push(res.text().await.unwrap());
            }
            bodies
        }));
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for task in tasks {
        for body in task.await.unwrap() {
            *counts.entry(body).or_default() += 1;
        }
    }

    // Each request advances the shared cursor once.
    let per_backend = concurrency * requests_per_task / 3;
    assert_eq!(counts.len(), 3);
    assert!(counts.values().all(|&n| n == per_backend), "uneven spread: {:?}", counts);
}
