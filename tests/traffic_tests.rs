// Traffic generator tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{memory_cache, pipeline, Script, ScriptedBackend};
use gemini_chat_relay::traffic::{generate_traffic, spawn, TrafficParams, RATE_LIMIT_BACKOFF};
use std::sync::Arc;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_every_request_is_accounted_for() {
    let backend = ScriptedBackend::new(Script::Echo);
    let pipeline = Arc::new(pipeline(backend, memory_cache(), 200));

    let params = TrafficParams {
        num_requests: 20,
        delay: 2,
    };
    let summary = generate_traffic(pipeline.clone(), params).await;

    assert_eq!(summary.answered + summary.blocked, 20);
    assert_eq!(summary.rate_limited + summary.failed, 0);
    assert_eq!(pipeline.history().len(), 40);

    let users: Vec<String> = pipeline
        .history()
        .snapshot()
        .into_iter()
        .map(|t| t.user_id)
        .collect();
    assert_eq!(users[0], "traffic_gen_1");
    assert_eq!(users[39], "traffic_gen_20");
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_requests() {
    let pipeline = Arc::new(pipeline(ScriptedBackend::new(Script::Echo), memory_cache(), 50));

    let start = Instant::now();
    generate_traffic(
        pipeline,
        TrafficParams {
            num_requests: 4,
            delay: 3,
        },
    )
    .await;

    // No pause after the last request
    assert_eq!(start.elapsed().as_secs(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_backs_off_with_hint() {
    let backend = ScriptedBackend::new(Script::QuotaExhausted);
    let pipeline = Arc::new(pipeline(backend.clone(), memory_cache(), 50));

    let start = Instant::now();
    let summary = generate_traffic(
        pipeline,
        TrafficParams {
            num_requests: 5,
            delay: 0,
        },
    )
    .await;

    // Jailbreak picks never reach the backend
    assert_eq!(summary.rate_limited as usize, backend.calls());
    assert_eq!(summary.rate_limited + summary.blocked, 5);
    // The scripted backend hints 7s, shorter than the default back-off
    assert_eq!(start.elapsed().as_secs(), 7 * summary.rate_limited as u64);
    assert!(RATE_LIMIT_BACKOFF.as_secs() > 7);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_run_completes() {
    let pipeline = Arc::new(pipeline(ScriptedBackend::new(Script::Fail), memory_cache(), 50));

    let summary = spawn(
        pipeline,
        TrafficParams {
            num_requests: 3,
            delay: 1,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.failed + summary.blocked, 3);
    assert_eq!(summary.answered, 0);
}
