//! Integration tests for the scheduler tick loop.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use olmgate_olmed::{OlmedAuthClient, TokenManager, TokenStore};
use olmgate_scheduler::{
    run_scheduler_loop, JobExecutor, JobRegistry, RequestTemplate, Schedule,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn executor_for(auth_base: &str) -> Arc<JobExecutor> {
    let client = OlmedAuthClient::new(auth_base, "gateway", "secret", 5)
        .expect("client construction should not fail")
        .with_retry_policy(0, 0);
    let manager = Arc::new(TokenManager::new(Arc::new(TokenStore::new()), client, 300));
    Arc::new(JobExecutor::new(manager, 5).expect("executor construction should not fail"))
}

fn template(url: &str) -> RequestTemplate {
    RequestTemplate {
        method: "GET".to_owned(),
        url: url.to_owned(),
        headers: BTreeMap::new(),
        body: None,
        use_shared_auth: false,
    }
}

#[tokio::test]
async fn interval_job_fires_exactly_once_per_due_period() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let registry = Arc::new(JobRegistry::new());
    registry
        .upsert(
            "ping",
            Schedule::Interval {
                interval_seconds: 2,
            },
            template(&format!("{}/api/ping", server.uri())),
        )
        .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let loop_handle = tokio::spawn(run_scheduler_loop(
        Arc::clone(&registry),
        executor_for(&server.uri()),
        Duration::from_millis(100),
        shutdown_rx,
    ));

    // The job comes due 2 s after registration and again 2 s after that;
    // stopping at 3 s must observe exactly one execution.
    tokio::time::sleep(Duration::from_secs(3)).await;
    shutdown_tx.send(true).ok();
    loop_handle.await.expect("loop task should not panic");

    let job = registry.get("ping").expect("job should still exist");
    assert_eq!(job.execution_count, 1, "exactly one execution expected");

    let last = job.last_execution.expect("last execution recorded");
    assert_eq!(
        job.next_execution,
        last + chrono::Duration::seconds(2),
        "next execution anchors to the dispatch instant"
    );

    let outcome = job.last_outcome.expect("outcome recorded");
    assert!(outcome.success);
    assert_eq!(outcome.status_code, Some(200));
}

#[tokio::test]
async fn failing_job_does_not_affect_siblings_or_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/healthy"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let registry = Arc::new(JobRegistry::new());
    registry
        .upsert(
            "poison",
            Schedule::Interval {
                interval_seconds: 1,
            },
            template("http://127.0.0.1:1/unreachable"),
        )
        .unwrap();
    registry
        .upsert(
            "healthy",
            Schedule::Interval {
                interval_seconds: 1,
            },
            template(&format!("{}/api/healthy", server.uri())),
        )
        .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let loop_handle = tokio::spawn(run_scheduler_loop(
        Arc::clone(&registry),
        executor_for(&server.uri()),
        Duration::from_millis(100),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(1700)).await;
    shutdown_tx.send(true).ok();
    loop_handle.await.expect("loop must survive a poison job");

    let poison = registry.get("poison").unwrap();
    assert!(poison.execution_count >= 1);
    assert!(
        poison.next_execution > poison.last_execution.unwrap(),
        "a failing job is still rescheduled"
    );
    let poison_outcome = poison.last_outcome.expect("failure recorded");
    assert!(!poison_outcome.success);

    let healthy = registry.get("healthy").unwrap();
    assert!(healthy.execution_count >= 1);
    assert!(healthy.last_outcome.expect("outcome recorded").success);
}

#[tokio::test]
async fn once_at_fires_once_then_deactivates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/oneshot"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let registry = Arc::new(JobRegistry::new());
    registry
        .upsert(
            "oneshot",
            Schedule::OnceAt {
                run_at: Utc::now() - chrono::Duration::seconds(1),
            },
            template(&format!("{}/api/oneshot", server.uri())),
        )
        .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let loop_handle = tokio::spawn(run_scheduler_loop(
        Arc::clone(&registry),
        executor_for(&server.uri()),
        Duration::from_millis(50),
        shutdown_rx,
    ));

    // Several ticks pass; a past one-shot must not re-fire on each of them.
    tokio::time::sleep(Duration::from_millis(600)).await;
    shutdown_tx.send(true).ok();
    loop_handle.await.expect("loop task should not panic");

    let job = registry.get("oneshot").unwrap();
    assert_eq!(job.execution_count, 1);
    assert!(!job.is_active, "one-shot jobs deactivate after firing");
}

#[tokio::test]
async fn loop_stops_on_shutdown_signal() {
    let server = MockServer::start().await;
    let registry = Arc::new(JobRegistry::new());
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let loop_handle = tokio::spawn(run_scheduler_loop(
        registry,
        executor_for(&server.uri()),
        Duration::from_secs(60),
        shutdown_rx,
    ));

    shutdown_tx.send(true).ok();

    tokio::time::timeout(Duration::from_secs(2), loop_handle)
        .await
        .expect("loop should exit promptly on shutdown")
        .expect("loop task should not panic");
}
