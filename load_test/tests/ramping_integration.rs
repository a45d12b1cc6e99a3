//! Ramping executor tests with short schedules

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use todo_load_test::client::TodoClient;
use todo_load_test::metrics::collector::MetricsCollector;
use todo_load_test::runner::{RampingVus, Workload};
use todo_load_test::schedule::{Schedule, Stage};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const ID: &str = "7f9cd9f9-6b9e-46f1-a097-5956498ca85e";

async fn echo_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(|req: &Request| {
            let id = req.url.path().trim_start_matches("/todo/").to_string();
            ResponseTemplate::new(200).set_body_json(json!({ "id": id }))
        })
        .mount(&server)
        .await;
    server
}

fn workload(server: &MockServer, think_time: Duration) -> Workload {
    Workload {
        client: TodoClient::new(&server.uri(), Duration::from_secs(5)).unwrap(),
        ids: Arc::from(vec![ID.to_string()]),
        think_time,
    }
}

#[tokio::test]
async fn test_ramp_up_hold_ramp_down_completes() {
    let server = echo_server().await;
    let executor = RampingVus {
        schedule: Schedule::new(
            0,
            vec![
                Stage::new(Duration::from_millis(300), 3),
                Stage::new(Duration::from_millis(600), 3),
                Stage::new(Duration::from_millis(300), 0),
            ],
        ),
        graceful_stop: Duration::from_secs(2),
        graceful_ramp_down: Duration::from_secs(2),
    };

    let collector = MetricsCollector::new();
    let cancel = CancellationToken::new();
    let outcome = executor
        .run(&workload(&server, Duration::from_millis(20)), &collector, &cancel)
        .await;

    assert!(!outcome.aborted);
    assert!(outcome.elapsed >= Duration::from_millis(1_200));

    let snapshot = collector.get_snapshot();
    assert_eq!(snapshot.vus.active, 0);
    assert_eq!(snapshot.vus.target, 0);
    assert!(snapshot.vus.peak >= 1);
    assert!(snapshot.vus.peak <= 3, "peak {}", snapshot.vus.peak);
    assert!(snapshot.iterations.completed > 0);
    assert_eq!(snapshot.requests.in_flight, 0);
    assert_eq!(snapshot.requests.failed, 0);
    assert_eq!(snapshot.failed_checks(), 0);
    assert_eq!(
        server.received_requests().await.unwrap().len(),
        snapshot.requests.completed
    );
}

#[tokio::test]
async fn test_cancel_interrupts_sleeping_vus() {
    let server = echo_server().await;
    let executor = RampingVus {
        schedule: Schedule::new(2, vec![Stage::new(Duration::from_secs(60), 2)]),
        graceful_stop: Duration::from_secs(30),
        graceful_ramp_down: Duration::from_secs(30),
    };

    let collector = MetricsCollector::new();
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        executor.run(&workload(&server, Duration::from_secs(30)), &collector, &cancel),
    )
    .await
    .expect("cancelled run should stop promptly");

    assert!(outcome.aborted);

    let snapshot = collector.get_snapshot();
    assert_eq!(snapshot.vus.peak, 2);
    assert_eq!(snapshot.vus.active, 0);
    assert_eq!(snapshot.iterations.completed, 0);
    assert_eq!(snapshot.iterations.interrupted, 2);
    assert_eq!(snapshot.requests.in_flight, 0);
}

#[tokio::test]
async fn test_graceful_stop_lets_iterations_finish() {
    let server = echo_server().await;
    let executor = RampingVus {
        schedule: Schedule::new(1, vec![Stage::new(Duration::from_millis(200), 1)]),
        graceful_stop: Duration::from_secs(5),
        graceful_ramp_down: Duration::from_secs(5),
    };

    let collector = MetricsCollector::new();
    let cancel = CancellationToken::new();
    // one iteration takes ~500ms, longer than the schedule
    let outcome = executor
        .run(&workload(&server, Duration::from_millis(500)), &collector, &cancel)
        .await;

    assert!(!outcome.aborted);
    let snapshot = collector.get_snapshot();
    assert_eq!(snapshot.iterations.completed, 1);
    assert_eq!(snapshot.iterations.interrupted, 0);
}

#[tokio::test]
async fn test_graceful_stop_expiry_interrupts() {
    let server = echo_server().await;
    let executor = RampingVus {
        schedule: Schedule::new(1, vec![Stage::new(Duration::from_millis(200), 1)]),
        graceful_stop: Duration::from_millis(100),
        graceful_ramp_down: Duration::from_millis(100),
    };

    let collector = MetricsCollector::new();
    let cancel = CancellationToken::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        executor.run(&workload(&server, Duration::from_secs(30)), &collector, &cancel),
    )
    .await
    .expect("graceful stop should bound the run");

    assert!(!outcome.aborted);
    let snapshot = collector.get_snapshot();
    assert_eq!(snapshot.iterations.completed, 0);
    assert_eq!(snapshot.iterations.interrupted, 1);
    assert_eq!(snapshot.vus.active, 0);
}

#[tokio::test]
async fn test_graceful_ramp_down_expiry_interrupts_retired_vu() {
    let server = echo_server().await;
    let executor = RampingVus {
        schedule: Schedule::new(
            2,
            vec![
                Stage::new(Duration::from_millis(100), 1),
                Stage::new(Duration::from_millis(1_500), 1),
            ],
        ),
        graceful_stop: Duration::from_millis(200),
        graceful_ramp_down: Duration::from_millis(200),
    };

    let collector = MetricsCollector::new();
    let cancel = CancellationToken::new();
    let load = workload(&server, Duration::from_secs(30));

    let observer = collector.clone();
    let mid_run = async move {
        // past the ramp-down grace, before the schedule ends
        tokio::time::sleep(Duration::from_millis(800)).await;
        observer.get_snapshot()
    };

    let (outcome, mid) = tokio::time::timeout(
        Duration::from_secs(10),
        async { tokio::join!(executor.run(&load, &collector, &cancel), mid_run) },
    )
    .await
    .expect("ramp-down and graceful stop should bound the run");

    assert_eq!(mid.vus.target, 1);
    assert_eq!(mid.vus.active, 1);
    assert_eq!(mid.iterations.interrupted, 1);
    assert_eq!(mid.iterations.completed, 0);

    assert!(!outcome.aborted);
    let snapshot = collector.get_snapshot();
    assert_eq!(snapshot.vus.active, 0);
    assert_eq!(snapshot.vus.peak, 2);
    assert_eq!(snapshot.iterations.interrupted, 2);
}
