//! Poll and fixed waiting on a paused clock.

mod common;

use std::time::Duration;

use common::FakeCompute;
use firerisk_analysis::{
    wait_for_exports, ExportOutcome, PollPolicy, SubmittedExport, WaitPolicy,
};
use firerisk_cloud::{ComputeBackend, ExportRequest, OperationState};
use firerisk_core::{Geometry, Image};
use tokio::time::{sleep, Instant};

use OperationState::{Failed, Running, Succeeded};

async fn submit(compute: &FakeCompute, names: &[&str]) -> Vec<SubmittedExport> {
    let mut out = Vec::new();
    for name in names {
        let request = ExportRequest::to_drive(
            Image::constant(1.0),
            name,
            "F",
            Geometry::rectangle(&firerisk_core::BBox::new(0.0, 0.0, 1.0, 1.0)),
            30.0,
            1,
        );
        let op = compute.start_export(&request).await.unwrap();
        out.push(SubmittedExport {
            name: name.to_string(),
            operation: op.name,
        });
    }
    out
}

fn never() -> std::future::Pending<()> {
    std::future::pending()
}

#[tokio::test(start_paused = true)]
async fn returns_once_every_job_is_terminal() {
    let compute = FakeCompute::new(|name| match name {
        "A" => vec![Running, Running, Succeeded],
        "B" => vec![Running, Failed],
        _ => vec![Succeeded],
    });
    let exports = submit(&compute, &["A", "B", "C"]).await;

    let start = Instant::now();
    let report = wait_for_exports(&compute, &exports, &WaitPolicy::default(), never())
        .await
        .unwrap();

    // Rounds at 0 s, 5 s and 15 s
    assert_eq!(start.elapsed(), Duration::from_secs(15));
    assert!(!report.interrupted);
    assert!(!report.timed_out);
    assert_eq!(report.exports[0].1, ExportOutcome::Succeeded);
    assert!(matches!(report.exports[1].1, ExportOutcome::Failed(ref r) if r.contains("compatible")));
    assert_eq!(report.exports[2].1, ExportOutcome::Succeeded);
    assert_eq!(report.retrievable(), ["A", "C"]);
    // Terminal jobs are not polled again: A x3, B x2, C x1
    assert_eq!(compute.polls.get(), 6);
}

#[tokio::test(start_paused = true)]
async fn backoff_is_capped_and_deadline_reports_pending() {
    let compute = FakeCompute::new(|_| vec![Running]);
    let exports = submit(&compute, &["slow"]).await;
    let policy = WaitPolicy::Poll(PollPolicy {
        deadline: Duration::from_secs(300),
        ..Default::default()
    });

    let start = Instant::now();
    let report = wait_for_exports(&compute, &exports, &policy, never()).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(300));
    assert!(report.timed_out);
    assert_eq!(report.exports[0].1, ExportOutcome::Pending);
    assert!(report.retrievable().is_empty());
    // Polls at 0, 5, 15, 35, 75, 135, 195, 255, 300
    assert_eq!(compute.polls.get(), 9);
}

#[tokio::test(start_paused = true)]
async fn cancellation_keeps_finished_jobs() {
    let compute = FakeCompute::new(|name| {
        if name == "fast" {
            vec![Succeeded]
        } else {
            vec![Running]
        }
    });
    let exports = submit(&compute, &["fast", "slow"]).await;

    let start = Instant::now();
    let report = wait_for_exports(
        &compute,
        &exports,
        &WaitPolicy::default(),
        sleep(Duration::from_secs(30)),
    )
    .await
    .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(30));
    assert!(report.interrupted);
    assert_eq!(report.exports[0].1, ExportOutcome::Succeeded);
    assert_eq!(report.exports[1].1, ExportOutcome::Pending);
    assert_eq!(report.retrievable(), ["fast"]);
}

#[tokio::test(start_paused = true)]
async fn fixed_wait_never_polls() {
    let compute = FakeCompute::succeeding();
    let exports = submit(&compute, &["A", "B"]).await;

    let start = Instant::now();
    let report = wait_for_exports(
        &compute,
        &exports,
        &WaitPolicy::Fixed(Duration::from_secs(60)),
        never(),
    )
    .await
    .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(60));
    assert_eq!(compute.polls.get(), 0);
    assert!(report.exports.iter().all(|(_, o)| *o == ExportOutcome::Unknown));
    assert_eq!(report.retrievable(), ["A", "B"]);
}

#[tokio::test(start_paused = true)]
async fn interrupted_fixed_wait_retrieves_nothing() {
    let compute = FakeCompute::succeeding();
    let exports = submit(&compute, &["A"]).await;

    let report = wait_for_exports(
        &compute,
        &exports,
        &WaitPolicy::Fixed(Duration::from_secs(60)),
        sleep(Duration::from_secs(1)),
    )
    .await
    .unwrap();

    assert!(report.interrupted);
    assert!(report.retrievable().is_empty());
}
