use super::*;
use crate::net::ApiError;
use crate::test_support::{MockTransport, network_error};
use serde_json::json;

#[tokio::test]
async fn starts_connecting() {
    let mock = MockTransport::new();
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock, &scope);
    assert_eq!(poller.current(), Connectivity::Connecting);
}

#[tokio::test]
async fn success_marks_connected() {
    let mock = MockTransport::new();
    mock.respond(STATUS_PATH, Ok(json!({"status": "ok"})));
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock.clone(), &scope);

    assert_eq!(poller.probe().await, Connectivity::Connected);
    assert_eq!(*poller.subscribe().borrow(), Connectivity::Connected);
}

#[tokio::test]
async fn non_2xx_marks_error() {
    let mock = MockTransport::new();
    mock.respond(STATUS_PATH, Err(ApiError::Status { path: STATUS_PATH.into(), status: 503 }));
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock.clone(), &scope);

    assert_eq!(poller.probe().await, Connectivity::Error);
    assert_eq!(poller.current(), Connectivity::Error);
}

#[tokio::test]
async fn network_failure_marks_error_and_recovers() {
    let mock = MockTransport::new();
    mock.respond_once(STATUS_PATH, Err(network_error(STATUS_PATH)));
    mock.respond(STATUS_PATH, Ok(json!({})));
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock.clone(), &scope);

    assert_eq!(poller.probe().await, Connectivity::Error);
    assert_eq!(poller.probe().await, Connectivity::Connected);
}

#[tokio::test(start_paused = true)]
async fn mount_probes_immediately_and_every_period() {
    let mock = MockTransport::new();
    mock.respond(STATUS_PATH, Err(network_error(STATUS_PATH)));
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock.clone(), &scope);

    poller.spawn(&scope, Duration::from_secs(30));
    tokio::task::yield_now().await;
    assert_eq!(poller.current(), Connectivity::Error, "never left at connecting after first probe");

    tokio::time::sleep(Duration::from_millis(60_001)).await;
    assert_eq!(mock.calls_to(STATUS_PATH).len(), 3);

    scope.close();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(mock.calls_to(STATUS_PATH).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn probe_resolving_after_close_does_not_write() {
    let mock = MockTransport::new();
    mock.respond(STATUS_PATH, Ok(json!({})));
    mock.delay(STATUS_PATH, Duration::from_secs(2));
    let scope = ViewScope::new();
    let poller = StatusPoller::new(mock.clone(), &scope);

    let pending = tokio::spawn({
        let poller = poller.clone();
        async move { poller.probe().await }
    });
    tokio::task::yield_now().await;
    scope.close();

    assert_eq!(pending.await.unwrap(), Connectivity::Connected);
    assert_eq!(poller.current(), Connectivity::Connecting);
}
