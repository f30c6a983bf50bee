use super::*;
use std::sync::atomic::AtomicUsize;

fn counting_scope(period: Duration) -> (ViewScope, Arc<AtomicUsize>) {
    let scope = ViewScope::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    scope.spawn_interval(period, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    (scope, ticks)
}

// =============================================================
// spawn_interval
// =============================================================

#[tokio::test(start_paused = true)]
async fn interval_ticks_immediately_then_each_period() {
    let (_scope, ticks) = counting_scope(Duration::from_secs(30));
    tokio::task::yield_now().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(30_001)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn close_stops_the_timer() {
    let (scope, ticks) = counting_scope(Duration::from_secs(5));
    tokio::task::yield_now().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    scope.close();
    tokio::time::sleep(Duration::from_secs(60)).await;
    tokio::task::yield_now().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);
    assert_eq!(scope.task_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_scope_closes_it() {
    let (scope, ticks) = counting_scope(Duration::from_secs(5));
    let liveness = scope.liveness();
    tokio::task::yield_now().await;
    drop(scope);

    assert!(!liveness.is_alive());
    tokio::time::sleep(Duration::from_secs(20)).await;
    tokio::task::yield_now().await;
    assert_eq!(ticks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn spawn_after_close_is_ignored() {
    let scope = ViewScope::new();
    scope.close();
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);
    scope.spawn(async move {
        flag.store(true, Ordering::SeqCst);
    });
    tokio::task::yield_now().await;
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(scope.task_count(), 0);
}

// =============================================================
// Slot
// =============================================================

#[test]
fn slot_set_only_notifies_on_change() {
    let scope = ViewScope::new();
    let slot = Slot::new(0_u32, scope.liveness());
    let mut rx = slot.subscribe();

    assert!(slot.set(3));
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    assert!(!slot.set(3));
    assert!(!rx.has_changed().unwrap());
    assert_eq!(slot.get(), 3);
}

#[test]
fn slot_drops_writes_after_close() {
    let scope = ViewScope::new();
    let slot = Slot::new(String::from("before"), scope.liveness());
    scope.close();

    assert!(!slot.set("after".to_owned()));
    assert!(!slot.update(|s| {
        s.push('!');
        true
    }));
    assert_eq!(slot.get(), "before");
}

#[test]
fn slot_clones_share_state() {
    let scope = ViewScope::new();
    let slot = Slot::new(vec![1, 2], scope.liveness());
    let other = slot.clone();
    other.update(|v| {
        v.push(3);
        true
    });
    assert_eq!(slot.with(Vec::len), 3);
}
