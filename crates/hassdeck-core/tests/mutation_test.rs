// Optimistic mutation tests against an in-memory hub.
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{MockHub, Outcome, connected};
use hassdeck_core::{ControlField, CoreError, Entity, EntityAction, EntityId};

fn cover(position: i64) -> Entity {
    Entity::new("cover.blinds", "open").with_attribute("current_position", json!(position))
}

fn climate(target: f64) -> Entity {
    Entity::new("climate.living", "heat").with_attribute("temperature", json!(target))
}

fn status(controller: &hassdeck_core::Controller, id: &str) -> String {
    controller
        .store()
        .entity(&EntityId::from(id))
        .unwrap()
        .status
        .clone()
}

fn attribute(controller: &hassdeck_core::Controller, id: &str, key: &str) -> Option<f64> {
    controller
        .store()
        .entity(&EntityId::from(id))
        .unwrap()
        .attribute_f64(key)
}

// ── Discrete actions ────────────────────────────────────────────────

#[tokio::test]
async fn test_poll_then_toggle_keeps_other_collections() {
    let hub = MockHub::new(vec![
        Entity::new("light.kitchen", "off"),
        Entity::new("switch.kettle", "off"),
    ]);
    let controller = connected(&hub).await;

    let before = controller.store().snapshot();
    assert_eq!(before.lights().len(), 1);
    assert_eq!(before.lights()[0].status, "off");

    controller
        .discrete()
        .execute(&"light.kitchen".into(), EntityAction::TurnOn)
        .await
        .unwrap();

    let after = controller.store().snapshot();
    assert_eq!(after.lights()[0].status, "on");
    assert!(Arc::ptr_eq(before.switches(), after.switches()));
    assert!(!Arc::ptr_eq(before.lights(), after.lights()));

    let calls = hub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to_string(), "light.turn_on(light.kitchen)");
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_reverts_to_snapshot() {
    let hub = MockHub::new(vec![Entity::new("lock.front", "unlocked")]);
    let controller = connected(&hub).await;
    hub.push_outcome(Outcome {
        delay: Duration::from_millis(200),
        fail: true,
    });

    let mutator = controller.discrete();
    let task = tokio::spawn(async move {
        mutator
            .execute(&"lock.front".into(), EntityAction::Lock)
            .await
    });
    tokio::task::yield_now().await;
    assert_eq!(status(&controller, "lock.front"), "locked");

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, CoreError::CommandRejected { .. }));
    assert_eq!(status(&controller, "lock.front"), "unlocked");
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_does_not_revert_newer_command() {
    let hub = MockHub::new(vec![Entity::new("light.hall", "off")]);
    let controller = connected(&hub).await;
    hub.push_outcome(Outcome {
        delay: Duration::from_millis(500),
        fail: true,
    });
    hub.push_outcome(Outcome::after(Duration::from_millis(10)));

    let first = controller.discrete();
    let slow = tokio::spawn(async move {
        first
            .execute(&"light.hall".into(), EntityAction::TurnOn)
            .await
    });
    tokio::task::yield_now().await;

    controller
        .discrete()
        .execute(&"light.hall".into(), EntityAction::TurnOn)
        .await
        .unwrap();

    assert!(slow.await.unwrap().is_err());
    assert_eq!(status(&controller, "light.hall"), "on");
}

#[tokio::test]
async fn test_unsupported_action_touches_nothing() {
    let hub = MockHub::new(vec![Entity::new("light.kitchen", "off")]);
    let controller = connected(&hub).await;
    let before = controller.store().snapshot();

    let err = controller
        .discrete()
        .execute(&"light.kitchen".into(), EntityAction::Lock)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::UnsupportedAction { .. }));
    assert!(hub.calls().is_empty());
    assert!(Arc::ptr_eq(&before, &controller.store().snapshot()));
}

#[tokio::test]
async fn test_script_run_has_no_optimistic_write() {
    let hub = MockHub::new(vec![Entity::new("script.goodnight", "off")]);
    let controller = connected(&hub).await;

    controller
        .discrete()
        .execute(&"script.goodnight".into(), EntityAction::Run)
        .await
        .unwrap();

    assert_eq!(status(&controller, "script.goodnight"), "off");
    assert_eq!(hub.calls()[0].service, "turn_on");
}

// ── Continuous controls ─────────────────────────────────────────────

#[tokio::test]
async fn test_cover_slider_commits_once_on_release() {
    let hub = MockHub::new(vec![cover(40)]);
    let controller = connected(&hub).await;
    let control = controller
        .continuous("cover.blinds".into(), ControlField::CoverPosition)
        .unwrap();

    for value in [48.0, 55.0, 62.0, 70.0, 75.0] {
        control.input(value).unwrap();
    }
    assert!(hub.calls().is_empty());
    assert_eq!(control.value(), Some(75.0));

    control.release().await.unwrap();

    let calls = hub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "set_cover_position");
    assert_eq!(calls[0].data["position"], json!(75));
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(75.0));
}

#[tokio::test]
async fn test_pending_value_survives_stale_poll() {
    let hub = MockHub::new(vec![cover(40)]);
    let controller = connected(&hub).await;
    let control = controller
        .continuous("cover.blinds".into(), ControlField::CoverPosition)
        .unwrap();
    control.input(75.0).unwrap();
    control.release().await.unwrap();

    // Hub has not moved yet.
    controller.full_refresh().await.unwrap();
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(75.0));

    // Within the tolerance band: accepted and the marker clears.
    hub.set_states(vec![cover(74)]);
    controller.full_refresh().await.unwrap();
    let id = EntityId::from("cover.blinds");
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(74.0));
    assert!(
        controller
            .store()
            .snapshot()
            .pending(&id, ControlField::CoverPosition)
            .is_none()
    );
}

#[tokio::test]
async fn test_failed_commit_reverts_to_confirmed() {
    let hub = MockHub::new(vec![cover(40)]);
    let controller = connected(&hub).await;
    hub.push_outcome(Outcome::fail());

    let control = controller
        .continuous("cover.blinds".into(), ControlField::CoverPosition)
        .unwrap();
    control.input(90.0).unwrap();
    assert!(control.release().await.is_err());

    let state = controller.store().snapshot();
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(40.0));
    assert_eq!(state.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_temperature_commits_after_idle_timeout() {
    let hub = MockHub::new(vec![climate(20.0)]);
    let controller = connected(&hub).await;
    let control = controller
        .continuous("climate.living".into(), ControlField::Temperature)
        .unwrap();

    control.input(20.5).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    control.input(21.0).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    control.input(21.5).unwrap();

    // Release does not commit a debounced control.
    control.release().await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(hub.calls().is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let calls = hub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].service, "set_temperature");
    assert_eq!(calls[0].data["temperature"], json!(21.5));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_timer() {
    let hub = MockHub::new(vec![climate(20.0)]);
    let controller = connected(&hub).await;
    let control = controller
        .continuous("climate.living".into(), ControlField::Temperature)
        .unwrap();

    control.input(23.0).unwrap();
    drop(control);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(hub.calls().is_empty());
}

#[tokio::test]
async fn test_teardown_clears_marker() {
    let hub = MockHub::new(vec![cover(10)]);
    let controller = connected(&hub).await;
    let control = controller
        .continuous("cover.blinds".into(), ControlField::CoverPosition)
        .unwrap();
    control.input(60.0).unwrap();
    control.release().await.unwrap();
    assert_eq!(controller.store().snapshot().pending_count(), 1);

    control.teardown();
    assert_eq!(controller.store().snapshot().pending_count(), 0);

    // With the marker gone the next poll wins.
    controller.full_refresh().await.unwrap();
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(10.0));
}

#[tokio::test(start_paused = true)]
async fn test_commit_failing_after_teardown_still_reverts() {
    let hub = MockHub::new(vec![cover(10)]);
    let controller = connected(&hub).await;
    hub.push_outcome(Outcome {
        delay: Duration::from_secs(1),
        fail: true,
    });

    let control = Arc::new(
        controller
            .continuous("cover.blinds".into(), ControlField::CoverPosition)
            .unwrap(),
    );
    control.input(60.0).unwrap();
    let commit = tokio::spawn({
        let control = Arc::clone(&control);
        async move { control.release().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(60.0));
    control.teardown();

    assert!(commit.await.unwrap().is_err());
    assert_eq!(attribute(&controller, "cover.blinds", "current_position"), Some(10.0));
    assert_eq!(controller.store().snapshot().pending_count(), 0);
}

#[tokio::test]
async fn test_control_rejects_wrong_category() {
    let hub = MockHub::new(vec![Entity::new("light.kitchen", "on")]);
    let controller = connected(&hub).await;

    let result = controller.continuous("light.kitchen".into(), ControlField::CoverPosition);
    assert!(matches!(result, Err(CoreError::UnsupportedAction { .. })));
}
