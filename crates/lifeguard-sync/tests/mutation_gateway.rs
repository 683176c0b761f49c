//! Mutation gateway behavior against a mounted dashboard: local rules run
//! before the collaborator, failures leave state untouched, successes
//! refresh the affected domain.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::{NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use common::Fixture;
use lifeguard_client::{DataAccessError, Endpoint};
use lifeguard_core::CheckInDenial;
use lifeguard_sync::{Operation, SyncHandlers};
use lifeguard_sync::error::MutationErrorKind;
use lifeguard_types::{
    AlertStatus, DayOfWeek, FlagDraft, FlagStatus, GeoPoint, LifeguardId, ScheduleTemplate,
    ShiftStatus,
};

const BEACH: GeoPoint = GeoPoint {
    latitude: 36.7213,
    longitude: -4.4214,
};

fn template(fx: &Fixture, lifeguard_id: LifeguardId) -> ScheduleTemplate {
    ScheduleTemplate {
        lifeguard_id,
        center_id: fx.center,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        start_date: NaiveDate::from_ymd_opt(2025, 7, 7).unwrap(),
        days: vec![DayOfWeek::Monday, DayOfWeek::Wednesday, DayOfWeek::Friday],
        weeks: 4,
    }
}

#[tokio::test(start_paused = true)]
async fn check_in_succeeds_inside_the_window() {
    let fx = Fixture::new();
    let lifeguard = LifeguardId::new();
    let shift = fx.todays_shift(lifeguard);
    fx.memory.seed_shift(shift.clone()).await;

    let handle = fx.mount(SyncHandlers::lifeguard()).await;
    assert!(handle.gateway().check_in_eligibility(&shift).allowed);

    let updated = handle.gateway().check_in(&shift, BEACH).await.unwrap();
    assert_eq!(updated.status, ShiftStatus::Active);
    assert_eq!(updated.check_in_time, Some(fx.now()));
    assert_eq!(updated.check_in_location, Some(BEACH));

    let shifts = handle.snapshot().shifts.unwrap();
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].status, ShiftStatus::Active);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_check_in_shows_server_message_and_changes_nothing() {
    let fx = Fixture::new();
    let shift = fx.todays_shift(LifeguardId::new());
    fx.memory.seed_shift(shift.clone()).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;
    let before = handle.snapshot();

    fx.memory
        .fail(
            Endpoint::CheckIn,
            DataAccessError::rejected(409, "Lifeguard is not assigned to this center"),
        )
        .await;
    let err = handle.gateway().check_in(&shift, BEACH).await.unwrap_err();
    assert_eq!(err.operation, Operation::CheckIn);
    assert_eq!(err.user_message(), "Lifeguard is not assigned to this center");
    assert_eq!(handle.snapshot(), before);

    fx.memory
        .fail(
            Endpoint::CheckIn,
            DataAccessError::Transport("connection refused".into()),
        )
        .await;
    let err = handle.gateway().check_in(&shift, BEACH).await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to check in. Please try again.");
    assert_eq!(handle.snapshot(), before);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn early_check_in_never_reaches_the_collaborator() {
    let fx = Fixture::new();
    let shift = fx.todays_shift(LifeguardId::new());
    fx.memory.seed_shift(shift.clone()).await;
    fx.clock.advance(TimeDelta::minutes(-90));
    let handle = fx.mount(SyncHandlers::lifeguard()).await;

    let eligibility = handle.gateway().check_in_eligibility(&shift);
    assert!(!eligibility.allowed);
    assert_eq!(eligibility.reason, Some(CheckInDenial::TooEarly));

    let err = handle.gateway().check_in(&shift, BEACH).await.unwrap_err();
    assert!(matches!(err.kind, MutationErrorKind::Rejected(_)));
    assert!(err.user_message().contains("too early"));
    assert_eq!(fx.memory.call_count(Endpoint::CheckIn).await, 0);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn second_check_out_is_refused_locally() {
    let fx = Fixture::new();
    let shift = fx.todays_shift(LifeguardId::new());
    fx.memory.seed_shift(shift.clone()).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;
    let gateway = handle.gateway();

    let active = gateway.check_in(&shift, BEACH).await.unwrap();
    fx.clock.advance(TimeDelta::hours(8));
    let done = gateway.check_out(&active).await.unwrap();
    assert_eq!(done.status, ShiftStatus::Completed);
    assert_eq!(done.check_out_time, Some(fx.now()));

    let err = gateway.check_out(&done).await.unwrap_err();
    assert_eq!(err.operation, Operation::CheckOut);
    assert!(matches!(err.kind, MutationErrorKind::Rejected(_)));
    assert_eq!(fx.memory.call_count(Endpoint::CheckOut).await, 1);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn completed_shift_cannot_be_cancelled() {
    let fx = Fixture::new();
    let mut shift = fx.todays_shift(LifeguardId::new());
    shift.status = ShiftStatus::Completed;
    fx.memory.seed_shift(shift.clone()).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;

    let err = handle.gateway().cancel_shift(&shift).await.unwrap_err();
    assert_eq!(err.operation, Operation::CancelShift);
    assert!(matches!(err.kind, MutationErrorKind::Rejected(_)));
    assert_eq!(fx.memory.call_count(Endpoint::UpdateShift).await, 0);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn scheduled_shift_can_be_cancelled() {
    let fx = Fixture::new();
    let shift = fx.todays_shift(LifeguardId::new());
    fx.memory.seed_shift(shift.clone()).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;

    let cancelled = handle.gateway().cancel_shift(&shift).await.unwrap();
    assert_eq!(cancelled.status, ShiftStatus::Cancelled);
    assert_eq!(
        handle.snapshot().shifts.unwrap()[0].status,
        ShiftStatus::Cancelled
    );

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn weekly_schedule_skips_the_overlapping_day() {
    let fx = Fixture::new();
    let lifeguard = LifeguardId::new();
    let mut busy = fx.todays_shift(lifeguard);
    busy.start_time = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
    busy.end_time = Utc.with_ymd_and_hms(2025, 7, 9, 20, 0, 0).unwrap();
    fx.memory.seed_shift(busy).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;

    let report = handle
        .gateway()
        .generate_weekly_schedule(&template(&fx, lifeguard))
        .await
        .unwrap();
    assert_eq!(report.created.len(), 11);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(fx.memory.call_count(Endpoint::CreateShift).await, 11);
    assert_eq!(handle.snapshot().shifts.unwrap().len(), 12);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn inverted_template_creates_nothing() {
    let fx = Fixture::new();
    let lifeguard = LifeguardId::new();
    let handle = fx.mount(SyncHandlers::lifeguard()).await;

    let mut bad = template(&fx, lifeguard);
    bad.start_time = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
    bad.end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let err = handle
        .gateway()
        .generate_weekly_schedule(&bad)
        .await
        .unwrap_err();
    assert_eq!(err.operation, Operation::GenerateSchedule);
    assert!(matches!(err.kind, MutationErrorKind::Template(_)));
    assert_eq!(fx.memory.call_count(Endpoint::ListShiftsForLifeguard).await, 0);
    assert_eq!(fx.memory.call_count(Endpoint::CreateShift).await, 0);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn failed_creates_are_counted_not_fatal() {
    let fx = Fixture::new();
    let handle = fx.mount(SyncHandlers::lifeguard()).await;
    fx.memory
        .fail(
            Endpoint::CreateShift,
            DataAccessError::Server {
                status: 503,
                message: None,
            },
        )
        .await;

    let report = handle
        .gateway()
        .generate_weekly_schedule(&template(&fx, LifeguardId::new()))
        .await
        .unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.skipped_count, 0);
    assert_eq!(report.failed_count, 12);
    assert_eq!(fx.memory.call_count(Endpoint::CreateShift).await, 12);

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn resolving_an_alert_refreshes_the_count() {
    let fx = Fixture::new();
    let alert = fx.alert(Some(fx.center));
    fx.memory.seed_alert(alert.clone()).await;
    fx.memory.seed_alert(fx.alert(Some(fx.center))).await;
    let handle = fx.mount(SyncHandlers::lifeguard()).await;
    assert_eq!(handle.snapshot().open_alerts, Some(2));

    let updated = handle
        .gateway()
        .update_alert_status(alert.id, AlertStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(updated.status, AlertStatus::Resolved);
    assert_eq!(handle.snapshot().open_alerts, Some(1));

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn flag_without_reason_is_refused() {
    let fx = Fixture::new();
    let handle = fx.mount(SyncHandlers::center_admin()).await;

    let err = handle
        .gateway()
        .create_flag(
            fx.center,
            &FlagDraft {
                status: FlagStatus::Red,
                reason: "   ".to_owned(),
                expires_at: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.operation, Operation::CreateFlag);
    assert_eq!(err.user_message(), "a reason is required");
    assert_eq!(fx.memory.call_count(Endpoint::CreateFlag).await, 0);

    let err = handle
        .gateway()
        .create_flag(
            fx.center,
            &FlagDraft {
                status: FlagStatus::Yellow,
                reason: "jellyfish".to_owned(),
                expires_at: Some(fx.now()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.kind, MutationErrorKind::Rejected(_)));

    handle.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn deleting_the_current_flag_falls_back_to_the_previous_one() {
    let fx = Fixture::new();
    let handle = fx.mount(SyncHandlers::center_admin()).await;
    let gateway = handle.gateway();

    let yellow = gateway
        .create_flag(
            fx.center,
            &FlagDraft {
                status: FlagStatus::Yellow,
                reason: "moderate surf".to_owned(),
                expires_at: None,
            },
        )
        .await
        .unwrap();
    fx.clock.advance(TimeDelta::minutes(10));
    let red = gateway
        .create_flag(
            fx.center,
            &FlagDraft {
                status: FlagStatus::Red,
                reason: "lightning".to_owned(),
                expires_at: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        handle.snapshot().current_flag.and_then(|d| d.flag().map(|f| f.id)),
        Some(red.id)
    );

    gateway.delete_flag(red.id).await.unwrap();
    assert_eq!(
        handle.snapshot().current_flag.and_then(|d| d.flag().map(|f| f.id)),
        Some(yellow.id)
    );

    handle.unmount().await;
}
