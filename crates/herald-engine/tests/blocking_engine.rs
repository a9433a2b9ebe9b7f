// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the blocking notification engine.

mod common;

use std::io::Write;
use std::sync::Arc;

use chrono::Duration;
use herald_config::HeraldConfig;
use herald_context::ContextRegistry;
use herald_core::{
    Clock, HeraldError, NotificationAdapter, NotificationAttachment, NotificationStatus,
    NotificationType, NotificationUpdate, OneOffRecipient, Page, UserId,
};
use herald_engine::NotificationService;
use herald_test_utils::{ManualClock, MemoryBackend, RecordingAdapter};
use tracing_test::traced_test;

use common::{blocking_registry, welcome_request, Calls, ALWAYS_FAILS};

struct Fixture {
    backend: MemoryBackend,
    clock: ManualClock,
    calls: Calls,
    service: NotificationService,
}

fn fixture_with(adapters: &[RecordingAdapter], config: HeraldConfig) -> Fixture {
    let clock = ManualClock::fixed();
    let backend = MemoryBackend::with_clock(Arc::new(clock.clone()));
    let calls = Calls::default();
    let adapters: Vec<Arc<dyn NotificationAdapter>> = adapters
        .iter()
        .cloned()
        .map(|a| Arc::new(a) as Arc<dyn NotificationAdapter>)
        .collect();
    let service = NotificationService::new(
        Arc::new(backend.clone()),
        adapters,
        blocking_registry(&calls),
        &config,
    )
    .unwrap()
    .with_clock(Arc::new(clock.clone()));
    Fixture {
        backend,
        clock,
        calls,
        service,
    }
}

fn fixture(adapters: &[RecordingAdapter]) -> Fixture {
    fixture_with(adapters, HeraldConfig::default())
}

fn user() -> UserId {
    UserId::from("user-42")
}

#[test]
fn created_notification_is_pending_and_context_not_generated() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);

    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    assert_eq!(n.details.status, NotificationStatus::Pending);
    assert_eq!(fx.calls.get(), 0);
    assert_eq!(email.delivery_count(), 0);
    assert_eq!(fx.backend.calls(), vec!["persist_notification"]);
}

#[test]
fn scheduled_notification_waits_for_send_after() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let at = fx.clock.now() + Duration::hours(2);

    let n = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email).send_after(at),
        )
        .unwrap();

    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(
        fx.service.get_notification(&n.id).unwrap().status(),
        NotificationStatus::Pending
    );
    assert_eq!(fx.service.get_future_notifications(Page::default()).unwrap().len(), 1);

    fx.clock.advance(Duration::hours(2));
    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(email.delivery_count(), 1);
    assert_eq!(fx.calls.get(), 1);
}

#[test]
fn unregistered_context_fails_before_any_backend_call() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let mut request = welcome_request(NotificationType::Email);
    request.context_name = "nope".into();

    let err = fx.service.create_notification(&user(), request).unwrap_err();
    assert!(matches!(err, HeraldError::ContextNotRegistered { ref name } if name == "nope"));
    assert!(fx.backend.calls().is_empty());
}

#[test]
fn async_generator_is_rejected_by_blocking_engine() {
    let backend = MemoryBackend::new();
    let registry = Arc::new(ContextRegistry::new());
    registry
        .register_async("async_only", |_: herald_core::ContextKwargs| async {
            Ok::<_, herald_core::BoxError>(herald_core::NotificationContext::new())
        })
        .unwrap();
    let service = NotificationService::new(
        Arc::new(backend.clone()),
        vec![],
        registry,
        &HeraldConfig::default(),
    )
    .unwrap();

    let mut request = welcome_request(NotificationType::Email);
    request.context_name = "async_only".into();
    let err = service.create_notification(&user(), request).unwrap_err();
    assert!(matches!(err, HeraldError::ContextFlavorMismatch { .. }));
    assert!(backend.calls().is_empty());
}

#[test]
#[traced_test]
fn partial_adapter_failure_marks_failed_with_failing_message() {
    let ok = RecordingAdapter::new("smtp", NotificationType::Email);
    let broken = RecordingAdapter::failing("ses", NotificationType::Email, "connection reset by peer");
    let fx = fixture(&[ok.clone(), broken.clone()]);

    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    let summary = fx.service.send_pending_notifications().unwrap();

    assert_eq!((summary.sent, summary.failed), (0, 1));
    assert_eq!(ok.delivery_count(), 1);
    assert_eq!(broken.attempts(), vec![n.id.clone()]);

    let stored = fx.service.get_notification(&n.id).unwrap();
    assert_eq!(stored.status(), NotificationStatus::Failed);
    let message = stored.details().error_message.clone().unwrap();
    assert!(message.contains("connection reset by peer"), "{message}");
    assert!(stored.details().failed_at.is_some());

    assert!(logs_contain("adapter failed to send notification"));
    assert!(logs_contain("dispatch pass complete"));
}

#[test]
fn one_off_email_is_sent_once() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);

    let n = fx
        .service
        .create_one_off_notification(
            &OneOffRecipient::new("user@example.com", "Jane", "Doe"),
            welcome_request(NotificationType::Email),
        )
        .unwrap();
    assert_eq!(n.details.status, NotificationStatus::Pending);

    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.sent, 1);

    let deliveries = email.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].recipient, "user@example.com");
    assert_eq!(deliveries[0].rendered.body, "Hello Ada, welcome to Herald!");
    assert_eq!(
        deliveries[0].rendered.subject.as_deref(),
        Some("Welcome aboard, Ada")
    );

    let stored = fx.service.get_notification(&n.id).unwrap();
    assert_eq!(stored.status(), NotificationStatus::Sent);
    assert_eq!(stored.details().adapter_used.as_deref(), Some("email"));
    assert_eq!(
        stored.details().context_used.as_ref().unwrap().get("first_name").unwrap(),
        "Ada"
    );
}

#[test]
fn malformed_one_off_target_is_rejected_before_backend() {
    let fx = fixture(&[RecordingAdapter::new("sms", NotificationType::Sms)]);
    let err = fx
        .service
        .create_one_off_notification(
            &OneOffRecipient::new("not-a-phone", "Jane", "Doe"),
            welcome_request(NotificationType::Sms),
        )
        .unwrap_err();
    assert!(matches!(err, HeraldError::InvalidTarget { .. }));
    assert!(fx.backend.calls().is_empty());
}

#[test]
fn update_allowed_only_while_pending() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    let updated = fx
        .service
        .update_notification(
            &n.id,
            NotificationUpdate {
                title: Some("Welcome (v2)".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.details().title, "Welcome (v2)");
    assert_eq!(updated.status(), NotificationStatus::Pending);

    fx.service.send_notification(&n.id).unwrap();

    let err = fx
        .service
        .update_notification(
            &n.id,
            NotificationUpdate {
                title: Some("too late".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HeraldError::InvalidStatusTransition {
            status: NotificationStatus::Sent,
            ..
        }
    ));

    let annotated = fx
        .service
        .update_notification(
            &n.id,
            NotificationUpdate {
                error_message: Some("bounced after delivery".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(annotated.status(), NotificationStatus::Sent);
    assert_eq!(
        annotated.details().error_message.as_deref(),
        Some("bounced after delivery")
    );
}

#[test]
fn update_validates_new_context_name() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    let err = fx
        .service
        .update_notification(
            &n.id,
            NotificationUpdate {
                context_name: Some("missing_ctx".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, HeraldError::ContextNotRegistered { .. }));
}

#[test]
fn cancelled_notification_is_skipped() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    let cancelled = fx.service.cancel_notification(&n.id).unwrap();
    assert_eq!(cancelled.status(), NotificationStatus::Cancelled);

    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.total(), 0);
    assert_eq!(email.delivery_count(), 0);

    assert!(matches!(
        fx.service.cancel_notification(&n.id).unwrap_err(),
        HeraldError::InvalidStatusTransition { .. }
    ));
    assert!(matches!(
        fx.service.send_notification(&n.id).unwrap_err(),
        HeraldError::InvalidStatusTransition {
            status: NotificationStatus::Cancelled,
            ..
        }
    ));
}

#[test]
fn adapters_distinguish_inline_and_regular_attachments() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);

    let mut report = tempfile::Builder::new()
        .prefix("report")
        .suffix(".txt")
        .tempfile()
        .unwrap();
    report.write_all(b"monthly report").unwrap();

    let n = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email)
                .attachment(
                    NotificationAttachment::new(b"\x89PNG".to_vec())
                        .filename("logo.png")
                        .inline(),
                )
                .attachment(
                    NotificationAttachment::new(report.path().to_path_buf())
                        .filename("report.txt")
                        .description("Monthly report"),
                ),
        )
        .unwrap();
    assert_eq!(n.details.attachments.len(), 2);
    assert_eq!(n.details.attachments[0].content_type, "image/png");
    assert_eq!(n.details.attachments[1].content_type, "text/plain");

    fx.service.send_pending_notifications().unwrap();
    let delivery = &email.deliveries()[0];
    assert_eq!(delivery.inline_attachments, vec!["logo.png"]);
    assert_eq!(delivery.attachments, vec!["report.txt"]);
    assert_eq!(delivery.attachment_bytes, 4 + 14);
}

#[test]
fn failed_persist_discards_stored_attachments() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    fx.backend.fail_next_persist();

    let err = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email)
                .attachment(NotificationAttachment::new(b"data".to_vec()).filename("a.csv")),
        )
        .unwrap_err();
    assert!(matches!(err, HeraldError::Backend { .. }));
    assert_eq!(fx.backend.stored_attachment_count(), 0);
}

#[test]
fn attachment_errors_abort_creation() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let err = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email)
                .attachment(NotificationAttachment::new(b"??".to_vec())),
        )
        .unwrap_err();
    assert!(matches!(err, HeraldError::UnknownContentType));
    assert!(fx.backend.all().is_empty());
}

#[test]
fn no_capable_adapter_marks_failed() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Sms))
        .unwrap();

    let outcome = fx.service.send_notification(&n.id).unwrap();
    assert_eq!(outcome.status, NotificationStatus::Failed);
    assert_eq!(
        outcome.error.as_deref(),
        Some("no adapter configured for SMS notifications")
    );
    assert_eq!(fx.calls.get(), 0);
}

#[test]
fn context_failure_marks_failed_and_locks_content() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let mut request = welcome_request(NotificationType::Email);
    request.context_name = ALWAYS_FAILS.into();
    let n = fx.service.create_notification(&user(), request).unwrap();

    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.failed, 1);
    let failed = fx.service.get_notification(&n.id).unwrap();
    assert_eq!(failed.status(), NotificationStatus::Failed);
    assert!(failed
        .details()
        .error_message
        .as_deref()
        .unwrap()
        .contains("profile service unavailable"));
    assert_eq!(email.delivery_count(), 0);

    // Failed notifications are not picked up again by the pass.
    assert_eq!(fx.service.send_pending_notifications().unwrap().total(), 0);

    fx.service
        .update_notification(
            &n.id,
            NotificationUpdate {
                error_message: Some("retrying with default context".into()),
                ..Default::default()
            },
        )
        .unwrap();
    let err = fx
        .service
        .update_notification(
            &n.id,
            NotificationUpdate {
                context_name: Some(common::WELCOME.into()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, HeraldError::InvalidStatusTransition { .. }));
}

#[test]
fn resend_of_sent_notification_is_a_new_attempt() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    let first = fx.service.send_notification(&n.id).unwrap();
    let second = fx.service.send_notification(&n.id).unwrap();
    assert_eq!(first.status, NotificationStatus::Sent);
    assert_eq!(second.status, NotificationStatus::Sent);
    assert_eq!(second.delivered_by, vec!["email"]);
    assert_eq!(email.delivery_count(), 2);
    assert_eq!(fx.calls.get(), 2);
}

#[test]
fn pending_pass_runs_oldest_first() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let start = fx.clock.now();

    fx.clock.set(start + Duration::minutes(10));
    let newer = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    fx.clock.set(start);
    let older = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    fx.clock.set(start + Duration::minutes(20));

    fx.service.send_pending_notifications().unwrap();
    let order: Vec<_> = email
        .deliveries()
        .into_iter()
        .map(|d| d.notification_id)
        .collect();
    assert_eq!(order, vec![older.id, newer.id]);
}

#[test]
fn pass_size_is_capped_by_config() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let mut config = HeraldConfig::default();
    config.dispatch.max_notifications_per_pass = Some(2);
    let fx = fixture_with(&[email.clone()], config);
    for _ in 0..3 {
        fx.service
            .create_notification(&user(), welcome_request(NotificationType::Email))
            .unwrap();
    }

    assert_eq!(fx.service.send_pending_notifications().unwrap().sent, 2);
    assert_eq!(fx.service.get_pending_notifications(Page::default()).unwrap().len(), 1);
    assert_eq!(fx.service.send_pending_notifications().unwrap().sent, 1);
}

#[test]
fn in_app_inbox_and_read_acknowledgement() {
    let inbox = RecordingAdapter::new("inbox", NotificationType::InApp);
    let fx = fixture(&[inbox.clone()]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::InApp))
        .unwrap();

    assert!(matches!(
        fx.service.mark_read(&n.id).unwrap_err(),
        HeraldError::InvalidStatusTransition { .. }
    ));

    fx.service.send_pending_notifications().unwrap();
    let unread = fx.service.get_in_app_unread(&user(), Page::default()).unwrap();
    assert_eq!(unread.len(), 1);

    let read = fx.service.mark_read(&n.id).unwrap();
    assert_eq!(read.status(), NotificationStatus::Read);
    assert!(fx
        .service
        .get_in_app_unread(&user(), Page::default())
        .unwrap()
        .is_empty());
}

#[test]
fn unread_requires_in_app_adapter() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let err = fx
        .service
        .get_in_app_unread(&user(), Page::default())
        .unwrap_err();
    assert!(matches!(err, HeraldError::NoInAppAdapter));
}

#[test]
fn future_notifications_are_paginated_per_user() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let later = fx.clock.now() + Duration::days(1);
    for _ in 0..3 {
        fx.service
            .create_notification(
                &user(),
                welcome_request(NotificationType::Email).send_after(later),
            )
            .unwrap();
    }
    fx.service
        .create_notification(
            &UserId::from("someone-else"),
            welcome_request(NotificationType::Email).send_after(later),
        )
        .unwrap();

    let first = fx
        .service
        .get_future_notifications_from_user(&user(), Page::new(1, 2))
        .unwrap();
    let second = fx
        .service
        .get_future_notifications_from_user(&user(), Page::new(2, 2))
        .unwrap();
    assert_eq!((first.len(), second.len()), (2, 1));
    assert_eq!(fx.service.get_future_notifications(Page::new(1, 10)).unwrap().len(), 4);
}

#[test]
fn missing_notification_is_not_found() {
    let fx = fixture(&[]);
    let id = herald_core::NotificationId::from("does-not-exist");
    assert!(matches!(
        fx.service.send_notification(&id).unwrap_err(),
        HeraldError::NotificationNotFound { .. }
    ));
    assert!(matches!(
        fx.service.cancel_notification(&id).unwrap_err(),
        HeraldError::NotificationNotFound { .. }
    ));
}

#[test]
fn deleted_attachment_is_detached() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let n = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email)
                .attachment(NotificationAttachment::new(b"a,b".to_vec()).filename("x.csv")),
        )
        .unwrap();
    let attachment_id = n.details.attachments[0].id.clone();

    fx.service.delete_attachment(&attachment_id).unwrap();
    let stored = fx.service.get_notification(&n.id).unwrap();
    assert!(stored.attachments().is_empty());
    assert_eq!(fx.backend.stored_attachment_count(), 0);
}

#[test]
#[serial_test::serial]
fn globally_registered_context_drives_delivery() {
    let registry = ContextRegistry::global();
    registry.reset();
    herald_context::register_context("global_welcome", |kwargs: &herald_core::ContextKwargs| {
        Ok(herald_core::NotificationContext::new()
            .with("first_name", kwargs.get("first_name").cloned().unwrap_or_default())
            .with("product", "Herald Cloud"))
    })
    .unwrap();

    let email = RecordingAdapter::new("email", NotificationType::Email);
    let service = NotificationService::new(
        Arc::new(MemoryBackend::new()),
        vec![Arc::new(email.clone())],
        registry.clone(),
        &HeraldConfig::default(),
    )
    .unwrap();

    let mut request = welcome_request(NotificationType::Email);
    request.context_name = "global_welcome".into();
    let n = service.create_notification(&user(), request).unwrap();
    service.send_notification(&n.id).unwrap();

    assert_eq!(
        email.deliveries()[0].rendered.body,
        "Hello Ada, welcome to Herald Cloud!"
    );
    registry.reset();
}

#[test]
fn kwargs_and_adapter_parameters_are_persisted() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let params = serde_json::json!({ "template_id": "d-123", "tags": ["onboarding"] });

    let n = fx
        .service
        .create_notification(
            &user(),
            welcome_request(NotificationType::Email)
                .context_kwarg("first_name", "Grace")
                .adapter_extra_parameters(params.as_object().cloned().unwrap()),
        )
        .unwrap();
    fx.service.send_notification(&n.id).unwrap();

    let stored = fx.service.get_notification(&n.id).unwrap();
    let details = stored.details();
    assert_eq!(details.context_kwargs["first_name"], "Grace");
    assert_eq!(
        details.adapter_extra_parameters.as_ref().unwrap()["template_id"],
        "d-123"
    );
    assert_eq!(email.deliveries()[0].context.get("first_name").unwrap(), "Grace");
}

#[test]
fn zero_pass_size_is_rejected_at_construction() {
    let mut config = HeraldConfig::default();
    config.dispatch.max_notifications_per_pass = Some(0);
    let result = NotificationService::new(
        Arc::new(MemoryBackend::new()),
        vec![],
        Arc::new(ContextRegistry::new()),
        &config,
    );
    match result {
        Err(HeraldError::Config(message)) => {
            assert!(message.contains("max_notifications_per_pass"), "{message}")
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a zero pass size must be rejected"),
    }
}

#[test]
#[traced_test]
fn lost_context_snapshot_still_counts_as_sent() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let fx = fixture(&[email.clone()]);
    let queued = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    fx.backend.fail_next_context_store();
    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!((summary.sent, summary.failed, summary.errored), (1, 0, 0));
    assert_eq!(summary.outcomes[0].status, NotificationStatus::Sent);
    assert_eq!(summary.outcomes[0].delivered_by, vec!["email"]);

    let stored = fx.service.get_notification(&queued.id).unwrap();
    assert_eq!(stored.status(), NotificationStatus::Sent);
    assert!(stored.details().context_used.is_none());
    assert!(logs_contain("failed to store context used"));

    let direct = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    fx.backend.fail_next_context_store();
    let outcome = fx.service.send_notification(&direct.id).unwrap();
    assert_eq!(outcome.status, NotificationStatus::Sent);
    assert_eq!(email.delivery_count(), 2);
}

#[test]
fn background_adapter_hands_off_then_delivers() {
    let queue = RecordingAdapter::new("queue", NotificationType::Email).background();
    let fx = fixture(&[queue.clone()]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    let summary = fx.service.send_pending_notifications().unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(queue.handoffs(), vec![n.id.clone()]);
    assert_eq!(queue.delivery_count(), 0);
    assert_eq!(
        fx.service.get_notification(&n.id).unwrap().status(),
        NotificationStatus::Sent
    );
    assert!(fx.service.send_pending_notifications().unwrap().outcomes.is_empty());

    let outcome = fx.service.delayed_send(&n.id).unwrap().expect("background adapter ran");
    assert_eq!(outcome.status, NotificationStatus::Sent);
    assert_eq!(outcome.delivered_by, vec!["queue"]);
    let deliveries = queue.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].rendered.body, "Hello Ada, welcome to Herald!");
    assert_eq!(fx.calls.get(), 2);
}

#[test]
fn failed_background_delivery_marks_failed() {
    let queue = RecordingAdapter::failing("queue", NotificationType::Email, "relay down").background();
    let fx = fixture(&[queue.clone()]);
    let n = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    fx.service.send_pending_notifications().unwrap();

    let outcome = fx.service.delayed_send(&n.id).unwrap().expect("background adapter ran");
    assert_eq!(outcome.status, NotificationStatus::Failed);
    assert!(outcome.error.as_deref().is_some_and(|e| e.contains("relay down")));
    let stored = fx.service.get_notification(&n.id).unwrap();
    assert_eq!(stored.status(), NotificationStatus::Failed);
    assert!(stored.details().failed_at.is_some());
}

#[test]
fn delayed_send_without_background_adapter_changes_nothing() {
    let email = RecordingAdapter::new("email", NotificationType::Email);
    let queue = RecordingAdapter::new("queue", NotificationType::Email).background();
    let fx = fixture(&[email.clone(), queue.clone()]);

    let in_app = fx
        .service
        .create_notification(&user(), welcome_request(NotificationType::InApp))
        .unwrap();
    assert!(fx.service.delayed_send(&in_app.id).unwrap().is_none());
    assert_eq!(
        fx.service.get_notification(&in_app.id).unwrap().status(),
        NotificationStatus::Pending
    );

    let plain = fixture(&[email.clone()]);
    let n = plain
        .service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();
    assert!(plain.service.delayed_send(&n.id).unwrap().is_none());
    assert_eq!(email.delivery_count(), 0);
    assert_eq!(plain.calls.get(), 0);
}

#[test]
fn unpaginated_future_queries_cover_every_match() {
    let fx = fixture(&[RecordingAdapter::new("email", NotificationType::Email)]);
    let other = UserId::from("user-99");
    for hours in 1..=12 {
        fx.service
            .create_notification(
                &user(),
                welcome_request(NotificationType::Email).send_after(fx.clock.now() + Duration::hours(hours)),
            )
            .unwrap();
    }
    fx.service
        .create_notification(
            &other,
            welcome_request(NotificationType::Email).send_after(fx.clock.now() + Duration::minutes(5)),
        )
        .unwrap();
    fx.service
        .create_notification(&user(), welcome_request(NotificationType::Email))
        .unwrap();

    let all = fx.service.get_all_future_notifications().unwrap();
    assert_eq!(all.len(), 13);
    assert!(matches!(all[0].recipient(), herald_core::Recipient::User(u) if u == &other));
    assert_eq!(fx.service.get_future_notifications(Page::default()).unwrap().len(), 10);

    let mine = fx.service.get_all_future_notifications_from_user(&user()).unwrap();
    assert_eq!(mine.len(), 12);
    assert!(mine.windows(2).all(|w| w[0].details.send_after <= w[1].details.send_after));
}
