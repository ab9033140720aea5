//! tests/scheduling_tests.rs
//! Pruebas de preferencias, calendario y planificación de campañas.

#[cfg(test)]
mod tests {
    use actix_rt::test;
    use chrono::{Duration, NaiveTime, Weekday};

    use crate::errors::{SchedulingError, ValidationError};
    use crate::models::calendar_model::CreateCalendarEventRequest;
    use crate::models::preference_model::{Frequency, UpdatePreferencesRequest};
    use crate::models::schedule_model::ScheduleRequest;
    use crate::models::update_model::{PlanUpdateRequest, UpdateContent, UpdateStatus};
    use crate::services::event_bus::UpdateEvent;
    use crate::tests::{ts, TestContext};

    fn content(title: &str) -> UpdateContent {
        UpdateContent {
            title: title.to_string(),
            summary: "Weekly numbers".to_string(),
            metrics: Default::default(),
            highlights: vec![],
            recommendations: vec![],
        }
    }

    async fn prefer(ctx: &TestContext, recipient_id: &str, days: Vec<Weekday>, hour: u32) {
        ctx.preference_service
            .update_preferences(
                recipient_id,
                UpdatePreferencesRequest {
                    preferred_time: NaiveTime::from_hms_opt(hour, 0, 0),
                    preferred_days: Some(days),
                    ..Default::default()
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .expect("preferences");
    }

    #[test]
    async fn unknown_recipient_gets_persisted_defaults() {
        let ctx = TestContext::new().await;
        let now = ts("2024-01-02T08:00:00Z");

        assert!(ctx.preference_service.get_preferences("new").await.unwrap().is_none());
        let pref = ctx
            .preference_service
            .get_or_create_default("new", now)
            .await
            .unwrap();
        assert_eq!(pref.preferred_days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(pref.preferred_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(pref.frequency, Frequency::Weekly);
        assert_eq!(pref.engagement_score, 0.5);

        let stored = ctx.preference_service.get_preferences("new").await.unwrap();
        assert_eq!(stored, Some(pref));
    }

    #[test]
    async fn invalid_preferences_are_rejected() {
        let ctx = TestContext::new().await;

        let err = ctx
            .preference_service
            .update_preferences(
                "r-1",
                UpdatePreferencesRequest {
                    preferred_days: Some(vec![]),
                    ..Default::default()
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyWeekdays)
        );

        let err = ctx
            .preference_service
            .update_preferences(
                "r-1",
                UpdatePreferencesRequest {
                    engagement_score: Some(1.5),
                    ..Default::default()
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
        assert!(ctx.preference_service.get_preferences("r-1").await.unwrap().is_none());
    }

    #[test]
    async fn unknown_stored_day_names_fall_back_to_defaults() {
        let ctx = TestContext::new().await;
        sqlx::query(
            r#"
            INSERT INTO recipient_preferences (
                recipient_id, preferred_time, preferred_days, preferred_frequency,
                engagement_score, last_contact, updated_at
            )
            VALUES ('legacy', '09:00', '["Funday"]', 'weekly', 0.5, NULL, '2024-01-01T00:00:00.000Z')
            "#,
        )
        .execute(&ctx.db_pool)
        .await
        .unwrap();

        let pref = ctx
            .preference_service
            .get_preferences("legacy")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pref.preferred_days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(pref.preferred_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    async fn calendar_rejects_empty_interval() {
        let ctx = TestContext::new().await;
        let err = ctx
            .calendar_service
            .add_event(CreateCalendarEventRequest {
                start_time: ts("2024-01-08T09:00:00Z"),
                end_time: ts("2024-01-08T09:00:00Z"),
                title: "Zero".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyInterval)
        );
    }

    #[test]
    async fn list_events_filters_by_overlap() {
        let ctx = TestContext::new().await;
        for (start, end) in [
            ("2024-01-08T08:30:00Z", "2024-01-08T09:30:00Z"),
            ("2024-01-10T12:00:00Z", "2024-01-10T13:00:00Z"),
        ] {
            ctx.calendar_service
                .add_event(CreateCalendarEventRequest {
                    start_time: ts(start),
                    end_time: ts(end),
                    title: "Busy".to_string(),
                    description: None,
                })
                .await
                .unwrap();
        }

        let all = ctx.calendar_service.list_events(None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let monday = ctx
            .calendar_service
            .list_events(Some(ts("2024-01-08T09:00:00Z")), Some(ts("2024-01-09T00:00:00Z")))
            .await
            .unwrap();
        assert_eq!(monday.len(), 1);
        assert_eq!(monday[0].start_time, ts("2024-01-08T08:30:00Z"));
    }

    #[test]
    async fn stored_conflicts_shape_the_schedule() {
        let ctx = TestContext::new().await;
        prefer(&ctx, "r-1", vec![Weekday::Mon], 9).await;
        ctx.calendar_service
            .add_event(CreateCalendarEventRequest {
                start_time: ts("2024-01-08T08:30:00Z"),
                end_time: ts("2024-01-08T09:30:00Z"),
                title: "Board meeting".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let earliest = ts("2024-01-02T08:00:00Z");
        let schedule = ctx
            .scheduling_service
            .get_optimal_schedule(
                &ScheduleRequest {
                    campaign_id: "spring".to_string(),
                    recipient_ids: vec!["r-1".to_string()],
                    content_type: "weekly".to_string(),
                    earliest_time: Some(earliest),
                    latest_time: Some(earliest + Duration::days(14)),
                },
                earliest,
            )
            .await
            .unwrap();

        assert_eq!(schedule.slot_for("r-1"), Some(ts("2024-01-15T09:00:00Z")));

        let entries = ctx.scheduling_service.list_schedule("spring").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].recipient_id, "r-1");
        assert_eq!(entries[0].scheduled_time, ts("2024-01-15T09:00:00Z"));
    }

    #[test]
    async fn default_window_is_seven_days() {
        let ctx = TestContext::new().await;
        let now = ts("2024-01-02T08:00:00Z");

        let schedule = ctx
            .scheduling_service
            .get_optimal_schedule(
                &ScheduleRequest {
                    campaign_id: "c".to_string(),
                    recipient_ids: vec!["fresh".to_string()],
                    content_type: "weekly".to_string(),
                    earliest_time: None,
                    latest_time: None,
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(schedule.earliest_time, now);
        assert_eq!(schedule.latest_time, now + Duration::days(7));
        // Defaults: el miércoles siguiente a las 10:00
        assert_eq!(schedule.slot_for("fresh"), Some(ts("2024-01-03T10:00:00Z")));
        assert!(ctx.preference_service.get_preferences("fresh").await.unwrap().is_some());
    }

    #[test]
    async fn inverted_window_is_rejected() {
        let ctx = TestContext::new().await;
        let err = ctx
            .scheduling_service
            .get_optimal_schedule(
                &ScheduleRequest {
                    campaign_id: "c".to_string(),
                    recipient_ids: vec!["r".to_string()],
                    content_type: "weekly".to_string(),
                    earliest_time: Some(ts("2024-01-09T00:00:00Z")),
                    latest_time: Some(ts("2024-01-02T00:00:00Z")),
                },
                ts("2024-01-01T00:00:00Z"),
            )
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<SchedulingError>().is_some());
    }

    #[test]
    async fn plan_groups_recipients_by_slot() {
        let ctx = TestContext::new().await;
        prefer(&ctx, "a", vec![Weekday::Mon], 9).await;
        prefer(&ctx, "b", vec![Weekday::Mon], 9).await;
        prefer(&ctx, "c", vec![Weekday::Thu], 15).await;
        prefer(&ctx, "d", vec![Weekday::Sun], 9).await;
        let mut events = ctx.events.subscribe();

        let earliest = ts("2024-01-02T08:00:00Z");
        let plan = ctx
            .scheduling_service
            .plan_update(
                PlanUpdateRequest {
                    campaign_id: "spring".to_string(),
                    update_type: "weekly".to_string(),
                    content: content("Spring campaign"),
                    recipients: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    channel_id: None,
                    earliest_time: Some(earliest),
                    // martes 08:00 a sábado 08:00: el domingo queda fuera
                    latest_time: Some(ts("2024-01-06T08:00:00Z")),
                },
                earliest,
            )
            .await
            .unwrap();

        // a y b prefieren lunes, d domingo
        assert_eq!(
            plan.unscheduled,
            vec!["a".to_string(), "b".to_string(), "d".to_string()]
        );
        assert_eq!(plan.updates.len(), 1);
        let thursday = &plan.updates[0];
        assert_eq!(thursday.recipients, vec!["c".to_string()]);
        assert_eq!(thursday.scheduled_time, Some(ts("2024-01-04T15:00:00Z")));
        assert_eq!(thursday.status, UpdateStatus::Scheduled);

        match events.try_recv().unwrap() {
            UpdateEvent::ScheduleComputed {
                campaign_id,
                scheduled,
                unscheduled,
            } => {
                assert_eq!(campaign_id, "spring");
                assert_eq!(scheduled, 1);
                assert_eq!(unscheduled, 3);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    async fn plan_creates_one_update_per_distinct_slot() {
        let ctx = TestContext::new().await;
        prefer(&ctx, "a", vec![Weekday::Mon], 9).await;
        prefer(&ctx, "b", vec![Weekday::Mon], 9).await;
        prefer(&ctx, "c", vec![Weekday::Wed], 14).await;

        let earliest = ts("2024-01-02T08:00:00Z");
        let plan = ctx
            .scheduling_service
            .plan_update(
                PlanUpdateRequest {
                    campaign_id: "q1".to_string(),
                    update_type: "weekly".to_string(),
                    content: content("Q1"),
                    recipients: vec!["a".into(), "b".into(), "c".into()],
                    channel_id: None,
                    earliest_time: Some(earliest),
                    latest_time: Some(earliest + Duration::days(7)),
                },
                earliest,
            )
            .await
            .unwrap();

        assert!(plan.unscheduled.is_empty());
        assert_eq!(plan.updates.len(), 2);
        // Ordenados por hora
        assert_eq!(plan.updates[0].scheduled_time, Some(ts("2024-01-03T14:00:00Z")));
        assert_eq!(plan.updates[0].recipients, vec!["c".to_string()]);
        assert_eq!(plan.updates[1].scheduled_time, Some(ts("2024-01-08T09:00:00Z")));
        assert_eq!(plan.updates[1].recipients, vec!["a".to_string(), "b".to_string()]);

        let stored = ctx
            .update_service
            .list_updates(Some(UpdateStatus::Scheduled), Some("q1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    async fn plan_without_recipients_is_rejected() {
        let ctx = TestContext::new().await;
        let err = ctx
            .scheduling_service
            .plan_update(
                PlanUpdateRequest {
                    campaign_id: "q1".to_string(),
                    update_type: "weekly".to_string(),
                    content: content("Q1"),
                    recipients: vec![],
                    channel_id: None,
                    earliest_time: None,
                    latest_time: None,
                },
                ts("2024-01-02T08:00:00Z"),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoRecipients)
        );
    }
}
