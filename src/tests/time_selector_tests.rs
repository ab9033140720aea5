//! tests/time_selector_tests.rs
//! Pruebas del selector de hora de entrega (función pura).

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveTime, Weekday};

    use crate::errors::SchedulingError;
    use crate::models::calendar_model::ConflictInterval;
    use crate::models::preference_model::RecipientPreference;
    use crate::services::time_selector::select_time;
    use crate::tests::ts;

    fn monday_nine() -> RecipientPreference {
        let mut pref = RecipientPreference::defaults_for("r-1", ts("2024-01-01T00:00:00Z"));
        pref.preferred_days = vec![Weekday::Mon];
        pref.preferred_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        pref
    }

    #[test]
    fn picks_next_preferred_day() {
        // 2024-01-02 es martes
        let earliest = ts("2024-01-02T08:00:00Z");
        let latest = earliest + Duration::days(7);

        let slot = select_time(&monday_nine(), &[], earliest, latest).unwrap();
        assert_eq!(slot, Some(ts("2024-01-08T09:00:00Z")));
    }

    #[test]
    fn conflict_pushes_to_following_week() {
        let earliest = ts("2024-01-02T08:00:00Z");
        let conflicts = [ConflictInterval::new(
            ts("2024-01-08T08:30:00Z"),
            ts("2024-01-08T09:30:00Z"),
        )];

        let slot = select_time(&monday_nine(), &conflicts, earliest, earliest + Duration::days(14))
            .unwrap();
        assert_eq!(slot, Some(ts("2024-01-15T09:00:00Z")));
    }

    #[test]
    fn exhausted_window_returns_none() {
        let earliest = ts("2024-01-02T08:00:00Z");
        let conflicts = [ConflictInterval::new(
            ts("2024-01-08T08:30:00Z"),
            ts("2024-01-08T09:30:00Z"),
        )];

        let slot =
            select_time(&monday_nine(), &conflicts, earliest, earliest + Duration::days(7)).unwrap();
        assert_eq!(slot, None);
    }

    #[test]
    fn skips_candidate_before_earliest() {
        // Lunes, pero ya pasó la hora preferida
        let earliest = ts("2024-01-08T10:00:00Z");
        let slot =
            select_time(&monday_nine(), &[], earliest, earliest + Duration::days(7)).unwrap();
        assert_eq!(slot, Some(ts("2024-01-15T09:00:00Z")));
    }

    #[test]
    fn candidate_equal_to_bounds_is_accepted() {
        let at = ts("2024-01-08T09:00:00Z");
        assert_eq!(select_time(&monday_nine(), &[], at, at).unwrap(), Some(at));
    }

    #[test]
    fn candidate_after_latest_is_rejected() {
        let earliest = ts("2024-01-08T00:00:00Z");
        let latest = ts("2024-01-08T08:59:00Z");
        assert_eq!(select_time(&monday_nine(), &[], earliest, latest).unwrap(), None);
    }

    #[test]
    fn adjacent_conflicts_do_not_block() {
        let earliest = ts("2024-01-02T08:00:00Z");
        // [08:00, 09:00) y [10:00, 11:00) tocan la ventana [09:00, 10:00) sin solaparla
        let conflicts = [
            ConflictInterval::new(ts("2024-01-08T08:00:00Z"), ts("2024-01-08T09:00:00Z")),
            ConflictInterval::new(ts("2024-01-08T10:00:00Z"), ts("2024-01-08T11:00:00Z")),
        ];

        let slot =
            select_time(&monday_nine(), &conflicts, earliest, earliest + Duration::days(7)).unwrap();
        assert_eq!(slot, Some(ts("2024-01-08T09:00:00Z")));
    }

    #[test]
    fn conflict_inside_delivery_window_blocks() {
        let earliest = ts("2024-01-02T08:00:00Z");
        let conflicts = [ConflictInterval::new(
            ts("2024-01-08T09:59:00Z"),
            ts("2024-01-08T10:30:00Z"),
        )];

        let slot =
            select_time(&monday_nine(), &conflicts, earliest, earliest + Duration::days(7)).unwrap();
        assert_eq!(slot, None);
    }

    #[test]
    fn invalid_range_is_an_error() {
        let earliest = ts("2024-01-09T00:00:00Z");
        let latest = ts("2024-01-02T00:00:00Z");

        let err = select_time(&monday_nine(), &[], earliest, latest).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidRange { .. }));
    }

    #[test]
    fn same_inputs_same_result() {
        let pref = RecipientPreference::defaults_for("r-2", ts("2024-01-01T00:00:00Z"));
        let earliest = ts("2024-01-02T08:00:00Z");
        let latest = earliest + Duration::days(7);

        let first = select_time(&pref, &[], earliest, latest).unwrap();
        let second = select_time(&pref, &[], earliest, latest).unwrap();
        assert_eq!(first, second);
        // Defaults: lunes/miércoles/viernes a las 10:00
        assert_eq!(first, Some(ts("2024-01-03T10:00:00Z")));
    }

    #[test]
    fn result_always_on_preferred_day_and_time() {
        let pref = RecipientPreference::defaults_for("r-3", ts("2024-01-01T00:00:00Z"));
        let mut earliest = ts("2024-01-01T00:00:00Z");
        for _ in 0..14 {
            if let Some(slot) =
                select_time(&pref, &[], earliest, earliest + Duration::days(7)).unwrap()
            {
                assert!(pref.prefers(chrono::Datelike::weekday(&slot)));
                assert_eq!(slot.time(), pref.preferred_time);
                assert!(slot >= earliest);
            }
            earliest += Duration::hours(13);
        }
    }
}
