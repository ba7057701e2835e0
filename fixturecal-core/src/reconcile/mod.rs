//! Reconciling a scraped schedule against the events already in its
//! calendar.
//!
//! A pass is stateless: everything it needs is re-read from the store. Each
//! scraped event ends in at most one write, either a patch of the event it
//! matched or an insert.

mod action;
mod apply;
mod match_index;
mod plan;

pub use action::{Action, ActionKind, Counts, SkipReason};
pub use apply::{BatchReport, Report, apply};
pub use match_index::{MatchIndex, MatchKey, remote_key, scraped_key};
pub use plan::{Plan, plan};

use tracing::debug;

use crate::config::Schedule;
use crate::error::FixtureResult;
use crate::event::ScrapedEvent;
use crate::store::CalendarStore;

/// List the schedule's events, plan, and apply.
pub async fn reconcile<S: CalendarStore>(
    store: &S,
    schedule: &Schedule,
    container_id: &str,
    scraped: &[ScrapedEvent],
) -> FixtureResult<Report> {
    let existing = store.list_events(container_id, schedule.tag()).await?;
    debug!(
        schedule = %schedule.name,
        existing = existing.len(),
        scraped = scraped.len(),
        "reconciling"
    );

    let plan = plan(schedule, scraped, &existing);
    apply(store, container_id, plan).await
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone};

    use super::*;
    use crate::FixtureError;
    use crate::event::{CalendarEvent, EventColor};
    use crate::source::SourceFormat;
    use crate::store::memory::{MemoryStore, Write};

    const CAL: &str = "cal-1";
    const ZONE: chrono_tz::Tz = chrono_tz::Australia::Sydney;

    fn schedule(tag: &str) -> Schedule {
        Schedule {
            name: "Shake Shaq".to_string(),
            url: tag.to_string(),
            format: SourceFormat::Ssb,
            color: EventColor::Tomato,
            time_zone: ZONE,
            game_length: Duration::minutes(60),
            attendees: vec!["coach@example.com".to_string()],
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn game(round: &str, start: NaiveDateTime, venue: &str) -> ScrapedEvent {
        ScrapedEvent {
            round_name: round.to_string(),
            start,
            end: start + Duration::minutes(60),
            venue: venue.to_string(),
            detail_url: None,
        }
    }

    /// An event as a previous pass would have left it.
    fn synced(id: &str, tag: &str, event: &ScrapedEvent) -> CalendarEvent {
        let local = |t: NaiveDateTime| ZONE.from_local_datetime(&t).unwrap().fixed_offset();
        CalendarEvent {
            id: id.to_string(),
            start: local(event.start),
            end: local(event.end),
            summary: event.round_name.clone(),
            location: Some(event.venue.clone()).filter(|v| !v.is_empty()),
            color: Some(EventColor::Tomato),
            description: event.detail_url.clone(),
            schedule_tag: Some(tag.to_string()),
        }
    }

    fn inserts(store: &MemoryStore) -> Vec<crate::event::NewEvent> {
        store
            .writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Insert(new) => Some(new),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_game_into_empty_calendar() {
        let store = MemoryStore::new();
        let scraped = vec![ScrapedEvent {
            round_name: "R3: Lions".to_string(),
            start: at(1, 18, 0),
            end: at(1, 19, 0),
            venue: "Court 2".to_string(),
            detail_url: None,
        }];

        let report = reconcile(&store, &schedule("sched-A"), CAL, &scraped)
            .await
            .unwrap();

        assert_eq!(report.counts().inserted, 1);
        let inserted = inserts(&store);
        assert_eq!(inserted.len(), 1);
        let new = &inserted[0];
        assert_eq!(new.summary, "R3: Lions");
        assert_eq!(new.start, at(1, 18, 0));
        assert_eq!(new.end, at(1, 19, 0));
        assert_eq!(new.location, "Court 2");
        assert_eq!(new.schedule_tag, "sched-A");
        assert_eq!(new.time_zone, "Australia/Sydney");
        assert_eq!(new.color, EventColor::Tomato);
        assert_eq!(new.attendees, vec!["coach@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_new_schedule_inserts_in_scrape_order() {
        let store = MemoryStore::new();
        let scraped = vec![
            game("R2", at(8, 19, 0), "Court 1"),
            game("R1", at(1, 18, 0), "Court 2"),
            game("R3", at(15, 20, 0), "Court 3"),
        ];

        reconcile(&store, &schedule("sched-A"), CAL, &scraped)
            .await
            .unwrap();

        let rounds: Vec<_> = inserts(&store).into_iter().map(|n| n.summary).collect();
        assert_eq!(rounds, vec!["R2", "R1", "R3"]);
        assert_eq!(store.writes().len(), 3);
    }

    #[tokio::test]
    async fn test_second_pass_writes_nothing() {
        let store = MemoryStore::new();
        let mut linked = game("R2: Tigers", at(8, 20, 40), "");
        linked.detail_url = Some("https://example.com/game/9".to_string());
        let scraped = vec![game("R1: Lions", at(1, 18, 0), "Court 2"), linked];
        let schedule = schedule("sched-A");

        reconcile(&store, &schedule, CAL, &scraped).await.unwrap();
        assert_eq!(store.writes().len(), 2);
        store.clear_writes();

        let report = reconcile(&store, &schedule, CAL, &scraped).await.unwrap();
        assert!(store.writes().is_empty());
        assert_eq!(report.counts().skipped, 2);
    }

    #[tokio::test]
    async fn test_other_schedules_are_never_touched() {
        let store = MemoryStore::new();
        let theirs = game("Their game", at(1, 18, 0), "Court 9");
        store.seed(CAL, synced("b-1", "sched-B", &theirs));

        let ours = vec![game("R1: Lions", at(1, 18, 0), "Court 2")];
        reconcile(&store, &schedule("sched-A"), CAL, &ours)
            .await
            .unwrap();

        assert_eq!(inserts(&store).len(), 1);
        let untouched = store
            .events(CAL)
            .into_iter()
            .find(|e| e.id == "b-1")
            .unwrap();
        assert_eq!(untouched.summary, "Their game");
    }

    #[test]
    fn test_untagged_events_in_listing_are_ignored() {
        let theirs = game("Their game", at(1, 18, 0), "Court 9");
        let mut untagged = synced("x-1", "sched-B", &theirs);
        untagged.schedule_tag = None;

        let plan = plan(
            &schedule("sched-A"),
            &[game("R1", at(1, 18, 0), "")],
            &[synced("b-1", "sched-B", &theirs), untagged],
        );

        assert_eq!(plan.counts().inserted, 1);
    }

    #[tokio::test]
    async fn test_time_change_patches_instead_of_inserting() {
        let store = MemoryStore::new();
        let before = game("R3: Lions", at(1, 18, 0), "Court 2");
        store.seed(CAL, synced("e-1", "sched-A", &before));

        let after = vec![game("R3: Lions", at(1, 19, 0), "Court 2")];
        reconcile(&store, &schedule("sched-A"), CAL, &after)
            .await
            .unwrap();

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let Write::Patch { event_id, patch } = &writes[0] else {
            panic!("expected a patch, got {writes:?}");
        };
        assert_eq!(event_id, "e-1");
        assert_eq!(patch.start, Some(at(1, 19, 0)));
        assert_eq!(patch.end, Some(at(1, 20, 0)));
        assert_eq!(patch.location.as_deref(), Some("Court 2"));
        assert_eq!(store.events(CAL).len(), 1);

        // And the moved event is now an exact match
        store.clear_writes();
        reconcile(&store, &schedule("sched-A"), CAL, &after)
            .await
            .unwrap();
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_exact_matches_win_over_date_matches() {
        let r1 = game("R1", at(1, 18, 0), "Court 1");
        let r2 = game("R2", at(1, 20, 0), "Court 1");
        let existing = vec![synced("a", "sched-A", &r1), synced("b", "sched-A", &r2)];

        // R2 moved to 21:00 and is listed before the unchanged R1
        let scraped = vec![game("R2", at(1, 21, 0), "Court 1"), r1.clone()];
        let plan = plan(&schedule("sched-A"), &scraped, &existing);

        match &plan.actions[0] {
            Action::Patch {
                event_id,
                rescheduled,
                ..
            } => {
                assert_eq!(event_id, "b");
                assert!(*rescheduled);
            }
            other => panic!("expected patch of b, got {other:?}"),
        }
        assert!(matches!(
            &plan.actions[1],
            Action::Skip { event_id: Some(id), reason: SkipReason::UpToDate, .. } if id == "a"
        ));
    }

    #[test]
    fn test_only_changed_fields_are_patched() {
        let before = game("R3: Lions", at(1, 18, 0), "Court 2");
        let existing = vec![synced("e-1", "sched-A", &before)];

        let after = vec![game("R3: Lions", at(1, 18, 0), "Court 5")];
        let plan = plan(&schedule("sched-A"), &after, &existing);

        assert_eq!(plan.actions.len(), 1);
        let Action::Patch { patch, .. } = &plan.actions[0] else {
            panic!("expected a patch");
        };
        assert_eq!(patch.fields(), vec!["location"]);
        assert_eq!(patch.location.as_deref(), Some("Court 5"));
    }

    #[test]
    fn test_missing_remote_fields_count_as_different() {
        let before = game("R3: Lions", at(1, 18, 0), "Court 2");
        let mut current = synced("e-1", "sched-A", &before);
        current.color = None;
        current.location = None;

        let plan = plan(&schedule("sched-A"), &[before], &[current]);
        let Action::Patch { patch, .. } = &plan.actions[0] else {
            panic!("expected a patch");
        };
        assert_eq!(patch.fields(), vec!["location", "color"]);
    }

    #[test]
    fn test_cleared_detail_link_clears_description() {
        let mut before = game("R3: Lions", at(1, 18, 0), "Court 2");
        before.detail_url = Some("https://example.com/game/1".to_string());
        let existing = vec![synced("e-1", "sched-A", &before)];

        before.detail_url = None;
        let plan = plan(&schedule("sched-A"), &[before], &existing);
        let Action::Patch { patch, .. } = &plan.actions[0] else {
            panic!("expected a patch");
        };
        assert_eq!(patch.description.as_deref(), Some(""));
    }

    #[test]
    fn test_duplicate_rows_insert_once() {
        let scraped = vec![
            game("R1", at(1, 18, 0), "Court 1"),
            game("R1 (again)", at(1, 18, 0), "Court 1"),
        ];

        let plan = plan(&schedule("sched-A"), &scraped, &[]);
        assert_eq!(plan.counts().inserted, 1);
        assert!(matches!(
            plan.actions[1],
            Action::Skip {
                reason: SkipReason::DuplicateInSource,
                ..
            }
        ));
    }

    #[test]
    fn test_same_date_candidates_earliest_is_moved() {
        let morning = game("R1", at(1, 10, 0), "");
        let afternoon = game("R2", at(1, 14, 0), "");
        let existing = vec![
            synced("pm", "sched-A", &afternoon),
            synced("am", "sched-A", &morning),
        ];

        let plan = plan(
            &schedule("sched-A"),
            &[game("R1", at(1, 12, 0), "")],
            &existing,
        );

        assert_eq!(plan.actions.len(), 1);
        assert!(matches!(
            &plan.actions[0],
            Action::Patch { event_id, .. } if event_id == "am"
        ));
    }

    #[test]
    fn test_two_moved_games_on_one_date_claim_distinct_events() {
        let existing = vec![synced("only", "sched-A", &game("R1", at(1, 10, 0), ""))];
        let scraped = vec![game("R1", at(1, 11, 0), ""), game("R2", at(1, 15, 0), "")];

        let plan = plan(&schedule("sched-A"), &scraped, &existing);
        let counts = plan.counts();
        assert_eq!(counts.patched, 1);
        assert_eq!(counts.inserted, 1);
    }

    #[tokio::test]
    async fn test_patch_refused_when_tag_changed() {
        let before = game("R3: Lions", at(1, 18, 0), "Court 2");
        let store = MemoryStore::new();
        store.seed(CAL, synced("e-1", "sched-B", &before));

        // A stale listing still shows the event as ours
        let stale = vec![synced("e-1", "sched-A", &before)];
        let after = vec![game("R3: Lions", at(1, 18, 0), "Court 4")];
        let plan = plan(&schedule("sched-A"), &after, &stale);

        let err = apply(&store, CAL, plan).await.unwrap_err();
        assert!(matches!(
            err,
            FixtureError::TagMismatch { ref event_id, ref found, .. }
                if event_id == "e-1" && found.as_deref() == Some("sched-B")
        ));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_batch_totals() {
        let scraped = vec![game("R1", at(1, 18, 0), ""), game("R2", at(8, 18, 0), "")];
        let first = plan(&schedule("sched-A"), &scraped, &[]);
        let second = plan(&schedule("sched-B"), &scraped[..1], &[]);

        let batch = BatchReport(vec![
            Report {
                schedule: first.schedule.clone(),
                actions: first.actions,
            },
            Report {
                schedule: second.schedule.clone(),
                actions: second.actions,
            },
        ]);
        assert_eq!(batch.totals().inserted, 3);
        assert_eq!(batch.totals().writes(), 3);
    }
}
