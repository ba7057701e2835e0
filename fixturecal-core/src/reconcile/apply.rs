//! Performing a plan against a calendar store.

use tracing::{debug, info};

use crate::error::{FixtureError, FixtureResult};
use crate::reconcile::action::{Action, Counts};
use crate::reconcile::plan::Plan;
use crate::store::CalendarStore;

/// What a reconciliation pass wrote.
#[derive(Debug, Clone)]
pub struct Report {
    pub schedule: String,
    pub actions: Vec<Action>,
}

impl Report {
    pub fn counts(&self) -> Counts {
        Counts::tally(self.actions.iter())
    }
}

/// Reports for every schedule in a run.
pub struct BatchReport(pub Vec<Report>);

impl BatchReport {
    pub fn totals(&self) -> Counts {
        let mut totals = Counts::default();
        for report in &self.0 {
            totals += report.counts();
        }
        totals
    }
}

/// Write `plan` to `container_id`, one store call per action, in order.
///
/// Each patch target is re-read first; an event whose tag no longer names
/// this schedule is never modified.
pub async fn apply<S: CalendarStore>(
    store: &S,
    container_id: &str,
    plan: Plan,
) -> FixtureResult<Report> {
    for action in &plan.actions {
        match action {
            Action::Skip { event, reason, .. } => {
                debug!(schedule = %plan.schedule, round = %event.round_name, ?reason, "skipped");
            }
            Action::Patch {
                event,
                event_id,
                patch,
                rescheduled,
            } => {
                let current = store.get_event(container_id, event_id).await?;
                if current.schedule_tag.as_deref() != Some(plan.tag.as_str()) {
                    return Err(FixtureError::TagMismatch {
                        event_id: event_id.clone(),
                        expected: plan.tag.clone(),
                        found: current.schedule_tag,
                    });
                }

                let id = store.patch_event(container_id, event_id, patch).await?;
                info!(
                    schedule = %plan.schedule,
                    round = %event.round_name,
                    event_id = %id,
                    fields = ?patch.fields(),
                    rescheduled,
                    "patched event"
                );
            }
            Action::Insert { event, new } => {
                let id = store.create_event(container_id, new).await?;
                info!(
                    schedule = %plan.schedule,
                    round = %event.round_name,
                    event_id = %id,
                    start = %new.start,
                    "inserted event"
                );
            }
        }
    }

    Ok(Report {
        schedule: plan.schedule,
        actions: plan.actions,
    })
}
