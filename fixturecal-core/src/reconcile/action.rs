use std::fmt;

use crate::event::{EventPatch, NewEvent, ScrapedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Skip,
    Patch,
    Insert,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Skip => write!(f, "="),
            ActionKind::Patch => write!(f, "~"),
            ActionKind::Insert => write!(f, "+"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The matching calendar event already has every field right
    UpToDate,
    /// An earlier row in the same scrape had the same start
    DuplicateInSource,
}

/// What the reconciler decided for one scraped event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Skip {
        event: ScrapedEvent,
        event_id: Option<String>,
        reason: SkipReason,
    },
    Patch {
        event: ScrapedEvent,
        event_id: String,
        patch: EventPatch,
        /// Matched by date only; the game moved to a new time
        rescheduled: bool,
    },
    Insert {
        event: ScrapedEvent,
        new: NewEvent,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Skip { .. } => ActionKind::Skip,
            Action::Patch { .. } => ActionKind::Patch,
            Action::Insert { .. } => ActionKind::Insert,
        }
    }

    pub fn event(&self) -> &ScrapedEvent {
        match self {
            Action::Skip { event, .. }
            | Action::Patch { event, .. }
            | Action::Insert { event, .. } => event,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Action::Skip { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.event())
    }
}

/// Number of actions of each kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub inserted: usize,
    pub patched: usize,
    pub skipped: usize,
}

impl Counts {
    pub fn tally<'a>(actions: impl Iterator<Item = &'a Action>) -> Self {
        let mut counts = Counts::default();

        for action in actions {
            match action.kind() {
                ActionKind::Insert => counts.inserted += 1,
                ActionKind::Patch => counts.patched += 1,
                ActionKind::Skip => counts.skipped += 1,
            }
        }

        counts
    }

    pub fn writes(&self) -> usize {
        self.inserted + self.patched
    }
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.patched += other.patched;
        self.skipped += other.skipped;
    }
}
