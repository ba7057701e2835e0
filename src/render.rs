//! Colored terminal rendering for fixturecal types.

use fixturecal_core::reconcile::{Action, ActionKind, Counts, SkipReason};
use fixturecal_core::{Plan, Report, Schedule, ScrapedEvent};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        let symbol = self.to_string();
        match self {
            ActionKind::Insert => symbol.green().to_string(),
            ActionKind::Patch => symbol.yellow().to_string(),
            ActionKind::Skip => symbol.dimmed().to_string(),
        }
    }
}

fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Insert => text.green().to_string(),
        ActionKind::Patch => text.yellow().to_string(),
        ActionKind::Skip => text.dimmed().to_string(),
    }
}

impl Render for ScrapedEvent {
    fn render(&self) -> String {
        let time = format!(
            "{} - {}",
            self.start.format("%a %d %b %Y %H:%M"),
            self.end.format("%H:%M")
        );
        if self.venue.is_empty() {
            format!("{} {}", self.round_name, time.dimmed())
        } else {
            format!("{} {} {}", self.round_name, time.dimmed(), self.venue.dimmed())
        }
    }
}

impl Render for Action {
    fn render(&self) -> String {
        let kind = self.kind();
        let event = self.event();
        let time = event.start.format("%a %d %b %H:%M").to_string();
        let line = format!(
            "{} {} {}",
            kind.render(),
            colorize(kind, &event.round_name),
            time.dimmed()
        );

        match self {
            Action::Patch {
                patch, rescheduled, ..
            } => {
                let fields = patch.fields().join(", ");
                let note = if *rescheduled {
                    format!("(rescheduled; {fields})")
                } else {
                    format!("({fields})")
                };
                format!("{line} {}", note.dimmed())
            }
            Action::Skip {
                reason: SkipReason::DuplicateInSource,
                ..
            } => format!("{line} {}", "(duplicate row on page)".dimmed()),
            _ => line,
        }
    }
}

impl Render for Schedule {
    fn render(&self) -> String {
        format!("🏀 {}", self.name)
    }
}

/// Above this many writes, list counts instead of each event.
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}

fn render_actions(actions: &[Action], verbose: bool, lines: &mut Vec<String>) {
    let shown: Vec<&Action> = actions
        .iter()
        .filter(|a| verbose || a.is_write())
        .collect();

    if verbose || shown.len() <= COMPACT_THRESHOLD {
        for action in shown {
            lines.push(format!("   {}", action.render()));
        }
        return;
    }

    let counts = Counts::tally(actions.iter());
    if counts.inserted > 0 {
        let label = format!("({} new {})", counts.inserted, pluralize(counts.inserted));
        lines.push(format!("   {} {}", "+".green(), label.green()));
    }
    if counts.patched > 0 {
        let label = format!("({} changed {})", counts.patched, pluralize(counts.patched));
        lines.push(format!("   {} {}", "~".yellow(), label.yellow()));
    }
}

/// Rendering that hides up-to-date games unless `verbose`.
pub trait ActionsRender {
    fn render(&self, verbose: bool) -> String;
}

impl ActionsRender for Plan {
    fn render(&self, verbose: bool) -> String {
        if self.actions.is_empty() {
            return "   No games on the page".dimmed().to_string();
        }
        if self.is_noop() && !verbose {
            return "   Up to date".dimmed().to_string();
        }

        let mut lines = Vec::new();
        render_actions(&self.actions, verbose, &mut lines);
        lines.join("\n")
    }
}

impl ActionsRender for Report {
    fn render(&self, verbose: bool) -> String {
        if self.actions.is_empty() {
            return "   No games on the page".dimmed().to_string();
        }
        if self.counts().writes() == 0 && !verbose {
            return "   Up to date".dimmed().to_string();
        }

        let mut lines = Vec::new();
        render_actions(&self.actions, verbose, &mut lines);
        lines.join("\n")
    }
}
