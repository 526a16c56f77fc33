//! Queue state reduction
//!
//! Maps a full feed delivery to what a display shows: who is being served,
//! who is next, and how many tickets sit in each status. Pure and
//! deterministic; called on every feed tick.

use queue_display_types::{QueueEntry, QueueStatus, Scope};

/// Per-status ticket tally for one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub waiting: usize,
    pub called: usize,
    pub served: usize,
    pub completed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn get(&self, status: QueueStatus) -> usize {
        match status {
            QueueStatus::Waiting => self.waiting,
            QueueStatus::Called => self.called,
            QueueStatus::Served => self.served,
            QueueStatus::Completed => self.completed,
            QueueStatus::Skipped => self.skipped,
        }
    }

    fn bump(&mut self, status: QueueStatus) {
        let slot = match status {
            QueueStatus::Waiting => &mut self.waiting,
            QueueStatus::Called => &mut self.called,
            QueueStatus::Served => &mut self.served,
            QueueStatus::Completed => &mut self.completed,
            QueueStatus::Skipped => &mut self.skipped,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        QueueStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// What a display renders for one feed delivery
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedQueueView {
    pub current_serving: Option<QueueEntry>,
    /// Waiting tickets, oldest first
    pub upcoming: Vec<QueueEntry>,
    pub counts: StatusCounts,
}

impl DerivedQueueView {
    pub fn current_token(&self) -> Option<&str> {
        self.current_serving.as_ref().map(|e| e.token.as_str())
    }

    pub fn upcoming_tokens(&self) -> Vec<&str> {
        self.upcoming.iter().map(|e| e.token.as_str()).collect()
    }

    pub fn has_emergency_waiting(&self) -> bool {
        self.upcoming.iter().any(QueueEntry::is_emergency)
    }
}

/// Derive the display view for `scope` from a complete feed delivery.
///
/// When several entries are Called/Served at once, the one appearing last in
/// the feed wins: the store appends the most recent status change last.
pub fn reduce(entries: &[QueueEntry], scope: &Scope, upcoming_limit: usize) -> DerivedQueueView {
    let mut counts = StatusCounts::default();
    let mut current_serving = None;
    let mut waiting = Vec::new();

    for entry in entries.iter().filter(|e| scope.matches(e)) {
        counts.bump(entry.status);
        if entry.status.is_serving() {
            current_serving = Some(entry);
        } else if entry.status == QueueStatus::Waiting {
            waiting.push(entry);
        }
    }

    // Stable: equal timestamps keep feed order
    waiting.sort_by_key(|e| e.created_at);

    DerivedQueueView {
        current_serving: current_serving.cloned(),
        upcoming: waiting.into_iter().take(upcoming_limit).cloned().collect(),
        counts,
    }
}
