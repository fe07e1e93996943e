use serde::Serialize;
use shopfront_core::{OrderStatus, TimelineEvent};

/// Something off about a fulfillment log. Logs are still rendered; issues are only flagged.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TimelineIssue {
    /// Event `index` reports a status earlier than one already seen
    StatusRegressed {
        index: usize,
        status: OrderStatus,
        after: OrderStatus,
    },
    /// Event `index` is timestamped before the event preceding it
    TimeWentBackwards { index: usize },
    /// Event `index` follows a cancellation or return
    EventAfterTerminal { index: usize, status: OrderStatus },
    /// The order's status never appears in a non-empty log
    StatusNotInTimeline { status: OrderStatus },
    /// The log already reached a later stage than the order's status
    StatusBehindTimeline {
        status: OrderStatus,
        latest: OrderStatus,
    },
}

/// Ordering rank: stages by position, exceptions after every stage.
fn rank(status: OrderStatus) -> usize {
    status.stage_index().unwrap_or(OrderStatus::STAGES.len())
}

/// Check that statuses never go backwards, timestamps never go backwards and nothing follows
/// a cancellation or return. Repeated statuses are fine (carrier scans).
pub fn audit_timeline(status: OrderStatus, timeline: &[TimelineEvent]) -> Vec<TimelineIssue> {
    let mut issues = Vec::new();
    let mut furthest: Option<OrderStatus> = None;
    let mut terminated = false;

    for (index, event) in timeline.iter().enumerate() {
        if terminated {
            issues.push(TimelineIssue::EventAfterTerminal {
                index,
                status: event.status,
            });
        }
        terminated |= event.status.is_exception();

        if let Some(previous) = index.checked_sub(1).and_then(|i| timeline.get(i)) {
            if event.occurred_at < previous.occurred_at {
                issues.push(TimelineIssue::TimeWentBackwards { index });
            }
        }

        match furthest {
            Some(after) if rank(event.status) < rank(after) => {
                issues.push(TimelineIssue::StatusRegressed {
                    index,
                    status: event.status,
                    after,
                });
            }
            _ => furthest = Some(event.status),
        }
    }

    if let Some(latest) = furthest {
        if !timeline.iter().any(|event| event.status == status) {
            issues.push(TimelineIssue::StatusNotInTimeline { status });
        }
        if rank(status) < rank(latest) {
            issues.push(TimelineIssue::StatusBehindTimeline { status, latest });
        }
    }

    issues
}
