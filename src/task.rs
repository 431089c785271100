use crate::on_completion::OnCompletion;
use crate::recurrence::{Occurrence, Recurrence};
use crate::status::{Status, StatusType};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;

/// Task priority, from the emoji on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    Medium,
    #[default]
    None,
    Low,
    Lowest,
}

impl Priority {
    /// Sort key: 0 for Highest through 5 for Lowest
    pub fn number(&self) -> u8 {
        match self {
            Priority::Highest => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::None => 3,
            Priority::Low => 4,
            Priority::Lowest => 5,
        }
    }

    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            Priority::Highest => Some("🔺"),
            Priority::High => Some("⏫"),
            Priority::Medium => Some("🔼"),
            Priority::None => None,
            Priority::Low => Some("🔽"),
            Priority::Lowest => Some("⏬"),
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            "🔺" => Some(Priority::Highest),
            "⏫" => Some(Priority::High),
            "🔼" => Some(Priority::Medium),
            "🔽" => Some(Priority::Low),
            "⏬" => Some(Priority::Lowest),
            _ => None,
        }
    }
}

/// Where a task line lives in its file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskLocation {
    pub path: PathBuf,
    /// Zero-based line number within the file
    pub line_number: usize,
    /// Line number of the heading (or file start) that opens the task's section
    pub section_start: usize,
    /// Position of the task among the tasks of its section
    pub section_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preceding_header: Option<String>,
}

impl TaskLocation {
    pub fn new(path: impl Into<PathBuf>, line_number: usize) -> Self {
        Self {
            path: path.into(),
            line_number,
            ..Self::default()
        }
    }
}

/// One markdown task line, broken into its parts.
///
/// Tasks are values: a status change builds new tasks and leaves the input as it was.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    pub status: Status,
    /// Description text, including any tags
    pub description: String,
    pub location: TaskLocation,
    /// Leading whitespace and blockquote markers
    pub indentation: String,
    /// `-`, `*`, `+` or a numbered marker like `1.`
    pub list_marker: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub created: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    pub due: Option<NaiveDate>,
    pub done: Option<NaiveDate>,
    pub cancelled: Option<NaiveDate>,
    /// Scheduled date was taken from the file name rather than the line
    pub scheduled_date_is_inferred: bool,
    pub recurrence: Option<Recurrence>,
    pub on_completion: OnCompletion,
    pub id: String,
    pub depends_on: Vec<String>,
    /// Obsidian block reference, like ` ^abc123`
    pub block_link: String,
    /// The line as it was read
    pub original_markdown: String,
}

impl Task {
    pub fn status_type(&self) -> StatusType {
        self.status.status_type()
    }

    /// DONE, CANCELLED and NON_TASK tasks count as done.
    pub fn is_done(&self) -> bool {
        matches!(
            self.status_type(),
            StatusType::Done | StatusType::Cancelled | StatusType::NonTask
        )
    }

    pub fn occurrence(&self) -> Occurrence {
        Occurrence::new(self.start, self.scheduled, self.due)
    }

    /// A copy of this task with its start/scheduled/due dates replaced.
    pub fn with_occurrence(&self, occurrence: Occurrence) -> Task {
        Task {
            start: occurrence.start,
            scheduled: occurrence.scheduled,
            due: occurrence.due,
            ..self.clone()
        }
    }

    /// The not-done tasks this one depends on.
    pub fn blocked_by<'a>(&self, all_tasks: &'a [Task]) -> Vec<&'a Task> {
        all_tasks
            .iter()
            .filter(|t| !t.id.is_empty() && self.depends_on.contains(&t.id))
            .collect()
    }

    /// The tasks that list this one's id in their dependencies.
    pub fn blocking<'a>(&self, all_tasks: &'a [Task]) -> Vec<&'a Task> {
        if self.id.is_empty() {
            return Vec::new();
        }
        all_tasks
            .iter()
            .filter(|t| t.depends_on.contains(&self.id))
            .collect()
    }

    /// True if this task is not done and depends on a task that is not done.
    /// Only direct dependencies are considered.
    pub fn is_blocked(&self, all_tasks: &[Task]) -> bool {
        if self.depends_on.is_empty() || self.is_done() {
            return false;
        }
        self.depends_on
            .iter()
            .any(|dep_id| all_tasks.iter().any(|t| &t.id == dep_id && !t.is_done()))
    }

    /// True if this task is not done and some task that is not done depends on it.
    pub fn is_blocking(&self, all_tasks: &[Task]) -> bool {
        if self.id.is_empty() || self.is_done() {
            return false;
        }
        all_tasks
            .iter()
            .any(|t| !t.is_done() && t.depends_on.contains(&self.id))
    }

    /// Compare every user-visible field. `original_markdown` is ignored.
    pub fn identical_to(&self, other: &Task) -> bool {
        self.status.identical_to(&other.status)
            && self.description == other.description
            && self.location == other.location
            && self.indentation == other.indentation
            && self.list_marker == other.list_marker
            && self.priority == other.priority
            && self.tags == other.tags
            && self.created == other.created
            && self.start == other.start
            && self.scheduled == other.scheduled
            && self.due == other.due
            && self.done == other.done
            && self.cancelled == other.cancelled
            && self.scheduled_date_is_inferred == other.scheduled_date_is_inferred
            && self.recurrence == other.recurrence
            && self.on_completion == other.on_completion
            && self.id == other.id
            && self.depends_on == other.depends_on
            && self.block_link == other.block_link
    }
}

/// Pairwise [`Task::identical_to`] over two lists of equal length.
pub fn tasks_lists_identical(a: &[Task], b: &[Task]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical_to(y))
}
