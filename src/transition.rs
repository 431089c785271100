//! Status changes on tasks, including the fork of a completed recurring task
//! into a completed instance plus the next instance.

use crate::config::Settings;
use crate::on_completion::handle_on_completion;
use crate::recurrence::{RecurrenceCalculator, RuleCalculator};
use crate::registry::StatusRegistry;
use crate::status::{Status, StatusType};
use crate::task::Task;
use chrono::NaiveDate;
use tracing::debug;

static DEFAULT_CALCULATOR: RuleCalculator = RuleCalculator;

/// The result of changing a task's status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// The original task with its new status and dates. `None` if an
    /// on-completion `delete` removed it.
    pub completed: Option<Task>,
    /// The next instance of a recurring task, if one was created
    pub reopened: Option<Task>,
    changed: bool,
}

impl StatusChange {
    pub fn new(completed: Option<Task>, reopened: Option<Task>) -> Self {
        Self {
            completed,
            reopened,
            changed: true,
        }
    }

    /// The task was already in the requested status.
    pub fn unchanged(task: Task) -> Self {
        Self {
            completed: Some(task),
            reopened: None,
            changed: false,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn without_completed(self) -> Self {
        Self {
            completed: None,
            ..self
        }
    }

    /// `[reopened, completed]`, skipping whichever is absent.
    pub fn into_tasks(self) -> Vec<Task> {
        self.reopened.into_iter().chain(self.completed).collect()
    }

    /// Like [`StatusChange::into_tasks`], but the new instance goes after
    /// the completed one when `recurrence_on_next_line` is set.
    pub fn into_users_order(self, recurrence_on_next_line: bool) -> Vec<Task> {
        let mut tasks = self.into_tasks();
        if recurrence_on_next_line {
            tasks.reverse();
        }
        tasks
    }
}

/// Applies status changes to tasks against one registry and set of settings.
pub struct TransitionEngine<'a> {
    registry: &'a StatusRegistry,
    settings: &'a Settings,
    calculator: &'a dyn RecurrenceCalculator,
    today: NaiveDate,
}

impl<'a> TransitionEngine<'a> {
    pub fn new(registry: &'a StatusRegistry, settings: &'a Settings) -> Self {
        Self {
            registry,
            settings,
            calculator: &DEFAULT_CALCULATOR,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Pin the date used for new created dates and as the default completion date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_calculator(mut self, calculator: &'a dyn RecurrenceCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn registry(&self) -> &StatusRegistry {
        self.registry
    }

    /// Move `task` to `new_status`.
    ///
    /// `completion_date` is used for new done or cancelled dates and for
    /// `when done` recurrence; it defaults to today. Created dates on new
    /// instances always use today.
    pub fn handle_new_status(
        &self,
        task: &Task,
        new_status: &Status,
        completion_date: Option<NaiveDate>,
    ) -> StatusChange {
        if new_status.identical_to(&task.status) {
            return StatusChange::unchanged(task.clone());
        }
        let completion_date = completion_date.unwrap_or(self.today);

        let done = new_date(
            task,
            new_status,
            StatusType::Done,
            task.done,
            self.settings.set_done_date,
            completion_date,
        );
        let cancelled = new_date(
            task,
            new_status,
            StatusType::Cancelled,
            task.cancelled,
            self.settings.set_cancelled_date,
            completion_date,
        );

        let reopened = if new_status.is_completed() && !task.status.is_completed() {
            self.create_next_instance(task, new_status, completion_date)
        } else {
            None
        };

        debug!(
            path = %task.location.path.display(),
            line = task.location.line_number,
            from = task.status.symbol(),
            to = new_status.symbol(),
            recurred = reopened.is_some(),
            "changed task status"
        );

        let completed = Task {
            status: new_status.clone(),
            done,
            cancelled,
            ..task.clone()
        };
        handle_on_completion(task, StatusChange::new(Some(completed), reopened))
    }

    /// Advance `task` along its status's `next_status_symbol`.
    pub fn toggle(&self, task: &Task, completion_date: Option<NaiveDate>) -> StatusChange {
        let new_status = self.registry.get_next_status_or_create(&task.status);
        self.handle_new_status(task, &new_status, completion_date)
    }

    /// [`TransitionEngine::toggle`], flattened in the order the lines should be written.
    pub fn toggle_in_users_order(&self, task: &Task, completion_date: Option<NaiveDate>) -> Vec<Task> {
        self.toggle(task, completion_date)
            .into_users_order(self.settings.recurrence_on_next_line)
    }

    pub fn handle_new_status_in_users_order(
        &self,
        task: &Task,
        new_status: &Status,
        completion_date: Option<NaiveDate>,
    ) -> Vec<Task> {
        self.handle_new_status(task, new_status, completion_date)
            .into_users_order(self.settings.recurrence_on_next_line)
    }

    fn create_next_instance(
        &self,
        task: &Task,
        new_status: &Status,
        completion_date: NaiveDate,
    ) -> Option<Task> {
        let recurrence = task.recurrence.as_ref()?;
        let Some(occurrence) =
            self.calculator
                .next_occurrence(recurrence, &task.occurrence(), completion_date)
        else {
            debug!(rule = %recurrence, "no next occurrence, task not repeated");
            return None;
        };

        let created = if self.settings.set_created_date {
            Some(self.today)
        } else {
            None
        };

        Some(Task {
            status: self.registry.get_next_recurrence_status_or_create(new_status),
            created,
            done: None,
            cancelled: None,
            id: String::new(),
            depends_on: Vec::new(),
            block_link: String::new(),
            ..task.with_occurrence(occurrence)
        })
    }
}

/// Value for a date that tracks entry into `tracked` (done or cancelled):
/// set on entry, kept while the task stays in that type, cleared otherwise.
fn new_date(
    task: &Task,
    new_status: &Status,
    tracked: StatusType,
    old_date: Option<NaiveDate>,
    enabled: bool,
    completion_date: NaiveDate,
) -> Option<NaiveDate> {
    if new_status.status_type() != tracked {
        return None;
    }
    if task.status_type() == tracked {
        return old_date;
    }
    enabled.then_some(completion_date)
}
