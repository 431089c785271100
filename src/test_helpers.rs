use crate::recurrence::Recurrence;
use crate::registry::StatusRegistry;
use crate::status::{Status, StatusConfiguration, StatusType};
use crate::task::Task;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Parse a `YYYY-MM-DD` date.
pub fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

/// Create a TODO task with the given description, with all other fields defaulted.
pub fn make_task(description: &str) -> Task {
    Task {
        description: description.to_string(),
        list_marker: "-".to_string(),
        ..Task::default()
    }
}

/// Create a task with the given description and status.
pub fn make_task_with_status(description: &str, status: Status) -> Task {
    Task {
        status,
        ..make_task(description)
    }
}

/// Create a task carrying an id and `⛔` dependencies.
pub fn make_task_with_dependencies(description: &str, id: &str, depends_on: &[&str]) -> Task {
    Task {
        id: id.to_string(),
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        ..make_task(description)
    }
}

/// Create a TODO task with a recurrence rule and optional start/scheduled/due dates.
pub fn recurring_task(
    rule: &str,
    start: Option<&str>,
    scheduled: Option<&str>,
    due: Option<&str>,
) -> Task {
    Task {
        recurrence: Some(Recurrence::from_text(rule).unwrap()),
        start: start.map(date),
        scheduled: scheduled.map(date),
        due: due.map(date),
        ..make_task("Water the plants")
    }
}

/// Statuses from `[symbol, name, next symbol, type]` rows.
pub fn constructed_statuses(rows: &[[&str; 4]]) -> Vec<Status> {
    rows.iter()
        .map(|[symbol, name, next, type_text]| {
            Status::new(StatusConfiguration::new(
                symbol,
                name,
                next,
                false,
                StatusType::from_type_str(type_text),
            ))
        })
        .collect()
}

/// A registry holding exactly the statuses in `rows`.
pub fn registry_with(rows: &[[&str; 4]]) -> StatusRegistry {
    let mut registry = StatusRegistry::new();
    registry.set(constructed_statuses(rows));
    registry
}

/// Write `content` to `name` under `dir` and return the path.
pub fn write_markdown(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
