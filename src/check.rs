use crate::status::{Status, StatusConfiguration, StatusType};
use crate::task::Task;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Result of checking status settings and task dependencies for issues
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub status_problems: Vec<StatusProblems>,
    pub invalid_statuses: Vec<InvalidStatus>,
    pub cycles: Vec<Vec<String>>,
    pub orphan_refs: Vec<OrphanRef>,
    pub ok: bool,
}

/// Advisory notes about one configured status
#[derive(Debug, Clone, Serialize)]
pub struct StatusProblems {
    pub symbol: String,
    pub name: String,
    pub problems: Vec<String>,
}

/// A configured status that cannot be used as written
#[derive(Debug, Clone, Serialize)]
pub struct InvalidStatus {
    pub symbol: String,
    pub name: String,
    pub errors: Vec<String>,
}

/// A `⛔` reference to an id no task carries
#[derive(Debug, Clone, Serialize)]
pub struct OrphanRef {
    pub path: PathBuf,
    /// One-based line number
    pub line: usize,
    pub description: String,
    pub to: String,
}

/// How a symbol is shown in messages and tables
pub fn printable_symbol(symbol: &str) -> String {
    match symbol {
        "" => String::new(),
        " " => "`space`".to_string(),
        other => format!("`{}`", other),
    }
}

/// Problems for the status at `index` of `statuses`, in display order.
pub fn problems_for_status(statuses: &[StatusConfiguration], index: usize) -> Vec<String> {
    let mut problems = Vec::new();
    let Some(status) = statuses.get(index) else {
        return problems;
    };

    if status.symbol.is_empty() {
        problems.push("Empty symbol: this status will be ignored.".to_string());
        return problems;
    }

    let first_index = statuses.iter().position(|s| s.symbol == status.symbol);
    if first_index != Some(index) {
        problems.push(format!(
            "Duplicate symbol '{}': this status will be ignored.",
            printable_symbol(&status.symbol)
        ));
        return problems;
    }

    check_conventional_type(status, &mut problems);
    check_next_status_symbol(statuses, status, &mut problems);
    problems
}

fn check_conventional_type(status: &StatusConfiguration, problems: &mut Vec<String>) {
    let conventional = Status::type_for_unknown_symbol(&status.symbol);
    if status.status_type == conventional {
        return;
    }
    // Most symbols default to TODO, which says nothing about intent
    if conventional == StatusType::Todo && status.symbol != " " {
        return;
    }
    problems.push(format!(
        "For information, the conventional type for status symbol {} is {}: you may wish to review this type.",
        printable_symbol(&status.symbol),
        printable_symbol(conventional.as_str())
    ));
}

fn check_next_status_symbol(
    statuses: &[StatusConfiguration],
    status: &StatusConfiguration,
    problems: &mut Vec<String>,
) {
    let Some(next) = statuses
        .iter()
        .find(|s| s.symbol == status.next_status_symbol)
    else {
        problems.push(format!(
            "Next symbol {} is unknown: create a status with symbol {}.",
            printable_symbol(&status.next_status_symbol),
            printable_symbol(&status.next_status_symbol)
        ));
        return;
    };

    if status.status_type != StatusType::Done {
        return;
    }
    if next.status_type != StatusType::Todo && next.status_type != StatusType::InProgress {
        problems.push(
            [
                format!(
                    "This `DONE` status is followed by {}, not `TODO` or `IN_PROGRESS`.",
                    printable_symbol(next.status_type.as_str())
                ),
                "If used to complete a recurring task, it will instead be followed by `TODO` or `IN_PROGRESS`, to ensure the next task matches the `not done` filter.".to_string(),
            ]
            .join("<br>"),
        );
    }
}

/// Advisory problems for every configured status, in order.
pub fn check_status_settings(statuses: &[StatusConfiguration]) -> Vec<StatusProblems> {
    (0..statuses.len())
        .map(|index| StatusProblems {
            symbol: statuses[index].symbol.clone(),
            name: statuses[index].name.clone(),
            problems: problems_for_status(statuses, index),
        })
        .collect()
}

/// Errors that make a status definition unusable: symbol, name, next symbol.
pub fn validate_status(status: &StatusConfiguration) -> Vec<String> {
    let mut errors = validate_one_symbol(&status.symbol, "Task Status Symbol");
    if status.name.is_empty() {
        errors.push("Task Status Name cannot be empty.".to_string());
    }
    errors.extend(validate_one_symbol(
        &status.next_status_symbol,
        "Task Next Status Symbol",
    ));
    errors
}

fn validate_one_symbol(symbol: &str, label: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let length = symbol.chars().count();
    if length == 0 {
        errors.push(format!("{} cannot be empty.", label));
    }
    if length > 1 {
        errors.push(format!("{} (\"{}\") must be a single character.", label, symbol));
    }
    errors
}

/// Check for cycles in `⛔` dependencies between task ids
pub fn check_cycles(tasks: &[Task]) -> Vec<Vec<String>> {
    let mut by_id: HashMap<&str, &Task> = HashMap::new();
    for task in tasks {
        if !task.id.is_empty() {
            by_id.entry(task.id.as_str()).or_insert(task);
        }
    }

    let mut cycles = Vec::new();
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for task in tasks {
        if !task.id.is_empty() && !visited.contains(&task.id) {
            find_cycles(
                &by_id,
                &task.id,
                &mut visited,
                &mut rec_stack,
                &mut path,
                &mut cycles,
            );
        }
    }

    cycles
}

fn find_cycles(
    by_id: &HashMap<&str, &Task>,
    task_id: &str,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(task_id.to_string());
    rec_stack.insert(task_id.to_string());
    path.push(task_id.to_string());

    if let Some(task) = by_id.get(task_id) {
        for dep_id in &task.depends_on {
            if !visited.contains(dep_id) {
                find_cycles(by_id, dep_id, visited, rec_stack, path, cycles);
            } else if rec_stack.contains(dep_id)
                && let Some(pos) = path.iter().position(|x| x == dep_id)
            {
                cycles.push(path[pos..].to_vec());
            }
        }
    }

    path.pop();
    rec_stack.remove(task_id);
}

/// Check for dependencies on ids that no task carries
pub fn check_orphans(tasks: &[Task]) -> Vec<OrphanRef> {
    let ids: HashSet<&str> = tasks
        .iter()
        .filter(|t| !t.id.is_empty())
        .map(|t| t.id.as_str())
        .collect();

    let mut orphans = Vec::new();
    for task in tasks {
        for dep_id in &task.depends_on {
            if !ids.contains(dep_id.as_str()) {
                orphans.push(OrphanRef {
                    path: task.location.path.clone(),
                    line: task.location.line_number + 1,
                    description: task.description.clone(),
                    to: dep_id.clone(),
                });
            }
        }
    }
    orphans
}

/// Run all checks and return a summary
pub fn check_all(statuses: &[StatusConfiguration], tasks: &[Task]) -> CheckResult {
    let status_problems = check_status_settings(statuses)
        .into_iter()
        .filter(|p| !p.problems.is_empty())
        .collect();
    let invalid_statuses: Vec<InvalidStatus> = statuses
        .iter()
        .filter_map(|s| {
            let errors = validate_status(s);
            (!errors.is_empty()).then(|| InvalidStatus {
                symbol: s.symbol.clone(),
                name: s.name.clone(),
                errors,
            })
        })
        .collect();
    let cycles = check_cycles(tasks);
    let orphan_refs = check_orphans(tasks);

    // Status problems, cycles and orphans are warnings; only unusable
    // status definitions make the check fail
    let ok = invalid_statuses.is_empty();

    CheckResult {
        status_problems,
        invalid_statuses,
        cycles,
        orphan_refs,
        ok,
    }
}
