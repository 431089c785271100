//! Editing and searching the `🆔` / `⛔` dependency links between tasks.

use crate::task::Task;
use std::cmp::Ordering;
use rand::Rng;

pub const MAX_SEARCH_RESULTS: usize = 20;
const ID_LENGTH: usize = 6;
const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Tasks whose description contains `search`, suitable as a new dependency of `task`.
///
/// Leaves out template lines, `task` itself and tasks it is already linked
/// to. Tasks in the same file come first, nearest line first.
pub fn search_for_candidate_tasks_for_dependency<'a>(
    search: &str,
    all_tasks: &'a [Task],
    task: &Task,
    blocked_by: &[&Task],
    blocking: &[&Task],
) -> Vec<&'a Task> {
    let search = search.to_lowercase();
    let mut results: Vec<&Task> = all_tasks
        .iter()
        .filter(|item| item.description.to_lowercase().contains(&search))
        .filter(|item| !(item.description.contains("<%") && item.description.contains("%>")))
        .filter(|item| {
            let same_task = item.description == task.description
                && item.location.path == task.location.path
                && item.original_markdown == task.original_markdown;
            let related = blocked_by
                .iter()
                .chain(blocking)
                .any(|linked| std::ptr::eq(*linked, *item) || linked.identical_to(item));
            !same_task && !related
        })
        .collect();

    results.sort_by(|a, b| {
        let a_same = a.location.path == task.location.path;
        let b_same = b.location.path == task.location.path;
        match (a_same, b_same) {
            (true, true) => line_distance(a, task).cmp(&line_distance(b, task)),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Ordering::Equal,
        }
    });
    results.truncate(MAX_SEARCH_RESULTS);
    results
}

fn line_distance(a: &Task, b: &Task) -> usize {
    a.location.line_number.abs_diff(b.location.line_number)
}

/// A random six character lowercase alphanumeric id not in `existing_ids`.
pub fn generate_unique_id(existing_ids: &[String]) -> String {
    loop {
        let id = random_id();
        if !existing_ids.contains(&id) {
            return id;
        }
    }
}

fn random_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| char::from(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())]))
        .collect()
}

/// `child` unchanged if it has an id, otherwise a copy with a fresh one.
pub fn ensure_task_has_id(child: &Task, existing_ids: &[String]) -> Task {
    if !child.id.is_empty() {
        return child.clone();
    }
    Task {
        id: generate_unique_id(existing_ids),
        ..child.clone()
    }
}

/// Replace `parent`'s dependencies with the ids of `children`.
pub fn set_dependencies_on_tasks_with_ids(parent: &Task, children: &[Task]) -> Task {
    let depends_on: Vec<String> = children.iter().map(|t| t.id.clone()).collect();
    Task {
        depends_on,
        ..parent.clone()
    }
}

/// Make `parent` depend on `child`, which must already have an id.
pub fn add_dependency_to_parent(parent: &Task, child: &Task) -> Task {
    if parent.depends_on.contains(&child.id) {
        return parent.clone();
    }
    let mut depends_on = parent.depends_on.clone();
    depends_on.push(child.id.clone());
    Task {
        depends_on,
        ..parent.clone()
    }
}

/// Make `parent` depend on `child`, giving `child` an id first if needed.
/// Returns `(new_parent, new_child)`.
pub fn add_dependency(parent: &Task, child: &Task, existing_ids: &[String]) -> (Task, Task) {
    let child = ensure_task_has_id(child, existing_ids);
    (add_dependency_to_parent(parent, &child), child)
}

pub fn remove_dependency(parent: &Task, child: &Task) -> Task {
    if !parent.depends_on.contains(&child.id) {
        return parent.clone();
    }
    Task {
        depends_on: parent
            .depends_on
            .iter()
            .filter(|id| **id != child.id)
            .cloned()
            .collect(),
        ..parent.clone()
    }
}
