use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tasklines::dependency::search_for_candidate_tasks_for_dependency;
use tasklines::parser::{load_all_tasks, load_task_at, to_file_line};

use super::{line_index, load_config};

#[derive(Serialize)]
struct CandidateJson<'a> {
    path: &'a Path,
    line: usize,
    description: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    id: &'a str,
}

pub fn run(
    dir: &Path,
    file: &Path,
    line: usize,
    search: &str,
    within: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();
    let index = line_index(line)?;

    let task = load_task_at(file, index, &registry)
        .with_context(|| format!("Failed to read task at {}:{}", file.display(), line))?;

    let root: PathBuf = match within {
        Some(within) => within.to_path_buf(),
        None => match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    let all_tasks = load_all_tasks(&root, &registry);

    // Use the scanned copy of the task so its path matches the others
    let file_canonical = fs::canonicalize(file)
        .with_context(|| format!("Failed to resolve {}", file.display()))?;
    let task = all_tasks
        .iter()
        .find(|t| {
            t.location.line_number == index
                && fs::canonicalize(&t.location.path).ok().as_ref() == Some(&file_canonical)
        })
        .cloned()
        .unwrap_or(task);

    let blocked_by = task.blocked_by(&all_tasks);
    let blocking = task.blocking(&all_tasks);
    let candidates =
        search_for_candidate_tasks_for_dependency(search, &all_tasks, &task, &blocked_by, &blocking);

    if json {
        let output: Vec<CandidateJson> = candidates
            .iter()
            .map(|t| CandidateJson {
                path: &t.location.path,
                line: t.location.line_number + 1,
                description: &t.description,
                id: &t.id,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No candidate tasks match '{}'", search);
        return Ok(());
    }
    for candidate in candidates {
        println!(
            "{}:{}: {}",
            candidate.location.path.display(),
            candidate.location.line_number + 1,
            to_file_line(candidate)
        );
    }
    Ok(())
}
