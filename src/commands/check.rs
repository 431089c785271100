use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tasklines::check::{CheckResult, check_all};
use tasklines::parser::load_all_tasks;

use super::load_config;

#[derive(Serialize)]
struct CheckJsonOutput {
    #[serde(flatten)]
    result: CheckResult,
    status_count: usize,
    task_count: usize,
    warnings: usize,
    errors: usize,
}

pub fn run(dir: &Path, path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();
    let statuses = config.statuses.all_statuses();
    let tasks = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Path not found: {}", path.display());
            }
            load_all_tasks(path, &registry)
        }
        None => Vec::new(),
    };
    let result = check_all(&statuses, &tasks);

    let warnings = result.status_problems.len() + result.cycles.len() + result.orphan_refs.len();
    let errors = result.invalid_statuses.len();

    if json {
        let ok = result.ok;
        let output = CheckJsonOutput {
            result,
            status_count: statuses.len(),
            task_count: tasks.len(),
            warnings,
            errors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        if !ok {
            anyhow::bail!("Found {} error(s) and {} warning(s)", errors, warnings);
        }
        return Ok(());
    }

    // Status problems are advisory
    if !result.status_problems.is_empty() {
        eprintln!("Warning: Status settings problems:");
        for status in &result.status_problems {
            for problem in &status.problems {
                eprintln!("  [{}] {}: {}", status.symbol, status.name, problem.replace("<br>", " "));
            }
        }
    }

    // Cycles are warnings: completing either task still works
    if !result.cycles.is_empty() {
        eprintln!("Warning: Dependency cycles detected:");
        for cycle in &result.cycles {
            eprintln!("  {}", cycle.join(" -> "));
        }
    }

    if !result.orphan_refs.is_empty() {
        eprintln!("Warning: Dependencies on unknown ids:");
        for orphan in &result.orphan_refs {
            eprintln!(
                "  {}:{} '{}' --[depends on]--> {} (not found)",
                orphan.path.display(),
                orphan.line,
                orphan.description,
                orphan.to
            );
        }
    }

    // Unusable status definitions are errors
    if !result.invalid_statuses.is_empty() {
        eprintln!("Error: Invalid statuses:");
        for invalid in &result.invalid_statuses {
            for error in &invalid.errors {
                eprintln!("  [{}] {}: {}", invalid.symbol, invalid.name, error);
            }
        }
    }

    if errors > 0 {
        anyhow::bail!("Found {} error(s) and {} warning(s)", errors, warnings);
    } else if warnings > 0 {
        println!(
            "Statuses OK: {} statuses, {} tasks, {} warning(s)",
            statuses.len(),
            tasks.len(),
            warnings
        );
    } else {
        println!(
            "Statuses OK: {} statuses, {} tasks, no issues found",
            statuses.len(),
            tasks.len()
        );
    }

    Ok(())
}
