use anyhow::{Context, Result};
use std::path::Path;
use tasklines::parser::load_task_at;
use tasklines::task::tasks_lists_identical;
use tasklines::transition::TransitionEngine;
use tracing::warn;

use super::{line_index, load_config, parse_date_arg, write_change};

pub fn run(
    dir: &Path,
    file: &Path,
    line: usize,
    symbol: &str,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();
    let index = line_index(line)?;
    let completion_date = parse_date_arg(date)?;

    if symbol.chars().count() != 1 {
        anyhow::bail!("Status symbol must be a single character, got '{}'", symbol);
    }
    if !registry.has_symbol(symbol) {
        warn!(symbol, "status symbol is not configured, treating it as TODO");
    }
    let new_status = registry.by_symbol_or_create(symbol);

    let task = load_task_at(file, index, &registry)
        .with_context(|| format!("Failed to read task at {}:{}", file.display(), line))?;

    let tasks = TransitionEngine::new(&registry, &config.settings)
        .handle_new_status_in_users_order(&task, &new_status, completion_date);
    let changed = !tasks_lists_identical(std::slice::from_ref(&task), &tasks);

    write_change(file, index, changed, &tasks, json)
}
