use anyhow::{Context, Result};
use std::path::Path;
use tasklines::parser::load_task_at;
use tasklines::task::tasks_lists_identical;
use tasklines::transition::TransitionEngine;

use super::{line_index, load_config, parse_date_arg, write_change};

pub fn run(dir: &Path, file: &Path, line: usize, date: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();
    let index = line_index(line)?;
    let completion_date = parse_date_arg(date)?;

    let task = load_task_at(file, index, &registry)
        .with_context(|| format!("Failed to read task at {}:{}", file.display(), line))?;

    let tasks = TransitionEngine::new(&registry, &config.settings)
        .toggle_in_users_order(&task, completion_date);
    let changed = !tasks_lists_identical(std::slice::from_ref(&task), &tasks);

    write_change(file, index, changed, &tasks, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_toggle_recurring_task_in_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tasks.md");
        std::fs::write(
            &file,
            "# Chores\n- [ ] Water the plants 🔁 every week 📅 2024-02-10\n- [ ] Other\n",
        )
        .unwrap();

        run(&temp_dir.path().join(".tasklines"), &file, 2, Some("2024-02-12"), false).unwrap();

        let content = std::fs::read_to_string(&file).unwrap();
        assert_eq!(
            content,
            "# Chores\n\
             - [ ] Water the plants 🔁 every week 📅 2024-02-17\n\
             - [x] Water the plants 🔁 every week 📅 2024-02-10 ✅ 2024-02-12\n\
             - [ ] Other\n"
        );
    }

    #[test]
    fn test_toggle_rejects_non_task_line() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tasks.md");
        std::fs::write(&file, "# Chores\n").unwrap();
        assert!(run(&temp_dir.path().join(".tasklines"), &file, 1, None, false).is_err());
        assert!(run(&temp_dir.path().join(".tasklines"), &file, 0, None, false).is_err());
    }
}
