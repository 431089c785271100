pub mod candidates;
pub mod check;
pub mod init;
pub mod report;
pub mod set_status;
pub mod statuses;
pub mod toggle;
pub mod unknown;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tasklines::config::Config;
use tasklines::parser::{replace_line, to_file_line};
use tasklines::task::Task;

/// Load the config from the given directory, or defaults if there is none.
pub fn load_config(dir: &Path) -> Result<Config> {
    Config::load(dir).with_context(|| format!("Failed to load config from {}", dir.display()))
}

/// Convert a 1-based line number from the command line to an index.
pub fn line_index(line: usize) -> Result<usize> {
    if line == 0 {
        anyhow::bail!("Line numbers start at 1");
    }
    Ok(line - 1)
}

pub fn parse_date_arg(date: Option<&str>) -> Result<Option<NaiveDate>> {
    date.map(|d| {
        NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))
    })
    .transpose()
}

#[derive(Serialize)]
struct ChangeJsonOutput<'a> {
    file: &'a Path,
    line: usize,
    changed: bool,
    lines: &'a [String],
}

/// Replace the task's line with the lines of the resulting tasks and report them.
pub fn write_change(
    file: &Path,
    index: usize,
    changed: bool,
    tasks: &[Task],
    json: bool,
) -> Result<()> {
    let lines: Vec<String> = tasks.iter().map(to_file_line).collect();

    if changed {
        replace_line(file, index, &lines)
            .with_context(|| format!("Failed to update {}", file.display()))?;
    }

    if json {
        let output = ChangeJsonOutput {
            file,
            line: index + 1,
            changed,
            lines: &lines,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !changed {
        println!("Line {} unchanged: status is already current", index + 1);
    } else if lines.is_empty() {
        println!("Removed line {} (on completion: delete)", index + 1);
    } else {
        for line in &lines {
            println!("{}", line);
        }
    }
    Ok(())
}
