//! Reading task lines out of markdown, writing them back, and rewriting files.

use crate::on_completion::OnCompletion;
use crate::recurrence::Recurrence;
use crate::registry::StatusRegistry;
use crate::task::{Priority, Task, TaskLocation};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Line {line} is out of range for {path:?} ({len} lines)")]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        len: usize,
    },
    #[error("Line {line} of {path:?} is not a task")]
    NotATask { path: PathBuf, line: usize },
}

/// Field passes over the end of a line before giving up
const MAX_FIELD_PASSES: usize = 20;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in task pattern is valid")
}

static TASK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^([\s\t>]*)([-*+]|[0-9]+\.) +\[(.)\] *(.*)"));
static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"^#{1,6} +(.*)$"));
static BLOCK_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r" \^[a-zA-Z0-9-]+$"));
static PRIORITY_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"([🔺⏫🔼🔽⏬])\x{FE0F}?$"));
static DONE_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"✅\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static CANCELLED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"❌\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static DUE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"[📅📆🗓]\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static SCHEDULED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"[⏳⌛]\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static START_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"🛫\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static CREATED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"➕\x{FE0F}? *(\d{4}-\d{2}-\d{2})$"));
static RECURRENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r"🔁\x{FE0F}? ?([a-zA-Z0-9, !]+)$"));
static ON_COMPLETION_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"🏁\x{FE0F}? *([a-zA-Z]*)$"));
static DEPENDS_ON_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"⛔\x{FE0F}? *([a-zA-Z0-9_-]+( *, *[a-zA-Z0-9_-]+ *)*)$")
});
static ID_REGEX: LazyLock<Regex> = LazyLock::new(|| regex(r"🆔\x{FE0F}? *([a-zA-Z0-9_-]+)$"));
static TRAILING_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(^|\s)#[^ !@#$%^&*(),.?":{}|<>]+$"#));
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(^|\s)(#[^ !@#$%^&*(),.?":{}|<>]+)"#));

/// Strip a match of `re` from the end of `body`, returning its captures' text.
fn take_field(re: &Regex, body: &mut String) -> Option<Vec<String>> {
    let caps: Captures = re.captures(body.as_str())?;
    let whole = caps.get(0)?;
    let groups = caps
        .iter()
        .skip(1)
        .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
        .collect();
    let start = whole.start();
    body.truncate(start);
    let trimmed_len = body.trim_end().len();
    body.truncate(trimmed_len);
    Some(groups)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Parse one markdown line into a task. `None` if it is not a task line.
///
/// Fields are read from the end of the line backwards, so anything after
/// the first unrecognised text stays in the description.
pub fn parse_line(line: &str, location: TaskLocation, registry: &StatusRegistry) -> Option<Task> {
    let caps = TASK_REGEX.captures(line)?;
    let indentation = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let list_marker = caps.get(2).map_or("", |m| m.as_str()).to_string();
    let symbol = caps.get(3).map_or("", |m| m.as_str());
    let mut body = caps.get(4).map_or("", |m| m.as_str()).trim().to_string();

    let mut task = Task {
        status: registry.by_symbol_or_create(symbol),
        location,
        indentation,
        list_marker,
        original_markdown: line.to_string(),
        ..Task::default()
    };

    if let Some(m) = BLOCK_LINK_REGEX.find(&body) {
        task.block_link = m.as_str().to_string();
        let start = m.start();
        body.truncate(start);
        let trimmed_len = body.trim_end().len();
        body.truncate(trimmed_len);
    }

    let mut trailing_tags: Vec<String> = Vec::new();
    for _ in 0..MAX_FIELD_PASSES {
        let mut matched = false;

        if let Some(groups) = take_field(&PRIORITY_REGEX, &mut body) {
            task.priority = Priority::from_emoji(&groups[0]).unwrap_or_default();
            matched = true;
        }
        if let Some(groups) = take_field(&DONE_REGEX, &mut body) {
            task.done = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(groups) = take_field(&CANCELLED_REGEX, &mut body) {
            task.cancelled = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(groups) = take_field(&DUE_REGEX, &mut body) {
            task.due = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(groups) = take_field(&SCHEDULED_REGEX, &mut body) {
            task.scheduled = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(groups) = take_field(&START_REGEX, &mut body) {
            task.start = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(groups) = take_field(&CREATED_REGEX, &mut body) {
            task.created = parse_date(&groups[0]);
            matched = true;
        }
        if let Some(caps) = RECURRENCE_REGEX.captures(&body) {
            let rule = caps.get(1).map_or("", |m| m.as_str()).trim();
            match Recurrence::from_text(rule) {
                Ok(recurrence) => {
                    task.recurrence = Some(recurrence);
                    take_field(&RECURRENCE_REGEX, &mut body);
                    matched = true;
                }
                // Left in the description so rewriting the line loses nothing
                Err(e) => warn!(line = %line, "{}", e),
            }
        }
        if let Some(groups) = take_field(&ON_COMPLETION_REGEX, &mut body) {
            task.on_completion = OnCompletion::parse(&groups[0]);
            matched = true;
        }
        if let Some(m) = TRAILING_TAG_REGEX.find(&body) {
            trailing_tags.insert(0, m.as_str().trim().to_string());
            let start = m.start();
            body.truncate(start);
            let trimmed_len = body.trim_end().len();
            body.truncate(trimmed_len);
            matched = true;
        }
        if let Some(groups) = take_field(&ID_REGEX, &mut body) {
            task.id = groups[0].clone();
            matched = true;
        }
        if let Some(groups) = take_field(&DEPENDS_ON_REGEX, &mut body) {
            task.depends_on = groups[0]
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            matched = true;
        }

        if !matched {
            break;
        }
    }

    if !trailing_tags.is_empty() {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&trailing_tags.join(" "));
    }

    task.tags = TAG_REGEX
        .captures_iter(&body)
        .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
        .collect();
    task.description = body;
    Some(task)
}

/// The text of a task after its checkbox.
pub fn serialize(task: &Task) -> String {
    let mut line = task.description.clone();
    let mut push = |emoji: &str, value: &str| {
        line.push(' ');
        line.push_str(emoji);
        if !value.is_empty() {
            line.push(' ');
            line.push_str(value);
        }
    };
    let date = |d: NaiveDate| d.format(DATE_FORMAT).to_string();

    if !task.id.is_empty() {
        push("🆔", &task.id);
    }
    if !task.depends_on.is_empty() {
        push("⛔", &task.depends_on.join(","));
    }
    if let Some(emoji) = task.priority.emoji() {
        push(emoji, "");
    }
    if let Some(recurrence) = &task.recurrence {
        push("🔁", &recurrence.to_text());
    }
    if task.on_completion != OnCompletion::Ignore {
        push(OnCompletion::EMOJI, task.on_completion.as_str());
    }
    if let Some(d) = task.created {
        push("➕", &date(d));
    }
    if let Some(d) = task.start {
        push("🛫", &date(d));
    }
    if let Some(d) = task.scheduled
        && !task.scheduled_date_is_inferred
    {
        push("⏳", &date(d));
    }
    if let Some(d) = task.due {
        push("📅", &date(d));
    }
    if let Some(d) = task.cancelled {
        push("❌", &date(d));
    }
    if let Some(d) = task.done {
        push("✅", &date(d));
    }
    line.push_str(&task.block_link);
    line
}

/// The whole markdown line for a task, checkbox included.
pub fn to_file_line(task: &Task) -> String {
    format!(
        "{}{} [{}] {}",
        task.indentation,
        task.list_marker,
        task.status.symbol(),
        serialize(task)
    )
}

/// Parse every task in `content`, tracking headings for task locations.
pub fn parse_tasks(content: &str, path: &Path, registry: &StatusRegistry) -> Vec<Task> {
    let mut tasks = Vec::new();
    let mut preceding_header: Option<String> = None;
    let mut section_start = 0;
    let mut section_index = 0;

    for (line_number, line) in content.lines().enumerate() {
        if let Some(caps) = HEADING_REGEX.captures(line) {
            preceding_header = caps.get(1).map(|m| m.as_str().trim().to_string());
            section_start = line_number;
            section_index = 0;
            continue;
        }
        let location = TaskLocation {
            path: path.to_path_buf(),
            line_number,
            section_start,
            section_index,
            preceding_header: preceding_header.clone(),
        };
        if let Some(task) = parse_line(line, location, registry) {
            tasks.push(task);
            section_index += 1;
        }
    }
    tasks
}

/// Load the tasks in one markdown file.
pub fn load_tasks<P: AsRef<Path>>(path: P, registry: &StatusRegistry) -> Result<Vec<Task>, ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let tasks = parse_tasks(&content, path, registry);
    debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

/// `root` itself if it is a file, otherwise every `.md` file below it, sorted.
pub fn markdown_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let root = root.as_ref();
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

/// Load the tasks from every markdown file under `root`. Files that cannot
/// be read are skipped with a warning.
pub fn load_all_tasks<P: AsRef<Path>>(root: P, registry: &StatusRegistry) -> Vec<Task> {
    let mut tasks = Vec::new();
    for file in markdown_files(root) {
        match load_tasks(&file, registry) {
            Ok(found) => tasks.extend(found),
            Err(e) => warn!(path = %file.display(), "skipping file: {}", e),
        }
    }
    tasks
}

/// Load the task on a zero-based line of a file.
pub fn load_task_at<P: AsRef<Path>>(
    path: P,
    line_number: usize,
    registry: &StatusRegistry,
) -> Result<Task, ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let len = content.lines().count();
    let tasks = parse_tasks(&content, path, registry);
    if line_number >= len {
        return Err(ParseError::LineOutOfRange {
            path: path.to_path_buf(),
            line: line_number + 1,
            len,
        });
    }
    tasks
        .into_iter()
        .find(|t| t.location.line_number == line_number)
        .ok_or_else(|| ParseError::NotATask {
            path: path.to_path_buf(),
            line: line_number + 1,
        })
}

/// Replace the zero-based line `line_number` with `new_lines` (possibly none).
///
/// Writes a temp file in the same directory and renames it over the
/// original, so a crash mid-write leaves the file intact.
pub fn replace_line<P: AsRef<Path>>(
    path: P,
    line_number: usize,
    new_lines: &[String],
) -> Result<(), ParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    if line_number >= lines.len() {
        return Err(ParseError::LineOutOfRange {
            path: path.to_path_buf(),
            line: line_number + 1,
            len: lines.len(),
        });
    }
    let mut updated: Vec<&str> = Vec::with_capacity(lines.len() + new_lines.len());
    updated.extend_from_slice(&lines[..line_number]);
    updated.extend(new_lines.iter().map(String::as_str));
    updated.extend_from_slice(&lines[line_number + 1..]);

    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut output = updated.join(newline);
    if content.ends_with('\n') && !updated.is_empty() {
        output.push_str(newline);
    }

    let parent = path.parent().unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{}.tmp.{}", file_name, std::process::id()));

    let result = (|| -> Result<(), ParseError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(output.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    })();

    if result.is_ok() {
        fs::rename(&tmp_path, path)?;
    } else {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Frequency;
    use crate::status::StatusType;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn parse(line: &str) -> Task {
        parse_line(line, TaskLocation::default(), &StatusRegistry::new()).unwrap()
    }

    fn date(s: &str) -> Option<NaiveDate> {
        parse_date(s)
    }

    #[test]
    fn test_not_a_task() {
        let registry = StatusRegistry::new();
        assert!(parse_line("just text", TaskLocation::default(), &registry).is_none());
        assert!(parse_line("- no checkbox", TaskLocation::default(), &registry).is_none());
        assert!(parse_line("# heading", TaskLocation::default(), &registry).is_none());
        assert!(parse_line("  > 1. [x] numbered", TaskLocation::default(), &registry).is_some());
    }

    #[test]
    fn test_parse_plain_task() {
        let task = parse("- [ ] Water the plants");
        assert_eq!(task.status.status_type(), StatusType::Todo);
        assert_eq!(task.description, "Water the plants");
        assert_eq!(task.list_marker, "-");
        assert_eq!(task.indentation, "");
        assert!(task.recurrence.is_none());
    }

    #[test]
    fn test_parse_all_fields() {
        let line = "  - [x] Water the plants #garden 🆔 abc123 ⛔ def456,ghi789 ⏫ 🔁 every week 🏁 delete ➕ 2024-01-01 🛫 2024-02-08 ⏳ 2024-02-09 📅 2024-02-10 ✅ 2024-02-10 ^block-1";
        let task = parse(line);
        assert_eq!(task.status.symbol(), "x");
        assert_eq!(task.indentation, "  ");
        assert_eq!(task.description, "Water the plants #garden");
        assert_eq!(task.tags, vec!["#garden".to_string()]);
        assert_eq!(task.id, "abc123");
        assert_eq!(task.depends_on, vec!["def456".to_string(), "ghi789".to_string()]);
        assert_eq!(task.priority, Priority::High);
        let recurrence = task.recurrence.clone().unwrap();
        assert_eq!(recurrence.frequency(), Frequency::Week);
        assert_eq!(task.on_completion, OnCompletion::Delete);
        assert_eq!(task.created, date("2024-01-01"));
        assert_eq!(task.start, date("2024-02-08"));
        assert_eq!(task.scheduled, date("2024-02-09"));
        assert_eq!(task.due, date("2024-02-10"));
        assert_eq!(task.done, date("2024-02-10"));
        assert_eq!(task.block_link, " ^block-1");
        assert_eq!(to_file_line(&task), line);
    }

    #[test]
    fn test_fields_in_any_order() {
        let task = parse("- [ ] Pay rent 📅 2024-03-01 🔁 every month ⏬");
        assert_eq!(task.description, "Pay rent");
        assert_eq!(task.due, date("2024-03-01"));
        assert_eq!(task.priority, Priority::Lowest);
        assert_eq!(task.recurrence.unwrap().to_text(), "every month");
    }

    #[test]
    fn test_trailing_tags_return_to_description() {
        let task = parse("- [ ] Buy milk 📅 2024-03-01 #shopping #errand");
        assert_eq!(task.description, "Buy milk #shopping #errand");
        assert_eq!(task.tags, vec!["#shopping".to_string(), "#errand".to_string()]);
        assert_eq!(task.due, date("2024-03-01"));
    }

    #[test]
    fn test_invalid_date_left_unset() {
        let task = parse("- [ ] Impossible 📅 2024-02-30");
        assert_eq!(task.description, "Impossible");
        assert_eq!(task.due, None);
    }

    #[test]
    fn test_unsupported_recurrence_stays_in_description() {
        let task = parse("- [ ] Odd 🔁 every blue moon");
        assert!(task.recurrence.is_none());
        assert_eq!(task.description, "Odd 🔁 every blue moon");
        assert_eq!(to_file_line(&task), "- [ ] Odd 🔁 every blue moon");
    }

    #[test]
    fn test_unknown_symbol_is_kept() {
        let task = parse("* [?] Maybe");
        assert_eq!(task.status.symbol(), "?");
        assert_eq!(task.status.name(), "Unknown");
        assert_eq!(to_file_line(&task), "* [?] Maybe");
    }

    #[test]
    fn test_inferred_scheduled_not_written() {
        let task = Task {
            scheduled: date("2024-01-01"),
            scheduled_date_is_inferred: true,
            ..parse("- [ ] Daily note task")
        };
        assert_eq!(serialize(&task), "Daily note task");
    }

    #[test]
    fn test_parse_tasks_tracks_sections() {
        let content = "intro\n- [ ] first\n# Garden\n- [ ] second\n- [x] third\n## Chores\n- [ ] fourth\n";
        let tasks = parse_tasks(content, Path::new("notes.md"), &StatusRegistry::new());
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].location.preceding_header, None);
        assert_eq!(tasks[0].location.line_number, 1);
        assert_eq!(tasks[1].location.preceding_header.as_deref(), Some("Garden"));
        assert_eq!(tasks[1].location.section_start, 2);
        assert_eq!(tasks[2].location.section_index, 1);
        assert_eq!(tasks[3].location.preceding_header.as_deref(), Some("Chores"));
        assert_eq!(tasks[3].location.section_index, 0);
    }

    #[test]
    fn test_load_task_at() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# Heading").unwrap();
        writeln!(file, "- [ ] A task").unwrap();
        let registry = StatusRegistry::new();

        let task = load_task_at(file.path(), 1, &registry).unwrap();
        assert_eq!(task.description, "A task");
        assert!(matches!(
            load_task_at(file.path(), 0, &registry),
            Err(ParseError::NotATask { line: 1, .. })
        ));
        assert!(matches!(
            load_task_at(file.path(), 5, &registry),
            Err(ParseError::LineOutOfRange { len: 2, .. })
        ));
    }

    #[test]
    fn test_replace_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.md");
        fs::write(&path, "a\nb\nc\n").unwrap();

        replace_line(&path, 1, &["b1".to_string(), "b2".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb1\nb2\nc\n");

        replace_line(&path, 0, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "b1\nb2\nc\n");

        assert!(replace_line(&path, 9, &[]).is_err());
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_replace_line_keeps_crlf_endings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.md");
        fs::write(&path, "a\r\n- [ ] b\r\nc\r\n").unwrap();

        replace_line(&path, 1, &["- [x] b".to_string()]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\r\n- [x] b\r\nc\r\n");

        replace_line(&path, 1, &["- [ ] b2".to_string(), "- [x] b".to_string()]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "a\r\n- [ ] b2\r\n- [x] b\r\nc\r\n"
        );
    }

    #[test]
    fn test_markdown_files_and_load_all() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.md"), "- [ ] one\n").unwrap();
        fs::write(dir.path().join("sub/b.md"), "- [x] two\n- [/] three\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "- [ ] ignored\n").unwrap();

        let files = markdown_files(dir.path());
        assert_eq!(files.len(), 2);
        let tasks = load_all_tasks(dir.path(), &StatusRegistry::new());
        assert_eq!(tasks.len(), 3);

        assert_eq!(markdown_files(dir.path().join("a.md")).len(), 1);
    }
}
