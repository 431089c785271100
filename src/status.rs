//! Task statuses: the symbol inside a checkbox and the behaviour bound to it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a status, driving transition and recurrence policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusType {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
    NonTask,
    Empty,
}

impl StatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusType::Todo => "TODO",
            StatusType::InProgress => "IN_PROGRESS",
            StatusType::Done => "DONE",
            StatusType::Cancelled => "CANCELLED",
            StatusType::NonTask => "NON_TASK",
            StatusType::Empty => "EMPTY",
        }
    }

    /// Convert text saved from a status type back to a type.
    /// Anything unrecognised is treated as TODO.
    pub fn from_type_str(text: &str) -> Self {
        match text {
            "IN_PROGRESS" => StatusType::InProgress,
            "DONE" => StatusType::Done,
            "CANCELLED" => StatusType::Cancelled,
            "NON_TASK" => StatusType::NonTask,
            "EMPTY" => StatusType::Empty,
            _ => StatusType::Todo,
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stored definition of one status, as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfiguration {
    /// Character(s) between the square brackets of the markdown checkbox
    pub symbol: String,
    pub name: String,
    /// Symbol of the status to move to when toggled
    pub next_status_symbol: String,
    #[serde(default)]
    pub available_as_command: bool,
    #[serde(rename = "type", default)]
    pub status_type: StatusType,
}

impl StatusConfiguration {
    pub fn new(
        symbol: &str,
        name: &str,
        next_status_symbol: &str,
        available_as_command: bool,
        status_type: StatusType,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            next_status_symbol: next_status_symbol.to_string(),
            available_as_command,
            status_type,
        }
    }
}

/// A status a task can be in.
///
/// Statuses refer to each other by symbol only, so the graph formed by
/// `next_status_symbol` may contain cycles and dangling references.
/// Resolving them is the job of [`crate::registry::StatusRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    configuration: StatusConfiguration,
}

impl Status {
    pub fn new(configuration: StatusConfiguration) -> Self {
        Self { configuration }
    }

    /// The default Done status. Goes to Todo when toggled.
    pub fn done() -> Self {
        Self::new(StatusConfiguration::new("x", "Done", " ", true, StatusType::Done))
    }

    /// Placeholder returned when a lookup fails.
    pub fn empty() -> Self {
        Self::new(StatusConfiguration::new("", "EMPTY", "", true, StatusType::Empty))
    }

    /// The default Todo status. Goes to Done when toggled.
    pub fn todo() -> Self {
        Self::new(StatusConfiguration::new(" ", "Todo", "x", true, StatusType::Todo))
    }

    /// The default Cancelled status. Goes to Todo when toggled.
    pub fn cancelled() -> Self {
        Self::new(StatusConfiguration::new(
            "-",
            "Cancelled",
            " ",
            true,
            StatusType::Cancelled,
        ))
    }

    /// The default In Progress status. Goes to Done when toggled.
    pub fn in_progress() -> Self {
        Self::new(StatusConfiguration::new(
            "/",
            "In Progress",
            "x",
            true,
            StatusType::InProgress,
        ))
    }

    /// A sample Non-Task status.
    pub fn non_task() -> Self {
        Self::new(StatusConfiguration::new(
            "Q",
            "Non-Task",
            "A",
            true,
            StatusType::NonTask,
        ))
    }

    /// A usable TODO status for a symbol the registry does not know.
    /// Keeps the user's symbol instead of collapsing it to EMPTY.
    pub fn unknown(symbol: &str) -> Self {
        Self::new(StatusConfiguration::new(
            symbol,
            "Unknown",
            "x",
            false,
            StatusType::Todo,
        ))
    }

    /// Build a status from imported text values: symbol, name, next symbol, type.
    pub fn from_imported(symbol: &str, name: &str, next_status_symbol: &str, type_text: &str) -> Self {
        Self::new(StatusConfiguration::new(
            symbol,
            name,
            next_status_symbol,
            false,
            StatusType::from_type_str(type_text),
        ))
    }

    /// The conventional type for a symbol that is not registered.
    pub fn type_for_unknown_symbol(symbol: &str) -> StatusType {
        match symbol {
            "x" | "X" => StatusType::Done,
            "/" => StatusType::InProgress,
            "-" => StatusType::Cancelled,
            "" => StatusType::Empty,
            _ => StatusType::Todo,
        }
    }

    pub fn configuration(&self) -> &StatusConfiguration {
        &self.configuration
    }

    pub fn symbol(&self) -> &str {
        &self.configuration.symbol
    }

    pub fn name(&self) -> &str {
        &self.configuration.name
    }

    pub fn next_status_symbol(&self) -> &str {
        &self.configuration.next_status_symbol
    }

    pub fn available_as_command(&self) -> bool {
        self.configuration.available_as_command
    }

    pub fn status_type(&self) -> StatusType {
        self.configuration.status_type
    }

    pub fn is_completed(&self) -> bool {
        self.status_type() == StatusType::Done
    }

    pub fn is_cancelled(&self) -> bool {
        self.status_type() == StatusType::Cancelled
    }

    /// True if every field matches `other`.
    pub fn identical_to(&self, other: &Status) -> bool {
        let a = &self.configuration;
        let b = &other.configuration;
        a.symbol == b.symbol
            && a.name == b.name
            && a.next_status_symbol == b.next_status_symbol
            && a.available_as_command == b.available_as_command
            && a.status_type == b.status_type
    }

    /// Copy of this status under a different name
    pub fn with_name(&self, name: &str) -> Self {
        Self::new(StatusConfiguration {
            name: name.to_string(),
            ..self.configuration.clone()
        })
    }

    /// One-line summary for users.
    pub fn preview_text(&self) -> String {
        format!(
            "- [{}] => [{}], name: '{}', type: '{}'.",
            self.symbol(),
            self.next_status_symbol(),
            self.name(),
            self.status_type()
        )
    }
}

impl From<StatusConfiguration> for Status {
    fn from(configuration: StatusConfiguration) -> Self {
        Status::new(configuration)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::todo()
    }
}
