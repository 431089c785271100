//! What to do with a task line once it has been completed.

use crate::status::StatusType;
use crate::task::Task;
use crate::transition::StatusChange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `🏁` instruction on a task line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnCompletion {
    /// No instruction
    #[default]
    Ignore,
    Keep,
    Delete,
}

impl OnCompletion {
    pub const EMOJI: &'static str = "🏁";

    /// Case-insensitive `keep` or `delete`. Anything else is `Ignore`.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.eq_ignore_ascii_case("keep") {
            OnCompletion::Keep
        } else if text.eq_ignore_ascii_case("delete") {
            OnCompletion::Delete
        } else {
            OnCompletion::Ignore
        }
    }

    /// Text written after the emoji. Empty for `Ignore`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OnCompletion::Ignore => "",
            OnCompletion::Keep => "keep",
            OnCompletion::Delete => "delete",
        }
    }
}

impl fmt::Display for OnCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Apply the original task's on-completion instruction to a status change.
///
/// Only acts when the change moved the task into DONE from some other type,
/// and only touches the completed instance: a new recurring instance always
/// survives.
pub fn handle_on_completion(original: &Task, change: StatusChange) -> StatusChange {
    let Some(completed) = change.completed.as_ref() else {
        return change;
    };
    let end_type = completed.status_type();
    if end_type != StatusType::Done || end_type == original.status_type() {
        return change;
    }

    match original.on_completion {
        OnCompletion::Delete => change.without_completed(),
        OnCompletion::Keep | OnCompletion::Ignore => change,
    }
}
