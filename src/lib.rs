pub mod status;
pub mod registry;
pub mod task;
pub mod recurrence;
pub mod transition;
pub mod on_completion;
pub mod dependency;
pub mod parser;
pub mod check;
pub mod report;
pub mod config;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use status::{Status, StatusConfiguration, StatusType};
pub use registry::StatusRegistry;
pub use task::{Priority, Task, TaskLocation, tasks_lists_identical};
pub use recurrence::{Occurrence, Recurrence, RecurrenceCalculator, RecurrenceError, RuleCalculator};
pub use transition::{StatusChange, TransitionEngine};
pub use on_completion::{OnCompletion, handle_on_completion};
pub use parser::{ParseError, load_tasks, parse_line, serialize, to_file_line};
pub use check::{CheckResult, check_all, check_cycles, check_orphans};
pub use config::{Config, Settings, StatusSettings};
