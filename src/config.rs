//! Project configuration for tasklines
//!
//! Configuration is stored in `.tasklines/config.toml` and holds the
//! behaviour flags for status changes plus the core and custom statuses.

use crate::registry::StatusRegistry;
use crate::status::{Status, StatusConfiguration};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Status change behaviour
    #[serde(default)]
    pub settings: Settings,

    /// Status definitions
    #[serde(default)]
    pub statuses: StatusSettings,
}

/// Flags read by the transition engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Add a created date to new instances of recurring tasks
    #[serde(default)]
    pub set_created_date: bool,

    /// Add a done date when a task becomes DONE
    #[serde(default = "default_true")]
    pub set_done_date: bool,

    /// Add a cancelled date when a task becomes CANCELLED
    #[serde(default = "default_true")]
    pub set_cancelled_date: bool,

    /// Write the new instance of a recurring task below the completed one
    #[serde(default)]
    pub recurrence_on_next_line: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            set_created_date: false,
            set_done_date: default_true(),
            set_cancelled_date: default_true(),
            recurrence_on_next_line: false,
        }
    }
}

/// Core statuses are always offered; custom statuses are the user's own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSettings {
    #[serde(default = "default_core_statuses")]
    pub core: Vec<StatusConfiguration>,

    #[serde(default = "default_custom_statuses")]
    pub custom: Vec<StatusConfiguration>,
}

fn default_core_statuses() -> Vec<StatusConfiguration> {
    vec![
        Status::todo().configuration().clone(),
        Status::done().configuration().clone(),
    ]
}

fn default_custom_statuses() -> Vec<StatusConfiguration> {
    vec![
        Status::in_progress().configuration().clone(),
        Status::cancelled().configuration().clone(),
    ]
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            core: default_core_statuses(),
            custom: default_custom_statuses(),
        }
    }
}

/// Rows of `[symbol, name, next symbol, type]`, as shipped by a theme.
pub type StatusCollection = &'static [[&'static str; 4]];

/// Statuses styled by the Minimal theme.
const MINIMAL_STATUSES: StatusCollection = &[
    [" ", "to-do", "x", "TODO"],
    ["/", "incomplete", "x", "IN_PROGRESS"],
    ["x", "done", "x", "DONE"],
    ["-", "canceled", "x", "CANCELLED"],
    [">", "forwarded", "x", "TODO"],
    ["<", "scheduling", "x", "TODO"],
    ["?", "question", "x", "TODO"],
    ["!", "important", "x", "TODO"],
    ["*", "star", "x", "TODO"],
    ["\"", "quote", "x", "TODO"],
    ["l", "location", "x", "TODO"],
    ["b", "bookmark", "x", "TODO"],
    ["i", "information", "x", "TODO"],
    ["S", "savings", "x", "TODO"],
    ["I", "idea", "x", "TODO"],
    ["p", "pros", "x", "TODO"],
    ["c", "cons", "x", "TODO"],
    ["f", "fire", "x", "TODO"],
    ["k", "key", "x", "TODO"],
    ["w", "win", "x", "TODO"],
    ["u", "up", "x", "TODO"],
    ["d", "down", "x", "TODO"],
];

/// Statuses styled by the ITS theme.
const ITS_STATUSES: StatusCollection = &[
    [" ", "Unchecked", "x", "TODO"],
    ["x", "Regular", " ", "DONE"],
    ["X", "Checked", " ", "DONE"],
    ["-", "Dropped", " ", "CANCELLED"],
    [">", "Forward", "x", "TODO"],
    ["D", "Date", "x", "TODO"],
    ["?", "Question", "x", "TODO"],
    ["/", "Half Done", "x", "IN_PROGRESS"],
    ["+", "Add", "x", "TODO"],
    ["R", "Research", "x", "TODO"],
    ["!", "Important", "x", "TODO"],
    ["i", "Idea", "x", "TODO"],
    ["B", "Brainstorm", "x", "TODO"],
    ["P", "Pro", "x", "TODO"],
    ["C", "Con", "x", "TODO"],
    ["Q", "Quote", "x", "TODO"],
    ["N", "Note", "x", "TODO"],
    ["b", "Bookmark", "x", "TODO"],
    ["I", "Information", "x", "TODO"],
    ["p", "Paraphrase", "x", "TODO"],
    ["L", "Location", "x", "TODO"],
    ["E", "Example", "x", "TODO"],
    ["A", "Answer", "x", "TODO"],
    ["r", "Reward", "x", "TODO"],
    ["c", "Choice", "x", "TODO"],
    ["d", "Doing", "x", "IN_PROGRESS"],
    ["T", "Time", "x", "TODO"],
    ["@", "Character / Person", "x", "TODO"],
    ["t", "Talk", "x", "TODO"],
    ["O", "Outline / Plot", "x", "TODO"],
    ["~", "Conflict", "x", "TODO"],
    ["W", "World", "x", "TODO"],
    ["f", "Clue / Find", "x", "TODO"],
    ["F", "Foreshadow", "x", "TODO"],
    ["H", "Favorite / Health", "x", "TODO"],
    ["&", "Symbolism", "x", "TODO"],
    ["s", "Secret", "x", "TODO"],
];

/// A theme's set of statuses that can be added to the custom statuses in one go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPreset {
    Its,
    Minimal,
}

impl StatusPreset {
    pub fn collection(&self) -> StatusCollection {
        match self {
            StatusPreset::Its => ITS_STATUSES,
            StatusPreset::Minimal => MINIMAL_STATUSES,
        }
    }

    /// The preset's rows as statuses, none of them offered as commands.
    pub fn statuses(&self) -> Vec<Status> {
        self.collection()
            .iter()
            .map(|[symbol, name, next, type_text]| Status::from_imported(symbol, name, next, type_text))
            .collect()
    }
}

impl std::str::FromStr for StatusPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "its" => Ok(StatusPreset::Its),
            "minimal" => Ok(StatusPreset::Minimal),
            _ => Err(format!("Unknown preset: {}. Use 'its' or 'minimal'.", s)),
        }
    }
}

impl StatusSettings {
    /// Append every status whose symbol is not configured yet.
    /// Returns one notice per status that was skipped.
    pub fn bulk_add<I>(&mut self, statuses: I) -> Vec<String>
    where
        I: IntoIterator<Item = Status>,
    {
        let mut notices = Vec::new();
        for status in statuses {
            let configuration = status.configuration().clone();
            let (name, symbol) = (configuration.name.clone(), configuration.symbol.clone());
            if !self.add_custom(configuration) {
                notices.push(format!("The status {} ({}) is already added.", name, symbol));
            }
        }
        notices
    }

    /// Core then custom statuses, in file order
    pub fn all_statuses(&self) -> Vec<StatusConfiguration> {
        self.core.iter().chain(&self.custom).cloned().collect()
    }

    /// Append a custom status. Returns false if the symbol is already configured.
    pub fn add_custom(&mut self, configuration: StatusConfiguration) -> bool {
        if self
            .all_statuses()
            .iter()
            .any(|s| s.symbol == configuration.symbol)
        {
            return false;
        }
        self.custom.push(configuration);
        true
    }
}

impl Config {
    /// Load configuration from .tasklines/config.toml
    /// Returns default config if file doesn't exist
    pub fn load(tasklines_dir: &Path) -> anyhow::Result<Self> {
        let config_path = tasklines_dir.join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Save configuration to .tasklines/config.toml
    pub fn save(&self, tasklines_dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(tasklines_dir)
            .map_err(|e| anyhow::anyhow!("Failed to create {:?}: {}", tasklines_dir, e))?;
        let config_path = tasklines_dir.join("config.toml");

        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

        fs::write(&config_path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write config: {}", e))?;

        Ok(())
    }

    /// Initialize default config file if it doesn't exist
    pub fn init(tasklines_dir: &Path) -> anyhow::Result<bool> {
        let config_path = tasklines_dir.join("config.toml");

        if config_path.exists() {
            return Ok(false);
        }

        let config = Self::default();
        config.save(tasklines_dir)?;
        Ok(true)
    }

    /// A registry holding the configured statuses. Empty symbols are
    /// skipped and later duplicates lose to earlier ones.
    pub fn registry(&self) -> StatusRegistry {
        let mut registry = StatusRegistry::new();
        registry.set(
            self.statuses
                .all_statuses()
                .into_iter()
                .filter(|s| !s.symbol.is_empty()),
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusType;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.set_done_date);
        assert!(config.settings.set_cancelled_date);
        assert!(!config.settings.set_created_date);
        assert!(!config.settings.recurrence_on_next_line);
        assert_eq!(config.statuses.core.len(), 2);
        assert_eq!(config.statuses.custom.len(), 2);
    }

    #[test]
    fn test_bulk_add_minimal_preset_skips_known_symbols() {
        let mut settings = StatusSettings::default();
        let notices = settings.bulk_add(StatusPreset::Minimal.statuses());

        assert_eq!(
            notices,
            vec![
                "The status to-do ( ) is already added.",
                "The status incomplete (/) is already added.",
                "The status done (x) is already added.",
                "The status canceled (-) is already added.",
            ]
        );
        assert_eq!(settings.custom.len(), 2 + 18);
        let forwarded = &settings.custom[2];
        assert_eq!(forwarded.symbol, ">");
        assert_eq!(forwarded.name, "forwarded");
        assert!(!forwarded.available_as_command);

        // Adding again changes nothing
        let notices = settings.bulk_add(StatusPreset::Minimal.statuses());
        assert_eq!(notices.len(), 22);
        assert_eq!(settings.custom.len(), 20);
    }

    #[test]
    fn test_its_preset_types() {
        let statuses = StatusPreset::Its.statuses();
        assert_eq!(statuses.len(), 37);
        let doing = statuses.iter().find(|s| s.symbol() == "d").unwrap();
        assert_eq!(doing.status_type(), StatusType::InProgress);
        let checked = statuses.iter().find(|s| s.symbol() == "X").unwrap();
        assert_eq!(checked.status_type(), StatusType::Done);
        assert_eq!(checked.next_status_symbol(), " ");
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("ITS".parse::<StatusPreset>(), Ok(StatusPreset::Its));
        assert_eq!("minimal".parse::<StatusPreset>(), Ok(StatusPreset::Minimal));
        assert!("fancy".parse::<StatusPreset>().is_err());
    }

    #[test]
    fn test_default_registry_matches_defaults() {
        let registry = Config::default().registry();
        let symbols: Vec<&str> = registry
            .registered_statuses()
            .iter()
            .map(|s| s.symbol())
            .collect();
        assert_eq!(symbols, vec![" ", "x", "/", "-"]);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.settings.recurrence_on_next_line = true;
        config.statuses.add_custom(StatusConfiguration::new(
            "?",
            "Question",
            " ",
            false,
            StatusType::NonTask,
        ));
        config.save(temp_dir.path()).unwrap();

        let loaded = Config::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.registry().by_symbol("?").name(), "Question");
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".tasklines");

        let created = Config::init(&dir).unwrap();
        assert!(created);

        let created = Config::init(&dir).unwrap();
        assert!(!created);
    }

    #[test]
    fn test_parse_custom_config() {
        let toml_str = r#"
[settings]
set_done_date = false

[[statuses.custom]]
symbol = "!"
name = "Important"
next_status_symbol = "x"
type = "IN_PROGRESS"

[[statuses.custom]]
symbol = ""
name = "Blank"
next_status_symbol = " "
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(!config.settings.set_done_date);
        assert!(config.settings.set_cancelled_date);
        assert_eq!(config.statuses.core.len(), 2);
        assert_eq!(config.statuses.custom.len(), 2);
        assert_eq!(config.statuses.custom[1].status_type, StatusType::Todo);

        let registry = config.registry();
        assert_eq!(registry.by_symbol("!").status_type(), StatusType::InProgress);
        assert!(!registry.has_symbol(""));
        assert!(!registry.has_symbol("/"));
    }

    #[test]
    fn test_add_custom_rejects_known_symbol() {
        let mut statuses = StatusSettings::default();
        assert!(!statuses.add_custom(Status::done().configuration().clone()));
        assert_eq!(statuses.custom.len(), 2);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.toml"), "settings = 3").unwrap();
        let err = Config::load(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
