use anyhow::{Context, Result};
use std::path::Path;
use tasklines::parser::load_all_tasks;
use tasklines::status::{Status, StatusConfiguration};

use super::load_config;

pub fn run(dir: &Path, path: &Path, add: bool, json: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }
    let mut config = load_config(dir)?;
    let registry = config.registry();

    let tasks = load_all_tasks(path, &registry);
    let seen: Vec<Status> = tasks.into_iter().map(|t| t.status).collect();
    let unknown = registry.find_unknown_statuses(&seen);

    // Unknown statuses are read as TODO; give new entries the conventional
    // type for their symbol instead
    let configurations: Vec<StatusConfiguration> = unknown
        .iter()
        .map(|s| {
            StatusConfiguration::new(
                s.symbol(),
                s.name(),
                s.next_status_symbol(),
                false,
                Status::type_for_unknown_symbol(s.symbol()),
            )
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&configurations)?);
    } else if configurations.is_empty() {
        println!("No unknown statuses found in {}", path.display());
    } else {
        println!("Unknown statuses in {}:", path.display());
        for configuration in &configurations {
            println!("  {}", Status::new(configuration.clone()).preview_text());
        }
    }

    if add && !configurations.is_empty() {
        let mut added = 0;
        for configuration in configurations {
            if config.statuses.add_custom(configuration) {
                added += 1;
            }
        }
        config.save(dir).context("Failed to save config")?;
        if !json {
            println!("Added {} custom status(es) to {}", added, dir.join("config.toml").display());
        }
    }
    Ok(())
}
