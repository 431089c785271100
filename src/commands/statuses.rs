use anyhow::Result;
use std::path::Path;
use tasklines::status::StatusConfiguration;

use super::load_config;

pub fn run(dir: &Path, details: bool, json: bool) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();

    if json {
        let statuses: Vec<&StatusConfiguration> = registry
            .registered_statuses()
            .into_iter()
            .map(|s| s.configuration())
            .collect();
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    print!("{}", registry.mermaid_diagram(details));
    Ok(())
}
