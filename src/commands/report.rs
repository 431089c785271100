use anyhow::Result;
use std::path::Path;
use tasklines::report::status_report;

use super::load_config;

pub fn run(dir: &Path) -> Result<()> {
    let config = load_config(dir)?;
    let registry = config.registry();
    print!("{}", status_report(&config.statuses, &registry));
    Ok(())
}
