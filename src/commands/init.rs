use anyhow::Result;
use std::path::Path;
use tasklines::config::{Config, StatusPreset};

pub fn run(dir: &Path, preset: Option<StatusPreset>) -> Result<()> {
    let config_path = dir.join("config.toml");
    if Config::init(dir)? {
        println!("Initialized tasklines config at {}", config_path.display());
    } else {
        println!("Config already exists at {}", config_path.display());
    }

    if let Some(preset) = preset {
        let mut config = Config::load(dir)?;
        let before = config.statuses.custom.len();
        let notices = config.statuses.bulk_add(preset.statuses());
        let added = config.statuses.custom.len() - before;
        if added > 0 {
            config.save(dir)?;
        }
        for notice in &notices {
            println!("{}", notice);
        }
        println!("Added {} status(es) from the {:?} preset", added, preset);
    }
    Ok(())
}
