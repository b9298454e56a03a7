use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use tributec::config::default_config_path;
use tributec::Config;

use crate::cli::ConfigCommands;

pub fn dispatch_config(
    action: ConfigCommands,
    config_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let config = Config::resolve(config_path)?;
            if json_output {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", config.to_toml()?);
            }
            Ok(())
        }
        ConfigCommands::Init { path, force } => {
            let path = match path {
                Some(p) => p,
                None => default_config_path()
                    .ok_or_else(|| anyhow!("Could not determine the user config directory"))?,
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, Config::default().to_toml()?)
                .with_context(|| format!("Failed to write {}", path.display()))?;

            if json_output {
                println!("{}", serde_json::json!({ "written": path }));
            } else {
                println!("{} Wrote default configuration to {}", "✓".green().bold(), path.display());
            }
            Ok(())
        }
    }
}
