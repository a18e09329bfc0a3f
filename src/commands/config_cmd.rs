use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use menuhub::config::{mask, Config, ConfigValue};

use super::OutputFormat;

const DEFAULT_CONFIG: &str = r#"# menuhub configuration

# Document store project (required)
project_id: ""

# Web API key for the document store
# api_key: ""

# Restaurant that admin commands act on
# restaurant_id: ""

# ID token sent as the bearer credential for admin commands
# id_token: ""

# What a sync does with public items no longer in the private catalog:
# prune (delete them) or retain (leave them)
# retention: prune

# Image hosting
# media:
#   cloud_name: ""
#   upload_preset: ""

# server:
#   port: 8080
"#;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

impl ConfigCommand {
    /// `config_path` is the `--config` override, which `init` writes to.
    pub fn run(
        &self,
        config: &Config,
        config_path: Option<&Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                init_target(config_path).display()
                            );
                        }
                        println!();

                        print_value("project_id", &config.project_id, |v| v.clone());
                        print_value("api_key", &config.api_key, |v| mask(v.as_deref()).into());
                        print_value("database", &config.database, |v| v.clone());
                        print_value("base_url", &config.base_url, |v| v.clone());
                        print_value("restaurant_id", &config.restaurant_id, |v| {
                            v.clone().unwrap_or_else(|| "(not set)".to_string())
                        });
                        print_value("id_token", &config.id_token, |v| mask(v.as_deref()).into());
                        print_value("retention", &config.retention, |v| v.as_str().into());
                        print_value("port", &config.port, |v| v.to_string());

                        let media = &config.media;
                        println!(
                            "media: cloud_name={} upload_preset={} api_key={} api_secret={}",
                            or_unset(&media.cloud_name),
                            or_unset(&media.upload_preset),
                            mask(media.api_key.as_deref()),
                            mask(media.api_secret.as_deref())
                        );
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = init_target(config_path);
                if init_config(&config_path)? {
                    println!("Created config file: {}", config_path.display());
                    println!("\nEdit this file to customize your settings.");
                } else {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'menuhub config show' to view current configuration.");
                }
                Ok(())
            }
        }
    }
}

fn print_value<T>(name: &str, value: &ConfigValue<T>, render: impl Fn(&T) -> String) {
    println!("{}: {}", name, render(&value.value));
    println!("  source: {}", value.source);
    println!();
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn init_target(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_config_path)
}

/// Writes the template config. Returns false when a file is already there.
fn init_config(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuhub_core::Retention;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("menuhub").join("config.yaml");

        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());

        let config = Config::load_with_env(Some(path.clone()), |_| None).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.project_id.value, "");
        assert_eq!(config.retention.value, Retention::Prune);
    }

    #[test]
    fn test_init_writes_to_config_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom").join("menuhub.yaml");
        let config = Config::load_with_env(Some(path.clone()), |_| None).unwrap();
        let cmd = ConfigCommand {
            command: ConfigSubcommand::Init,
        };

        cmd.run(&config, Some(&path)).unwrap();

        assert!(path.exists());
        assert!(!Config::default_config_path().starts_with(dir.path()));
        assert_eq!(init_target(None), Config::default_config_path());
    }
}
