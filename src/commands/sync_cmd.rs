//! Republishes the private catalog into the public collections.

use clap::{Args, ValueEnum};

use menuhub::config::Config;
use menuhub_core::SyncEngine;

use super::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum SyncTarget {
    Categories,
    Recipes,
    #[default]
    All,
}

/// Publish the catalog to the public collections
#[derive(Args)]
pub struct SyncCommand {
    /// What to publish
    #[arg(value_enum, default_value = "all")]
    target: SyncTarget,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl SyncCommand {
    pub async fn run(
        &self,
        engine: &SyncEngine,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let restaurant_id = config.require_restaurant()?;
        let credential = config.credential();

        if let OutputFormat::Text = self.format {
            println!(
                "Publishing {} for restaurant {} (retention: {})...",
                target_name(self.target),
                restaurant_id,
                engine.retention().as_str()
            );
            println!();
        }

        let (json, text, clean) = match self.target {
            SyncTarget::Categories => {
                let report = engine.sync_categories(restaurant_id, &credential).await?;
                (serde_json::to_string_pretty(&report)?, report.to_string(), report.is_clean())
            }
            SyncTarget::Recipes => {
                let report = engine.sync_recipes(restaurant_id, &credential).await?;
                (serde_json::to_string_pretty(&report)?, report.to_string(), report.is_clean())
            }
            SyncTarget::All => {
                let report = engine.sync_all(restaurant_id, &credential).await?;
                (serde_json::to_string_pretty(&report)?, report.to_string(), report.is_clean())
            }
        };

        match self.format {
            OutputFormat::Json => println!("{}", json),
            OutputFormat::Text => {
                for line in text.lines() {
                    println!("  {}", line);
                }
                println!();
                if clean {
                    println!("Sync complete.");
                }
            }
        }

        if !clean {
            return Err("sync finished with failures".into());
        }
        Ok(())
    }
}

fn target_name(target: SyncTarget) -> &'static str {
    match target {
        SyncTarget::Categories => "categories",
        SyncTarget::Recipes => "recipes",
        SyncTarget::All => "categories and recipes",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        sync: SyncCommand,
    }

    #[test]
    fn test_target_defaults_to_all() {
        let cli = TestCli::parse_from(["menuhub"]);
        assert!(matches!(cli.sync.target, SyncTarget::All));

        let cli = TestCli::parse_from(["menuhub", "recipes", "--format", "json"]);
        assert!(matches!(cli.sync.target, SyncTarget::Recipes));
        assert!(matches!(cli.sync.format, OutputFormat::Json));
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        assert!(TestCli::try_parse_from(["menuhub", "dishes"]).is_err());
    }
}
