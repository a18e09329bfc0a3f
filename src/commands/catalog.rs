use clap::{Args, Subcommand};

use menuhub_core::PublicCatalog;

use super::OutputFormat;

/// Browse the public catalog the way customers see it
#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,

    /// Only show items published by this restaurant
    #[arg(long, global = true)]
    restaurant: Option<String>,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// List public categories
    Categories {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List public recipes
    Recipes {
        /// Only show recipes in this category
        #[arg(long, short)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl CatalogCommand {
    pub async fn run(&self, public: PublicCatalog) -> Result<(), Box<dyn std::error::Error>> {
        let public = match &self.restaurant {
            Some(restaurant_id) => public.with_restaurant(restaurant_id.as_str()),
            None => public,
        };

        match &self.command {
            CatalogSubcommand::Categories { format } => {
                let categories = public.categories().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&categories)?);
                    }
                    OutputFormat::Text => {
                        if categories.is_empty() {
                            println!("No categories published.");
                        }
                        for category in &categories {
                            println!("{}", category);
                        }
                    }
                }
            }
            CatalogSubcommand::Recipes { category, format } => {
                let recipes = match category {
                    Some(id) => public.recipes_in_category(id).await?,
                    None => public.recipes().await?,
                };
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        if recipes.is_empty() {
                            println!("No recipes published.");
                        }
                        for recipe in &recipes {
                            println!("{}", recipe);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
