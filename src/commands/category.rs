use clap::{Args, Subcommand};
use std::path::PathBuf;

use menuhub::config::Config;
use menuhub_core::{CatalogKind, CatalogService, CategoryChanges, NewCategory};

use super::{print_missing_images, print_publish, read_image, OutputFormat};

#[derive(Args)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// List the restaurant's categories
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a category
    Add {
        /// Category name
        name: String,

        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Rename a category or replace its image
    Update {
        /// Category ID
        id: String,

        /// New name
        #[arg(long)]
        name: String,

        /// New image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// List categories whose image is no longer hosted
    CheckImages,

    /// Delete a category
    Delete {
        /// Category ID
        id: String,
    },
}

impl CategoryCommand {
    pub async fn run(
        &self,
        catalog: &CatalogService,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let restaurant_id = config.require_restaurant()?;
        let credential = config.credential();

        match &self.command {
            CategorySubcommand::List { format } => {
                let categories = catalog.list_categories(restaurant_id, &credential).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&categories)?);
                    }
                    OutputFormat::Text => {
                        if categories.is_empty() {
                            println!("No categories found.");
                        } else {
                            for category in &categories {
                                println!("{}", category);
                            }
                        }
                    }
                }
                Ok(())
            }

            CategorySubcommand::Add { name, image } => {
                let mut new = NewCategory::new(name.as_str());
                if let Some(path) = image {
                    new = new.with_image(read_image(path)?);
                }

                let added = catalog.add_category(restaurant_id, &credential, new).await?;
                println!("Added category: {}", added.value);
                print_publish(&added.publish);
                Ok(())
            }

            CategorySubcommand::Update { id, name, image } => {
                let mut changes = CategoryChanges::new(name.as_str());
                if let Some(path) = image {
                    changes = changes.with_image(read_image(path)?);
                }

                let updated = catalog
                    .update_category(restaurant_id, &credential, id, changes)
                    .await?;
                println!("Updated category: {}", updated.value);
                print_publish(&updated.publish);
                Ok(())
            }

            CategorySubcommand::CheckImages => {
                let missing = catalog
                    .missing_images(CatalogKind::Categories, restaurant_id, &credential)
                    .await?;
                print_missing_images(&missing);
                Ok(())
            }

            CategorySubcommand::Delete { id } => {
                let deleted = catalog.delete_category(restaurant_id, &credential, id).await?;
                println!("Deleted category {}", deleted.value);
                print_publish(&deleted.publish);
                Ok(())
            }
        }
    }
}
