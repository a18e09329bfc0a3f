use clap::{Args, Subcommand};
use std::path::PathBuf;

use menuhub::config::Config;
use menuhub_core::{CatalogKind, CatalogService, RecipeInput};

use super::{print_missing_images, print_publish, read_image, OutputFormat};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

/// Fields shared by `recipe add` and `recipe update`
#[derive(Args)]
pub struct RecipeFields {
    /// Recipe name
    name: String,

    /// Category ID the recipe belongs to
    #[arg(long, short)]
    category: String,

    /// Price (e.g., 12.50)
    #[arg(long, short)]
    price: f64,

    /// Free-text ingredient list
    #[arg(long, default_value = "")]
    ingredients: String,

    /// Image file to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

impl RecipeFields {
    fn to_input(&self) -> Result<RecipeInput, Box<dyn std::error::Error>> {
        let mut input = RecipeInput::new(self.name.as_str(), self.category.as_str(), self.price)
            .with_ingredients(self.ingredients.as_str());
        if let Some(path) = &self.image {
            input = input.with_image(read_image(path)?);
        }
        Ok(input)
    }
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// List the restaurant's recipes
    List {
        /// Only show recipes in this category
        #[arg(long, short)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add a recipe
    Add(RecipeFields),

    /// Replace a recipe's fields
    Update {
        /// Recipe ID
        id: String,

        #[command(flatten)]
        fields: RecipeFields,
    },

    /// List recipes whose image is no longer hosted
    CheckImages,

    /// Delete a recipe
    Delete {
        /// Recipe ID
        id: String,
    },
}

impl RecipeCommand {
    pub async fn run(
        &self,
        catalog: &CatalogService,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let restaurant_id = config.require_restaurant()?;
        let credential = config.credential();

        match &self.command {
            RecipeSubcommand::List { category, format } => {
                let mut recipes = catalog.list_recipes(restaurant_id, &credential).await?;
                if let Some(category) = category {
                    recipes.retain(|r| &r.category_id == category);
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&recipes)?);
                    }
                    OutputFormat::Text => {
                        if recipes.is_empty() {
                            println!("No recipes found.");
                        } else {
                            for recipe in &recipes {
                                println!("{}", recipe);
                            }
                        }
                    }
                }
                Ok(())
            }

            RecipeSubcommand::Add(fields) => {
                let added = catalog
                    .add_recipe(restaurant_id, &credential, fields.to_input()?)
                    .await?;
                println!("Added recipe: {}", added.value);
                print_publish(&added.publish);
                Ok(())
            }

            RecipeSubcommand::Update { id, fields } => {
                let updated = catalog
                    .update_recipe(restaurant_id, &credential, id, fields.to_input()?)
                    .await?;
                println!("Updated recipe: {}", updated.value);
                print_publish(&updated.publish);
                Ok(())
            }

            RecipeSubcommand::CheckImages => {
                let missing = catalog
                    .missing_images(CatalogKind::Recipes, restaurant_id, &credential)
                    .await?;
                print_missing_images(&missing);
                Ok(())
            }

            RecipeSubcommand::Delete { id } => {
                let deleted = catalog.delete_recipe(restaurant_id, &credential, id).await?;
                println!("Deleted recipe {}", deleted.value);
                print_publish(&deleted.publish);
                Ok(())
            }
        }
    }
}
