mod catalog;
mod category;
mod config_cmd;
mod order;
mod recipe;
mod sync_cmd;

pub use catalog::CatalogCommand;
pub use category::CategoryCommand;
pub use config_cmd::ConfigCommand;
pub use order::OrderCommand;
pub use recipe::RecipeCommand;
pub use sync_cmd::SyncCommand;

use clap::ValueEnum;
use menuhub_core::{ImageUpload, MissingImage, Publish};
use std::path::Path;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reads an image file for upload.
fn read_image(path: &Path) -> Result<ImageUpload, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read image '{}': {}", path.display(), e))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload::new(filename, bytes))
}

fn print_publish(publish: &Publish) {
    match publish {
        Publish::Synced(report) if report.coalesced => {
            println!("Public catalog: sync already in progress")
        }
        Publish::Synced(report) => println!("Public catalog: {}", report),
        Publish::Lagging { reason } => {
            println!("Public catalog not updated: {}", reason);
            println!("Run 'menuhub sync' to retry.");
        }
    }
}

fn print_missing_images(missing: &[MissingImage]) {
    if missing.is_empty() {
        println!("All images are hosted.");
        return;
    }
    println!("Missing images:");
    for item in missing {
        println!("  {} ({}): {}", item.name, item.id, item.image_public_id);
    }
}
