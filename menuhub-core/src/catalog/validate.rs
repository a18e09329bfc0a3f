//! Input rules for admin catalog writes.

use image::ImageFormat;

use super::error::CatalogError;
use crate::media::ImageUpload;
use crate::models::RecipeInput;

/// Bounds on a trimmed name, in characters.
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

/// Largest accepted image upload (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub fn validate_name(name: &str) -> Result<(), CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::validation("name", "must not be empty"));
    }
    let chars = name.chars().count();
    if chars < NAME_MIN_CHARS {
        return Err(CatalogError::validation(
            "name",
            format!("must be at least {} characters long", NAME_MIN_CHARS),
        ));
    }
    if chars > NAME_MAX_CHARS {
        return Err(CatalogError::validation(
            "name",
            format!("must be at most {} characters long", NAME_MAX_CHARS),
        ));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::validation(
            "price",
            format!("{} is not a non-negative amount", price),
        ));
    }
    Ok(())
}

/// Accepts JPEG, PNG and WebP images up to [`MAX_IMAGE_BYTES`]. The format
/// is read from the file contents, not the file name.
pub fn validate_image(image: &ImageUpload) -> Result<(), CatalogError> {
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(CatalogError::validation(
            "image",
            format!(
                "{} is {} bytes, the limit is 5 MB",
                image.filename,
                image.bytes.len()
            ),
        ));
    }
    match image::guess_format(&image.bytes) {
        Ok(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP) => Ok(()),
        _ => Err(CatalogError::validation(
            "image",
            format!("{} is not a JPEG, PNG or WebP image", image.filename),
        )),
    }
}

pub(crate) fn validate_optional_image(image: Option<&ImageUpload>) -> Result<(), CatalogError> {
    image.map_or(Ok(()), validate_image)
}

pub(crate) fn validate_recipe(input: &RecipeInput) -> Result<(), CatalogError> {
    validate_name(&input.name)?;
    validate_price(input.price)?;
    validate_optional_image(input.image.as_ref())
}
