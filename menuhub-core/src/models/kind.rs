use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of catalog item, and where each lives in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Categories,
    Recipes,
}

impl CatalogKind {
    pub fn name(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "categories",
            CatalogKind::Recipes => "recipes",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "category",
            CatalogKind::Recipes => "recipe",
        }
    }

    /// Admin-only collection for one restaurant.
    pub fn private_collection(&self, restaurant_id: &str) -> String {
        format!("restaurants/{}/{}", restaurant_id, self.name())
    }

    pub fn private_document(&self, restaurant_id: &str, id: &str) -> String {
        format!("{}/{}", self.private_collection(restaurant_id), id)
    }

    /// World-readable mirror shared by all restaurants.
    pub fn public_collection(&self) -> &'static str {
        match self {
            CatalogKind::Categories => "public-categories",
            CatalogKind::Recipes => "public-recipes",
        }
    }

    pub fn public_document(&self, id: &str) -> String {
        format!("{}/{}", self.public_collection(), id)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "categories" | "category" => Some(CatalogKind::Categories),
            "recipes" | "recipe" => Some(CatalogKind::Recipes),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            CatalogKind::Categories.private_collection("r1"),
            "restaurants/r1/categories"
        );
        assert_eq!(
            CatalogKind::Recipes.private_document("r1", "x"),
            "restaurants/r1/recipes/x"
        );
        assert_eq!(CatalogKind::Recipes.public_document("x"), "public-recipes/x");
    }

    #[test]
    fn test_parse() {
        assert_eq!(CatalogKind::parse("Recipe"), Some(CatalogKind::Recipes));
        assert_eq!(CatalogKind::parse("categories"), Some(CatalogKind::Categories));
        assert_eq!(CatalogKind::parse("orders"), None);
    }
}
