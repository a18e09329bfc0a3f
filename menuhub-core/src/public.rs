//! Customer-facing reads of the public mirror.

use std::sync::Arc;

use crate::codec::{decode, Record};
use crate::models::{CatalogKind, Category, Recipe};
use crate::store::{Credential, DocumentStore, StoreError};

/// Unauthenticated reader over the public collections.
#[derive(Clone)]
pub struct PublicCatalog {
    store: Arc<dyn DocumentStore>,
    restaurant_id: Option<String>,
}

impl PublicCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            restaurant_id: None,
        }
    }

    /// Limits typed reads to one restaurant's items.
    pub fn with_restaurant(mut self, restaurant_id: impl Into<String>) -> Self {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    /// Every decodable document in a public collection, in store order.
    pub async fn collection(&self, name: &str) -> Result<Vec<Record>, StoreError> {
        let documents = self
            .store
            .get_collection(name, &Credential::Anonymous)
            .await?;
        if documents.is_empty() {
            tracing::debug!("No documents found in collection: {}", name);
        }
        Ok(documents.iter().filter_map(decode).collect())
    }

    /// All categories, sorted by name.
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        let records = self
            .collection(CatalogKind::Categories.public_collection())
            .await?;
        let mut categories: Vec<Category> = records
            .iter()
            .filter_map(Category::from_record)
            .filter(|c| self.in_scope(c.restaurant_id.as_deref()))
            .collect();
        categories.sort_by_key(|c| c.name.to_lowercase());
        Ok(categories)
    }

    /// All recipes, sorted by name.
    pub async fn recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let records = self
            .collection(CatalogKind::Recipes.public_collection())
            .await?;
        let mut recipes: Vec<Recipe> = records
            .iter()
            .filter_map(Recipe::from_record)
            .filter(|r| self.in_scope(r.restaurant_id.as_deref()))
            .collect();
        recipes.sort_by_key(|r| r.name.to_lowercase());
        Ok(recipes)
    }

    /// One category, or `None` when it does not exist.
    pub async fn category(&self, id: &str) -> Result<Option<Category>, StoreError> {
        let path = CatalogKind::Categories.public_document(id);
        match self.store.get_document(&path, &Credential::Anonymous).await {
            Ok(doc) => Ok(decode(&doc)
                .as_ref()
                .and_then(Category::from_record)
                .filter(|c| self.in_scope(c.restaurant_id.as_deref()))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn recipes_in_category(&self, category_id: &str) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes = self.recipes().await?;
        recipes.retain(|r| r.category_id == category_id);
        Ok(recipes)
    }

    fn in_scope(&self, restaurant_id: Option<&str>) -> bool {
        match &self.restaurant_id {
            Some(scope) => restaurant_id == Some(scope.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Document, Fields, Value};
    use crate::store::{ErrorCode, InMemoryStore, StoreOp};

    fn item(name: &str, restaurant_id: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(name));
        fields.insert("restaurantId".to_string(), Value::string(restaurant_id));
        fields
    }

    fn recipe(name: &str, category_id: &str) -> Fields {
        let mut fields = item(name, "r1");
        fields.insert("categoryId".to_string(), Value::string(category_id));
        fields.insert("price".to_string(), Value::Double(3.0));
        fields
    }

    fn seeded() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store.protect("restaurants");
        store.insert("public-categories/c1", item("soups", "r1"));
        store.insert("public-categories/c2", item("Drinks", "r1"));
        store.insert("public-categories/c3", item("Bakery", "r2"));
        store.insert("public-recipes/p1", recipe("Tomato", "c1"));
        store.insert("public-recipes/p2", recipe("Lemonade", "c2"));
        store.insert("public-recipes/p3", recipe("Leek", "c1"));
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_categories_sorted_case_insensitive() {
        let catalog = PublicCatalog::new(seeded());
        let names: Vec<String> = catalog
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bakery", "Drinks", "soups"]);
    }

    #[tokio::test]
    async fn test_scoped_to_restaurant() {
        let catalog = PublicCatalog::new(seeded()).with_restaurant("r2");
        let categories = catalog.categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "c3");
        assert!(catalog.category("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recipes_in_category() {
        let catalog = PublicCatalog::new(seeded());
        let names: Vec<String> = catalog
            .recipes_in_category("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Leek", "Tomato"]);
    }

    #[tokio::test]
    async fn test_category_lookup() {
        let catalog = PublicCatalog::new(seeded());
        let drinks = catalog.category("c2").await.unwrap().unwrap();
        assert_eq!(drinks.name, "Drinks");
        assert!(catalog.category("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collection_drops_undecodable_documents() {
        let store = seeded();
        store.insert_raw(
            "public-recipes/empty",
            Document {
                name: Some("public-recipes/empty".to_string()),
                ..Default::default()
            },
        );
        let catalog = PublicCatalog::new(store);

        assert_eq!(catalog.collection("public-recipes").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reads_are_anonymous_and_errors_surface() {
        let store = seeded();
        store.fail(StoreOp::GetCollection, "public-recipes", ErrorCode::Unavailable);
        let catalog = PublicCatalog::new(store.clone());

        let err = catalog.recipes().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unavailable);

        // Private collections stay closed to the reader
        let err = catalog
            .collection("restaurants/r1/categories")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
