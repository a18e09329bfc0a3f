//! Document store client.
//!
//! The store is a path-addressed hierarchy of collections and documents:
//!
//! ```text
//! restaurants/{restaurantId}/categories/{id}   private, admin only
//! restaurants/{restaurantId}/recipes/{id}      private, admin only
//! restaurants/{restaurantId}/orders/{id}       customer orders
//! public-categories/{id}                       public mirror
//! public-recipes/{id}                          public mirror
//! ```
//!
//! [`RestStore`] speaks the Firestore REST protocol; [`InMemoryStore`] keeps
//! the same wire documents in memory for tests and offline use.

mod error;
mod memory;
mod rest;
mod retry;

use async_trait::async_trait;

use crate::codec::{Document, Fields};

pub use error::{ErrorCode, StoreError};
pub use memory::{InMemoryStore, StoreOp};
pub use rest::{RestStore, StoreConfig};
pub use retry::RetryPolicy;

/// Credential presented with a store request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Unauthenticated access, as used for the public mirror.
    Anonymous,
    /// An ID token issued by the identity provider.
    Bearer(String),
}

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential::Bearer(token.into())
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Credential::Anonymous => None,
            Credential::Bearer(token) => Some(token),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Anonymous => write!(f, "Anonymous"),
            Credential::Bearer(_) => write!(f, "Bearer(***)"),
        }
    }
}

/// Generic create/read/update/delete over store documents.
///
/// Fields are passed in plain form; implementations encode them with
/// [`crate::codec::encode`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists every document directly inside a collection.
    async fn get_collection(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Vec<Document>, StoreError>;

    /// Reads one document; fails with `NOT_FOUND` when it does not exist.
    async fn get_document(&self, path: &str, credential: &Credential)
        -> Result<Document, StoreError>;

    /// Creates a document. With `id`, fails with `ALREADY_EXISTS` if taken;
    /// without it the store assigns one.
    async fn create_document(
        &self,
        collection: &str,
        fields: &Fields,
        credential: &Credential,
        id: Option<&str>,
    ) -> Result<Document, StoreError>;

    /// Replaces the given fields, leaving others untouched. Creates the
    /// document if it does not exist.
    async fn update_document(
        &self,
        path: &str,
        fields: &Fields,
        credential: &Credential,
    ) -> Result<Document, StoreError>;

    async fn delete_document(&self, path: &str, credential: &Credential)
        -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential::bearer("secret-token");
        assert_eq!(format!("{:?}", credential), "Bearer(***)");
        assert_eq!(credential.token(), Some("secret-token"));
        assert_eq!(Credential::Anonymous.token(), None);
    }
}
