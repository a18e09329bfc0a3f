//! In-memory document store.
//!
//! Holds documents in wire form, so reads go through the same decode path as
//! the REST store. Supports fault injection and records every call, which
//! the sync tests use to assert on store traffic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use super::error::{ErrorCode, StoreError};
use super::{Credential, DocumentStore};
use crate::codec::{decode, encode, Document, Fields, Record};

const NAME_PREFIX: &str = "projects/in-memory/databases/(default)/documents/";

/// Store operations, used for fault injection and the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetCollection,
    GetDocument,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct Fault {
    op: StoreOp,
    path: String,
    code: ErrorCode,
    /// `None` fails forever.
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    /// Documents keyed by relative path, e.g. `public-categories/c1`.
    documents: BTreeMap<String, Document>,
    faults: Vec<Fault>,
    calls: Vec<(StoreOp, String)>,
    /// Path prefixes that reject anonymous credentials.
    protected: Vec<String>,
}

/// Document store kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds a document at `path`, replacing any existing one.
    pub fn insert(&self, path: &str, fields: Fields) {
        let path = normalize(path);
        let now = now();
        let doc = Document {
            name: Some(format!("{}{}", NAME_PREFIX, path)),
            fields: Some(encode(&fields)),
            create_time: Some(now.clone()),
            update_time: Some(now),
        };
        self.state().documents.insert(path, doc);
    }

    /// Seeds a document exactly as given, e.g. with malformed fields.
    pub fn insert_raw(&self, path: &str, doc: Document) {
        self.state().documents.insert(normalize(path), doc);
    }

    /// Decoded view of the document at `path`.
    pub fn get(&self, path: &str) -> Option<Record> {
        self.state().documents.get(&normalize(path)).and_then(decode)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state().documents.contains_key(&normalize(path))
    }

    /// Ids of the documents directly inside `collection`, in store order.
    pub fn ids(&self, collection: &str) -> Vec<String> {
        let state = self.state();
        children(&state.documents, collection)
            .map(|(path, _)| path.rsplit('/').next().unwrap_or_default().to_string())
            .collect()
    }

    /// Makes every `op` on `path` fail with `code`.
    pub fn fail(&self, op: StoreOp, path: &str, code: ErrorCode) {
        self.push_fault(op, path, code, None);
    }

    /// Makes the next `times` calls of `op` on `path` fail with `code`.
    pub fn fail_times(&self, op: StoreOp, path: &str, code: ErrorCode, times: usize) {
        self.push_fault(op, path, code, Some(times));
    }

    /// Rejects anonymous access to every path under `prefix`.
    pub fn protect(&self, prefix: &str) {
        self.state().protected.push(normalize(prefix));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<(StoreOp, String)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    fn push_fault(&self, op: StoreOp, path: &str, code: ErrorCode, remaining: Option<usize>) {
        self.state().faults.push(Fault {
            op,
            path: normalize(path),
            code,
            remaining,
        });
    }

    /// Logs the call and applies access rules and injected faults.
    fn begin(
        &self,
        state: &mut State,
        op: StoreOp,
        path: &str,
        credential: &Credential,
    ) -> Result<(), StoreError> {
        state.calls.push((op, path.to_string()));

        if *credential == Credential::Anonymous
            && state
                .protected
                .iter()
                .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)))
        {
            return Err(StoreError::new(
                ErrorCode::PermissionDenied,
                format!("Missing or insufficient permissions for {}", path),
            ));
        }

        let hit = state
            .faults
            .iter_mut()
            .position(|fault| fault.op == op && fault.path == path && fault.remaining != Some(0));
        if let Some(index) = hit {
            let fault = &mut state.faults[index];
            if let Some(remaining) = fault.remaining.as_mut() {
                *remaining -= 1;
            }
            return Err(StoreError::new(
                fault.code,
                format!("Injected {} failure for {}", fault.code, path),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_collection(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Vec<Document>, StoreError> {
        let path = normalize(path);
        let mut state = self.state();
        self.begin(&mut state, StoreOp::GetCollection, &path, credential)?;
        Ok(children(&state.documents, &path)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn get_document(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Document, StoreError> {
        let path = normalize(path);
        let mut state = self.state();
        self.begin(&mut state, StoreOp::GetDocument, &path, credential)?;
        state
            .documents
            .get(&path)
            .cloned()
            .ok_or_else(|| StoreError::not_found(&path))
    }

    async fn create_document(
        &self,
        collection: &str,
        fields: &Fields,
        credential: &Credential,
        id: Option<&str>,
    ) -> Result<Document, StoreError> {
        let collection = normalize(collection);
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string()[..20].to_string());
        let path = format!("{}/{}", collection, id);

        let mut state = self.state();
        self.begin(&mut state, StoreOp::Create, &path, credential)?;
        if state.documents.contains_key(&path) {
            return Err(StoreError::already_exists(&path));
        }

        let now = now();
        let doc = Document {
            name: Some(format!("{}{}", NAME_PREFIX, path)),
            fields: Some(encode(fields)),
            create_time: Some(now.clone()),
            update_time: Some(now),
        };
        state.documents.insert(path, doc.clone());
        Ok(doc)
    }

    async fn update_document(
        &self,
        path: &str,
        fields: &Fields,
        credential: &Credential,
    ) -> Result<Document, StoreError> {
        let path = normalize(path);
        let mut state = self.state();
        self.begin(&mut state, StoreOp::Update, &path, credential)?;

        let now = now();
        let doc = state
            .documents
            .entry(path.clone())
            .or_insert_with(|| Document {
                name: Some(format!("{}{}", NAME_PREFIX, path)),
                fields: Some(Default::default()),
                create_time: Some(now.clone()),
                update_time: None,
            });
        let existing = doc.fields.get_or_insert_with(Default::default);
        existing.extend(encode(fields));
        doc.update_time = Some(now);
        Ok(doc.clone())
    }

    async fn delete_document(&self, path: &str, credential: &Credential) -> Result<(), StoreError> {
        let path = normalize(path);
        let mut state = self.state();
        self.begin(&mut state, StoreOp::Delete, &path, credential)?;
        // Deleting a missing document succeeds, as it does against Firestore
        state.documents.remove(&path);
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Documents whose parent collection is exactly `collection`.
fn children<'a>(
    documents: &'a BTreeMap<String, Document>,
    collection: &str,
) -> impl Iterator<Item = (&'a String, &'a Document)> {
    let prefix = format!("{}/", collection.trim_matches('/'));
    let len = prefix.len();
    documents
        .range(prefix.clone()..)
        .take_while(move |(path, _)| path.starts_with(&prefix))
        // Skip documents in nested subcollections
        .filter(move |(path, _)| !path[len..].contains('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;

    fn fields(name: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::string(name));
        fields
    }

    fn admin() -> Credential {
        Credential::bearer("token")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let doc = store
            .create_document("restaurants/r1/categories", &fields("Drinks"), &admin(), None)
            .await
            .unwrap();

        let id = doc.id().unwrap().to_string();
        assert_eq!(id.len(), 20);

        let fetched = store
            .get_document(&format!("restaurants/r1/categories/{}", id), &admin())
            .await
            .unwrap();
        assert_eq!(decode(&fetched).unwrap().get_str("name"), Some("Drinks"));
    }

    #[tokio::test]
    async fn test_create_with_taken_id_conflicts() {
        let store = InMemoryStore::new();
        store.insert("public-categories/c1", fields("Drinks"));

        let err = store
            .create_document("public-categories", &fields("Soda"), &admin(), Some("c1"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .get_document("public-categories/nope", &admin())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_collection_excludes_nested_and_sibling_paths() {
        let store = InMemoryStore::new();
        store.insert("restaurants/r1/categories/a", fields("A"));
        store.insert("restaurants/r1/categories/b", fields("B"));
        store.insert("restaurants/r1/categories/b/notes/n1", fields("nested"));
        store.insert("restaurants/r10/categories/c", fields("other"));
        store.insert("restaurants/r1/categoriesx/d", fields("sibling"));

        let docs = store
            .get_collection("restaurants/r1/categories", &admin())
            .await
            .unwrap();
        let ids: Vec<&str> = docs.iter().filter_map(|d| d.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = InMemoryStore::new();
        let mut initial = fields("Drinks");
        initial.insert("imageUrl".to_string(), Value::string("http://img"));
        store.insert("restaurants/r1/categories/c1", initial);

        store
            .update_document("restaurants/r1/categories/c1", &fields("Cold Drinks"), &admin())
            .await
            .unwrap();

        let record = store.get("restaurants/r1/categories/c1").unwrap();
        assert_eq!(record.get_str("name"), Some("Cold Drinks"));
        assert_eq!(record.get_str("imageUrl"), Some("http://img"));
    }

    #[tokio::test]
    async fn test_fail_times_expires() {
        let store = InMemoryStore::new();
        store.fail_times(
            StoreOp::GetCollection,
            "public-recipes",
            ErrorCode::Unavailable,
            1,
        );

        let first = store.get_collection("public-recipes", &admin()).await;
        assert_eq!(first.unwrap_err().code, ErrorCode::Unavailable);
        assert!(store.get_collection("public-recipes", &admin()).await.is_ok());
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn test_protected_prefix_rejects_anonymous() {
        let store = InMemoryStore::new();
        store.protect("restaurants");
        store.insert("restaurants/r1/categories/c1", fields("Drinks"));

        let err = store
            .get_collection("restaurants/r1/categories", &Credential::Anonymous)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        assert!(store
            .get_collection("restaurants/r1/categories", &admin())
            .await
            .is_ok());
    }
}
