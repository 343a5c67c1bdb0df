//! In-memory stand-in for MongoDB that understands the handful of update
//! operators the scribe emits.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{Bson, Document};

use scribe_service::{CollectionProvider, Result, ScribeCollection, ScribeError, WriteOperation};

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, Vec<Document>>,
    bulk_calls: Vec<(String, usize)>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    fail_on: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Every bulk write into `collection` fails.
    pub fn failing_on(collection: &str) -> Self {
        Self { fail_on: Some(collection.to_string()), ..Default::default() }
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.state.lock().unwrap().collections.get(collection).cloned().unwrap_or_default()
    }

    pub fn find_one(&self, collection: &str, id: &str) -> Option<Document> {
        self.documents(collection)
            .into_iter()
            .find(|d| d.get_str("_id").map(|v| v == id).unwrap_or(false))
    }

    /// (collection, operation count) per bulk write, in call order.
    pub fn bulk_calls(&self) -> Vec<(String, usize)> {
        self.state.lock().unwrap().bulk_calls.clone()
    }
}

impl CollectionProvider for InMemoryStore {
    fn collection(&self, name: &str) -> Box<dyn ScribeCollection> {
        Box::new(InMemoryCollection { name: name.to_string(), store: self.clone() })
    }
}

pub struct InMemoryCollection {
    name: String,
    store: InMemoryStore,
}

#[async_trait]
impl ScribeCollection for InMemoryCollection {
    fn name(&self) -> &str { &self.name }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<()> {
        let mut state = self.store.state.lock().unwrap();
        state.collections.entry(self.name.clone()).or_default().extend(documents);
        Ok(())
    }

    async fn bulk_write(&self, operations: Vec<WriteOperation>) -> Result<()> {
        if self.store.fail_on.as_deref() == Some(self.name.as_str()) {
            return Err(ScribeError::Sink { collection: self.name.clone(), message: "injected failure".into() });
        }
        let mut state = self.store.state.lock().unwrap();
        state.bulk_calls.push((self.name.clone(), operations.len()));
        let docs = state.collections.entry(self.name.clone()).or_default();
        for operation in operations {
            apply(docs, operation);
        }
        Ok(())
    }
}

fn apply(docs: &mut Vec<Document>, operation: WriteOperation) {
    match operation {
        WriteOperation::InsertOne { document } => docs.push(document),
        WriteOperation::UpdateOne { filter, update, upsert, array_filters } => {
            let filters = array_filters.unwrap_or_default();
            if let Some(pos) = docs.iter().position(|d| matches(d, &filter)) {
                apply_update(&mut docs[pos], &update, &filters, false);
            } else if upsert {
                let mut created = Document::new();
                for (k, v) in &filter {
                    if !k.starts_with('$') {
                        created.insert(k.clone(), v.clone());
                    }
                }
                apply_update(&mut created, &update, &filters, true);
                docs.push(created);
            }
        }
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

fn apply_update(doc: &mut Document, update: &Document, filters: &[Document], inserting: bool) {
    if inserting {
        if let Ok(fields) = update.get_document("$setOnInsert") {
            for (path, value) in fields {
                set_path(doc, path, value.clone(), filters);
            }
        }
    }
    if let Ok(fields) = update.get_document("$set") {
        for (path, value) in fields {
            set_path(doc, path, value.clone(), filters);
        }
    }
    if let Ok(fields) = update.get_document("$push") {
        for (field, spec) in fields {
            let items: Vec<Bson> = match spec {
                Bson::Document(d) if d.contains_key("$each") => d.get_array("$each").cloned().unwrap_or_default(),
                other => vec![other.clone()],
            };
            if !matches!(doc.get(field), Some(Bson::Array(_))) {
                doc.insert(field.clone(), Vec::<Bson>::new());
            }
            if let Ok(array) = doc.get_array_mut(field) {
                array.extend(items);
            }
        }
    }
}

fn set_path(doc: &mut Document, path: &str, value: Bson, filters: &[Document]) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, rest),
        None => {
            doc.insert(path, value);
            return;
        }
    };

    if let Some(field) = rest.strip_prefix("$[el].") {
        if let Ok(array) = doc.get_array_mut(head) {
            for item in array.iter_mut() {
                if let Bson::Document(element) = item {
                    if element_matches(element, filters) {
                        element.insert(field, value.clone());
                    }
                }
            }
        }
        return;
    }

    if !matches!(doc.get(head), Some(Bson::Document(_))) {
        doc.insert(head, Document::new());
    }
    if let Ok(sub) = doc.get_document_mut(head) {
        set_path(sub, rest, value, filters);
    }
}

fn element_matches(element: &Document, filters: &[Document]) -> bool {
    filters.iter().all(|f| {
        f.iter().all(|(k, v)| {
            let field = k.strip_prefix("el.").unwrap_or(k);
            element.get(field) == Some(v)
        })
    })
}

/// Wrap a command payload the way producers put it on the stream.
pub fn record(payload: serde_json::Value) -> String {
    serde_json::json!({ "payload": payload.to_string() }).to_string()
}
