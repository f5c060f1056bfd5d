//! The name-to-blob store shared by all operators in one execution scope.
//!
//! The workspace owns every blob; operators resolve handles at construction
//! and keep them for their whole lifetime. Blobs persist across operator
//! executions and are replaced or resized in place, never remapped.

use crate::blob::{Blob, SharedBlob};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Name -> blob mapping acting as shared mutable state for one execution
/// scope.
///
/// Concurrent access discipline (single writer per blob per execution step)
/// is an obligation of the graph executor, not enforced here.
#[derive(Default)]
pub struct Workspace {
    blobs: HashMap<String, SharedBlob>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an existing blob. Returns `None` if no blob has the name.
    pub fn blob(&self, name: &str) -> Option<SharedBlob> {
        self.blobs.get(name).cloned()
    }

    /// Fetch the blob with the given name, creating an empty one if absent.
    pub fn create_blob(&mut self, name: &str) -> SharedBlob {
        self.blobs
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Blob::new())))
            .clone()
    }

    /// Create the blob if needed and store `value` in it.
    ///
    /// Convenience for feeding inputs before running operators.
    pub fn set_blob<T: Send + Sync + 'static>(&mut self, name: &str, value: T) -> SharedBlob {
        let blob = self.create_blob(name);
        blob.write().expect("blob lock poisoned").set(value);
        blob
    }

    /// Check if a blob with the given name exists.
    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.contains_key(name)
    }

    /// Iterate over all blob names.
    pub fn blob_names(&self) -> impl Iterator<Item = &str> {
        self.blobs.keys().map(|s| s.as_str())
    }

    /// Number of blobs in the workspace.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if the workspace is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}
