//! In-memory storage implementation.
//!
//! Objects are held in RAM behind a [`RwLock`] and are lost when the process
//! exits. Use this for tests, the conformance suite, and demos.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use resdoc::ResourceObject;

use super::{Storage, StorageError};

struct Inner {
    objects: BTreeMap<String, ResourceObject>,
    next_id: u64,
}

/// Thread-safe, in-memory implementation of [`Storage`].
///
/// Objects created without an id get the next free number from a counter
/// starting at 1.
pub struct MemoryStorage {
    resource_type: String,
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            inner: RwLock::new(Inner {
                objects: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StorageError> {
        self.inner
            .read()
            .map_err(|_| StorageError::Internal("memory storage lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StorageError> {
        self.inner
            .write()
            .map_err(|_| StorageError::Internal("memory storage lock poisoned".into()))
    }

    fn not_found(&self, id: &str) -> StorageError {
        StorageError::NotFound {
            resource_type: self.resource_type.clone(),
            id: id.to_owned(),
        }
    }
}

/// Stored copies carry no status; it is resolved again on every send.
fn stored(object: &ResourceObject) -> ResourceObject {
    let mut copy = object.clone();
    copy.status = 0;
    copy
}

/// Numeric ids by value, then any others lexically.
fn id_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create(&self, mut object: ResourceObject) -> Result<ResourceObject, StorageError> {
        let mut inner = self.write()?;

        if object.id.is_empty() {
            while inner.objects.contains_key(&inner.next_id.to_string()) {
                inner.next_id += 1;
            }
            object.id = inner.next_id.to_string();
            inner.next_id += 1;
        } else if inner.objects.contains_key(&object.id) {
            return Err(StorageError::Conflict(format!(
                "{} {} already exists",
                self.resource_type, object.id
            )));
        }

        inner.objects.insert(object.id.clone(), stored(&object));
        Ok(object)
    }

    async fn get(&self, id: &str) -> Result<ResourceObject, StorageError> {
        let inner = self.read()?;
        inner.objects.get(id).cloned().ok_or_else(|| self.not_found(id))
    }

    async fn list(&self) -> Result<Vec<ResourceObject>, StorageError> {
        let inner = self.read()?;
        let mut objects: Vec<ResourceObject> = inner.objects.values().cloned().collect();
        objects.sort_by(|a, b| id_order(&a.id, &b.id));
        Ok(objects)
    }

    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StorageError> {
        let mut inner = self.write()?;
        match inner.objects.get_mut(&object.id) {
            Some(slot) => {
                *slot = stored(&object);
                Ok(object)
            }
            None => Err(self.not_found(&object.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let mut inner = self.write()?;
        inner.objects.remove(id).map(|_| ()).ok_or_else(|| self.not_found(id))
    }
}
