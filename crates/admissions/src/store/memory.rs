use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Map, Value};
use tokio::sync::watch;
use uuid::Uuid;

use super::{FieldPatch, Precondition, RemoteStore, StoreError};

/// In-process [`RemoteStore`] backing the service, the demo command, and
/// tests: a JSON tree behind a mutex, with per-path watch channels
/// republishing the subtree after every mutation.
pub struct MemoryStore {
    tree: Mutex<Value>,
    watchers: Mutex<HashMap<String, watch::Sender<Option<Value>>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tree: Mutex::new(Value::Object(Map::new())),
            watchers: Mutex::new(HashMap::new()),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify(&self, tree: &Value) {
        let watchers = self.watchers.lock().expect("watcher mutex poisoned");
        for (path, sender) in watchers.iter() {
            sender.send_replace(value_at(tree, path).cloned());
        }
    }

    fn check_preconditions(
        path: &str,
        preconditions: &[Precondition],
        subtree: Option<&Value>,
    ) -> Result<(), StoreError> {
        for precondition in preconditions {
            let current = subtree.and_then(|value| value_at(value, &precondition.field));
            if current != precondition.expected.as_ref() {
                return Err(StoreError::Conflict {
                    path: format!("{path}/{}", precondition.field),
                });
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, path: &str) -> watch::Receiver<Option<Value>> {
        let tree = self.tree.lock().expect("store mutex poisoned");
        let mut watchers = self.watchers.lock().expect("watcher mutex poisoned");
        watchers
            .entry(path.to_string())
            .or_insert_with(|| watch::channel(value_at(&tree, path).cloned()).0)
            .subscribe()
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let tree = self.tree.lock().expect("store mutex poisoned");
        Ok(value_at(&tree, path).cloned())
    }

    async fn update(
        &self,
        path: &str,
        preconditions: &[Precondition],
        changes: FieldPatch,
    ) -> Result<(), StoreError> {
        let mut tree = self.tree.lock().expect("store mutex poisoned");
        Self::check_preconditions(path, preconditions, value_at(&tree, path))?;
        for (field, value) in changes {
            set_at(&mut tree, &format!("{path}/{field}"), value);
        }
        self.notify(&tree);
        Ok(())
    }

    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut tree = self.tree.lock().expect("store mutex poisoned");
        set_at(&mut tree, path, value);
        self.notify(&tree);
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut tree = self.tree.lock().expect("store mutex poisoned");
        set_at(&mut tree, &format!("{path}/{id}"), value);
        self.notify(&tree);
        Ok(id)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let mut tree = self.tree.lock().expect("store mutex poisoned");
        remove_at(&mut tree, path);
        self.notify(&tree);
        Ok(())
    }
}

fn value_at<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in path.split('/') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Set the value at a slash-joined path, materializing intermediate objects
/// and overwriting any scalar found along the way.
fn set_at(tree: &mut Value, path: &str, value: Value) {
    if !tree.is_object() {
        *tree = Value::Object(Map::new());
    }
    let Value::Object(map) = tree else {
        return;
    };
    match path.split_once('/') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            set_at(
                map.entry(head.to_string()).or_insert(Value::Null),
                rest,
                value,
            );
        }
    }
}

fn remove_at(tree: &mut Value, path: &str) {
    let Value::Object(map) = tree else {
        return;
    };
    match path.split_once('/') {
        None => {
            map.remove(path);
        }
        Some((head, rest)) => {
            if let Some(child) = map.get_mut(head) {
                remove_at(child, rest);
            }
        }
    }
}
