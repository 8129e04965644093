//! Locally persisted queue of IT notifications.
//!
//! The whole sequence lives under one key of a [`KeyValueStorage`] and every
//! mutation rewrites it in full. Volume is expected to stay in the tens of
//! records; `benches/notification_store.rs` tracks the cost per mutation.

use crate::{
    error::Result,
    models::notification::{NewNotification, Notification},
};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage key holding the serialized notification sequence.
pub const NOTIFICATIONS_KEY: &str = "it_notifications";

/// String key/value persistence, the equivalent of browser local storage.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // write-then-rename so a crash never leaves a half-written file
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

pub struct NotificationStore {
    storage: Arc<dyn KeyValueStorage>,
    // serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl NotificationStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(dir)))
    }

    /// All notifications in insertion order. Unreadable or corrupted storage
    /// reads as an empty store.
    pub fn list(&self) -> Vec<Notification> {
        let data = match self.storage.get(NOTIFICATIONS_KEY) {
            Ok(Some(data)) => data,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Error reading notifications: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!("Error parsing stored notifications, treating store as empty: {}", e);
            Vec::new()
        })
    }

    pub fn list_pending(&self) -> Vec<Notification> {
        self.list().into_iter().filter(Notification::is_pending).collect()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.list().into_iter().find(|n| n.id == id)
    }

    pub fn add(&self, notification: NewNotification) -> Result<Notification> {
        let _guard = self.write_lock.lock();

        let stored = notification.into_notification(Uuid::new_v4().to_string(), Utc::now());
        let mut notifications = self.list();
        notifications.push(stored.clone());
        self.persist(&notifications)?;

        debug!(
            "Queued {} notification {} for employee {}",
            stored.notification_type, stored.id, stored.employee_id
        );
        Ok(stored)
    }

    /// Flags a notification as processed. Unknown ids are ignored.
    pub fn mark_processed(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut notifications = self.list();
        match notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) if !notification.processed => {
                notification.processed = true;
                self.persist(&notifications)?;
                debug!("Notification {} marked processed", id);
            }
            Some(_) => {}
            None => debug!("mark_processed: no notification with id {}", id),
        }
        Ok(())
    }

    /// Deletes a notification. Unknown ids are ignored.
    pub fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut notifications = self.list();
        let before = notifications.len();
        notifications.retain(|n| n.id != id);
        if notifications.len() != before {
            self.persist(&notifications)?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.storage.remove(NOTIFICATIONS_KEY)
    }

    fn persist(&self, notifications: &[Notification]) -> Result<()> {
        let data = serde_json::to_string(notifications)?;
        self.storage.set(NOTIFICATIONS_KEY, &data)
    }
}
