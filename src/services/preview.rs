use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::constants::BLOB_ROUTE_PREFIX;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Payload behind an object URL.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
}

#[derive(Debug)]
struct BlobEntry {
    blob: Blob,
    one_shot: bool,
    created_at: DateTime<Utc>,
}

/// Local display references for uploaded images and generated downloads.
///
/// Every reference is reachable under `/blob/<id>` until revoked. Long-lived
/// references are handed out as [`ObjectUrl`] guards which revoke on drop;
/// one-shot references are revoked by the first successful [`resolve`].
///
/// [`resolve`]: ObjectUrlRegistry::resolve
#[derive(Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<Mutex<HashMap<Uuid, BlobEntry>>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, BlobEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, blob: Blob, one_shot: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().insert(
            id,
            BlobEntry {
                blob,
                one_shot,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn create(&self, mime: &str, bytes: Vec<u8>) -> ObjectUrl {
        let id = self.insert(
            Blob {
                mime: mime.to_string(),
                bytes,
                file_name: None,
            },
            false,
        );
        log::debug!("Created object URL {}", id);
        ObjectUrl {
            id,
            registry: self.clone(),
        }
    }

    /// Registers a reference that disappears as soon as it is served.
    pub fn create_one_shot(&self, mime: &str, bytes: Vec<u8>, file_name: &str) -> String {
        let id = self.insert(
            Blob {
                mime: mime.to_string(),
                bytes,
                file_name: Some(file_name.to_string()),
            },
            true,
        );
        log::debug!("Created one-shot object URL {} for {}", id, file_name);
        url_for(&id)
    }

    pub fn resolve(&self, id: &Uuid) -> Option<Blob> {
        let mut entries = self.lock();
        let one_shot = entries.get(id)?.one_shot;
        if one_shot {
            let entry = entries.remove(id)?;
            log::debug!("Revoked one-shot object URL {} after serving", id);
            Some(entry.blob)
        } else {
            entries.get(id).map(|entry| entry.blob.clone())
        }
    }

    pub fn revoke(&self, id: &Uuid) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            log::debug!("Revoked object URL {}", id);
        }
        removed
    }

    /// Drops one-shot references nobody fetched within `max_age`.
    pub fn purge_unclaimed(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !(entry.one_shot && entry.created_at < cutoff));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn url_for(id: &Uuid) -> String {
    format!("{}/{}", BLOB_ROUTE_PREFIX, id)
}

/// Owned object URL; revoked when dropped.
pub struct ObjectUrl {
    id: Uuid,
    registry: ObjectUrlRegistry,
}

impl ObjectUrl {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        url_for(&self.id)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.revoke(&self.id);
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.id).finish()
    }
}

/// Human readable size, base 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit + 1 < SIZE_UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    format!("{} {}", value, SIZE_UNITS[unit])
}

pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut short: String = name.chars().take(keep).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short.png", 30), "short.png");
        let long = "a_really_long_scanned_receipt_from_march.jpeg";
        let short = truncate_name(long, 30);
        assert_eq!(short.chars().count(), 30);
        assert!(short.ends_with("..."));
        assert!(long.starts_with(short.trim_end_matches("...")));
        assert_eq!(truncate_name("ßßßßß", 4), "ß...");
    }

    #[test]
    fn test_object_url_revoked_on_drop() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create("image/png", vec![1, 2, 3]);
        let id = url.id();
        assert_eq!(url.url(), format!("/blob/{}", id));
        assert_eq!(registry.resolve(&id).unwrap().bytes, vec![1, 2, 3]);
        // Still there after a non one-shot resolve
        assert!(registry.resolve(&id).is_some());

        drop(url);
        assert!(registry.resolve(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_one_shot_is_served_once() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create_one_shot("text/plain; charset=utf-8", b"hi".to_vec(), "out.txt");
        let id: Uuid = url.trim_start_matches("/blob/").parse().unwrap();

        let blob = registry.resolve(&id).unwrap();
        assert_eq!(blob.file_name.as_deref(), Some("out.txt"));
        assert!(registry.resolve(&id).is_none());
    }

    #[test]
    fn test_purge_unclaimed_keeps_owned_urls() {
        let registry = ObjectUrlRegistry::new();
        let _owned = registry.create("image/png", vec![0]);
        registry.create_one_shot("text/plain", vec![0], "a.txt");

        assert_eq!(registry.purge_unclaimed(Duration::hours(1)), 0);
        assert_eq!(registry.purge_unclaimed(Duration::seconds(-1)), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let registry = ObjectUrlRegistry::new();
        let url = registry.create("image/gif", vec![]);
        assert!(registry.revoke(&url.id()));
        assert!(!registry.revoke(&url.id()));
        drop(url);
    }
}
