use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::natural_sort;

/// Where a photo in the working set came from. Provenance only, it has no
/// effect on layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhotoOrigin {
    #[serde(rename = "upload")]
    Uploaded,
    #[serde(rename = "simpro")]
    Imported,
}

/// One photo in a session's working set. `bytes` is opaque to the layout
/// pipeline and only consumed by the PDF renderer; it is never serialized
/// into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoRecord {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub origin: PhotoOrigin,
    pub mime_type: String,
    #[serde(skip_serializing)]
    pub bytes: Arc<Vec<u8>>,
}

impl PhotoRecord {
    pub fn new(
        id: String,
        name: String,
        origin: PhotoOrigin,
        mime_type: String,
        bytes: Vec<u8>,
    ) -> Self {
        let size_bytes = bytes.len() as u64;
        PhotoRecord {
            id,
            name,
            size_bytes,
            origin,
            mime_type,
            bytes: Arc::new(bytes),
        }
    }
}

/// Returns the filename without its final extension:
/// "site-photo.v2.jpeg" -> "site-photo.v2". Only the last dot-suffix is
/// stripped, and only when it is a real suffix (non-empty, no '/' or '.').
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => {
            let suffix = &name[idx + 1..];
            if !suffix.is_empty() && !suffix.contains('/') && !suffix.contains('.') {
                &name[..idx]
            } else {
                name
            }
        }
        None => name,
    }
}

/// Returns the final extension including the dot, or "" when there is none.
pub fn extension_of(name: &str) -> &str {
    let stem = strip_extension(name);
    &name[stem.len()..]
}

/// Generates a working-set id for an uploaded photo, unique for the session.
pub fn generate_upload_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("upload_{}_{}", Utc::now().timestamp_millis(), suffix.to_lowercase())
}

/// In-memory working sets, keyed by session name. The store only holds the
/// current photo list; pages are always recomputed from it on demand.
#[derive(Clone, Default)]
pub struct PhotoStore {
    inner: Arc<Mutex<HashMap<String, Vec<PhotoRecord>>>>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<PhotoRecord>>> {
        // A poisoned lock only means another handler panicked mid-update;
        // the map itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends photos to the session's working set and returns its new size.
    /// Ids are unique within a set; a photo whose id is already present is
    /// skipped, so re-importing a job does not duplicate its records.
    pub fn add(&self, session: &str, photos: Vec<PhotoRecord>) -> usize {
        let mut sets = self.lock();
        let set = sets.entry(session.to_string()).or_default();
        for photo in photos {
            if !set.iter().any(|p| p.id == photo.id) {
                set.push(photo);
            }
        }
        set.len()
    }

    /// True when the session already holds a photo with this id.
    pub fn contains(&self, session: &str, id: &str) -> bool {
        self.lock()
            .get(session)
            .is_some_and(|set| set.iter().any(|p| p.id == id))
    }

    /// Returns the session's photos in natural display order.
    pub fn list_sorted(&self, session: &str) -> Vec<PhotoRecord> {
        let sets = self.lock();
        let mut photos = sets.get(session).cloned().unwrap_or_default();
        photos.sort_by(|a, b| natural_sort::compare(&a.name, &b.name));
        photos
    }

    /// Renames a photo's display stem, preserving its extension and id.
    /// Returns the updated record, or None when the id is unknown.
    pub fn rename(&self, session: &str, id: &str, new_stem: &str) -> Option<PhotoRecord> {
        let stem = new_stem.trim();
        if stem.is_empty() {
            return None;
        }
        let mut sets = self.lock();
        let set = sets.get_mut(session)?;
        let photo = set.iter_mut().find(|p| p.id == id)?;
        photo.name = format!("{}{}", stem, extension_of(&photo.name));
        Some(photo.clone())
    }

    /// Removes a photo by id. Returns true when something was removed.
    pub fn remove(&self, session: &str, id: &str) -> bool {
        let mut sets = self.lock();
        match sets.get_mut(session) {
            Some(set) => {
                let before = set.len();
                set.retain(|p| p.id != id);
                set.len() != before
            }
            None => false,
        }
    }

    /// Drops the session's entire working set.
    pub fn clear(&self, session: &str) {
        self.lock().remove(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: &str, name: &str) -> PhotoRecord {
        PhotoRecord::new(
            id.to_string(),
            name.to_string(),
            PhotoOrigin::Uploaded,
            "image/jpeg".to_string(),
            vec![0u8; 4],
        )
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("site-photo.v2.jpeg"), "site-photo.v2");
        assert_eq!(strip_extension("IMG_0001.JPG"), "IMG_0001");
        assert_eq!(strip_extension("no-extension"), "no-extension");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("meter.jpg"), ".jpg");
        assert_eq!(extension_of("site-photo.v2.jpeg"), ".jpeg");
        assert_eq!(extension_of("no-extension"), "");
    }

    #[test]
    fn test_list_is_natural_sorted() {
        let store = PhotoStore::new();
        store.add(
            "s1",
            vec![photo("a", "IMG_10.jpg"), photo("b", "IMG_2.jpg"), photo("c", "IMG_1.jpg")],
        );
        let names: Vec<String> = store
            .list_sorted("s1")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["IMG_1.jpg", "IMG_2.jpg", "IMG_10.jpg"]);
    }

    #[test]
    fn test_rename_keeps_extension_and_id() {
        let store = PhotoStore::new();
        store.add("s1", vec![photo("a", "IMG_1.jpg")]);
        let renamed = store.rename("s1", "a", "front door").unwrap();
        assert_eq!(renamed.id, "a");
        assert_eq!(renamed.name, "front door.jpg");

        assert!(store.rename("s1", "a", "   ").is_none());
        assert!(store.rename("s1", "missing", "x").is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let store = PhotoStore::new();
        store.add("s1", vec![photo("a", "one.jpg"), photo("b", "two.jpg")]);
        assert!(store.remove("s1", "a"));
        assert!(!store.remove("s1", "a"));
        assert_eq!(store.list_sorted("s1").len(), 1);

        store.clear("s1");
        assert!(store.list_sorted("s1").is_empty());
    }

    #[test]
    fn test_add_skips_duplicate_ids() {
        let store = PhotoStore::new();
        store.add("s1", vec![photo("simpro_7", "meter.jpg")]);
        let total = store.add(
            "s1",
            vec![photo("simpro_7", "meter.jpg"), photo("simpro_8", "roof.jpg")],
        );
        assert_eq!(total, 2);

        assert!(store.contains("s1", "simpro_7"));
        assert!(!store.contains("s1", "simpro_9"));
        assert!(!store.contains("other", "simpro_7"));

        // A single remove drops the id entirely.
        assert!(store.remove("s1", "simpro_7"));
        assert!(!store.contains("s1", "simpro_7"));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = PhotoStore::new();
        store.add("s1", vec![photo("a", "one.jpg")]);
        assert!(store.list_sorted("s2").is_empty());
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = generate_upload_id();
        let b = generate_upload_id();
        assert!(a.starts_with("upload_"));
        assert_ne!(a, b);
    }
}
