use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::model::Snapshot;

/// Key the application state lives under.
pub const SNAPSHOT_KEY: &str = "resource_booking_data_v2";

/// Whole-snapshot key-value persistence.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<Snapshot>>;
    fn set(&self, key: &str, snapshot: &Snapshot) -> io::Result<()>;
}

/// One JSON file per key under a data directory.
///
/// Writes go to `<key>.json.tmp`, are fsynced, then renamed over the live
/// file, so a crash mid-write leaves the previous snapshot intact.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        // Sanitize key to prevent path traversal
        let safe: String = key
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty store key"));
        }
        Ok(self.dir.join(format!("{safe}.json")))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<Snapshot>> {
        let path = self.path_for(key)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let snapshot = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(snapshot))
    }

    fn set(&self, key: &str, snapshot: &Snapshot) -> io::Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshot)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &path)
    }
}

/// Volatile store for tests and offline demos.
#[derive(Default)]
pub struct MemoryStore {
    slots: DashMap<String, Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Snapshot>> {
        Ok(self.slots.get(key).map(|e| e.value().clone()))
    }

    fn set(&self, key: &str, snapshot: &Snapshot) -> io::Result<()> {
        self.slots.insert(key.to_string(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("slotbook_test_store").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample() -> Snapshot {
        Snapshot {
            bookings: vec![Booking {
                id: new_booking_id(),
                resource_id: "PC-2".into(),
                start_time: 1_000,
                end_time: 2_000,
                booker_id: "bob".into(),
                created_at: 500,
                status: BookingStatus::Confirmed,
            }],
            logs: vec![LogEntry {
                id: new_log_id(),
                timestamp: 600,
                user_id: "bob".into(),
                activity_type: ActivityType::NewBooking,
                details: "PC-2".into(),
            }],
        }
    }

    #[test]
    fn file_store_set_then_get() {
        let store = FileStore::open(tmp_dir("roundtrip")).unwrap();
        let snap = sample();
        store.set(SNAPSHOT_KEY, &snap).unwrap();
        assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), Some(snap));
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let store = FileStore::open(tmp_dir("missing")).unwrap();
        assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_overwrite_replaces_whole_snapshot() {
        let store = FileStore::open(tmp_dir("overwrite")).unwrap();
        store.set(SNAPSHOT_KEY, &sample()).unwrap();
        store.set(SNAPSHOT_KEY, &Snapshot::default()).unwrap();
        assert_eq!(store.get(SNAPSHOT_KEY).unwrap(), Some(Snapshot::default()));
        // No temp file left behind
        assert!(!store.dir().join(format!("{SNAPSHOT_KEY}.json.tmp")).exists());
    }

    #[test]
    fn file_store_corrupt_file_is_invalid_data() {
        let store = FileStore::open(tmp_dir("corrupt")).unwrap();
        fs::write(store.dir().join(format!("{SNAPSHOT_KEY}.json")), b"{not json").unwrap();
        let err = store.get(SNAPSHOT_KEY).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn file_store_rejects_empty_key() {
        let store = FileStore::open(tmp_dir("empty_key")).unwrap();
        assert!(store.get("../..").is_err());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", &sample()).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap().bookings.len(), 1);
    }
}
