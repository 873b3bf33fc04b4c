//! Directory-backed persistent document store.
//!
//! Layout of a store directory:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK              # Advisory lock for single-writer
//! ├─ documents.cbor    # Snapshot of every document
//! └─ INDEXES           # One index name per line
//! ```
//!
//! Every mutating call rewrites the snapshot with write-then-rename, so a
//! crash leaves either the previous or the new snapshot on disk.

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStore;
use crate::query::{Filter, Projection};
use crate::store::DocumentStore;
use crate::write::{BulkWriteResult, UpdateResult, WriteModel};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tsio_codec::{decode_documents, encode_documents, Document, Value};

const LOCK_FILE: &str = "LOCK";
const DOCUMENTS_FILE: &str = "documents.cbor";
const DOCUMENTS_TEMP: &str = "documents.cbor.tmp";
const INDEXES_FILE: &str = "INDEXES";

/// A persistent document store kept in a directory.
///
/// Documents are served from memory and written back to disk after every
/// mutation. The directory is held under an exclusive advisory lock for
/// the lifetime of the store.
///
/// # Example
///
/// ```no_run
/// use tsio_store::{DocumentStore, FileStore, Filter};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("tsio_data")).unwrap();
/// let removed = store.delete_many(&Filter::eq("TS_NAME", "OLD")).unwrap();
/// println!("removed {removed} document(s)");
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: InMemoryStore,
    /// Serializes snapshot writes.
    persist: Mutex<()>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process holds the lock (returns `Locked`)
    /// - The snapshot cannot be decoded (returns `Corrupted`)
    /// - I/O errors occur
    pub fn open(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        if !path.is_dir() {
            return Err(StoreError::Corrupted(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked);
        }

        let documents = load_documents(&path.join(DOCUMENTS_FILE))?;
        let inner = InMemoryStore::with_documents(documents);
        inner.restore_indexes(load_indexes(&path.join(INDEXES_FILE))?);

        tracing::debug!(path = %path.display(), documents = inner.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            inner,
            persist: Mutex::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Writes the snapshot atomically.
    fn save_documents(&self) -> StoreResult<()> {
        let _guard = self.persist.lock();
        let documents = self.inner.documents();
        let data = encode_documents(&documents)?;

        let temp_path = self.path.join(DOCUMENTS_TEMP);
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.path.join(DOCUMENTS_FILE))?;
        self.sync_directory()?;

        tracing::trace!(documents = documents.len(), bytes = data.len(), "saved snapshot");
        Ok(())
    }

    fn save_indexes(&self) -> StoreResult<()> {
        let _guard = self.persist.lock();
        let mut contents = self.inner.indexes().join("\n");
        contents.push('\n');
        fs::write(self.path.join(INDEXES_FILE), contents)?;
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn load_documents(path: &Path) -> StoreResult<Vec<Document>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;
    if data.is_empty() {
        return Ok(Vec::new());
    }

    decode_documents(&data).map_err(|e| StoreError::Corrupted(e.to_string()))
}

fn load_indexes(path: &Path) -> StoreResult<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

impl DocumentStore for FileStore {
    fn find(&self, filter: &Filter, projection: &Projection) -> StoreResult<Vec<Document>> {
        self.inner.find(filter, projection)
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        self.inner.count(filter)
    }

    fn distinct(&self, field: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        self.inner.distinct(field, filter)
    }

    fn update_many(&self, filter: &Filter, set: &Document) -> StoreResult<UpdateResult> {
        let result = self.inner.update_many(filter, set)?;
        if result.modified > 0 {
            self.save_documents()?;
        }
        Ok(result)
    }

    fn bulk_write(&self, writes: &[WriteModel], ordered: bool) -> StoreResult<BulkWriteResult> {
        let outcome = self.inner.bulk_write(writes, ordered);
        // Applied writes survive a partial rejection, so they are persisted too.
        self.save_documents()?;
        outcome
    }

    fn delete_many(&self, filter: &Filter) -> StoreResult<u64> {
        let deleted = self.inner.delete_many(filter)?;
        if deleted > 0 {
            self.save_documents()?;
        }
        Ok(deleted)
    }

    fn create_index(&self, field: &str) -> StoreResult<String> {
        let name = self.inner.create_index(field)?;
        self.save_indexes()?;
        Ok(name)
    }
}
