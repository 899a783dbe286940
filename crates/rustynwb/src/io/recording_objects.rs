//! Per-IO tracking of live registered objects.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::nwb::RegisteredType;

/// Ordered collection of the typed objects created during one session.
///
/// Entries are addressable by index or by path. Adding an object that is
/// already tracked returns its existing index, and a new object at an already
/// tracked path replaces the old entry, so each path has at most one entry.
#[derive(Default)]
pub struct RecordingObjects {
    objects: Mutex<Vec<Arc<dyn RegisteredType>>>,
}

fn same_object(a: &Arc<dyn RegisteredType>, b: &Arc<dyn RegisteredType>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl RecordingObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an object and return its index.
    pub fn add(&self, object: Arc<dyn RegisteredType>) -> usize {
        let mut objects = self.objects.lock();
        if let Some(index) = objects.iter().position(|o| same_object(o, &object)) {
            return index;
        }
        if let Some(index) = objects.iter().position(|o| o.path() == object.path()) {
            debug!(path = object.path(), index, "replacing tracked recording object");
            objects[index] = object;
            return index;
        }
        objects.push(object);
        objects.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Arc<dyn RegisteredType>> {
        self.objects.lock().get(index).cloned()
    }

    /// The tracked object at `path`, by linear search.
    pub fn get_by_path(&self, path: &str) -> Option<Arc<dyn RegisteredType>> {
        self.objects.lock().iter().find(|o| o.path() == path).cloned()
    }

    /// Index of a tracked object.
    pub fn index_of(&self, object: &Arc<dyn RegisteredType>) -> Option<usize> {
        self.objects.lock().iter().position(|o| same_object(o, object))
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    /// Finalize every tracked object.
    ///
    /// All objects are finalized even if some fail; the first error is
    /// returned.
    pub fn finalize(&self) -> Result<()> {
        let snapshot: Vec<_> = self.objects.lock().clone();
        let mut first_error = None;
        for object in snapshot {
            if let Err(e) = object.finalize() {
                warn!(path = object.path(), error = %e, "failed to finalize recording object");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drop the cached write handles of every tracked object.
    pub fn clear_recording_data_cache(&self) {
        let snapshot: Vec<_> = self.objects.lock().clone();
        for object in snapshot {
            object.clear_recording_data_cache();
        }
    }

    /// Forget every tracked object.
    pub fn clear(&self) {
        self.objects.lock().clear();
    }
}

impl fmt::Display for RecordingObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objects = self.objects.lock();
        writeln!(f, "RecordingObjects ({} objects)", objects.len())?;
        for (i, object) in objects.iter().enumerate() {
            writeln!(f, "  [{i}] {} at {}", object.full_type_name(), object.path())?;
        }
        Ok(())
    }
}

impl fmt::Debug for RecordingObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingObjects")
            .field("len", &self.len())
            .finish()
    }
}
