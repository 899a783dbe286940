use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::io::data_block::DataRef;
use crate::io::memory::store::MemoryStore;
use crate::io::memory::Session;
use crate::io::recording_data::RecordingData;
use crate::io::types::FileMode;

/// Write handle for one dataset of a [`MemoryStore`].
pub(crate) struct MemoryRecordingData {
    path: String,
    store: Arc<MemoryStore>,
    session: Arc<RwLock<Session>>,
    position: Mutex<Vec<usize>>,
}

impl MemoryRecordingData {
    pub(crate) fn new(
        path: String,
        store: Arc<MemoryStore>,
        session: Arc<RwLock<Session>>,
        rank: usize,
    ) -> Self {
        Self {
            path,
            store,
            session,
            position: Mutex::new(vec![0; rank]),
        }
    }
}

impl fmt::Debug for MemoryRecordingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRecordingData")
            .field("path", &self.path)
            .field("position", &*self.position.lock())
            .finish()
    }
}

impl RecordingData for MemoryRecordingData {
    fn path(&self) -> &str {
        &self.path
    }

    fn shape(&self) -> Vec<usize> {
        self.store
            .inner
            .read()
            .dataset(&self.path)
            .map(|ds| ds.shape.clone())
            .unwrap_or_default()
    }

    fn position(&self) -> Vec<usize> {
        self.position.lock().clone()
    }

    fn write_data_block(
        &self,
        data_shape: &[usize],
        position_offset: &[usize],
        data: DataRef<'_>,
    ) -> Result<()> {
        match self.session.read().mode {
            None => return Err(Error::NotOpen(self.path.clone())),
            Some(FileMode::ReadOnly) => return Err(Error::ReadOnly(self.path.clone())),
            Some(_) => {}
        }
        self.store
            .inner
            .write()
            .dataset_mut(&self.path)?
            .write_block(&self.path, data_shape, position_offset, data)?;

        let mut position = self.position.lock();
        if position.len() != data_shape.len() {
            *position = vec![0; data_shape.len()];
        }
        for (d, p) in position.iter_mut().enumerate() {
            *p = (*p).max(position_offset[d] + data_shape[d]);
        }
        Ok(())
    }
}
