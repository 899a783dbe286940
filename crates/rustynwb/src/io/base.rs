//! The storage interface every backend implements.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ NWB types (nwb::*) + registry│
//! ├──────────────────────────────┤
//! │           BaseIo             │  ← trait defined here
//! ├──────────────┬───────────────┤
//! │   MemoryIo   │  other stores │  ← pluggable backends
//! └──────────────┴───────────────┘
//! ```
//!
//! All methods take `&self`; backends use interior locking so one IO can be
//! shared as a [`SharedIo`] between the file object and every typed object
//! created from it. Structural calls consult [`BaseIo::can_modify_objects`]
//! and fail with [`Error::StructuralMutationDenied`] while recording.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::data_block::DataBlockGeneric;
use crate::io::data_type::BaseDataType;
use crate::io::recording_data::RecordingData;
use crate::io::recording_objects::RecordingObjects;
use crate::io::selection::Selection;
use crate::io::types::{
    ArrayDataSetConfig, AttrValue, FileMode, RecordState, SearchMode, StorageObjectType,
};
use crate::utils::{generate_uuid, merge_paths};

/// Shared handle to a storage backend.
pub type SharedIo = Arc<dyn BaseIo>;

/// Hierarchical storage backend.
///
/// Required methods cover lifecycle, structural mutation and reads. Provided
/// methods build NWB conventions (type attributes, type search) on top of
/// them.
pub trait BaseIo: Send + Sync + fmt::Debug {
    /// Name of the file or store this IO operates on.
    fn file_name(&self) -> &str;

    /// Mode the file was opened with, `None` when closed.
    fn file_mode(&self) -> Option<FileMode>;

    fn record_state(&self) -> RecordState;

    fn is_open(&self) -> bool {
        self.record_state() != RecordState::Closed
    }

    /// Open the file. Fails with [`Error::AlreadyOpen`] if already open.
    fn open(&self, mode: FileMode) -> Result<()>;

    /// Close the file. Closing a closed IO is a no-op.
    fn close(&self) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Whether groups, datasets and attributes may be created right now.
    fn can_modify_objects(&self) -> bool;

    /// Enter streaming mode.
    ///
    /// Tracked recording objects are finalized first, so anything they defer
    /// is written while the structure can still change. A failed finalize
    /// does not block the transition; its first error is returned once
    /// recording has started.
    fn start_recording(&self) -> Result<()>;

    /// Finalize every tracked recording object and leave streaming mode,
    /// closing the file unless the backend allows structure to change again.
    fn stop_recording(&self) -> Result<()>;

    /// Objects created or reconstructed during this session.
    fn recording_objects(&self) -> &RecordingObjects;

    // -- structural mutation ------------------------------------------------

    /// Create a group, and any missing parents. Existing groups are kept.
    fn create_group(&self, path: &str) -> Result<()>;

    /// Create or overwrite the attribute `name` on the object at `path`.
    fn create_attribute(&self, path: &str, name: &str, value: AttrValue) -> Result<()>;

    /// Create an extendable array dataset and return its write handle.
    fn create_array_data_set(
        &self,
        config: &ArrayDataSetConfig,
        path: &str,
    ) -> Result<Arc<dyn RecordingData>>;

    /// Create a fixed dataset holding `block`.
    fn create_data_set(&self, path: &str, block: DataBlockGeneric) -> Result<()>;

    /// Create a soft link at `path` pointing to `target`.
    fn create_link(&self, path: &str, target: &str) -> Result<()>;

    /// Create a dataset of object references to `targets`.
    fn create_reference_data_set(&self, path: &str, targets: &[String]) -> Result<()>;

    // -- reads ----------------------------------------------------------------

    /// Read the attribute at `path` (`<object path>/<attribute name>`).
    fn read_attribute(&self, path: &str) -> Result<DataBlockGeneric>;

    /// Resolve a reference attribute to the path it points to.
    fn read_reference_attribute(&self, path: &str) -> Result<String>;

    /// Read the selected elements of a dataset.
    fn read_dataset(&self, path: &str, selection: &Selection) -> Result<DataBlockGeneric>;

    fn object_exists(&self, path: &str) -> bool;

    fn attribute_exists(&self, path: &str) -> bool;

    /// Whether `path` itself is a soft link.
    fn is_link(&self, path: &str) -> bool;

    fn get_storage_object_type(&self, path: &str) -> StorageObjectType;

    /// Children of a group and attributes of a group or dataset, as names
    /// relative to `path`. `StorageObjectType::Undefined` lists everything.
    fn get_storage_objects(
        &self,
        path: &str,
        filter: StorageObjectType,
    ) -> Result<Vec<(String, StorageObjectType)>>;

    /// Shape of a dataset or attribute.
    fn get_storage_object_shape(&self, path: &str) -> Result<Vec<usize>>;

    fn get_storage_object_data_type(&self, path: &str) -> Result<BaseDataType>;

    /// Write handle for an existing array dataset.
    fn get_data_set(&self, path: &str) -> Result<Arc<dyn RecordingData>>;

    // -- provided -------------------------------------------------------------

    fn create_string_data_set(&self, path: &str, value: &str) -> Result<()> {
        self.create_data_set(path, DataBlockGeneric::scalar_string(value))
    }

    fn create_string_array_data_set(&self, path: &str, values: &[String]) -> Result<()> {
        let block = DataBlockGeneric::new(
            crate::io::data_block::DataValues::Str(values.to_vec()),
            vec![values.len()],
        )?;
        self.create_data_set(path, block)
    }

    fn create_reference_attribute(&self, target: &str, path: &str, name: &str) -> Result<()> {
        self.create_attribute(path, name, AttrValue::Reference(target.to_string()))
    }

    /// Write the `namespace`, `neurodata_type` and `object_id` attributes that
    /// tag an object with its schema type.
    fn create_common_nwb_attributes(
        &self,
        path: &str,
        namespace: &str,
        neurodata_type: &str,
    ) -> Result<()> {
        self.create_attribute(path, "namespace", AttrValue::from(namespace))?;
        self.create_attribute(path, "neurodata_type", AttrValue::from(neurodata_type))?;
        self.create_attribute(path, "object_id", AttrValue::String(generate_uuid()))
    }

    /// Read a dataset with the optional hyperslab arguments; empty arguments
    /// read everything.
    fn read_dataset_args(
        &self,
        path: &str,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        block: &[usize],
    ) -> Result<DataBlockGeneric> {
        let dims = self.get_storage_object_shape(path)?;
        let selection = Selection::from_args(&dims, start, count, stride, block)?;
        self.read_dataset(path, &selection)
    }

    /// Read a scalar string attribute.
    fn read_string_attribute(&self, path: &str) -> Result<String> {
        let block = self.read_attribute(path)?;
        block
            .first_string()
            .map(str::to_string)
            .ok_or(Error::TypeMismatch {
                expected: crate::io::data_type::ElementType::Str,
                actual: block.element_type(),
            })
    }

    /// Find typed objects below `start`.
    ///
    /// Returns a map of path → `namespace::neurodata_type` for every group or
    /// dataset tagged with both attributes whose full type is in `types` (an
    /// empty set matches every typed object). With `StopOnType` the search
    /// does not descend into matched objects. Soft links are not followed.
    fn find_types(
        &self,
        start: &str,
        types: &HashSet<String>,
        mode: SearchMode,
        exclude_start: bool,
    ) -> Result<HashMap<String, String>> {
        let mut found = HashMap::new();
        let mut pending = vec![start.to_string()];
        while let Some(path) = pending.pop() {
            let kind = self.get_storage_object_type(&path);
            if !matches!(kind, StorageObjectType::Group | StorageObjectType::Dataset) {
                continue;
            }
            let is_start = path == start;
            let namespace = self.read_string_attribute(&merge_paths(&path, "namespace"));
            let type_name = self.read_string_attribute(&merge_paths(&path, "neurodata_type"));
            if let (Ok(namespace), Ok(type_name)) = (namespace, type_name) {
                let full = format!("{namespace}::{type_name}");
                if types.is_empty() || types.contains(&full) {
                    if !(exclude_start && is_start) {
                        found.insert(path.clone(), full);
                    }
                    if mode == SearchMode::StopOnType && !(exclude_start && is_start) {
                        continue;
                    }
                }
            }
            if kind == StorageObjectType::Group {
                for (name, child_kind) in self.get_storage_objects(&path, StorageObjectType::Undefined)? {
                    if !matches!(child_kind, StorageObjectType::Group | StorageObjectType::Dataset) {
                        continue;
                    }
                    let child = merge_paths(&path, &name);
                    if !self.is_link(&child) {
                        pending.push(child);
                    }
                }
            }
        }
        Ok(found)
    }
}
