//! Path-keyed object tree backing [`MemoryIo`](super::MemoryIo).
//!
//! Objects live in a flat map keyed by normalized absolute path. Soft links
//! are resolved component by component, so a link to a group makes the
//! group's children reachable through the link as well.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::io::data_block::{element_count, DataBlockGeneric, DataRef, DataValues};
use crate::io::data_type::BaseDataType;
use crate::io::selection::Selection;
use crate::io::types::{AttrValue, StorageObjectType};
use crate::utils::{merge_paths, parent_path};

const MAX_LINK_DEPTH: usize = 32;

/// A stored attribute value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredAttribute {
    pub(crate) values: DataValues,
    pub(crate) shape: Vec<usize>,
    pub(crate) is_reference: bool,
}

impl StoredAttribute {
    fn from_value(value: AttrValue) -> Self {
        match value {
            AttrValue::Numeric(values) => {
                let shape = if values.len() == 1 {
                    Vec::new()
                } else {
                    vec![values.len()]
                };
                Self {
                    values,
                    shape,
                    is_reference: false,
                }
            }
            AttrValue::String(s) => Self {
                values: DataValues::Str(vec![s]),
                shape: Vec::new(),
                is_reference: false,
            },
            AttrValue::StringArray(v) => Self {
                shape: vec![v.len()],
                values: DataValues::Str(v),
                is_reference: false,
            },
            AttrValue::Reference(target) => Self {
                values: DataValues::Str(vec![normalize(&target)]),
                shape: Vec::new(),
                is_reference: true,
            },
        }
    }
}

/// A stored dataset: element buffer in row-major order plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredDataset {
    pub(crate) data_type: BaseDataType,
    pub(crate) shape: Vec<usize>,
    pub(crate) chunking: Vec<usize>,
    pub(crate) values: DataValues,
}

impl StoredDataset {
    /// Grow the extent to `new_shape`, keeping every element at its
    /// multi-index.
    fn resize(&mut self, new_shape: &[usize]) -> Result<()> {
        let mut values = DataValues::zeros(self.data_type.element_type(), element_count(new_shape));
        let old_region: Vec<_> = self.shape.iter().map(|&n| 0..n).collect();
        let targets = Selection::slice(&old_region).flat_indices(new_shape);
        values.scatter(&targets, self.values.as_data_ref())?;
        self.values = values;
        self.shape = new_shape.to_vec();
        Ok(())
    }

    /// Write a row-major block at `offset`, growing the extent as needed.
    pub(crate) fn write_block(
        &mut self,
        path: &str,
        block_shape: &[usize],
        offset: &[usize],
        data: DataRef<'_>,
    ) -> Result<()> {
        if block_shape.len() != self.shape.len() || offset.len() != self.shape.len() {
            return Err(Error::InvalidArgument(format!(
                "{path}: block of rank {} at offset of rank {} written to dataset of rank {}",
                block_shape.len(),
                offset.len(),
                self.shape.len()
            )));
        }
        let expected = element_count(block_shape);
        if expected != data.len() {
            return Err(Error::ShapeMismatch {
                shape: block_shape.to_vec(),
                expected,
                actual: data.len(),
            });
        }
        let needed: Vec<usize> = self
            .shape
            .iter()
            .zip(offset.iter().zip(block_shape))
            .map(|(&cur, (&off, &n))| if n == 0 { cur } else { cur.max(off + n) })
            .collect();
        if needed != self.shape {
            self.resize(&needed)?;
        }
        if expected == 0 {
            return Ok(());
        }
        let region: Vec<_> = offset
            .iter()
            .zip(block_shape)
            .map(|(&off, &n)| off..off + n)
            .collect();
        let targets = Selection::slice(&region).flat_indices(&self.shape);
        self.values.scatter(&targets, data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ObjectKind {
    Group,
    Dataset(StoredDataset),
    Link(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredObject {
    pub(crate) kind: ObjectKind,
    pub(crate) attributes: BTreeMap<String, StoredAttribute>,
}

impl StoredObject {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    fn object_type(&self) -> StorageObjectType {
        match self.kind {
            ObjectKind::Group => StorageObjectType::Group,
            ObjectKind::Dataset(_) => StorageObjectType::Dataset,
            ObjectKind::Link(_) => StorageObjectType::Undefined,
        }
    }
}

pub(crate) use crate::utils::normalize_path as normalize;

/// Split `<object>/<attribute>` into its two halves.
pub(crate) fn split_attribute_path(path: &str) -> (String, String) {
    let normalized = normalize(path);
    let name = crate::utils::path_name(&normalized).to_string();
    (parent_path(&normalized), name)
}

/// Contents of one store.
#[derive(Debug, Default)]
pub(crate) struct StoreInner {
    pub(crate) exists: bool,
    pub(crate) writer_attached: bool,
    pub(crate) objects: BTreeMap<String, StoredObject>,
}

impl StoreInner {
    /// Drop all contents and start over with an empty root group.
    pub(crate) fn truncate(&mut self) {
        self.objects.clear();
        self.objects
            .insert("/".to_string(), StoredObject::new(ObjectKind::Group));
        self.exists = true;
    }

    /// Resolve soft links along `path`; `None` if any component is missing.
    pub(crate) fn resolve(&self, path: &str) -> Option<String> {
        let normalized = normalize(path);
        let mut current = "/".to_string();
        for part in normalized.split('/').filter(|p| !p.is_empty()) {
            let mut next = merge_paths(&current, part);
            let mut depth = 0;
            while let Some(ObjectKind::Link(target)) = self.objects.get(&next).map(|o| &o.kind) {
                depth += 1;
                if depth > MAX_LINK_DEPTH {
                    return None;
                }
                next = normalize(target);
            }
            self.objects.get(&next)?;
            current = next;
        }
        self.objects.contains_key(&current).then_some(current)
    }

    pub(crate) fn get(&self, path: &str) -> Option<&StoredObject> {
        self.resolve(path).and_then(|p| self.objects.get(&p))
    }

    pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut StoredObject> {
        let resolved = self.resolve(path)?;
        self.objects.get_mut(&resolved)
    }

    pub(crate) fn dataset(&self, path: &str) -> Result<&StoredDataset> {
        match self.get(path).map(|o| &o.kind) {
            Some(ObjectKind::Dataset(ds)) => Ok(ds),
            _ => Err(Error::ObjectNotFound(path.to_string())),
        }
    }

    pub(crate) fn dataset_mut(&mut self, path: &str) -> Result<&mut StoredDataset> {
        match self.get_mut(path).map(|o| &mut o.kind) {
            Some(ObjectKind::Dataset(ds)) => Ok(ds),
            _ => Err(Error::ObjectNotFound(path.to_string())),
        }
    }

    pub(crate) fn object_type(&self, path: &str) -> StorageObjectType {
        if let Some(object) = self.get(path) {
            return object.object_type();
        }
        let (owner, name) = split_attribute_path(path);
        match self.get(&owner) {
            Some(object) if object.attributes.contains_key(&name) => StorageObjectType::Attribute,
            _ => StorageObjectType::Undefined,
        }
    }

    pub(crate) fn is_link(&self, path: &str) -> bool {
        let normalized = normalize(path);
        let parent = parent_path(&normalized);
        let Some(resolved_parent) = self.resolve(&parent) else {
            return false;
        };
        let direct = merge_paths(&resolved_parent, crate::utils::path_name(&normalized));
        matches!(
            self.objects.get(&direct).map(|o| &o.kind),
            Some(ObjectKind::Link(_))
        )
    }

    /// Where a new object named by `path` goes: its parent is resolved
    /// through links and created as a group chain if missing.
    fn prepare_insert(&mut self, path: &str) -> Result<String> {
        let normalized = normalize(path);
        if normalized == "/" {
            return Err(Error::ObjectExists(normalized));
        }
        let parent = self.ensure_group(&parent_path(&normalized))?;
        let target = merge_paths(&parent, crate::utils::path_name(&normalized));
        if self.objects.contains_key(&target) {
            return Err(Error::ObjectExists(normalized));
        }
        Ok(target)
    }

    /// Resolve a group path, creating missing groups along the way.
    pub(crate) fn ensure_group(&mut self, path: &str) -> Result<String> {
        let normalized = normalize(path);
        if let Some(resolved) = self.resolve(&normalized) {
            return match self.objects.get(&resolved).map(|o| &o.kind) {
                Some(ObjectKind::Group) => Ok(resolved),
                _ => Err(Error::ObjectExists(normalized)),
            };
        }
        let parent = self.ensure_group(&parent_path(&normalized))?;
        let target = merge_paths(&parent, crate::utils::path_name(&normalized));
        self.objects
            .insert(target.clone(), StoredObject::new(ObjectKind::Group));
        Ok(target)
    }

    pub(crate) fn insert_dataset(&mut self, path: &str, dataset: StoredDataset) -> Result<String> {
        let target = self.prepare_insert(path)?;
        self.objects
            .insert(target.clone(), StoredObject::new(ObjectKind::Dataset(dataset)));
        Ok(target)
    }

    pub(crate) fn insert_link(&mut self, path: &str, target: &str) -> Result<()> {
        let at = self.prepare_insert(path)?;
        self.objects
            .insert(at, StoredObject::new(ObjectKind::Link(normalize(target))));
        Ok(())
    }

    pub(crate) fn set_attribute(&mut self, path: &str, name: &str, value: AttrValue) -> Result<()> {
        let object = self
            .get_mut(path)
            .ok_or_else(|| Error::ObjectNotFound(path.to_string()))?;
        object
            .attributes
            .insert(name.to_string(), StoredAttribute::from_value(value));
        Ok(())
    }

    pub(crate) fn attribute(&self, path: &str) -> Result<&StoredAttribute> {
        let (owner, name) = split_attribute_path(path);
        self.get(&owner)
            .and_then(|o| o.attributes.get(&name))
            .ok_or_else(|| Error::AttributeNotFound(normalize(path)))
    }

    /// Direct children of a group and attributes of any object.
    pub(crate) fn children(
        &self,
        path: &str,
        filter: StorageObjectType,
    ) -> Result<Vec<(String, StorageObjectType)>> {
        let resolved = self
            .resolve(path)
            .ok_or_else(|| Error::ObjectNotFound(path.to_string()))?;
        let object = &self.objects[&resolved];
        let mut out = Vec::new();
        if matches!(object.kind, ObjectKind::Group) {
            let prefix = if resolved == "/" {
                "/".to_string()
            } else {
                format!("{resolved}/")
            };
            for (child_path, child) in self.objects.range(prefix.clone()..) {
                if !child_path.starts_with(&prefix) {
                    break;
                }
                let name = &child_path[prefix.len()..];
                if name.is_empty() || name.contains('/') {
                    continue;
                }
                let kind = match &child.kind {
                    ObjectKind::Link(_) => self.object_type(child_path),
                    _ => child.object_type(),
                };
                out.push((name.to_string(), kind));
            }
        }
        for name in object.attributes.keys() {
            out.push((name.clone(), StorageObjectType::Attribute));
        }
        if filter != StorageObjectType::Undefined {
            out.retain(|(_, kind)| *kind == filter);
        }
        Ok(out)
    }

    pub(crate) fn read_dataset(&self, path: &str, selection: &Selection) -> Result<DataBlockGeneric> {
        let dataset = self.dataset(path)?;
        selection.validate(&dataset.shape)?;
        let shape = match selection {
            Selection::All => dataset.shape.clone(),
            _ => selection.output_shape(&dataset.shape),
        };
        let values = match selection {
            Selection::All => dataset.values.clone(),
            _ => dataset.values.gather(&selection.flat_indices(&dataset.shape)),
        };
        DataBlockGeneric::with_type(values, shape, dataset.data_type)
    }
}

/// A hierarchical in-memory store.
///
/// A store outlives the IO instances that open it, so it can be written by
/// one [`MemoryIo`](super::MemoryIo), closed, and reopened read-only by
/// another, the way a file on disk would be.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) inner: RwLock<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the store has been created by an `Overwrite` open.
    pub fn exists(&self) -> bool {
        self.inner.read().exists
    }

    /// Number of groups, datasets and links in the store.
    pub fn object_count(&self) -> usize {
        self.inner.read().objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_root() -> StoreInner {
        let mut inner = StoreInner::default();
        inner.truncate();
        inner
    }

    fn dataset(values: DataValues, shape: Vec<usize>) -> StoredDataset {
        StoredDataset {
            data_type: BaseDataType::from(values.element_type()),
            shape,
            chunking: vec![],
            values,
        }
    }

    #[test]
    fn ensure_group_creates_parents() {
        let mut inner = store_with_root();
        inner.ensure_group("/stimulus/presentation").unwrap();
        assert_eq!(inner.object_type("/stimulus"), StorageObjectType::Group);
        assert_eq!(inner.object_type("/stimulus/presentation"), StorageObjectType::Group);
    }

    #[test]
    fn links_resolve_through_components() {
        let mut inner = store_with_root();
        inner.ensure_group("/general/devices/array").unwrap();
        inner
            .set_attribute("/general/devices/array", "description", AttrValue::from("probe"))
            .unwrap();
        inner.ensure_group("/groups/shank0").unwrap();
        inner
            .insert_link("/groups/shank0/device", "/general/devices/array")
            .unwrap();

        assert!(inner.is_link("/groups/shank0/device"));
        assert!(!inner.is_link("/general/devices/array"));
        assert_eq!(
            inner.object_type("/groups/shank0/device"),
            StorageObjectType::Group
        );
        let attr = inner.attribute("/groups/shank0/device/description").unwrap();
        assert_eq!(attr.values, DataValues::Str(vec!["probe".into()]));
    }

    #[test]
    fn dangling_link_is_undefined() {
        let mut inner = store_with_root();
        inner.insert_link("/missing", "/nowhere").unwrap();
        assert_eq!(inner.object_type("/missing"), StorageObjectType::Undefined);
    }

    #[test]
    fn duplicate_dataset_rejected() {
        let mut inner = store_with_root();
        inner
            .insert_dataset("/x", dataset(DataValues::I32(vec![1]), vec![1]))
            .unwrap();
        let err = inner
            .insert_dataset("/x", dataset(DataValues::I32(vec![1]), vec![1]))
            .unwrap_err();
        assert_eq!(err, Error::ObjectExists("/x".into()));
    }

    #[test]
    fn children_listing() {
        let mut inner = store_with_root();
        inner.ensure_group("/a/b").unwrap();
        inner
            .insert_dataset("/a/d", dataset(DataValues::F32(vec![]), vec![0]))
            .unwrap();
        inner.set_attribute("/a", "note", AttrValue::from("x")).unwrap();

        let all = inner.children("/a", StorageObjectType::Undefined).unwrap();
        assert_eq!(
            all,
            vec![
                ("b".to_string(), StorageObjectType::Group),
                ("d".to_string(), StorageObjectType::Dataset),
                ("note".to_string(), StorageObjectType::Attribute),
            ]
        );
        let groups = inner.children("/a", StorageObjectType::Group).unwrap();
        assert_eq!(groups.len(), 1);
        let root = inner.children("/", StorageObjectType::Group).unwrap();
        assert_eq!(root, vec![("a".to_string(), StorageObjectType::Group)]);
    }

    #[test]
    fn block_write_grows_every_dimension() {
        let mut ds = dataset(DataValues::I32(vec![]), vec![0, 2]);
        ds.write_block("/d", &[2, 1], &[0, 0], DataRef::I32(&[1, 2])).unwrap();
        ds.write_block("/d", &[2, 1], &[0, 1], DataRef::I32(&[3, 4])).unwrap();
        assert_eq!(ds.shape, vec![2, 2]);
        assert_eq!(ds.values, DataValues::I32(vec![1, 3, 2, 4]));

        ds.write_block("/d", &[1, 1], &[1, 2], DataRef::I32(&[9])).unwrap();
        assert_eq!(ds.shape, vec![2, 3]);
        assert_eq!(ds.values, DataValues::I32(vec![1, 3, 0, 2, 4, 9]));
    }

    #[test]
    fn block_write_checks_rank_and_length() {
        let mut ds = dataset(DataValues::F64(vec![]), vec![0]);
        assert!(ds.write_block("/d", &[2, 1], &[0, 0], DataRef::F64(&[1.0, 2.0])).is_err());
        assert!(ds.write_block("/d", &[3], &[0], DataRef::F64(&[1.0, 2.0])).is_err());
    }

    #[test]
    fn read_slice() {
        let mut inner = store_with_root();
        inner
            .insert_dataset("/x", dataset(DataValues::I32((1..=10).collect()), vec![10]))
            .unwrap();
        let block = inner.read_dataset("/x", &Selection::slice(&[2..5])).unwrap();
        assert_eq!(block.shape(), &[3]);
        assert_eq!(block.data(), &DataValues::I32(vec![3, 4, 5]));
    }
}
