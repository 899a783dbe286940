use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::{AttrValue, DataValues};
use crate::nwb::hdmf::{Container, ElementIdentifiers, VectorData};
use crate::nwb::registry::create_typed;
use crate::nwb::{RegisteredType, TypeBase};

#[derive(Debug, Clone, PartialEq)]
enum ColumnValues {
    Values(DataValues),
    References(Vec<String>),
}

impl ColumnValues {
    fn len(&self) -> usize {
        match self {
            ColumnValues::Values(v) => v.len(),
            ColumnValues::References(r) => r.len(),
        }
    }
}

#[derive(Debug)]
struct PendingColumn {
    name: String,
    description: String,
    values: ColumnValues,
}

#[derive(Debug, Default)]
struct PendingRows {
    columns: Vec<PendingColumn>,
    ids: Option<Vec<i32>>,
}

/// `hdmf-common::DynamicTable`: a group of equal-length column datasets
/// with an `id` column.
///
/// Columns and row ids accumulate in memory and are written by
/// [`RegisteredType::finalize`]. Rows are written once: after the first
/// finalize new columns must match the stored row count.
#[derive(Debug)]
pub struct DynamicTable {
    pub(crate) container: Container,
    pending: Mutex<PendingRows>,
}

impl DynamicTable {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            container: Container::with_base(base),
            pending: Mutex::new(PendingRows::default()),
        }
    }

    /// Create the table group with an empty `id` column.
    pub fn initialize(&self, description: &str) -> Result<()> {
        self.container.initialize()?;
        let io = self.io()?;
        io.create_attribute(self.path(), "description", AttrValue::from(description))?;
        io.create_attribute(self.path(), "colnames", AttrValue::StringArray(Vec::new()))?;
        create_typed::<ElementIdentifiers>(&self.base().child_path("id"), &io).initialize()
    }

    fn push_column(&self, name: &str, description: &str, values: ColumnValues) -> Result<()> {
        if name.is_empty() || name.contains('/') || name == "id" {
            return Err(Error::InvalidArgument(format!("invalid column name {name:?}")));
        }
        let mut pending = self.pending.lock();
        if pending.columns.iter().any(|c| c.name == name) {
            return Err(Error::ObjectExists(self.base().child_path(name)));
        }
        pending.columns.push(PendingColumn {
            name: name.to_string(),
            description: description.to_string(),
            values,
        });
        Ok(())
    }

    /// Queue a value column.
    pub fn add_column(&self, name: &str, description: &str, values: DataValues) -> Result<()> {
        self.push_column(name, description, ColumnValues::Values(values))
    }

    /// Queue a column of object references.
    pub fn add_reference_column(
        &self,
        name: &str,
        description: &str,
        targets: Vec<String>,
    ) -> Result<()> {
        self.push_column(name, description, ColumnValues::References(targets))
    }

    /// Queue explicit row ids. Without them rows are numbered from 0.
    pub fn set_row_ids(&self, ids: Vec<i32>) {
        self.pending.lock().ids = Some(ids);
    }

    /// Whether anything is waiting to be written.
    pub fn has_pending(&self) -> bool {
        let pending = self.pending.lock();
        !pending.columns.is_empty() || pending.ids.is_some()
    }

    /// Number of stored rows.
    pub fn num_rows(&self) -> Result<usize> {
        Ok(self
            .io()?
            .get_storage_object_shape(&self.base().child_path("id"))?
            .first()
            .copied()
            .unwrap_or(0))
    }

    /// Stored column names, in insertion order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        let block = self.colnames().values_generic()?;
        Ok(block.as_strings().map(<[String]>::to_vec).unwrap_or_default())
    }

    /// A stored value column.
    pub fn column(&self, name: &str) -> Option<Arc<VectorData>> {
        self.base().registered::<VectorData>(name)
    }

    /// Drop queued columns and ids without writing them.
    pub(crate) fn discard_pending(&self) {
        *self.pending.lock() = PendingRows::default();
    }

    /// Write the queued batch. The batch is consumed whether or not the
    /// write succeeds, so a failed finalize never leaves it half written
    /// and still queued.
    pub(crate) fn write_pending(&self) -> Result<()> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.columns.is_empty() && batch.ids.is_none() {
            return Ok(());
        }
        self.write_batch(&batch).inspect_err(|e| {
            warn!(path = %self.path(), error = %e, "discarded table rows that failed to write");
        })
    }

    /// Check a batch against the stored table without writing anything.
    fn validate_batch(&self, batch: &PendingRows) -> Result<usize> {
        let io = self.io()?;
        let stored_rows = self.num_rows()?;

        let mut lengths = batch.columns.iter().map(|c| c.values.len());
        let rows = match (lengths.next(), &batch.ids) {
            (Some(n), _) => n,
            (None, Some(ids)) => ids.len(),
            (None, None) => 0,
        };
        if lengths.any(|n| n != rows) {
            return Err(Error::InvalidArgument(format!(
                "{}: columns must all have the same length",
                self.path()
            )));
        }
        if let Some(ids) = &batch.ids {
            if ids.len() != rows {
                return Err(Error::InvalidArgument(format!(
                    "{}: {} row ids for {rows} rows",
                    self.path(),
                    ids.len()
                )));
            }
        }
        if stored_rows > 0 && (batch.ids.is_some() || rows != stored_rows) {
            return Err(Error::InvalidArgument(format!(
                "{}: table already holds {stored_rows} rows",
                self.path()
            )));
        }
        if stored_rows == 0 && batch.ids.is_none() && i32::try_from(rows).is_err() {
            return Err(Error::InvalidArgument(format!(
                "{}: {rows} rows exceed the id range",
                self.path()
            )));
        }
        for column in &batch.columns {
            let path = self.base().child_path(&column.name);
            if io.object_exists(&path) {
                return Err(Error::ObjectExists(path));
            }
            if let ColumnValues::References(targets) = &column.values {
                if let Some(missing) = targets.iter().find(|t| !io.object_exists(t)) {
                    return Err(Error::ObjectNotFound(missing.clone()));
                }
            }
        }
        Ok(rows)
    }

    fn write_batch(&self, batch: &PendingRows) -> Result<()> {
        let rows = self.validate_batch(batch)?;
        let io = self.io()?;

        if self.num_rows()? == 0 {
            let ids = match &batch.ids {
                Some(ids) => ids.clone(),
                None => (0..rows as i32).collect(),
            };
            let id = create_typed::<ElementIdentifiers>(&self.base().child_path("id"), &io);
            if !id.exists() {
                id.initialize()?;
            }
            id.append(&ids)?;
        }

        let mut colnames = self.column_names().unwrap_or_default();
        for column in &batch.columns {
            let path = self.base().child_path(&column.name);
            let vector = create_typed::<VectorData>(&path, &io);
            match &column.values {
                ColumnValues::Values(values) => {
                    vector.initialize_with_values(values, &column.description)?;
                }
                ColumnValues::References(targets) => {
                    io.create_reference_data_set(&path, targets)?;
                    io.create_common_nwb_attributes(&path, vector.namespace(), vector.type_name())?;
                    io.create_attribute(&path, "description", AttrValue::from(column.description.as_str()))?;
                }
            }
            colnames.push(column.name.clone());
        }
        io.create_attribute(self.path(), "colnames", AttrValue::StringArray(colnames))?;

        debug!(path = %self.path(), rows, columns = batch.columns.len(), "wrote table rows");
        Ok(())
    }
}

deref_to!(DynamicTable => Container, container);
impl_registered_type!(
    DynamicTable,
    "hdmf-common",
    "DynamicTable",
    base = container.base,
    finalize = write_pending
);

define_fields! {
    DynamicTable {
        attribute description: String = "description", "Description of what is in this table.";
        attribute colnames: String = "colnames", "Column names in display order.";
        registered id: ElementIdentifiers = "id", "Row identifiers.";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{BaseIo, FileMode, MemoryIo, SharedIo};

    fn table() -> (SharedIo, Arc<DynamicTable>) {
        let io: SharedIo = Arc::new(MemoryIo::new("table.nwb"));
        io.open(FileMode::Overwrite).unwrap();
        let table = create_typed::<DynamicTable>("/table", &io);
        table.initialize("a table").unwrap();
        (io, table)
    }

    #[test]
    fn initialize_writes_empty_id() {
        let (_io, table) = table();
        assert_eq!(table.num_rows().unwrap(), 0);
        assert!(table.column_names().unwrap().is_empty());
        assert_eq!(
            table.description().values().unwrap().data(),
            &["a table".to_string()]
        );
    }

    #[test]
    fn finalize_writes_columns_and_default_ids() {
        let (io, table) = table();
        table
            .add_column("location", "where", DataValues::Str(vec!["a".into(), "b".into()]))
            .unwrap();
        table
            .add_column("gain", "gain", DataValues::F32(vec![1.0, 2.0]))
            .unwrap();
        assert!(table.has_pending());
        table.finalize().unwrap();
        assert!(!table.has_pending());

        let ids = table.id().unwrap().data().values_as::<i32>().unwrap();
        assert_eq!(ids.data(), &[0, 1]);
        assert_eq!(table.column_names().unwrap(), ["location", "gain"]);
        let gain = table.column("gain").unwrap();
        assert_eq!(gain.data().values_as::<f32>().unwrap().data(), &[1.0, 2.0]);
        assert_eq!(
            io.read_string_attribute("/table/gain/neurodata_type").unwrap(),
            "VectorData"
        );
    }

    #[test]
    fn finalize_is_idempotent() {
        let (_io, table) = table();
        table.set_row_ids(vec![5, 6, 7]);
        table.finalize().unwrap();
        table.finalize().unwrap();
        assert_eq!(table.num_rows().unwrap(), 3);
    }

    #[test]
    fn reference_column() {
        let (io, table) = table();
        io.create_group("/targets/a").unwrap();
        table
            .add_reference_column("target", "refs", vec!["/targets/a".into()])
            .unwrap();
        table.finalize().unwrap();
        let refs = io.read_dataset("/table/target", &crate::io::Selection::All).unwrap();
        assert_eq!(refs.as_strings().unwrap(), ["/targets/a".to_string()]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let (_io, table) = table();
        table.add_column("a", "", DataValues::I32(vec![1, 2])).unwrap();
        table.add_column("b", "", DataValues::I32(vec![1])).unwrap();
        assert!(matches!(table.finalize(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn duplicate_or_reserved_column_names() {
        let (_io, table) = table();
        table.add_column("a", "", DataValues::I32(vec![1])).unwrap();
        assert!(table.add_column("a", "", DataValues::I32(vec![1])).is_err());
        assert!(table.add_column("id", "", DataValues::I32(vec![1])).is_err());
    }

    #[test]
    fn failed_finalize_writes_nothing_and_can_be_retried() {
        let (io, table) = table();
        table.add_column("a", "", DataValues::I32(vec![1, 2])).unwrap();
        table
            .add_reference_column("target", "", vec!["/missing".into(), "/missing".into()])
            .unwrap();
        assert!(matches!(table.finalize(), Err(Error::ObjectNotFound(_))));
        assert!(!io.object_exists("/table/a"));
        assert!(!table.has_pending());
        assert_eq!(table.num_rows().unwrap(), 0);

        io.create_group("/targets/a").unwrap();
        table.add_column("a", "", DataValues::I32(vec![1, 2])).unwrap();
        table
            .add_reference_column("target", "", vec!["/targets/a".into(), "/targets/a".into()])
            .unwrap();
        table.finalize().unwrap();
        assert_eq!(table.num_rows().unwrap(), 2);
        assert_eq!(table.column_names().unwrap(), ["a", "target"]);
    }

    #[test]
    fn stored_column_is_not_written_twice() {
        let (_io, table) = table();
        table.add_column("a", "", DataValues::I32(vec![1, 2])).unwrap();
        table.finalize().unwrap();
        table.add_column("a", "", DataValues::I32(vec![3, 4])).unwrap();
        assert!(matches!(table.finalize(), Err(Error::ObjectExists(_))));
        table.finalize().unwrap();
        assert_eq!(
            table.column("a").unwrap().data().values_as::<i32>().unwrap().data(),
            &[1, 2]
        );
    }

    #[test]
    fn later_columns_must_match_rows() {
        let (_io, table) = table();
        table.add_column("a", "", DataValues::I32(vec![1, 2])).unwrap();
        table.finalize().unwrap();
        table.add_column("b", "", DataValues::I32(vec![3])).unwrap();
        assert!(table.finalize().is_err());
    }
}
