use parking_lot::Mutex;
use tracing::warn;

use crate::channel::Channel;
use crate::config::{ELECTRODES_TABLE_PATH, ELECTRODE_GROUP_PATH};
use crate::error::{Error, Result};
use crate::io::DataValues;
use crate::nwb::hdmf::DynamicTable;
use crate::nwb::{RegisteredType, TypeBase};
use crate::utils::merge_paths;

#[derive(Debug, Default)]
struct PendingElectrodes {
    ids: Vec<i32>,
    locations: Vec<String>,
    group_names: Vec<String>,
    groups: Vec<String>,
}

/// `core::ElectrodesTable`: one row per recorded electrode, at
/// [`ELECTRODES_TABLE_PATH`].
///
/// Rows added with [`add_electrodes`](Self::add_electrodes) are written on
/// finalize, as the `location`, `group` and `group_name` columns.
#[derive(Debug)]
pub struct ElectrodesTable {
    pub(crate) table: DynamicTable,
    pending: Mutex<PendingElectrodes>,
}

impl ElectrodesTable {
    pub(crate) fn with_base(base: TypeBase) -> Self {
        Self {
            table: DynamicTable::with_base(base),
            pending: Mutex::new(PendingElectrodes::default()),
        }
    }

    /// The table's fixed location in a file.
    pub fn path_in_file() -> &'static str {
        ELECTRODES_TABLE_PATH
    }

    pub fn initialize(&self, description: &str) -> Result<()> {
        self.table.initialize(description)
    }

    /// Queue one row per channel. Each channel's group must exist under
    /// `/general/extracellular_ephys` by finalize time.
    pub fn add_electrodes(&self, channels: &[Channel]) -> Result<()> {
        let ids = channels
            .iter()
            .map(|c| {
                i32::try_from(c.global_index).map_err(|_| {
                    Error::InvalidArgument(format!(
                        "electrode index {} exceeds the id range",
                        c.global_index
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut pending = self.pending.lock();
        for (channel, id) in channels.iter().zip(ids) {
            pending.ids.push(id);
            pending.locations.push("unknown".to_string());
            pending.group_names.push(channel.group_name.clone());
            pending
                .groups
                .push(merge_paths(ELECTRODE_GROUP_PATH, &channel.group_name));
        }
        Ok(())
    }

    fn queue_rows(&self, rows: PendingElectrodes) -> Result<()> {
        self.table.add_column(
            "location",
            "the location of channel within the subject e.g. brain region",
            DataValues::Str(rows.locations),
        )?;
        self.table.add_reference_column(
            "group",
            "a reference to the ElectrodeGroup this electrode is a part of",
            rows.groups,
        )?;
        self.table.add_column(
            "group_name",
            "the name of the ElectrodeGroup this electrode is a part of",
            DataValues::Str(rows.group_names),
        )?;
        self.table.set_row_ids(rows.ids);
        Ok(())
    }

    fn write_pending(&self) -> Result<()> {
        let rows = std::mem::take(&mut *self.pending.lock());
        if !rows.ids.is_empty() {
            if let Err(e) = self.queue_rows(rows) {
                self.table.discard_pending();
                warn!(path = %self.path(), error = %e, "discarded electrode rows");
                return Err(e);
            }
        }
        self.table.finalize()
    }
}

deref_to!(ElectrodesTable => DynamicTable, table);
impl_registered_type!(
    ElectrodesTable,
    "core",
    "ElectrodesTable",
    base = table.container.base,
    finalize = write_pending
);

define_fields! {
    ElectrodesTable {
        dataset location: String = "location", "Location of each electrode.";
        dataset group_name: String = "group_name", "Name of each electrode's group.";
        dataset group: String = "group", "Reference to each electrode's group.";
    }
}
