//! Configuration and schema constants.

/// Version of the NWB schema files written by this crate.
pub const NWB_VERSION: &str = "2.8.0";

/// Default chunk length along the time axis of recorded series.
pub const CHUNK_XSIZE: usize = 2048;

/// Default chunk length along the event axis of spike event series.
pub const SPIKE_CHUNK_XSIZE: usize = 8;

/// Fixed location of the electrodes table.
pub const ELECTRODES_TABLE_PATH: &str = "/general/extracellular_ephys/electrodes";

/// Group that holds electrode groups.
pub const ELECTRODE_GROUP_PATH: &str = "/general/extracellular_ephys";

/// Group that holds devices.
pub const DEVICES_PATH: &str = "/general/devices";

/// Group that holds acquired series.
pub const ACQUISITION_PATH: &str = "/acquisition";

/// Storage backend options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoConfig {
    /// Keep structure mutable while recording.
    ///
    /// With this set, starting a recording does not freeze the object
    /// hierarchy and stopping it flushes and leaves the file open, so another
    /// recording can follow.
    pub disable_swmr_mode: bool,
    /// Chunk shape used when a dataset config gives none.
    pub default_chunking: Vec<usize>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            disable_swmr_mode: false,
            default_chunking: vec![CHUNK_XSIZE],
        }
    }
}

impl IoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep structure mutable while recording.
    pub fn disable_swmr_mode(mut self) -> Self {
        self.disable_swmr_mode = true;
        self
    }

    /// Set the fallback chunk shape.
    pub fn default_chunking(mut self, chunking: &[usize]) -> Self {
        self.default_chunking = chunking.to_vec();
        self
    }
}
