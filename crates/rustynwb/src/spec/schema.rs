//! Cached schema documents, one JSON text per schema file.
//!
//! Only the type definitions this crate writes are carried, with their
//! inheritance; readers that need the full schema resolve it by namespace
//! name and version.

pub(crate) const CORE_VERSION: &str = "2.8.0";
pub(crate) const HDMF_COMMON_VERSION: &str = "1.8.0";
pub(crate) const HDMF_EXPERIMENTAL_VERSION: &str = "0.5.0";

pub(crate) const CORE_NAMESPACE: &str = r#"{"namespaces":[{"name":"core","full_name":"NWB core","doc":"NWB namespace","version":"2.8.0","schema":[{"namespace":"hdmf-common"},{"source":"nwb.base"},{"source":"nwb.device"},{"source":"nwb.ecephys"},{"source":"nwb.misc"},{"source":"nwb.file"}]}]}"#;

pub(crate) const CORE_BASE: &str = r#"{"groups":[
{"neurodata_type_def":"NWBContainer","neurodata_type_inc":"Container","doc":"An abstract data type for a generic container storing collections of data and metadata."},
{"neurodata_type_def":"NWBDataInterface","neurodata_type_inc":"NWBContainer","doc":"An abstract data type for a generic container storing collections of data, as opposed to metadata."},
{"neurodata_type_def":"TimeSeries","neurodata_type_inc":"NWBDataInterface","doc":"General purpose time series.","datasets":[{"name":"data","doc":"Data values."},{"name":"starting_time","quantity":"?","doc":"Timestamp of the first sample in seconds."},{"name":"timestamps","quantity":"?","doc":"Timestamps for samples stored in data, in seconds."},{"name":"control","quantity":"?","doc":"Numerical labels that apply to each time point in data."},{"name":"control_description","quantity":"?","doc":"Description of each control value."}]},
{"neurodata_type_def":"ProcessingModule","neurodata_type_inc":"NWBContainer","doc":"A collection of processed data.","groups":[{"neurodata_type_inc":"NWBDataInterface","quantity":"*","doc":"Data objects stored in this collection."},{"neurodata_type_inc":"DynamicTable","quantity":"*","doc":"Tables stored in this collection."}]}
]}"#;

pub(crate) const CORE_DEVICE: &str = r#"{"groups":[{"neurodata_type_def":"Device","neurodata_type_inc":"NWBContainer","doc":"Metadata about a data acquisition device, e.g., recording system, electrode, microscope."}]}"#;

pub(crate) const CORE_ECEPHYS: &str = r#"{"groups":[
{"neurodata_type_def":"ElectricalSeries","neurodata_type_inc":"TimeSeries","doc":"A time series of acquired voltage data from extracellular recordings.","datasets":[{"name":"electrodes","neurodata_type_inc":"DynamicTableRegion","doc":"DynamicTableRegion pointer to the electrodes that this time series was generated from."},{"name":"channel_conversion","quantity":"?","doc":"Channel-specific conversion factor."}]},
{"neurodata_type_def":"SpikeEventSeries","neurodata_type_inc":"ElectricalSeries","doc":"Stores snapshots/snippets of recorded spike events."},
{"neurodata_type_def":"ElectrodeGroup","neurodata_type_inc":"NWBContainer","doc":"A physical grouping of electrodes, e.g. a shank of an array.","links":[{"name":"device","target_type":"Device","doc":"Link to the device that was used to record from this electrode group."}]}
]}"#;

pub(crate) const CORE_MISC: &str = r#"{"groups":[{"neurodata_type_def":"AnnotationSeries","neurodata_type_inc":"TimeSeries","doc":"Stores user annotations made during an experiment."}]}"#;

pub(crate) const CORE_FILE: &str = r#"{"groups":[
{"neurodata_type_def":"NWBFile","neurodata_type_inc":"NWBContainer","name":"root","doc":"An NWB file storing cellular-based neurophysiology data from a single experimental session."},
{"neurodata_type_def":"ElectrodesTable","neurodata_type_inc":"DynamicTable","name":"electrodes","doc":"A table of all electrodes (i.e. channels) used for recording."}
]}"#;

pub(crate) const HDMF_COMMON_NAMESPACE: &str = r#"{"namespaces":[{"name":"hdmf-common","full_name":"HDMF Common","doc":"Common data structures provided by HDMF","version":"1.8.0","schema":[{"source":"base"},{"source":"table"}]}]}"#;

pub(crate) const HDMF_COMMON_BASE: &str = r#"{"datasets":[{"data_type_def":"Data","doc":"An abstract data type for a dataset."}],"groups":[{"data_type_def":"Container","doc":"An abstract data type for a group storing collections of data and metadata."},{"data_type_def":"SimpleMultiContainer","data_type_inc":"Container","doc":"A simple Container for holding onto multiple containers."}]}"#;

pub(crate) const HDMF_COMMON_TABLE: &str = r#"{"datasets":[
{"data_type_def":"VectorData","data_type_inc":"Data","doc":"An n-dimensional dataset representing a column of a DynamicTable."},
{"data_type_def":"VectorIndex","data_type_inc":"VectorData","doc":"Used with VectorData to encode a ragged array."},
{"data_type_def":"ElementIdentifiers","data_type_inc":"Data","doc":"A list of unique identifiers for values within a dataset, e.g. rows of a DynamicTable."},
{"data_type_def":"DynamicTableRegion","data_type_inc":"VectorData","doc":"DynamicTableRegion provides a link from one table to an index or region of another."}
],"groups":[
{"data_type_def":"DynamicTable","data_type_inc":"Container","doc":"A group containing multiple datasets that are aligned on the first dimension.","datasets":[{"name":"id","data_type_inc":"ElementIdentifiers","doc":"Array of unique identifiers for the rows of this dynamic table."},{"data_type_inc":"VectorData","quantity":"*","doc":"Vector columns of this dynamic table."}]},
{"data_type_def":"AlignedDynamicTable","data_type_inc":"DynamicTable","doc":"DynamicTable container that supports storing a collection of sub-tables."}
]}"#;

pub(crate) const HDMF_EXPERIMENTAL_NAMESPACE: &str = r#"{"namespaces":[{"name":"hdmf-experimental","full_name":"HDMF Experimental","doc":"Experimental data structures provided by HDMF. These are not guaranteed to be available in the future.","version":"0.5.0","schema":[{"namespace":"hdmf-common"},{"source":"experimental"},{"source":"resources"}]}]}"#;

pub(crate) const HDMF_EXPERIMENTAL_EXPERIMENTAL: &str = r#"{"datasets":[{"data_type_def":"EnumData","data_type_inc":"VectorData","doc":"Data that come from a fixed set of values."}]}"#;

pub(crate) const HDMF_EXPERIMENTAL_RESOURCES: &str = r#"{"groups":[{"data_type_def":"HERD","data_type_inc":"Container","doc":"HDMF External Resources Data Structure."}]}"#;
