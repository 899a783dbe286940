use std::collections::HashSet;
use std::sync::Arc;

use rustynwb::config::{ELECTRODES_TABLE_PATH, ELECTRODE_GROUP_PATH};
use rustynwb::io::{
    ArrayDataSetConfig, BaseDataType, BaseIo, DataValues, FileMode, MemoryIo, RecordState,
    SearchMode, SharedIo,
};
use rustynwb::nwb::registry::{self, create_typed};
use rustynwb::nwb::{
    Device, ElectricalSeries, ElectricalSeriesSettings, ElectrodeGroup, ElectrodesTable, NwbFile,
    NwbFileSettings, RegisteredType,
};
use rustynwb::Channel;

// ============================================================
// Helpers
// ============================================================

const NUM_SAMPLES: usize = 100;

fn channels() -> Vec<Channel> {
    (0..3)
        .map(|i| Channel::new(format!("ch{i}"), "array0", 0, i, i))
        .collect()
}

fn samples(channel: usize) -> Vec<f32> {
    (0..NUM_SAMPLES).map(|i| (channel * 1000 + i) as f32).collect()
}

/// Build the file, electrodes and series by hand and record 100 samples per
/// channel, then stop recording.
fn record_session(io: &Arc<MemoryIo>) -> Arc<ElectricalSeries> {
    let _ = tracing_subscriber::fmt::try_init();
    let shared: SharedIo = io.clone();
    shared.open(FileMode::Overwrite).unwrap();

    let file = create_typed::<NwbFile>("/", &shared);
    file.initialize(&NwbFileSettings::new("abc")).unwrap();

    let device = create_typed::<Device>("/general/devices/array0", &shared);
    device.initialize("description", "unknown").unwrap();
    let group = create_typed::<ElectrodeGroup>(&format!("{ELECTRODE_GROUP_PATH}/array0"), &shared);
    group.initialize("description", "unknown", &device).unwrap();

    let table = create_typed::<ElectrodesTable>(ELECTRODES_TABLE_PATH, &shared);
    table.initialize("metadata about extracellular electrodes").unwrap();
    table.add_electrodes(&channels()).unwrap();
    table.finalize().unwrap();

    let series = create_typed::<ElectricalSeries>("/acquisition/array0", &shared);
    let config = ArrayDataSetConfig::new(BaseDataType::F32, vec![0, 3], vec![1024, 0]);
    series
        .initialize(config, &channels(), &ElectricalSeriesSettings::new())
        .unwrap();

    shared.start_recording().unwrap();
    let timestamps: Vec<f64> = (0..NUM_SAMPLES).map(|i| i as f64 / 30_000.0).collect();
    for channel in 0..3 {
        let ts = (channel == 0).then_some(timestamps.as_slice());
        series
            .write_channel(channel, NUM_SAMPLES, &samples(channel), ts, None)
            .unwrap();
    }
    shared.stop_recording().unwrap();
    series
}

// ============================================================
// Scenario
// ============================================================

#[test]
fn record_then_read_back() {
    let writer = Arc::new(MemoryIo::new("abc.nwb"));
    let written = record_session(&writer);
    assert_eq!(writer.record_state(), RecordState::Closed);
    assert_eq!(written.samples_recorded(), vec![NUM_SAMPLES; 3]);

    let reader: SharedIo = Arc::new(MemoryIo::with_store("abc.nwb", writer.store()));
    reader.open(FileMode::ReadOnly).unwrap();
    assert!(!reader.can_modify_objects());

    let types = HashSet::from(["core::ElectricalSeries".to_string()]);
    let found = reader
        .find_types("/", &types, SearchMode::ContinueOnType, false)
        .unwrap();
    assert_eq!(found.len(), 1);
    let path = found.keys().next().unwrap().clone();
    assert_eq!(path, "/acquisition/array0");

    let object = registry::create(&path, &reader, false).unwrap();
    assert_eq!(object.full_type_name().to_string(), "core::ElectricalSeries");
    let series = registry::downcast::<ElectricalSeries>(object).unwrap();

    let data = series.data().values_as::<f32>().unwrap();
    assert_eq!(data.shape(), &[NUM_SAMPLES, 3]);
    let view = data.as_view();
    for channel in 0..3 {
        let column: Vec<f32> = (0..NUM_SAMPLES)
            .map(|i| *view.get(&[i, channel]).unwrap())
            .collect();
        assert_eq!(column, samples(channel));
    }
    assert_eq!(series.timestamps().values().unwrap().len(), NUM_SAMPLES);

    let file = create_typed::<NwbFile>("/", &reader);
    assert!(file.is_initialized());
    assert_eq!(file.identifier().values().unwrap().data(), &["abc".to_string()]);
    let table = file.electrodes_table().unwrap();
    assert_eq!(table.id().unwrap().data().values_as::<i32>().unwrap().data(), &[0, 1, 2]);
    assert_eq!(
        table.group_name().values().unwrap().data(),
        &["array0".to_string(), "array0".to_string(), "array0".to_string()]
    );
    assert_eq!(series.electrodes().unwrap().table_path().unwrap(), ELECTRODES_TABLE_PATH);
}

#[test]
fn read_only_file_rejects_structure() {
    let writer = Arc::new(MemoryIo::new("ro.nwb"));
    record_session(&writer);

    let reader: SharedIo = Arc::new(MemoryIo::with_store("ro.nwb", writer.store()));
    reader.open(FileMode::ReadOnly).unwrap();
    assert!(reader.create_group("/analysis/extra").is_err());
    assert!(reader.start_recording().is_err());

    let file = create_typed::<NwbFile>("/", &reader);
    assert!(file.create_annotation_series("notes").is_err());
}

#[test]
fn hyperslab_of_recorded_data() {
    let writer = Arc::new(MemoryIo::new("slab.nwb"));
    record_session(&writer);

    let reader: SharedIo = Arc::new(MemoryIo::with_store("slab.nwb", writer.store()));
    reader.open(FileMode::ReadOnly).unwrap();
    let series = create_typed::<ElectricalSeries>("/acquisition/array0", &reader);
    let block = series.data().values_generic_slice(&[10, 1], &[3, 2], &[], &[]).unwrap();
    assert_eq!(block.shape(), &[3, 2]);
    assert_eq!(
        block.data(),
        &DataValues::F32(vec![1010.0, 2010.0, 1011.0, 2011.0, 1012.0, 2012.0])
    );
}

#[test]
fn reopened_writer_can_add_annotations() {
    let writer = Arc::new(MemoryIo::new("rw.nwb"));
    record_session(&writer);

    let io: SharedIo = Arc::new(MemoryIo::with_store("rw.nwb", writer.store()));
    io.open(FileMode::ReadWrite).unwrap();
    let file = create_typed::<NwbFile>("/", &io);
    assert!(file.is_initialized());
    let index = file.create_annotation_series("notes").unwrap();
    assert_eq!(io.recording_objects().get(index).unwrap().type_name(), "AnnotationSeries");
    let names: Vec<String> = file
        .acquisition()
        .unwrap()
        .iter()
        .map(|o| o.name().to_string())
        .collect();
    assert_eq!(names, ["array0", "notes"]);
}

// ============================================================
// Failure recovery
// ============================================================

#[test]
fn electrodes_finalize_retried_before_recording() {
    let io: SharedIo = Arc::new(MemoryIo::new("retry.nwb"));
    io.open(FileMode::Overwrite).unwrap();
    let file = create_typed::<NwbFile>("/", &io);
    file.initialize(&NwbFileSettings::new("retry")).unwrap();

    let table = create_typed::<ElectrodesTable>(ELECTRODES_TABLE_PATH, &io);
    table.initialize("metadata about extracellular electrodes").unwrap();
    table.add_electrodes(&channels()).unwrap();
    // the electrode group does not exist yet
    assert!(table.finalize().is_err());
    assert!(!table.location().exists());

    let device = create_typed::<Device>("/general/devices/array0", &io);
    device.initialize("description", "unknown").unwrap();
    let group = create_typed::<ElectrodeGroup>(&format!("{ELECTRODE_GROUP_PATH}/array0"), &io);
    group.initialize("description", "unknown", &device).unwrap();
    table.add_electrodes(&channels()).unwrap();
    table.finalize().unwrap();

    let series = create_typed::<ElectricalSeries>("/acquisition/array0", &io);
    let config = ArrayDataSetConfig::new(BaseDataType::F32, vec![0, 3], vec![1024, 0]);
    series
        .initialize(config, &channels(), &ElectricalSeriesSettings::new())
        .unwrap();
    io.start_recording().unwrap();
    for channel in 0..3 {
        // no control dataset: control values are dropped
        series
            .write_channel(channel, 2, &[1.0f32, 2.0], Some(&[0.0, 0.1]), Some(&[1, 1]))
            .unwrap();
    }
    assert_eq!(series.data().shape().unwrap(), vec![2, 3]);
    assert!(!series.control().exists());
    assert_eq!(
        table.id().unwrap().data().values_as::<i32>().unwrap().data(),
        &[0, 1, 2]
    );
    io.stop_recording().unwrap();
    assert_eq!(io.record_state(), RecordState::Closed);
}
