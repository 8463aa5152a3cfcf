//! Decoding a realistic full sample.

mod common;

use argus_daq::sample::{HEADER_SIZE, SAMPLE_BUFFER_SIZE};
use argus_daq::{ArgusError, Sample, SensorType};
use common::{desktop_sample, DESKTOP_MEASUREMENTS, GPU_NAME};

#[test]
fn test_desktop_sample() {
    let sample = Sample::decode(&desktop_sample(1234)).unwrap();

    assert!(sample.is_active());
    assert_eq!(sample.version.major, 6);
    assert_eq!(sample.version.minor_a, 0);
    assert_eq!(sample.version.minor_b, 1);
    assert_eq!(sample.version.build, 2507);
    assert_eq!(sample.structure_version, 1);
    assert_eq!(sample.cycle_counter, 1234);
    assert_eq!(sample.total_measurement_count, DESKTOP_MEASUREMENTS as u32);
    assert_eq!(sample.data.len(), DESKTOP_MEASUREMENTS);

    assert_eq!(sample.measurements(SensorType::GpuTemperature).unwrap().len(), 3);
    assert_eq!(sample.measurements(SensorType::GpuName).unwrap()[0].label, GPU_NAME);
    assert!(sample.measurements(SensorType::from_raw(0xFFFF)).unwrap().is_empty());
}

#[test]
fn test_query_is_consistent_with_tables() {
    let sample = Sample::decode(&desktop_sample(1)).unwrap();

    let mut seen = 0;
    for (ty, slice) in sample.measurements_by_type() {
        assert!(slice.iter().all(|m| m.sensor_type == ty), "{ty}");
        seen += slice.len();
    }
    assert_eq!(seen, DESKTOP_MEASUREMENTS);

    // Sum of counts equals the data length.
    let total: u32 = sample.counts.iter().sum();
    assert_eq!(total as usize, sample.data.len());
}

#[test]
fn test_padded_region_decodes_identically() {
    let bytes = desktop_sample(7);
    let mut padded = bytes.clone();
    padded.resize(SAMPLE_BUFFER_SIZE, 0xCC);

    assert_eq!(Sample::decode(&bytes).unwrap(), Sample::decode(&padded).unwrap());
}

#[test]
fn test_truncated_records_fail() {
    let bytes = desktop_sample(7);
    let err = Sample::decode(&bytes[..HEADER_SIZE + 10]).unwrap_err();
    assert!(matches!(err, ArgusError::DecodeTruncation { .. }));
}

#[test]
fn test_gpu_temperature_display() {
    let sample = Sample::decode(&desktop_sample(1)).unwrap();
    let lines: Vec<String> = sample
        .measurements(SensorType::GpuTemperature)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(lines[0], "GPUTemperature.\"GPU\" 54.000000°C");
    assert_eq!(lines[2], "GPUTemperature.\"Hot Spot\" 56.000000°C");
}
