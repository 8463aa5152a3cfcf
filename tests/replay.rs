//! Capturing a region to disk and decoding it offline.

mod common;

use argus_daq::mock::MemoryRegion;
use argus_daq::sample::SAMPLE_BUFFER_SIZE;
use argus_daq::{ArgusClient, ArgusError, SensorType, SharedRegion};
use common::{desktop_sample, GPU_NAME};

#[test]
fn test_capture_then_replay() {
    let (region, producer) = MemoryRegion::new();
    producer.publish(&desktop_sample(4242));
    let live = ArgusClient::new(region);
    let expected = live.read().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.bin");
    std::fs::write(&path, live.snapshot().unwrap()).unwrap();
    live.detach().unwrap();

    let replay = ArgusClient::replay(&path).unwrap();
    assert_eq!(replay.region().size(), SAMPLE_BUFFER_SIZE);
    assert_eq!(replay.cycle_counter(), 4242);

    let sample = replay.read().unwrap();
    assert_eq!(sample, expected);
    assert_eq!(sample.measurements(SensorType::GpuName).unwrap()[0].label, GPU_NAME);

    let mut cached = replay.cached();
    let a = cached.read().unwrap();
    let b = cached.read().unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));

    replay.detach().unwrap();
}

#[test]
fn test_replay_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArgusClient::replay(dir.path().join("missing.bin")).unwrap_err();
    assert!(matches!(err, ArgusError::Io { .. }));
}

#[test]
fn test_replay_short_dump_fails_to_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.bin");
    std::fs::write(&path, &desktop_sample(1)[..100]).unwrap();

    let replay = ArgusClient::replay(&path).unwrap();
    let err = replay.read().unwrap_err();
    assert!(matches!(err, ArgusError::DecodeTruncation { .. }));
}
