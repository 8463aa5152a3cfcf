//! Shared fixture: a desktop system as Argus Monitor reports it.

#![allow(dead_code)]

use argus_daq::mock::SampleBuilder;
use argus_daq::{Measurement, SensorType, Version};

/// Number of measurements in [`desktop_sample`].
pub const DESKTOP_MEASUREMENTS: usize = 74;

pub const GPU_NAME: &str = "NVIDIA NVIDIA GeForce RTX 3090";

fn push(
    out: &mut Vec<Measurement>,
    sensor_type: SensorType,
    labels: &[&str],
    unit: &str,
    base: f64,
) {
    for (i, label) in labels.iter().enumerate() {
        out.push(Measurement {
            sensor_type,
            label: label.to_string(),
            unit: unit.to_string(),
            value: base + i as f64,
            data_index: out.len() as u32,
            sensor_index: i as u32,
        });
    }
}

fn numbered(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix} {i}")).collect()
}

/// Measurements of the fixture system, in no particular order.
pub fn desktop_measurements() -> Vec<Measurement> {
    let cores = numbered("Core", 8);
    let cores: Vec<&str> = cores.iter().map(String::as_str).collect();
    let fans = numbered("Fan", 8);
    let fans: Vec<&str> = fans.iter().map(String::as_str).collect();
    let disks = numbered("Disk", 3);
    let disks: Vec<&str> = disks.iter().map(String::as_str).collect();

    let mut m = Vec::new();
    push(&mut m, SensorType::Temperature, &["Mainboard", "CPU Socket", "PCH", "VRM", "System 1", "System 2", "AIO Liquid"], "°C", 30.0);
    push(&mut m, SensorType::SyntheticTemperature, &["Max CPU/GPU"], "°C", 60.0);
    push(&mut m, SensorType::FanSpeedRpm, &fans, "RPM", 800.0);
    push(&mut m, SensorType::FanControlValue, &fans, "%", 40.0);
    push(&mut m, SensorType::NetworkSpeed, &["Ethernet Down", "Ethernet Up"], "KB/s", 12.0);
    push(&mut m, SensorType::CpuTemperature, &["CPU"], "°C", 55.0);
    push(&mut m, SensorType::CpuTemperatureAdditional, &["CCD1", "CCD2"], "°C", 50.0);
    push(&mut m, SensorType::CpuMultiplier, &cores, "x", 36.0);
    push(&mut m, SensorType::CpuFrequencyFsb, &["FSB"], "MHz", 100.0);
    push(&mut m, SensorType::GpuTemperature, &["GPU", "Memory Junction", "Hot Spot"], "°C", 54.0);
    push(&mut m, SensorType::GpuName, &[GPU_NAME], "", 0.0);
    push(&mut m, SensorType::GpuLoad, &["Core", "Memory Controller", "Video Engine", "Bus Interface"], "%", 5.0);
    push(&mut m, SensorType::GpuCoreClock, &["Core"], "MHz", 1395.0);
    push(&mut m, SensorType::GpuMemoryClock, &["Memory"], "MHz", 9751.0);
    push(&mut m, SensorType::GpuFanSpeedPercent, &["Fan 1", "Fan 2"], "%", 30.0);
    push(&mut m, SensorType::GpuFanSpeedRpm, &["Fan 1", "Fan 2"], "RPM", 1100.0);
    push(&mut m, SensorType::GpuMemoryUsedPercent, &["Memory"], "%", 12.0);
    push(&mut m, SensorType::GpuMemoryUsedMb, &["Memory"], "MB", 2900.0);
    push(&mut m, SensorType::GpuPower, &["Board"], "W", 110.0);
    push(&mut m, SensorType::DiskTemperature, &disks, "°C", 38.0);
    push(&mut m, SensorType::DiskTransferRate, &["Disk 0 Read", "Disk 0 Write", "Disk 1 Read", "Disk 1 Write", "Disk 2 Read", "Disk 2 Write"], "MB/s", 0.0);
    push(&mut m, SensorType::CpuLoad, &["Total", "Core 0", "Core 1", "Core 2", "Core 3", "Core 4", "Core 5", "Core 6", "Core 7"], "%", 3.0);
    push(&mut m, SensorType::RamUsage, &["RAM"], "%", 41.0);
    m
}

pub fn desktop_builder(cycle_counter: u32) -> SampleBuilder {
    SampleBuilder::new()
        .version(Version {
            major: 6,
            minor_a: 0,
            minor_b: 1,
            extra: 0,
            build: 2507,
        })
        .structure_version(1)
        .cycle_counter(cycle_counter)
        .measurements(desktop_measurements())
}

/// Encoded byte image of the fixture system at `cycle_counter`.
pub fn desktop_sample(cycle_counter: u32) -> Vec<u8> {
    desktop_builder(cycle_counter).build()
}
