//! Sensor type enumeration and naming table.
//!
//! Argus Monitor tags every measurement with a numeric sensor type and keeps
//! per-type offset/count tables in the sample header. The tables have exactly
//! [`SENSOR_TYPE_COUNT`] entries; any raw value at or beyond that count is
//! preserved as [`SensorType::Unknown`] and never used as a table index.

use serde::{Serialize, Serializer};
use std::fmt;

/// Number of entries in the per-type offset and count tables.
///
/// This is the producer's `Length` sentinel, not a sensor type itself.
pub const SENSOR_TYPE_COUNT: usize = 26;

/// Category of a measurement as published by Argus Monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    /// Unused slot.
    Invalid,
    /// Mainboard sensors, external fan controllers and AIOs.
    Temperature,
    /// User defined synthetic temperature (mean, max, difference, ...).
    SyntheticTemperature,
    /// Fans on mainboard channels, AIOs, external controllers, pump speeds.
    FanSpeedRpm,
    /// Control value of a fan or pump driven by Argus Monitor.
    FanControlValue,
    /// Up/down speeds of monitored network adapters.
    NetworkSpeed,
    /// Per-core temperature (Intel) or package temperature (AMD).
    CpuTemperature,
    /// Additional CPU temperatures such as AMD CCDx.
    CpuTemperatureAdditional,
    /// Per-core multiplier.
    CpuMultiplier,
    /// FSB frequency; core clock = FSB × multiplier.
    CpuFrequencyFsb,
    /// GPU core and hotspot temperatures.
    GpuTemperature,
    /// GPU model name, carried in the label.
    GpuName,
    /// GPU utilization in percent.
    GpuLoad,
    /// GPU core clock.
    GpuCoreClock,
    /// GPU memory clock.
    GpuMemoryClock,
    /// GPU shader clock.
    GpuShaderClock,
    /// GPU fan duty in percent.
    GpuFanSpeedPercent,
    /// GPU fan speed.
    GpuFanSpeedRpm,
    /// Share of GPU memory in use.
    GpuMemoryUsedPercent,
    /// GPU memory in use, in MB.
    GpuMemoryUsedMb,
    /// GPU board power.
    GpuPower,
    /// Drive temperatures (SMART or NVMe).
    DiskTemperature,
    /// Drive read/write throughput.
    DiskTransferRate,
    /// Total and per-core CPU load.
    CpuLoad,
    /// System memory usage.
    RamUsage,
    /// Battery charge level.
    Battery,
    /// Raw value outside the known table.
    Unknown(u32),
}

impl SensorType {
    /// All table-indexable types in raw order.
    pub const ALL: [SensorType; SENSOR_TYPE_COUNT] = [
        Self::Invalid,
        Self::Temperature,
        Self::SyntheticTemperature,
        Self::FanSpeedRpm,
        Self::FanControlValue,
        Self::NetworkSpeed,
        Self::CpuTemperature,
        Self::CpuTemperatureAdditional,
        Self::CpuMultiplier,
        Self::CpuFrequencyFsb,
        Self::GpuTemperature,
        Self::GpuName,
        Self::GpuLoad,
        Self::GpuCoreClock,
        Self::GpuMemoryClock,
        Self::GpuShaderClock,
        Self::GpuFanSpeedPercent,
        Self::GpuFanSpeedRpm,
        Self::GpuMemoryUsedPercent,
        Self::GpuMemoryUsedMb,
        Self::GpuPower,
        Self::DiskTemperature,
        Self::DiskTransferRate,
        Self::CpuLoad,
        Self::RamUsage,
        Self::Battery,
    ];

    /// Convert from the raw wire value. Never fails.
    pub fn from_raw(raw: u32) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(Self::Unknown(raw))
    }

    /// The raw wire value.
    pub fn raw(self) -> u32 {
        match self {
            Self::Unknown(raw) => raw,
            known => Self::ALL
                .iter()
                .position(|t| *t == known)
                .map_or(u32::MAX, |i| i as u32),
        }
    }

    /// Index into the sample's offset/count tables, if this type has one.
    pub fn table_index(self) -> Option<usize> {
        match self {
            Self::Unknown(_) => None,
            known => Some(known.raw() as usize),
        }
    }

    /// True for real sensor categories (neither `Invalid` nor unknown).
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid | Self::Unknown(_))
    }

    /// Name used by Argus Monitor for this type.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::Invalid => "Invalid",
            Self::Temperature => "Temperature",
            Self::SyntheticTemperature => "SyntheticTemperature",
            Self::FanSpeedRpm => "FanSpeedRPM",
            Self::FanControlValue => "FanControlValue",
            Self::NetworkSpeed => "NetworkSpeed",
            Self::CpuTemperature => "CPUTemperature",
            Self::CpuTemperatureAdditional => "CPUTemperatureAdditional",
            Self::CpuMultiplier => "CPUMultiplier",
            Self::CpuFrequencyFsb => "CPUFrequencyFSB",
            Self::GpuTemperature => "GPUTemperature",
            Self::GpuName => "GPUName",
            Self::GpuLoad => "GPULoad",
            Self::GpuCoreClock => "GPUCoreClock",
            Self::GpuMemoryClock => "GPUMemoryClock",
            Self::GpuShaderClock => "GPUShaderClock",
            Self::GpuFanSpeedPercent => "GPUFanSpeedPercent",
            Self::GpuFanSpeedRpm => "GPUFanSpeedRPM",
            Self::GpuMemoryUsedPercent => "GPUMemoryUsedPercent",
            Self::GpuMemoryUsedMb => "GPUMemoryUsedMB",
            Self::GpuPower => "GPUPower",
            Self::DiskTemperature => "DiskTemperature",
            Self::DiskTransferRate => "DiskTransferRate",
            Self::CpuLoad => "CPULoad",
            Self::RamUsage => "RAMUsage",
            Self::Battery => "Battery",
            Self::Unknown(_) => return None,
        };
        Some(name)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "SensorType({})", self.raw()),
        }
    }
}

impl From<u32> for SensorType {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl Serialize for SensorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for (i, ty) in SensorType::ALL.iter().enumerate() {
            assert_eq!(ty.raw(), i as u32);
            assert_eq!(SensorType::from_raw(i as u32), *ty);
            assert_eq!(ty.table_index(), Some(i));
        }
    }

    #[test]
    fn test_unknown_values_preserved() {
        let sentinel = SensorType::from_raw(SENSOR_TYPE_COUNT as u32);
        assert_eq!(sentinel, SensorType::Unknown(26));
        assert_eq!(sentinel.table_index(), None);
        assert!(!sentinel.is_valid());

        let large = SensorType::from_raw(0xFFFF);
        assert_eq!(large.raw(), 0xFFFF);
        assert_eq!(large.to_string(), "SensorType(65535)");
    }

    #[test]
    fn test_validity() {
        assert!(!SensorType::Invalid.is_valid());
        assert!(SensorType::Temperature.is_valid());
        assert!(SensorType::Battery.is_valid());
        assert_eq!(SensorType::Invalid.table_index(), Some(0));
    }

    #[test]
    fn test_names() {
        assert_eq!(SensorType::GpuTemperature.to_string(), "GPUTemperature");
        assert_eq!(SensorType::FanSpeedRpm.to_string(), "FanSpeedRPM");
        assert_eq!(SensorType::RamUsage.to_string(), "RAMUsage");
        assert_eq!(SensorType::from_raw(11), SensorType::GpuName);
    }
}
