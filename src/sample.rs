//! Decoding of a full Argus Monitor sample.
//!
//! A sample is a packed header followed by a fixed-capacity array of
//! measurement records:
//!
//! | Field                   | Width                    |
//! |-------------------------|--------------------------|
//! | signature               | 4                        |
//! | version (4×u8 + build)  | 8                        |
//! | structure version       | 4                        |
//! | cycle counter           | 4                        |
//! | offset table            | 4 × [`SENSOR_TYPE_COUNT`] |
//! | count table             | 4 × [`SENSOR_TYPE_COUNT`] |
//! | total measurement count | 4                        |
//! | measurement records     | 212 × [`SENSOR_DATA_CAPACITY`] |

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::binary::{ByteReader, UINT32, UINT8};
use crate::error::{ArgusError, Result};
use crate::measurement::{Measurement, MEASUREMENT_SIZE};
use crate::sensors::{SensorType, SENSOR_TYPE_COUNT};

/// Hard ceiling on decoded measurement records per sample.
pub const SENSOR_DATA_CAPACITY: usize = 512;

const VERSION_SIZE: usize = UINT8 * 4 + UINT32;

/// Byte offset of the cycle counter from the start of the region.
pub const CYCLE_COUNTER_OFFSET: usize = UINT32 + VERSION_SIZE + UINT32;

/// Size of everything before the first measurement record.
pub const HEADER_SIZE: usize =
    CYCLE_COUNTER_OFFSET + UINT32 + 2 * UINT32 * SENSOR_TYPE_COUNT + UINT32;

/// Size of a complete sample buffer at full capacity.
pub const SAMPLE_BUFFER_SIZE: usize = HEADER_SIZE + SENSOR_DATA_CAPACITY * MEASUREMENT_SIZE;

/// Signature written by Argus Monitor while it is running.
pub const SIGNATURE_ACTIVE: u32 = 0x4D67_7241;

/// Signature of an inactive interface.
pub const SIGNATURE_INACTIVE: u32 = 0x0000_0000;

/// Argus Monitor version that produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Version {
    /// Major version.
    pub major: u8,
    /// First minor component.
    pub minor_a: u8,
    /// Second minor component.
    pub minor_b: u8,
    /// Fourth component.
    pub extra: u8,
    /// Build number.
    pub build: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}",
            self.major, self.minor_a, self.minor_b, self.extra, self.build
        )
    }
}

/// Immutable snapshot of all measurements at one producer cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// [`SIGNATURE_ACTIVE`], [`SIGNATURE_INACTIVE`], or anything the producer wrote.
    pub signature: u32,
    pub version: Version,
    /// Layout revision of the shared structure.
    pub structure_version: u32,
    /// Incremented by the producer on every update; wraps at `u32::MAX`.
    pub cycle_counter: u32,
    /// Start index into [`Sample::data`] per sensor type.
    pub offsets: [u32; SENSOR_TYPE_COUNT],
    /// Number of entries per sensor type.
    pub counts: [u32; SENSOR_TYPE_COUNT],
    /// Declared number of measurements; may exceed `data.len()`.
    pub total_measurement_count: u32,
    /// Decoded measurements in producer storage order.
    pub data: Vec<Measurement>,
}

impl Sample {
    /// Decode a sample with the default record capacity.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Self::decode_with_capacity(buf, SENSOR_DATA_CAPACITY)
    }

    /// Decode a sample, reading at most `capacity` measurement records.
    ///
    /// Records declared beyond `capacity` are dropped silently.
    pub fn decode_with_capacity(buf: &[u8], capacity: usize) -> Result<Self> {
        let mut r = ByteReader::new(buf);

        let signature = r.u32()?;
        let version = Version {
            major: r.u8()?,
            minor_a: r.u8()?,
            minor_b: r.u8()?,
            extra: r.u8()?,
            build: r.u32()?,
        };
        let structure_version = r.u32()?;
        let cycle_counter = r.u32()?;

        let mut offsets = [0u32; SENSOR_TYPE_COUNT];
        for offset in offsets.iter_mut() {
            *offset = r.u32()?;
        }
        let mut counts = [0u32; SENSOR_TYPE_COUNT];
        for count in counts.iter_mut() {
            *count = r.u32()?;
        }

        let total_measurement_count = r.u32()?;

        let n = capacity.min(total_measurement_count as usize);
        let mut data = Vec::with_capacity(n);
        for _ in 0..n {
            data.push(Measurement::decode(&mut r)?);
        }

        Ok(Self {
            signature,
            version,
            structure_version,
            cycle_counter,
            offsets,
            counts,
            total_measurement_count,
            data,
        })
    }

    /// True if the producer marked the interface as active.
    pub fn is_active(&self) -> bool {
        self.signature == SIGNATURE_ACTIVE
    }

    /// Measurements belonging to `sensor_type`, borrowed from [`Sample::data`].
    ///
    /// Types without a table entry yield an empty slice. Offset/count pairs
    /// that point past the decoded data are reported as
    /// [`ArgusError::IndexOutOfRange`] rather than clamped.
    pub fn measurements(&self, sensor_type: SensorType) -> Result<&[Measurement]> {
        let Some(index) = sensor_type.table_index() else {
            return Ok(&[]);
        };

        let offset = self.offsets[index];
        let count = self.counts[index];
        let out_of_range = || ArgusError::IndexOutOfRange {
            sensor_type: sensor_type.to_string(),
            offset,
            count,
            len: self.data.len(),
        };

        let start = offset as usize;
        let end = start.checked_add(count as usize).ok_or_else(out_of_range)?;
        self.data.get(start..end).ok_or_else(out_of_range)
    }

    /// Iterate over every valid sensor type that has measurements.
    ///
    /// Types with inconsistent table entries are skipped with a warning.
    pub fn measurements_by_type(&self) -> impl Iterator<Item = (SensorType, &[Measurement])> {
        SensorType::ALL
            .into_iter()
            .filter(|ty| ty.is_valid())
            .filter_map(move |ty| match self.measurements(ty) {
                Ok([]) => None,
                Ok(slice) => Some((ty, slice)),
                Err(e) => {
                    warn!(error = %e, "Skipping inconsistent sensor table entry");
                    None
                }
            })
    }
}
