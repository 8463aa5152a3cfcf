//! Decoding of a single measurement record.

use serde::Serialize;
use std::fmt;

use crate::binary::{ByteReader, FLOAT64, UINT16, UINT32};
use crate::error::Result;
use crate::sensors::SensorType;

/// Capacity of the label field in bytes (64 UTF-16 code units).
pub const LABEL_FIELD_SIZE: usize = 64 * UINT16;

/// Capacity of the unit field in bytes (32 UTF-16 code units).
pub const UNIT_FIELD_SIZE: usize = 32 * UINT16;

/// Size of one measurement record on the wire.
pub const MEASUREMENT_SIZE: usize =
    UINT32 + LABEL_FIELD_SIZE + UNIT_FIELD_SIZE + FLOAT64 + UINT32 + UINT32;

/// One labelled reading of one sensor instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Category of the reading. Unknown raw values are kept as-is.
    pub sensor_type: SensorType,
    /// Producer label, may be empty.
    pub label: String,
    /// Unit text, may be empty.
    pub unit: String,
    pub value: f64,
    /// Producer-internal data index.
    pub data_index: u32,
    /// Distinguishes instances of the same sensor type (GPU 0 vs GPU 1).
    pub sensor_index: u32,
}

impl Measurement {
    /// Decode one record starting at the reader's position.
    ///
    /// The reader ends exactly [`MEASUREMENT_SIZE`] bytes further on,
    /// regardless of how long the text fields actually are.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self> {
        let sensor_type = SensorType::from_raw(r.u32()?);

        let start = r.pos();
        let label = r.utf16_string()?;
        r.seek(start + LABEL_FIELD_SIZE)?;

        let start = r.pos();
        let unit = r.utf16_string()?;
        r.seek(start + UNIT_FIELD_SIZE)?;

        Ok(Self {
            sensor_type,
            label,
            unit,
            value: r.f64()?,
            data_index: r.u32()?,
            sensor_index: r.u32()?,
        })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:?} {:.6}{}",
            self.sensor_type, self.label, self.value, self.unit
        )
    }
}
