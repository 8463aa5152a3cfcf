//! In-process stand-in for the Argus Monitor producer.
//!
//! Provides an encoder for the wire format ([`SampleBuilder`],
//! [`encode_measurement`]) and a [`MemoryRegion`] that implements
//! [`SharedRegion`] over a plain byte buffer. Tests publish new samples
//! through a [`MemoryProducer`] handle and can inject lock failures.
//!
//! # Example
//!
//! ```
//! use argus_daq::mock::{MemoryRegion, SampleBuilder};
//! use argus_daq::ArgusClient;
//!
//! let (region, producer) = MemoryRegion::new();
//! producer.publish(&SampleBuilder::new().cycle_counter(3).build());
//!
//! let client = ArgusClient::new(region);
//! assert_eq!(client.cycle_counter(), 3);
//! assert_eq!(client.read().unwrap().cycle_counter, 3);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{ArgusError, Result};
use crate::measurement::{Measurement, LABEL_FIELD_SIZE, UNIT_FIELD_SIZE};
use crate::region::SharedRegion;
use crate::sample::{Version, CYCLE_COUNTER_OFFSET, SAMPLE_BUFFER_SIZE, SIGNATURE_ACTIVE};
use crate::sensors::{SensorType, SENSOR_TYPE_COUNT};

fn put_utf16(buf: &mut Vec<u8>, text: &str, field_size: usize) {
    let start = buf.len();
    // Leave room for the terminator.
    let max_units = field_size / 2 - 1;
    for unit in text.encode_utf16().take(max_units) {
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf.resize(start + field_size, 0);
}

/// Append one 212-byte measurement record to `buf`.
///
/// Text longer than its field is truncated.
pub fn encode_measurement(buf: &mut Vec<u8>, m: &Measurement) {
    buf.extend_from_slice(&m.sensor_type.raw().to_le_bytes());
    put_utf16(buf, &m.label, LABEL_FIELD_SIZE);
    put_utf16(buf, &m.unit, UNIT_FIELD_SIZE);
    buf.extend_from_slice(&m.value.to_le_bytes());
    buf.extend_from_slice(&m.data_index.to_le_bytes());
    buf.extend_from_slice(&m.sensor_index.to_le_bytes());
}

/// Builds the byte image of a sample as the producer would publish it.
///
/// Measurements are stored grouped by sensor type in table order and the
/// offset/count tables are derived from them. [`SampleBuilder::table_entry`]
/// and [`SampleBuilder::total_measurement_count`] override the derived values
/// to construct inconsistent samples.
#[derive(Debug, Clone)]
pub struct SampleBuilder {
    signature: u32,
    version: Version,
    structure_version: u32,
    cycle_counter: u32,
    measurements: Vec<Measurement>,
    table_overrides: Vec<(usize, u32, u32)>,
    total_override: Option<u32>,
}

impl Default for SampleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuilder {
    /// Active signature, structure version 1, no measurements.
    pub fn new() -> Self {
        Self {
            signature: SIGNATURE_ACTIVE,
            version: Version::default(),
            structure_version: 1,
            cycle_counter: 0,
            measurements: Vec::new(),
            table_overrides: Vec::new(),
            total_override: None,
        }
    }

    /// Header signature; anything but the active value marks the producer stopped.
    pub fn signature(mut self, signature: u32) -> Self {
        self.signature = signature;
        self
    }

    /// Producer version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Layout version of the shared structure.
    pub fn structure_version(mut self, structure_version: u32) -> Self {
        self.structure_version = structure_version;
        self
    }

    /// Producer cycle counter.
    pub fn cycle_counter(mut self, cycle_counter: u32) -> Self {
        self.cycle_counter = cycle_counter;
        self
    }

    /// Append one measurement.
    pub fn measurement(mut self, m: Measurement) -> Self {
        self.measurements.push(m);
        self
    }

    /// Append several measurements.
    pub fn measurements(mut self, ms: impl IntoIterator<Item = Measurement>) -> Self {
        self.measurements.extend(ms);
        self
    }

    /// Force the table entry for `sensor_type`. Ignored for unknown types.
    pub fn table_entry(mut self, sensor_type: SensorType, offset: u32, count: u32) -> Self {
        if let Some(index) = sensor_type.table_index() {
            self.table_overrides.push((index, offset, count));
        }
        self
    }

    /// Force the declared measurement count.
    pub fn total_measurement_count(mut self, total: u32) -> Self {
        self.total_override = Some(total);
        self
    }

    /// Header followed by the encoded records; no trailing padding.
    pub fn build(&self) -> Vec<u8> {
        let mut records = self.measurements.clone();
        // Stable, so instances keep their push order within a type.
        records.sort_by_key(|m| m.sensor_type.table_index().unwrap_or(usize::MAX));

        let mut counts = [0u32; SENSOR_TYPE_COUNT];
        for index in records.iter().filter_map(|m| m.sensor_type.table_index()) {
            counts[index] += 1;
        }
        let mut offsets = [0u32; SENSOR_TYPE_COUNT];
        let mut running = 0;
        for (offset, count) in offsets.iter_mut().zip(counts) {
            *offset = running;
            running += count;
        }
        for &(index, offset, count) in &self.table_overrides {
            offsets[index] = offset;
            counts[index] = count;
        }
        let total = self.total_override.unwrap_or(records.len() as u32);

        let mut buf = Vec::new();
        buf.extend_from_slice(&self.signature.to_le_bytes());
        buf.extend_from_slice(&[
            self.version.major,
            self.version.minor_a,
            self.version.minor_b,
            self.version.extra,
        ]);
        buf.extend_from_slice(&self.version.build.to_le_bytes());
        buf.extend_from_slice(&self.structure_version.to_le_bytes());
        buf.extend_from_slice(&self.cycle_counter.to_le_bytes());
        for offset in offsets {
            buf.extend_from_slice(&offset.to_le_bytes());
        }
        for count in counts {
            buf.extend_from_slice(&count.to_le_bytes());
        }
        buf.extend_from_slice(&total.to_le_bytes());
        for m in &records {
            encode_measurement(&mut buf, m);
        }
        buf
    }
}

#[derive(Debug)]
struct MemoryShared {
    bytes: RwLock<Vec<u8>>,
    /// Stands in for the cross-process mutex.
    mutex: Mutex<()>,
    fail_locks: AtomicBool,
    locks: AtomicUsize,
    detached: AtomicBool,
    peek_cycle: Mutex<Option<u32>>,
}

/// [`SharedRegion`] over an in-process buffer of [`SAMPLE_BUFFER_SIZE`] bytes.
#[derive(Debug)]
pub struct MemoryRegion {
    shared: Arc<MemoryShared>,
}

/// Producer side of a [`MemoryRegion`].
#[derive(Debug, Clone)]
pub struct MemoryProducer {
    shared: Arc<MemoryShared>,
}

impl MemoryRegion {
    /// Zero-filled region and its producer handle.
    pub fn new() -> (Self, MemoryProducer) {
        let shared = Arc::new(MemoryShared {
            bytes: RwLock::new(vec![0; SAMPLE_BUFFER_SIZE]),
            mutex: Mutex::new(()),
            fail_locks: AtomicBool::new(false),
            locks: AtomicUsize::new(0),
            detached: AtomicBool::new(false),
            peek_cycle: Mutex::new(None),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryProducer { shared },
        )
    }
}

impl SharedRegion for MemoryRegion {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn size(&self) -> usize {
        self.shared.bytes.read().len()
    }

    fn peek_u32(&self, offset: usize) -> u32 {
        if offset == CYCLE_COUNTER_OFFSET {
            if let Some(cycle) = *self.shared.peek_cycle.lock() {
                return cycle;
            }
        }
        let bytes = self.shared.bytes.read();
        offset
            .checked_add(4)
            .and_then(|end| bytes.get(offset..end))
            .and_then(|b| b.try_into().ok())
            .map_or(0, u32::from_le_bytes)
    }

    fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> T,
    {
        if self.shared.detached.load(Ordering::SeqCst) {
            return Err(ArgusError::sync("wait", "region is detached"));
        }
        if self.shared.fail_locks.load(Ordering::SeqCst) {
            return Err(ArgusError::sync("wait", "injected failure"));
        }
        let _guard = self.shared.mutex.lock();
        self.shared.locks.fetch_add(1, Ordering::SeqCst);
        let bytes = self.shared.bytes.read();
        Ok(f(&bytes[..]))
    }

    fn detach(&mut self) -> Result<()> {
        self.shared.detached.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MemoryProducer {
    /// Overwrite the start of the region with `sample` under the mutex.
    ///
    /// Bytes beyond `sample.len()` keep their previous contents. Input longer
    /// than the region is truncated.
    pub fn publish(&self, sample: &[u8]) {
        let _guard = self.shared.mutex.lock();
        let mut bytes = self.shared.bytes.write();
        let n = sample.len().min(bytes.len());
        bytes[..n].copy_from_slice(&sample[..n]);
    }

    /// Rewrite only the cycle counter field.
    pub fn set_cycle_counter(&self, cycle_counter: u32) {
        let _guard = self.shared.mutex.lock();
        let mut bytes = self.shared.bytes.write();
        bytes[CYCLE_COUNTER_OFFSET..CYCLE_COUNTER_OFFSET + 4]
            .copy_from_slice(&cycle_counter.to_le_bytes());
    }

    /// Make the unlocked cycle counter peek report `cycle` regardless of the
    /// buffer, as a torn read would. `None` restores normal peeks.
    pub fn set_peek_cycle_counter(&self, cycle: Option<u32>) {
        *self.shared.peek_cycle.lock() = cycle;
    }

    /// Make every subsequent lock attempt fail with [`ArgusError::Sync`].
    pub fn set_fail_locks(&self, fail: bool) {
        self.shared.fail_locks.store(fail, Ordering::SeqCst);
    }

    /// Number of successful lock acquisitions so far.
    pub fn lock_count(&self) -> usize {
        self.shared.locks.load(Ordering::SeqCst)
    }

    /// True once the consumer side has detached.
    pub fn is_detached(&self) -> bool {
        self.shared.detached.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{Sample, HEADER_SIZE};

    #[test]
    fn test_builder_groups_by_type() {
        let m = |ty, label: &str| Measurement {
            sensor_type: ty,
            label: label.to_string(),
            unit: String::new(),
            value: 0.0,
            data_index: 0,
            sensor_index: 0,
        };
        let buf = SampleBuilder::new()
            .measurement(m(SensorType::CpuLoad, "load"))
            .measurement(m(SensorType::Temperature, "t0"))
            .measurement(m(SensorType::Temperature, "t1"))
            .build();
        let sample = Sample::decode(&buf).unwrap();

        let labels: Vec<_> = sample.data.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["t0", "t1", "load"]);
        assert_eq!(sample.measurements(SensorType::CpuLoad).unwrap()[0].label, "load");
    }

    #[test]
    fn test_long_text_keeps_terminator() {
        let long = "x".repeat(200);
        let mut buf = Vec::new();
        encode_measurement(
            &mut buf,
            &Measurement {
                sensor_type: SensorType::Temperature,
                label: long,
                unit: String::new(),
                value: 1.0,
                data_index: 0,
                sensor_index: 0,
            },
        );
        let decoded = Measurement::decode(&mut crate::binary::ByteReader::new(&buf)).unwrap();
        assert_eq!(decoded.label.len(), LABEL_FIELD_SIZE / 2 - 1);
        assert_eq!(decoded.value, 1.0);
    }

    #[test]
    fn test_memory_region_lock_accounting() {
        let (mut region, producer) = MemoryRegion::new();
        producer.publish(&SampleBuilder::new().cycle_counter(9).build());
        assert_eq!(region.peek_u32(CYCLE_COUNTER_OFFSET), 9);
        assert_eq!(producer.lock_count(), 0);

        let len = region.with_lock(|b| b.len()).unwrap();
        assert_eq!(len, SAMPLE_BUFFER_SIZE);
        assert!(len > HEADER_SIZE);
        assert_eq!(producer.lock_count(), 1);

        producer.set_fail_locks(true);
        assert!(region.with_lock(|_| ()).unwrap_err().is_sync());
        assert_eq!(producer.lock_count(), 1);

        region.detach().unwrap();
        assert!(producer.is_detached());
    }

    #[test]
    fn test_peek_cycle_counter_override() {
        let (region, producer) = MemoryRegion::new();
        producer.publish(&SampleBuilder::new().cycle_counter(3).build());

        producer.set_peek_cycle_counter(Some(7));
        assert_eq!(region.peek_u32(CYCLE_COUNTER_OFFSET), 7);
        let locked = region.with_lock(|b| u32::from_le_bytes(b[16..20].try_into().unwrap()));
        assert_eq!(locked.unwrap(), 3);

        producer.set_peek_cycle_counter(None);
        assert_eq!(region.peek_u32(CYCLE_COUNTER_OFFSET), 3);
    }
}
