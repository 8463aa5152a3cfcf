//! InfluxDB line protocol output.
//!
//! One line per measurement:
//!
//! ```text
//! GPUTemperature,label=GPU\ Core,sensor=0 value=54.000000 1700000000000000000
//! ```

use std::io::{self, Write};

use argus_daq::{Measurement, Sample};

/// Backslash-escape commas, spaces and equals signs.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Write one measurement line.
pub fn write_measurement<W: Write>(out: &mut W, m: &Measurement, timestamp_ns: i64) -> io::Result<()> {
    writeln!(
        out,
        "{},label={},sensor={} value={:.6} {}",
        escape(&m.sensor_type.to_string()),
        escape(&m.label),
        m.sensor_index,
        m.value,
        timestamp_ns
    )
}

/// Write every decoded measurement of `sample`, all stamped with `timestamp_ns`.
///
/// Returns the number of lines written.
pub fn write_sample<W: Write>(out: &mut W, sample: &Sample, timestamp_ns: i64) -> io::Result<usize> {
    for m in &sample.data {
        write_measurement(out, m, timestamp_ns)?;
    }
    Ok(sample.data.len())
}
