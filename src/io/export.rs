//! CSV export for replay step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "timestep,time,price,temperature,usage_before,usage_after_shedding,\
                      consumed,devices_on,devices_total,energy_saving_mode,\
                      temperature_regulation_active,night_mode";

/// Exports replay records to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes replay records as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestep.to_string(),
            r.time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            format!("{:.4}", r.price),
            format!("{:.2}", r.temperature),
            format!("{:.2}", r.usage_before),
            format!("{:.2}", r.usage_after_shedding),
            format!("{:.2}", r.consumed),
            r.devices_on().to_string(),
            r.device_status.len().to_string(),
            r.energy_saving_mode.to_string(),
            r.temperature_regulation_active.to_string(),
            r.night_mode.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::policy::DecisionTable;

    fn make_step(t: usize) -> StepRecord {
        let mut table = DecisionTable::default();
        table.set("Luzes", t % 2 == 0);
        table.set("Heating", false);
        table.set("Cooling", false);
        StepRecord {
            timestep: t,
            time: NaiveDate::from_ymd_opt(2024, 10, 1)
                .and_then(|d| d.and_hms_opt((t % 24) as u32, 0, 0))
                .unwrap_or_default(),
            price: 0.18,
            temperature: 21.0,
            usage_before: t as f64,
            usage_after_shedding: t as f64,
            consumed: 0.5,
            energy_saving_mode: false,
            temperature_regulation_active: false,
            night_mode: t < 6,
            device_status: table,
        }
    }

    #[test]
    fn header_lists_all_columns() {
        let mut buf = Vec::new();
        write_csv(&[make_step(0)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "timestep,time,price,temperature,usage_before,usage_after_shedding,\
             consumed,devices_on,devices_total,energy_saving_mode,\
             temperature_regulation_active,night_mode"
        );
    }

    #[test]
    fn row_count_matches_step_count() {
        let records: Vec<StepRecord> = (0..24).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn rows_are_parseable() {
        let records: Vec<StepRecord> = (0..3).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(12));

        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get(1), Some("2024-10-01T00:00:00"));
        assert_eq!(rows[0].get(7), Some("1"));
        assert_eq!(rows[1].get(7), Some("0"));
        assert_eq!(rows[2].get(11), Some("true"));
    }
}
