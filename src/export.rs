use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use clap::ValueEnum;
use tracing::debug;

use crate::model::Contract;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// `contracts_<YYYYmmdd_HHMMSS>`, unique enough for one operator.
pub fn default_output_name() -> String {
    format!("contracts_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Writes all `records` to `<dir>/<name>.<ext>` and returns the path.
pub fn export(
    records: &[Contract],
    format: OutputFormat,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    let path = dir.join(format!("{name}.{}", format.extension()));
    let file = File::create(&path)?;

    match format {
        OutputFormat::Json => write_json(records, BufWriter::new(file))?,
        OutputFormat::Csv => write_csv(records, file)?,
    }
    debug!(path = %path.display(), records = records.len(), "export written");
    Ok(path)
}

/// Pretty array of objects; serde_json leaves non-ASCII text as is.
pub fn write_json<W: Write>(records: &[Contract], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Header row with every field name present in any record (first seen first),
/// then one row per record with empty cells for missing fields.
pub fn write_csv<W: Write>(records: &[Contract], writer: W) -> Result<()> {
    let columns = union_columns(records);
    let mut wtr = csv::Writer::from_writer(writer);

    // With no columns at all csv writes each row as `""`, so the row count survives.
    wtr.write_record(&columns)?;
    for record in records {
        wtr.write_record(columns.iter().map(|col| record.get(col).unwrap_or("")))?;
    }
    wtr.flush()?;
    Ok(())
}

fn union_columns(records: &[Contract]) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Vec::with_capacity(Contract::FIELD_NAMES.len());
    for record in records {
        for (name, _) in record.fields() {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }
    columns
}
