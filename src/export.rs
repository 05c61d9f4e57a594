//! Tabular exports of the filtered records and the institution view.
//!
//! CSV files carry a header row and round-trip through `read_*_csv`.
//! Parquet files hold the same columns for columnar tooling.

use crate::aggregate::InstitutionStats;
use crate::corpus::PublicationRecord;
use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array,
    UInt8Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const PARQUET_BATCH_SIZE: usize = 100_000;

// Macro for creating Arrow schema fields
macro_rules! field {
    ($name:expr, $data_type:expr) => {
        Field::new($name, $data_type, true)
    };
    ($name:expr, $data_type:expr, $nullable:expr) => {
        Field::new($name, $data_type, $nullable)
    };
}

// Macro for creating schemas with less boilerplate
macro_rules! schema {
    ($($name:expr => $data_type:expr $(, $nullable:expr)?);* $(;)?) => {
        Schema::new(vec![
            $(field!($name, $data_type $(, $nullable)?),)*
        ])
    };
}

macro_rules! string_array {
    ($records:expr, $field:ident) => {{
        let array: ArrayRef = Arc::new(StringArray::from_iter_values(
            $records.iter().map(|r| &r.$field),
        ));
        array
    }};
}

macro_rules! primitive_array {
    ($array_type:ty, $records:expr, $field:ident) => {{
        let array: ArrayRef = Arc::new(<$array_type>::from_iter_values(
            $records.iter().map(|r| r.$field),
        ));
        array
    }};
}

macro_rules! bool_array {
    ($records:expr, $field:ident) => {{
        let array: ArrayRef = Arc::new(BooleanArray::from_iter(
            $records.iter().map(|r| Some(r.$field)),
        ));
        array
    }};
}

macro_rules! record_batch {
    ($schema:expr, $($array:expr),* $(,)?) => {
        RecordBatch::try_new(Arc::new($schema), vec![$($array,)*])
    };
}

// ====== CSV ======

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        // header is line 1
        rows.push(row.with_context(|| format!("{}:{}", path.display(), idx + 2))?);
    }
    Ok(rows)
}

pub fn write_records_csv(path: &Path, records: &[PublicationRecord]) -> Result<()> {
    write_csv(path, records)
}

pub fn read_records_csv(path: &Path) -> Result<Vec<PublicationRecord>> {
    read_csv(path)
}

pub fn write_institutions_csv(path: &Path, stats: &[InstitutionStats]) -> Result<()> {
    write_csv(path, stats)
}

pub fn read_institutions_csv(path: &Path) -> Result<Vec<InstitutionStats>> {
    read_csv(path)
}

// ====== PARQUET ======

fn create_parquet_writer(output_path: &Path, schema: Schema) -> Result<ArrowWriter<File>> {
    let file = File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .set_max_row_group_size(1_000_000)
        .build();

    let writer = ArrowWriter::try_new(file, Arc::new(schema), Some(props))?;
    Ok(writer)
}

fn records_schema() -> Schema {
    schema! {
        "id" => DataType::Utf8, false;
        "title" => DataType::Utf8, false;
        "institution" => DataType::Utf8, false;
        "country" => DataType::Utf8, false;
        "topic" => DataType::Utf8, false;
        "year" => DataType::Int32, false;
        "month" => DataType::UInt8, false;
        "citations" => DataType::UInt64, false;
        "author_count" => DataType::UInt32, false;
        "venue" => DataType::Utf8, false;
        "open_access" => DataType::Boolean, false;
        "impact_weight" => DataType::Float64, false;
    }
}

fn institutions_schema() -> Schema {
    schema! {
        "institution" => DataType::Utf8, false;
        "total_citations" => DataType::UInt64, false;
        "avg_citations" => DataType::Float64, false;
        "paper_count" => DataType::UInt64, false;
        "impact_sum" => DataType::Float64, false;
    }
}

fn records_to_record_batch(records: &[PublicationRecord]) -> Result<RecordBatch> {
    let batch = record_batch!(
        records_schema(),
        string_array!(records, id),
        string_array!(records, title),
        string_array!(records, institution),
        string_array!(records, country),
        string_array!(records, topic),
        primitive_array!(Int32Array, records, year),
        primitive_array!(UInt8Array, records, month),
        primitive_array!(UInt64Array, records, citations),
        primitive_array!(UInt32Array, records, author_count),
        string_array!(records, venue),
        bool_array!(records, open_access),
        primitive_array!(Float64Array, records, impact_weight),
    )?;
    Ok(batch)
}

fn institutions_to_record_batch(stats: &[InstitutionStats]) -> Result<RecordBatch> {
    let paper_counts: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        stats.iter().map(|s| s.paper_count as u64),
    ));
    let batch = record_batch!(
        institutions_schema(),
        string_array!(stats, institution),
        primitive_array!(UInt64Array, stats, total_citations),
        primitive_array!(Float64Array, stats, avg_citations),
        paper_counts,
        primitive_array!(Float64Array, stats, impact_sum),
    )?;
    Ok(batch)
}

fn write_parquet<T>(
    path: &Path,
    schema: Schema,
    rows: &[T],
    to_record_batch: fn(&[T]) -> Result<RecordBatch>,
) -> Result<()> {
    let mut writer = create_parquet_writer(path, schema)?;
    for chunk in rows.chunks(PARQUET_BATCH_SIZE) {
        let batch = to_record_batch(chunk)?;
        writer.write(&batch)?;
    }
    writer.close()?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_records_parquet(path: &Path, records: &[PublicationRecord]) -> Result<()> {
    write_parquet(path, records_schema(), records, records_to_record_batch)
}

pub fn write_institutions_parquet(path: &Path, stats: &[InstitutionStats]) -> Result<()> {
    write_parquet(path, institutions_schema(), stats, institutions_to_record_batch)
}
