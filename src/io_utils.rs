//! I/O utilities for source discovery, CSV/JSON reading, and report writing.
//!
//! All file I/O in hippo flows through this module. It provides:
//!
//! - **Discovery**: non-recursive listing of a layout directory filtered by
//!   extension, sorted for deterministic runs.
//! - **CSV**: reader construction and UTF-8 decoding of byte records via
//!   `encoding_rs`.
//! - **JSON**: array-of-objects parsing into raw rows.
//! - **Reports**: pretty JSON output with 4-space indentation.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, ser::PrettyFormatter};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
const REPORT_INDENT: &[u8] = b"    ";

/// Lists the files directly under `dir` whose extension matches `extension`.
pub fn discover_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Listing directory {dir:?}"))? {
        let path = entry
            .with_context(|| format!("Reading entry in {dir:?}"))?
            .path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> Result<csv::Reader<BufReader<File>>> {
    let reader =
        BufReader::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?);
    Ok(open_csv_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Parsed CSV contents: headers and decoded rows, in file order.
#[derive(Debug, Clone, Default)]
pub struct CsvContents {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Reads a whole CSV file. A file without a header record, or a row with more
/// fields than the header, is an error.
pub fn read_csv_file(path: &Path) -> Result<CsvContents> {
    let mut reader = open_csv_reader_from_path(path, DEFAULT_CSV_DELIMITER)?;
    let headers = reader_headers(&mut reader, UTF_8)
        .with_context(|| format!("Reading headers of {path:?}"))?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();
    if headers.is_empty() {
        bail!("No columns to parse from file {path:?}");
    }
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        if record.len() > headers.len() {
            bail!(
                "Row {} has {} field(s) but the header declares {}",
                row_idx + 2,
                record.len(),
                headers.len()
            );
        }
        let decoded = decode_record(&record, UTF_8)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded);
    }
    Ok(CsvContents { headers, rows })
}

/// Reads a JSON file holding a top-level array of objects.
pub fn read_json_records(path: &Path) -> Result<Vec<Map<String, JsonValue>>> {
    let reader =
        BufReader::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?);
    let parsed: JsonValue =
        serde_json::from_reader(reader).with_context(|| format!("Parsing JSON in {path:?}"))?;
    let JsonValue::Array(items) = parsed else {
        bail!("Expected a top-level JSON array of objects in {path:?}");
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            JsonValue::Object(map) => Ok(map),
            other => Err(anyhow!(
                "Element {idx} in {path:?} is not an object (found {})",
                json_kind(&other)
            )),
        })
        .collect()
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

pub fn to_json_pretty<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(REPORT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .context("Serializing report")?;
    Ok(buffer)
}

/// Writes `records` as a JSON array with 4-space indentation.
pub fn write_json<T>(path: &Path, records: &[T]) -> Result<()>
where
    T: Serialize,
{
    let bytes = to_json_pretty(records)?;
    let mut writer = BufWriter::new(
        File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
    );
    writer
        .write_all(&bytes)
        .with_context(|| format!("Writing report to {path:?}"))?;
    writer
        .flush()
        .with_context(|| format!("Flushing report to {path:?}"))?;
    Ok(())
}
