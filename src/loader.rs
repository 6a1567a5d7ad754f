//! Schema-validated ingestion.
//!
//! Every file of a layout is parsed on its own into raw rows, coerced column
//! by column against the layout's [`Schema`], and split into valid rows and
//! quarantined rows. Valid rows of all files are concatenated into one
//! [`Dataset`]. Failures never abort the load; they are pushed to the
//! [`Diagnostics`] collector:
//!
//! - a file that cannot be read or parsed is skipped ([`Issue::UnreadableFile`])
//! - a schema column absent from a file is synthesized as all-missing
//!   ([`Issue::MissingColumn`])
//! - rows with any missing value after coercion are dropped and reported in
//!   full ([`Issue::QuarantinedRows`])
//! - a layout with no valid rows at all yields an empty dataset
//!   ([`Issue::EmptyDataset`])

use std::path::Path;

use anyhow::Result;
use log::{debug, info};

use crate::{
    data::{RawCell, Value, coerce_cell},
    diagnostics::{Diagnostics, Issue, QuarantinedRow},
    io_utils,
    records::{Claim, Dataset, FileSummary, LayoutRecord, Pharmacy, Revert, SourceData},
    schema::{FileFormat, Layout, Schema, SchemaRegistry},
};

/// Raw rows of one file, already aligned to the schema's column order.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<RawCell>>,
    pub missing_columns: Vec<String>,
}

/// Outcome of validating one file.
#[derive(Debug, Clone, Default)]
pub struct ValidatedFile {
    /// File row index paired with the coerced values.
    pub valid: Vec<(usize, Vec<Value>)>,
    pub quarantined: Vec<QuarantinedRow>,
}

/// Loads every `format` file under `source_dir` as layout `R::LAYOUT`.
pub fn load<R: LayoutRecord>(
    registry: &SchemaRegistry,
    format: FileFormat,
    source_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Dataset<R> {
    let layout = R::LAYOUT;
    let schema = registry.schema(layout);
    let files = match source_dir
        .is_dir()
        .then(|| io_utils::discover_files(source_dir, format.extension()))
    {
        Some(Ok(files)) => files,
        Some(Err(err)) => {
            diagnostics.push(Issue::UnreadableFile {
                path: source_dir.to_path_buf(),
                reason: format!("{err:#}"),
            });
            Vec::new()
        }
        None => Vec::new(),
    };
    if files.is_empty() {
        diagnostics.push(Issue::NoSourceFiles {
            layout,
            format: format.to_string(),
            dir: source_dir.to_path_buf(),
        });
    }

    let mut records = Vec::new();
    let mut summaries = Vec::with_capacity(files.len());
    for path in &files {
        info!("Reading file: {}", path.display());
        let table = match read_raw_table(path, format, schema) {
            Ok(table) => table,
            Err(err) => {
                diagnostics.push(Issue::UnreadableFile {
                    path: path.clone(),
                    reason: format!("{err:#}"),
                });
                continue;
            }
        };
        for column in &table.missing_columns {
            diagnostics.push(Issue::MissingColumn {
                path: path.clone(),
                column: column.clone(),
            });
        }

        let rows_read = table.rows.len();
        let validated = validate_rows(schema, &table.rows);
        let mut valid_rows = 0usize;
        let mut quarantined = validated.quarantined;
        for (index, values) in validated.valid {
            match R::from_values(schema, &values) {
                Some(record) => {
                    records.push(record);
                    valid_rows += 1;
                }
                None => quarantined.push(QuarantinedRow {
                    index,
                    fields: schema
                        .headers()
                        .into_iter()
                        .zip(values.iter().map(Value::as_display))
                        .collect(),
                    invalid_columns: Vec::new(),
                }),
            }
        }
        if !quarantined.is_empty() {
            quarantined.sort_by_key(|row| row.index);
            diagnostics.push(Issue::QuarantinedRows {
                path: path.clone(),
                rows: quarantined,
            });
        }
        info!(
            "File {}: {} valid row(s) out of {}",
            path.display(),
            valid_rows,
            rows_read
        );
        summaries.push(FileSummary {
            path: path.clone(),
            rows_read,
            valid_rows,
        });
    }

    if records.is_empty() {
        diagnostics.push(Issue::EmptyDataset { layout });
    } else {
        info!("Data for {layout} loaded and validated: {} row(s)", records.len());
    }
    Dataset::new(records, summaries)
}

/// Loads the three fixed layouts from their subdirectories of `source_root`.
pub fn load_all(
    registry: &SchemaRegistry,
    source_root: &Path,
    diagnostics: &mut Diagnostics,
) -> SourceData {
    SourceData {
        pharmacies: load_layout::<Pharmacy>(registry, source_root, diagnostics),
        claims: load_layout::<Claim>(registry, source_root, diagnostics),
        reverts: load_layout::<Revert>(registry, source_root, diagnostics),
    }
}

fn load_layout<R: LayoutRecord>(
    registry: &SchemaRegistry,
    source_root: &Path,
    diagnostics: &mut Diagnostics,
) -> Dataset<R> {
    let layout: Layout = R::LAYOUT;
    load::<R>(
        registry,
        layout.default_format(),
        &source_root.join(layout.dir_name()),
        diagnostics,
    )
}

/// Parses one file and projects it onto the schema's columns.
pub fn read_raw_table(path: &Path, format: FileFormat, schema: &Schema) -> Result<RawTable> {
    match format {
        FileFormat::Csv => {
            let contents = io_utils::read_csv_file(path)?;
            let positions = schema
                .columns
                .iter()
                .map(|c| contents.headers.iter().position(|h| *h == c.name))
                .collect::<Vec<_>>();
            let rows = contents
                .rows
                .into_iter()
                .map(|row| {
                    positions
                        .iter()
                        .map(|pos| match pos.and_then(|idx| row.get(idx)) {
                            Some(text) => RawCell::Text(text.clone()),
                            None => RawCell::Absent,
                        })
                        .collect()
                })
                .collect();
            Ok(RawTable {
                rows,
                missing_columns: missing_columns(schema, &positions),
            })
        }
        FileFormat::Json => {
            let objects = io_utils::read_json_records(path)?;
            let positions = schema
                .columns
                .iter()
                .map(|c| objects.iter().any(|obj| obj.contains_key(&c.name)).then_some(()))
                .collect::<Vec<_>>();
            let rows = objects
                .into_iter()
                .map(|mut obj| {
                    schema
                        .columns
                        .iter()
                        .map(|c| match obj.remove(&c.name) {
                            Some(value) => RawCell::Json(value),
                            None => RawCell::Absent,
                        })
                        .collect()
                })
                .collect();
            Ok(RawTable {
                rows,
                missing_columns: missing_columns(schema, &positions),
            })
        }
    }
}

fn missing_columns<T>(schema: &Schema, positions: &[Option<T>]) -> Vec<String> {
    schema
        .columns
        .iter()
        .zip(positions)
        .filter(|(_, pos)| pos.is_none())
        .map(|(column, _)| column.name.clone())
        .collect()
}

/// Coerces each row and separates fully valid rows from quarantined ones.
/// Row order is preserved in both outputs.
pub fn validate_rows(schema: &Schema, rows: &[Vec<RawCell>]) -> ValidatedFile {
    let mut validated = ValidatedFile::default();
    for (index, row) in rows.iter().enumerate() {
        let coerced = schema
            .columns
            .iter()
            .enumerate()
            .map(|(col_idx, column)| {
                let cell = row.get(col_idx).unwrap_or(&RawCell::Absent);
                (cell, coerce_cell(cell, column))
            })
            .collect::<Vec<_>>();

        if coerced.iter().all(|(_, value)| value.is_some()) {
            validated.valid.push((
                index,
                coerced.into_iter().filter_map(|(_, value)| value).collect(),
            ));
            continue;
        }

        let invalid_columns = schema
            .columns
            .iter()
            .zip(&coerced)
            .filter(|(_, (_, value))| value.is_none())
            .map(|(column, _)| column.name.clone())
            .collect::<Vec<_>>();
        debug!("Row {index} failed columns {invalid_columns:?}");
        validated.quarantined.push(QuarantinedRow {
            index,
            fields: schema
                .columns
                .iter()
                .zip(&coerced)
                .map(|(column, (cell, _))| (column.name.clone(), cell.render()))
                .collect(),
            invalid_columns,
        });
    }
    validated
}
