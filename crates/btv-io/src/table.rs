//! Parquet output of the per-jet table.
//!
//! # Schema: `fastbtv_tree_v1`
//!
//! | Column      | Arrow Type | Description                             |
//! |-------------|------------|-----------------------------------------|
//! | `run`       | `UInt32`   | Run number                              |
//! | `lumi`      | `UInt32`   | Luminosity block                        |
//! | `evt`       | `UInt64`   | Event number                            |
//! | `flavour`   | `Int32`    | `abs(hadronFlavour)`                    |
//! | `jet_pt`    | `Float32`  |                                         |
//! | `jet_eta`   | `Float32`  |                                         |
//! | `jet_phi`   | `Float32`  |                                         |
//! | `pu`        | `Int32`    | In-time true interactions (truncated)   |
//! | `<group>`   | `Float32`  | One per sum group, lexicographic order  |
//!
//! Key-value metadata: `fastbtv.schema_version` and `fastbtv.discriminators`
//! (JSON array of the sum-group column names).

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, Float32Array, Int32Array, PrimitiveArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Field, Float32Type, Int32Type, Schema, SchemaRef, UInt32Type,
    UInt64Type,
};
use arrow::record_batch::RecordBatch;
use btv_core::{TableSink, TreeRecord};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::TableError;

/// Schema version string embedded in Parquet key-value metadata.
pub const TREE_SCHEMA_V1: &str = "fastbtv_tree_v1";

/// Parquet metadata key for the schema version.
pub const META_KEY_SCHEMA_VERSION: &str = "fastbtv.schema_version";

/// Parquet metadata key for the discriminator column names (JSON).
pub const META_KEY_DISCRIMINATORS: &str = "fastbtv.discriminators";

/// Fixed leading columns.
pub const FIXED_COLUMNS: [&str; 8] =
    ["run", "lumi", "evt", "flavour", "jet_pt", "jet_eta", "jet_phi", "pu"];

/// Rows buffered per record batch.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

fn tree_schema(columns: &[String]) -> Result<SchemaRef, TableError> {
    let mut seen: HashSet<&str> = FIXED_COLUMNS.iter().copied().collect();
    for c in columns {
        if !seen.insert(c) {
            return Err(TableError::Schema(format!("duplicate column '{c}'")));
        }
    }

    let mut fields = vec![
        Field::new("run", DataType::UInt32, false),
        Field::new("lumi", DataType::UInt32, false),
        Field::new("evt", DataType::UInt64, false),
        Field::new("flavour", DataType::Int32, false),
        Field::new("jet_pt", DataType::Float32, false),
        Field::new("jet_eta", DataType::Float32, false),
        Field::new("jet_phi", DataType::Float32, false),
        Field::new("pu", DataType::Int32, false),
    ];
    fields.extend(columns.iter().map(|c| Field::new(c, DataType::Float32, false)));

    let names = serde_json::to_string(columns)
        .map_err(|e| TableError::Schema(format!("failed to serialize column names: {e}")))?;
    let metadata = HashMap::from([
        (META_KEY_SCHEMA_VERSION.to_string(), TREE_SCHEMA_V1.to_string()),
        (META_KEY_DISCRIMINATORS.to_string(), names),
    ]);
    Ok(Arc::new(Schema::new(fields).with_metadata(metadata)))
}

#[derive(Debug, Default)]
struct RowBuffer {
    run: Vec<u32>,
    lumi: Vec<u32>,
    evt: Vec<u64>,
    flavour: Vec<i32>,
    pt: Vec<f32>,
    eta: Vec<f32>,
    phi: Vec<f32>,
    pu: Vec<i32>,
    discriminators: Vec<Vec<f32>>,
}

impl RowBuffer {
    fn with_columns(n: usize) -> Self {
        Self { discriminators: vec![Vec::new(); n], ..Default::default() }
    }

    fn len(&self) -> usize {
        self.run.len()
    }

    fn push(&mut self, row: &TreeRecord) -> Result<(), TableError> {
        if row.discriminators.len() != self.discriminators.len() {
            return Err(TableError::Schema(format!(
                "row has {} discriminator values, table has {} columns",
                row.discriminators.len(),
                self.discriminators.len()
            )));
        }
        self.run.push(row.run);
        self.lumi.push(row.lumi);
        self.evt.push(row.evt);
        self.flavour.push(row.flavour);
        self.pt.push(row.jet_pt as f32);
        self.eta.push(row.jet_eta as f32);
        self.phi.push(row.jet_phi as f32);
        self.pu.push(row.pu);
        for (col, &v) in self.discriminators.iter_mut().zip(&row.discriminators) {
            col.push(v as f32);
        }
        Ok(())
    }

    fn drain_batch(&mut self, schema: &SchemaRef) -> Result<RecordBatch, TableError> {
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from(std::mem::take(&mut self.run))),
            Arc::new(UInt32Array::from(std::mem::take(&mut self.lumi))),
            Arc::new(UInt64Array::from(std::mem::take(&mut self.evt))),
            Arc::new(Int32Array::from(std::mem::take(&mut self.flavour))),
            Arc::new(Float32Array::from(std::mem::take(&mut self.pt))),
            Arc::new(Float32Array::from(std::mem::take(&mut self.eta))),
            Arc::new(Float32Array::from(std::mem::take(&mut self.phi))),
            Arc::new(Int32Array::from(std::mem::take(&mut self.pu))),
        ];
        for col in &mut self.discriminators {
            arrays.push(Arc::new(Float32Array::from(std::mem::take(col))));
        }
        Ok(RecordBatch::try_new(schema.clone(), arrays)?)
    }
}

/// Buffered Parquet writer for [`TreeRecord`] rows.
///
/// The file is created (and the schema fixed) on construction, so a run that
/// sees no jets still leaves a readable, empty table behind.
pub struct ParquetTableWriter {
    path: PathBuf,
    schema: SchemaRef,
    writer: Option<ArrowWriter<File>>,
    buffer: RowBuffer,
    batch_size: usize,
    rows_written: u64,
}

impl std::fmt::Debug for ParquetTableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetTableWriter")
            .field("path", &self.path)
            .field("buffered", &self.buffer.len())
            .field("rows_written", &self.rows_written)
            .field("open", &self.writer.is_some())
            .finish()
    }
}

impl ParquetTableWriter {
    /// Create `path` with the fixed columns followed by `columns`.
    pub fn create(path: &Path, columns: &[String]) -> Result<Self, TableError> {
        Self::with_batch_size(path, columns, DEFAULT_BATCH_SIZE)
    }

    /// Like [`create`](Self::create) with an explicit rows-per-batch.
    pub fn with_batch_size(
        path: &Path,
        columns: &[String],
        batch_size: usize,
    ) -> Result<Self, TableError> {
        let schema = tree_schema(columns)?;
        let props = WriterProperties::builder().set_compression(Compression::SNAPPY).build();
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        Ok(Self {
            path: path.to_path_buf(),
            schema,
            writer: Some(writer),
            buffer: RowBuffer::with_columns(columns.len()),
            batch_size: batch_size.max(1),
            rows_written: 0,
        })
    }

    /// Table schema.
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Rows handed to the writer so far (flushed or buffered).
    pub fn rows(&self) -> u64 {
        self.rows_written + self.buffer.len() as u64
    }

    fn flush(&mut self) -> Result<(), TableError> {
        if self.buffer.len() == 0 {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or(TableError::Finished)?;
        let n = self.buffer.len();
        let batch = self.buffer.drain_batch(&self.schema)?;
        writer.write(&batch)?;
        self.rows_written += n as u64;
        Ok(())
    }

    fn append(&mut self, row: &TreeRecord) -> Result<(), TableError> {
        if self.writer.is_none() {
            return Err(TableError::Finished);
        }
        self.buffer.push(row)?;
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TableError> {
        self.flush()?;
        if let Some(writer) = self.writer.take() {
            writer.close()?;
            tracing::debug!(path = %self.path.display(), rows = self.rows_written, "table closed");
        }
        Ok(())
    }
}

impl TableSink for ParquetTableWriter {
    fn write_row(&mut self, row: &TreeRecord) -> btv_core::Result<()> {
        Ok(self.append(row)?)
    }

    fn finish(&mut self) -> btv_core::Result<()> {
        Ok(self.close()?)
    }
}

/// Read a Parquet file into Arrow RecordBatches.
pub fn read_parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, TableError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;
    let batches: Result<Vec<_>, _> = reader.collect();
    Ok(batches?)
}

/// Arrow schema (including key-value metadata) of a Parquet file.
pub fn read_table_schema(path: &Path) -> Result<SchemaRef, TableError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    Ok(builder.schema().clone())
}

/// A per-jet table read back from Parquet.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeTable {
    /// Discriminator column names, in table order.
    pub columns: Vec<String>,
    /// Rows in file order; `discriminators` aligned with `columns`.
    pub rows: Vec<TreeRecord>,
}

impl TreeTable {
    /// Position of a discriminator column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn primitive<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a PrimitiveArray<T>, TableError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| TableError::Schema(format!("missing column '{name}'")))?;
    col.as_primitive_opt::<T>().ok_or_else(|| {
        TableError::Schema(format!(
            "column '{name}' has type {}, expected {}",
            col.data_type(),
            T::DATA_TYPE
        ))
    })
}

/// Read a table written by [`ParquetTableWriter`] back into rows.
///
/// Every column after the fixed ones is taken as a discriminator column.
pub fn read_tree(path: &Path) -> Result<TreeTable, TableError> {
    let schema = read_table_schema(path)?;
    let columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|n| !FIXED_COLUMNS.contains(&n.as_str()))
        .collect();

    let mut rows = Vec::new();
    for batch in read_parquet_batches(path)? {
        let run = primitive::<UInt32Type>(&batch, "run")?;
        let lumi = primitive::<UInt32Type>(&batch, "lumi")?;
        let evt = primitive::<UInt64Type>(&batch, "evt")?;
        let flavour = primitive::<Int32Type>(&batch, "flavour")?;
        let pt = primitive::<Float32Type>(&batch, "jet_pt")?;
        let eta = primitive::<Float32Type>(&batch, "jet_eta")?;
        let phi = primitive::<Float32Type>(&batch, "jet_phi")?;
        let pu = primitive::<Int32Type>(&batch, "pu")?;
        let discs = columns
            .iter()
            .map(|c| primitive::<Float32Type>(&batch, c))
            .collect::<Result<Vec<_>, _>>()?;

        for i in 0..batch.num_rows() {
            rows.push(TreeRecord {
                run: run.value(i),
                lumi: lumi.value(i),
                evt: evt.value(i),
                flavour: flavour.value(i),
                jet_pt: pt.value(i) as f64,
                jet_eta: eta.value(i) as f64,
                jet_phi: phi.value(i) as f64,
                pu: pu.value(i),
                discriminators: discs.iter().map(|d| d.value(i) as f64).collect(),
            });
        }
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), columns = columns.len(), "table read");
    Ok(TreeTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(evt: u64, flavour: i32, disc: Vec<f64>) -> TreeRecord {
        TreeRecord {
            run: 1,
            lumi: 9,
            evt,
            flavour,
            jet_pt: 42.5,
            jet_eta: -1.25,
            jet_phi: 0.5,
            pu: 57,
            discriminators: disc,
        }
    }

    fn columns() -> Vec<String> {
        vec!["CSVv2".to_string(), "DeepFlavour".to_string()]
    }

    #[test]
    fn rows_round_trip_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.parquet");
        let mut w = ParquetTableWriter::with_batch_size(&path, &columns(), 2).unwrap();
        for i in 0..5 {
            w.write_row(&row(i, 5, vec![0.25, -42.0])).unwrap();
        }
        assert_eq!(w.rows(), 5);
        w.finish().unwrap();

        let batches = read_parquet_batches(&path).unwrap();
        let n: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(n, 5);

        let b = &batches[0];
        assert_eq!(b.num_columns(), 10);
        assert_eq!(b.schema().field(2).data_type(), &DataType::UInt64);
        assert_eq!(b.column(2).as_primitive::<UInt64Type>().value(1), 1);
        assert_eq!(b.column(7).as_primitive::<Int32Type>().value(0), 57);
        assert_eq!(b.schema().field(9).name(), "DeepFlavour");
        assert_eq!(b.column(8).as_primitive::<Float32Type>().value(0), 0.25);
        assert_eq!(b.column(9).as_primitive::<Float32Type>().value(0), -42.0);
    }

    #[test]
    fn empty_table_keeps_schema_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let mut w = ParquetTableWriter::create(&path, &columns()).unwrap();
        w.finish().unwrap();

        let schema = read_table_schema(&path).unwrap();
        assert_eq!(schema.fields().len(), 10);
        assert_eq!(
            schema.metadata().get(META_KEY_SCHEMA_VERSION).map(String::as_str),
            Some(TREE_SCHEMA_V1)
        );
        let names: Vec<String> =
            serde_json::from_str(&schema.metadata()[META_KEY_DISCRIMINATORS]).unwrap();
        assert_eq!(names, columns());
        let rows: usize = read_parquet_batches(&path).unwrap().iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 0);
    }

    #[test]
    fn tree_reads_back_as_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.parquet");
        let mut w = ParquetTableWriter::with_batch_size(&path, &columns(), 2).unwrap();
        let written: Vec<TreeRecord> =
            (0..3).map(|i| row(10 + i, [5, 4, 0][i as usize], vec![0.5, 0.25])).collect();
        for r in &written {
            w.write_row(r).unwrap();
        }
        w.finish().unwrap();

        let table = read_tree(&path).unwrap();
        assert_eq!(table.columns, columns());
        assert_eq!(table.column_index("DeepFlavour"), Some(1));
        assert_eq!(table.column_index("pu"), None);
        // All values are exactly representable in Float32.
        assert_eq!(table.rows, written);
    }

    #[test]
    fn tree_reader_rejects_foreign_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new("run", DataType::Float64, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(arrow::array::Float64Array::from(vec![1.0])) as ArrayRef],
        )
        .unwrap();
        let mut w = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        w.write(&batch).unwrap();
        w.close().unwrap();

        let err = read_tree(&path).unwrap_err();
        assert!(matches!(err, TableError::Schema(ref m) if m.contains("run")), "{err}");
    }

    #[test]
    fn column_clash_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParquetTableWriter::create(&dir.path().join("t.parquet"), &["pu".to_string()])
            .unwrap_err();
        assert!(matches!(err, TableError::Schema(_)));
    }

    #[test]
    fn width_mismatch_and_write_after_finish_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = ParquetTableWriter::create(&dir.path().join("t.parquet"), &columns()).unwrap();
        assert!(w.write_row(&row(1, 4, vec![0.1])).is_err());
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(w.write_row(&row(1, 4, vec![0.1, 0.2])).is_err());
    }
}
