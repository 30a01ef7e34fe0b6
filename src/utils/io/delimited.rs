//! Delimited text reading
//!
//! Survey extracts and reference-model microdata are distributed as
//! tab-delimited text with a header row. Column types are inferred from the
//! whole file.

use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::error::util::safe_open_file;
use crate::utils::io::parquet::get_batch_size;
use crate::utils::logging::StepTimer;

/// Read a delimited text file with a header into one record batch
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<RecordBatch> {
    let timer = StepTimer::start("reading delimited table", path);

    let mut file = safe_open_file(path, "reading delimited table")?;
    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (schema, _) = format.infer_schema(&mut file, None)?;
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(get_batch_size())
        .build(file)?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    timer.finish(batch.num_rows(), "rows");
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arrow::array_to_f64;
    use std::io::Write;

    #[test]
    fn test_reads_tab_file_with_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("househol.tab");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "SERNUM\tGROSS4\tCTANNUAL").unwrap();
        writeln!(file, "1\t1500\t1200.5").unwrap();
        writeln!(file, "2\t1700\t").unwrap();
        drop(file);

        let batch = read_delimited(&path, b'\t').unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);

        let idx = batch.schema().index_of("CTANNUAL").unwrap();
        let ct = array_to_f64(batch.column(idx)).unwrap().unwrap();
        assert_eq!(ct[0], 1200.5);
        assert!(ct[1].is_nan());
    }
}
