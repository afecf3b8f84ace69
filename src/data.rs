//! Headerless delimiter-separated numeric tables.
//!
//! Every file this pipeline touches is a plain matrix: no header, no index
//! column, one `f32` per cell. Ragged rows and non-numeric cells are rejected
//! up front so shape errors surface at load time rather than mid-training.

use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Reads a headerless numeric table into a dense row-major matrix.
///
/// All rows must have the same column count and the table must contain at
/// least one row.
pub fn read_matrix(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut cells: Vec<f32> = Vec::new();
    let mut cols: Option<usize> = None;
    let mut rows = 0usize;

    for record in reader.deserialize::<Vec<f32>>() {
        let row = record?;
        match cols {
            None => cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                return Err(Error::Shape(format!(
                    "row {} has {} columns, expected {}",
                    rows + 1,
                    row.len(),
                    expected
                )));
            }
            Some(_) => {}
        }
        cells.extend(row);
        rows += 1;
    }

    let cols = cols.unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Err(Error::Shape("table is empty".into()));
    }

    // Shape and cell count agree by construction above.
    Ok(Array2::from_shape_vec((rows, cols), cells).expect("row-major cells match shape"))
}

/// Writes a matrix in the same headerless format the loader reads.
pub fn write_matrix(path: impl AsRef<Path>, matrix: &Array2<f32>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in matrix.outer_iter() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write as _;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write temp csv");
        file
    }

    #[test]
    fn reads_headerless_matrix() {
        let file = write_temp("1,2,3\n4,5,6\n");
        let matrix = read_matrix(file.path()).expect("read");
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 3);
        assert_eq!(matrix[[1, 2]], 6.0);
    }

    #[test]
    fn rejects_ragged_rows() {
        let file = write_temp("1,2,3\n4,5\n");
        let err = read_matrix(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn rejects_non_numeric_cells() {
        let file = write_temp("1,2\n3,oops\n");
        let err = read_matrix(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn rejects_empty_table() {
        let file = write_temp("");
        let err = read_matrix(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn write_then_read_round_trips() {
        let matrix =
            Array2::from_shape_vec((2, 2), vec![0.5f32, -1.25, 3.0, 42.0]).expect("matrix");
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.csv");
        write_matrix(&path, &matrix).expect("write");
        let back = read_matrix(&path).expect("read back");
        assert_eq!(back, matrix);
    }
}
