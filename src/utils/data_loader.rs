//! CSV loading

use crate::error::{Result, TabfitError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a CSV file with a header row into an eager DataFrame.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        TabfitError::DataError(format!("cannot open {}: {}", path.display(), e))
    })?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| TabfitError::DataError(format!("cannot parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv() {
        let mut tmp = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(tmp, "a,b,label").unwrap();
        writeln!(tmp, "1.0,x,10").unwrap();
        writeln!(tmp, "2.0,y,20").unwrap();
        tmp.flush().unwrap();

        let df = load_csv(tmp.path()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_csv(Path::new("/nonexistent/never.csv"));
        assert!(matches!(result, Err(TabfitError::DataError(_))));
    }
}
