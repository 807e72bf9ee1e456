//! CSV output of the normalized dataset

use crate::error::{EtlError, Result};
use crate::types::Dataset;
use csv::Writer;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write the dataset as CSV: one header row, then one row per record
///
/// Amounts use the shortest representation that reads back to the same `f64`.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W) -> csv::Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(dataset.columns())?;

    for record in dataset.records() {
        let mut row = Vec::with_capacity(record.converted.len() + 2);
        row.push(record.name.clone());
        row.extend(record.amounts().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Save the dataset to `path`, replacing any existing file
///
/// The data goes to a temporary file in the target directory which is renamed
/// over `path` once fully written. On failure the temporary file is removed and
/// an existing file at `path` is left as it was.
pub fn save_to_file(dataset: &Dataset, path: &Path) -> Result<()> {
    let target = path.display().to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| EtlError::persistence(&target, e))?;
    write_dataset(dataset, &mut tmp).map_err(|e| EtlError::persistence(&target, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| EtlError::persistence(&target, e))?;
    tmp.persist(path)
        .map_err(|e| EtlError::persistence(&target, e.error))?;

    log::debug!("Wrote {} rows to {}", dataset.len(), target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedRecord;
    use std::fs;
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        Dataset::new(
            "USD",
            vec!["GBP".to_string(), "EUR".to_string()],
            vec![
                NormalizedRecord {
                    name: "JPMorgan Chase".to_string(),
                    market_cap: 432.92,
                    converted: vec![346.34, 402.62],
                },
                NormalizedRecord {
                    name: "Bank, Ltd.".to_string(),
                    market_cap: 100.0,
                    converted: vec![80.0, 93.0],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let mut bytes = Vec::new();
        write_dataset(&dataset(), &mut bytes).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "Name,MC_USD_Billion,MC_GBP_Billion,MC_EUR_Billion\n\
             JPMorgan Chase,432.92,346.34,402.62\n\
             \"Bank, Ltd.\",100,80,93\n"
        );
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Largest_banks_data.csv");
        fs::write(&path, "stale contents").unwrap();

        save_to_file(&dataset(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Name,MC_USD_Billion"));
        assert_eq!(text.lines().count(), 3);
        // Only the target file remains, no temporary leftovers
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_save_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = save_to_file(&dataset(), &path).unwrap_err();
        assert!(matches!(err, EtlError::Persistence { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_replace_keeps_existing_target() {
        let dir = tempdir().unwrap();
        // A non-empty directory at the target path makes the final rename fail
        let path = dir.path().join("Largest_banks_data.csv");
        fs::create_dir(&path).unwrap();
        let kept = path.join("previous.csv");
        fs::write(&kept, "Name,MC_USD_Billion\nHSBC,160.68\n").unwrap();

        let err = save_to_file(&dataset(), &path).unwrap_err();
        assert!(matches!(err, EtlError::Persistence { .. }));

        assert!(path.is_dir());
        assert_eq!(
            fs::read_to_string(&kept).unwrap(),
            "Name,MC_USD_Billion\nHSBC,160.68\n"
        );
        // No temporary file left beside the target
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![path.file_name().unwrap().to_owned()]);
    }

    #[test]
    fn test_values_read_back_exactly() {
        let ds = dataset();
        let mut bytes = Vec::new();
        write_dataset(&ds, &mut bytes).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());

        for (record, row) in ds.records().iter().zip(rdr.records()) {
            let row = row.unwrap();
            let parsed: Vec<f64> = row.iter().skip(1).map(|v| v.parse().unwrap()).collect();
            assert_eq!(parsed, record.amounts().collect::<Vec<_>>());
        }
    }
}
