//!
//! CSV output. The file is replaced on every run.
//!
use crate::Result;
use std::path::Path;

/// Write `headers` followed by `rows` to `path`, creating missing parent directories.
/// Every row must have as many fields as `headers`.
pub fn write<P: AsRef<Path>>(path: P, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    tracing::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "stale,content\n1,2\n3,4\n5,6\n").unwrap();

        write(&path, &["A", "B"], &[row(&["x", "y"])]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,B\nx,y\n");
    }

    #[test]
    fn quotes_when_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.csv");

        write(
            &path,
            &["Name", "Note"],
            &[row(&["vol,1", r#"say "hi""#]), row(&["vol2", ""])],
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Name,Note\n\"vol,1\",\"say \"\"hi\"\"\"\nvol2,\n"
        );
    }

    #[test]
    fn rejects_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        let err = write(&path, &["A", "B", "C"], &[row(&["1", "2"])]).unwrap_err();
        assert!(matches!(err, crate::Error::CSV(_)));
    }

    #[test]
    fn header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write(&path, &["A", "B"], &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,B\n");
    }
}
