use std::fs;
use std::path::Path;

use crate::error::{Result, ToolError};

/// Reads a log file that must be UTF-8.
pub fn read_utf8(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|source| ToolError::Undecodable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rejects_non_utf8_content() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("log.dat");
        fs::write(&path, b"1 R1 0 X\n\xff\xfe").expect("file written");

        let error = read_utf8(&path).expect_err("invalid UTF-8 rejected");
        assert!(matches!(error, ToolError::Undecodable { .. }));
    }

    #[test]
    fn reads_utf8_content() {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("log.dat");
        fs::write(&path, "! Board Name: Ä Time: now\n").expect("file written");

        assert_eq!(read_utf8(&path).expect("read"), "! Board Name: Ä Time: now\n");
    }
}
