use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use crate::XpsError;

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "# Group: G\n# Region: R\n#\n1.0 2.0\n";

    #[test]
    fn compression_from_extension() {
        assert_eq!(Compression::from_path("scan.xy"), Compression::None);
        assert_eq!(Compression::from_path("scan.xy.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("scan.XY.BZ2"), Compression::Bzip2);
        assert_eq!(Compression::from_path("scan"), Compression::None);
    }

    #[test]
    fn plain_gzip_and_bzip2() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.xy", "a.xy.gz", "a.xy.bz2"] {
            let path = dir.path().join(name);
            write_text(&path, TEXT).unwrap();
            assert_eq!(read_text(&path).unwrap(), TEXT, "{name}");
        }
        // compressed files are not stored as plain text
        let raw = std::fs::read(dir.path().join("a.xy.gz")).unwrap();
        assert_ne!(raw, TEXT.as_bytes());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.xy");
        match read_text(&path) {
            Err(XpsError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected result {other:?}"),
        }
    }
}

/// Container compression of an export file, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("gz") => Compression::Gzip,
            Some("bz2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }
}

/// Read a whole export file as text, decompressing `.gz` and `.bz2` files on the fly.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, XpsError> {
    let path = path.as_ref();
    let io_err = |source| XpsError::Io { path: path.to_path_buf(), source };
    let f = File::open(path).map_err(io_err)?;
    let rdr = BufReader::new(f);
    let mut text = String::new();
    let read = match Compression::from_path(path) {
        Compression::None => read_all(rdr, &mut text),
        Compression::Gzip => read_all(GzDecoder::new(rdr), &mut text),
        Compression::Bzip2 => read_all(BzDecoder::new(rdr), &mut text),
    };
    read.map_err(io_err)?;
    Ok(text)
}

/// Write text to `path`, compressing according to its extension.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<(), XpsError> {
    let path = path.as_ref();
    let io_err = |source| XpsError::Io { path: path.to_path_buf(), source };
    let f = File::create(path).map_err(io_err)?;
    let w = BufWriter::new(f);
    let written = match Compression::from_path(path) {
        Compression::None => write_all(w, text),
        Compression::Gzip => {
            let mut enc = GzEncoder::new(w, flate2::Compression::default());
            enc.write_all(text.as_bytes())
                .and_then(|_| enc.finish())
                .and_then(|mut w| w.flush())
        }
        Compression::Bzip2 => {
            let mut enc = BzEncoder::new(w, bzip2::Compression::fast());
            enc.write_all(text.as_bytes())
                .and_then(|_| enc.finish())
                .and_then(|mut w| w.flush())
        }
    };
    written.map_err(io_err)
}

fn read_all<R: Read>(mut reader: R, text: &mut String) -> std::io::Result<()> {
    reader.read_to_string(text)?;
    Ok(())
}

fn write_all<W: Write>(mut writer: W, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()
}
