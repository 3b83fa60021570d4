// mirtargets: miRNA target prediction from SSEARCH36 alignments.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::MultiGzDecoder;
use log::debug;

type E = Box<dyn std::error::Error>;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug)]
pub struct SinkError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for SinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "can't create output file {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for SinkError {}

/// Wraps `conn` in a gzip decoder if its contents start with the gzip magic bytes.
///
/// Concatenated gzip members are read as one stream.
pub fn decompress_if_gzip<R: Read + 'static>(
    conn: R,
) -> Result<Box<dyn Read>, E> {
    let mut reader = BufReader::new(conn);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        debug!("Detected gzip compressed input");
        Ok(Box::new(MultiGzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

/// Open `path` for reading, or stdin if `path` is None or `-`.
pub fn open_input(
    path: Option<&Path>,
) -> Result<Box<dyn Read>, E> {
    match path {
        Some(path) if path != Path::new("-") => {
            debug!("Reading from {}", path.display());
            let f = File::open(path).map_err(|e| format!("can't open input file {}: {}", path.display(), e))?;
            decompress_if_gzip(f)
        },
        _ => {
            debug!("Reading from stdin");
            decompress_if_gzip(std::io::stdin())
        },
    }
}

/// Create the output for alignments rejected by the cutoffs.
pub fn open_failed_output(
    path: &Path,
) -> Result<BufWriter<File>, SinkError> {
    let f = File::create(path).map_err(|e| SinkError{ path: path.to_path_buf(), source: e })?;
    Ok(BufWriter::new(f))
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn decompress_if_gzip_plain() {
        use super::decompress_if_gzip;
        use std::io::Cursor;
        use std::io::Read;

        let data: Vec<u8> = b"  1>>>ath-miR156a - 21 nt\n".to_vec();

        let mut got: Vec<u8> = Vec::new();
        decompress_if_gzip(Cursor::new(data.clone())).unwrap().read_to_end(&mut got).unwrap();

        assert_eq!(got, data);
    }

    #[test]
    fn decompress_if_gzip_compressed() {
        use super::decompress_if_gzip;
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Cursor;
        use std::io::Read;
        use std::io::Write;

        let data: Vec<u8> = b"ath-miR156a\tchr1_1\t:\tG\tG\t21\t1\t52164\t52205\t+\t20\n".to_vec();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut got: Vec<u8> = Vec::new();
        decompress_if_gzip(Cursor::new(compressed)).unwrap().read_to_end(&mut got).unwrap();

        assert_eq!(got, data);
    }

    #[test]
    fn decompress_if_gzip_concatenated_members() {
        use super::decompress_if_gzip;
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Cursor;
        use std::io::Read;
        use std::io::Write;

        let mut compressed: Vec<u8> = Vec::new();
        for part in [b"first\n".to_vec(), b"second\n".to_vec()] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&part).unwrap();
            compressed.append(&mut encoder.finish().unwrap());
        }

        let mut got: Vec<u8> = Vec::new();
        decompress_if_gzip(Cursor::new(compressed)).unwrap().read_to_end(&mut got).unwrap();

        assert_eq!(got, b"first\nsecond\n".to_vec());
    }

    #[test]
    fn decompress_if_gzip_empty() {
        use super::decompress_if_gzip;
        use std::io::Cursor;
        use std::io::Read;

        let mut got: Vec<u8> = Vec::new();
        decompress_if_gzip(Cursor::new(Vec::<u8>::new())).unwrap().read_to_end(&mut got).unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn open_input_missing_file() {
        use super::open_input;
        use std::path::Path;

        assert!(open_input(Some(Path::new("/nonexistent/mirtargets/input.txt"))).is_err());
    }

    #[test]
    fn open_failed_output_names_path() {
        use super::open_failed_output;
        use std::path::Path;

        let got = open_failed_output(Path::new("/nonexistent/mirtargets/failed.tsv")).unwrap_err();

        assert!(got.to_string().contains("/nonexistent/mirtargets/failed.tsv"));
    }
}
