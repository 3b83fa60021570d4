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

//! Printer for outputting [AlignmentRecord] records as intermediate .tsv lines.
//!
//! Can be used to convert any iterator over [AlignmentRecord] results, such
//! as a [ReportParser](crate::parser::ReportParser), to their plain text
//! representation.
//!
//! Returns 1 line at a time using next(). Errors from the input iterator are
//! passed through.
//!
//! ## Usage
//!
//! ```rust
//! use mirtargets::{AlignmentRecord, Strand};
//! use mirtargets::printer::Printer;
//!
//! let data = vec![
//!     AlignmentRecord{ query_id: "mir156a".to_string(), target_id: "chr1_1".to_string(),
//!                      match_string: ":: :".to_string(), query_string: "GTGC".to_string(), subject_string: "GTAC".to_string(),
//!                      q_start: 4, q_end: 1, start: 100, end: 125, strand: Strand::Plus, hsp_length: 3 },
//! ];
//!
//! let mut iter = data.into_iter().map(Ok::<AlignmentRecord, Box<dyn std::error::Error>>);
//! let mut printer = Printer::new(&mut iter);
//!
//! let mut output: Vec<u8> = Vec::new();
//! for line in printer.by_ref() {
//!     output.append(&mut line.unwrap());
//! }
//!
//! let expected: Vec<u8> = b"mir156a\tchr1_1\t:: :\tGTGC\tGTAC\t4\t1\t100\t125\t+\t3\n".to_vec();
//! assert_eq!(output, expected);
//! ```
//!

use crate::AlignmentRecord;

use tsv::format_record_line;

// Format specific implementations
pub mod tsv;

type E = Box<dyn std::error::Error>;

pub struct Printer<'a, I> where I: Iterator<Item=Result<AlignmentRecord, E>> {
    records: &'a mut I,
    index: usize,
}

impl<'a, I> Printer<'a, I> where I: Iterator<Item=Result<AlignmentRecord, E>> {
    pub fn new(
        records: &'a mut I,
    ) -> Self {
        Printer{ records, index: 0 }
    }

    /// Number of records printed so far.
    pub fn n_printed(
        &self,
    ) -> usize {
        self.index
    }
}

impl<I> Iterator for Printer<'_, I> where I: Iterator<Item=Result<AlignmentRecord, E>> {
    type Item = Result<Vec<u8>, E>;

    fn next(
        &mut self,
    ) -> Option<Result<Vec<u8>, E>> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };

        let mut out: Vec<u8> = Vec::new();
        if let Err(e) = format_record_line(&record, &mut out) {
            return Some(Err(e))
        }
        self.index += 1;
        Some(Ok(out))
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn print_parsed_report() {
        use super::Printer;
        use crate::Orientation;
        use crate::parser::ReportParser;
        use std::io::Cursor;

        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"  1>>>ath-miR156a - 21 nt\n".to_vec());
        data.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
        data.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
        data.append(&mut b"ath-mi GTGCTCACTCTCTTCTGTCAA\n".to_vec());
        data.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
        data.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());

        let expected: Vec<u8> = b"ath-miR156a\tchr1_1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec();

        let mut cursor = Cursor::new(data);
        let mut parser = ReportParser::new(&mut cursor, Orientation::Forward).unwrap();
        let mut printer = Printer::new(&mut parser);

        let mut got: Vec<u8> = Vec::new();
        for line in printer.by_ref() {
            got.append(&mut line.unwrap());
        }

        assert_eq!(got, expected);
        assert_eq!(printer.n_printed(), 1);
    }

    #[test]
    fn print_passes_errors_through() {
        use super::Printer;
        use crate::AlignmentRecord;

        let data: Vec<Result<AlignmentRecord, Box<dyn std::error::Error>>> = vec![Err("broken".into())];
        let mut iter = data.into_iter();
        let mut printer = Printer::new(&mut iter);

        assert!(printer.next().unwrap().is_err());
        assert!(printer.next().is_none());
        assert_eq!(printer.n_printed(), 0);
    }
}
