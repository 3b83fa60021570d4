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
use std::io::BufRead;
use std::io::BufReader;
use std::io::Lines;
use std::io::Read;

use crate::AlignmentRecord;
use crate::Strand;

type E = Box<dyn std::error::Error>;

const N_COLUMNS: usize = 11;

#[derive(Debug, Clone)]
pub struct MalformedRecord {
    pub line_number: usize,
    pub message: String,
}

impl std::fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "malformed record at line {}: {}", self.line_number, self.message)
    }
}

impl std::error::Error for MalformedRecord {}

/// Parse a line from the intermediate .tsv format
///
/// Reads the 11 tab-separated columns written by
/// [format_record_line](crate::printer::tsv::format_record_line). The
/// alignment strings are kept as is, including leading and trailing spaces.
///
/// Terminates with a [MalformedRecord] if the line does not have 11 columns
/// or if a coordinate or the strand can't be parsed.
///
pub fn read_tsv_line(
    line: &str,
    line_number: usize,
) -> Result<AlignmentRecord, MalformedRecord> {
    let malformed = |message: String| MalformedRecord{ line_number, message };

    let records: Vec<&str> = line.split('\t').collect();
    if records.len() != N_COLUMNS {
        return Err(malformed(format!("expected {} columns, found {}", N_COLUMNS, records.len())))
    }

    let int = |idx: usize, name: &str| -> Result<i64, MalformedRecord> {
        records[idx].trim().parse::<i64>().map_err(|e| malformed(format!("{} '{}': {}", name, records[idx], e)))
    };

    Ok(AlignmentRecord {
        query_id: records[0].trim().to_string(),
        target_id: records[1].trim().to_string(),
        match_string: records[2].to_string(),
        query_string: records[3].to_string(),
        subject_string: records[4].to_string(),
        q_start: int(5, "q_start")?,
        q_end: int(6, "q_end")?,
        start: int(7, "start")?,
        end: int(8, "end")?,
        strand: records[9].trim().parse::<Strand>().map_err(malformed)?,
        hsp_length: int(10, "hsp_length")?,
    })
}

/// Reads [AlignmentRecord] records from intermediate .tsv data.
///
/// Skips empty lines and lines starting with `#`.
pub struct RecordReader<'a, R: Read> {
    lines: Lines<BufReader<&'a mut R>>,
    line_number: usize,
    finished: bool,
}

impl<'a, R: Read> RecordReader<'a, R> {
    pub fn new(
        conn: &'a mut R,
    ) -> Self {
        RecordReader {
            lines: BufReader::new(conn).lines(),
            line_number: 0,
            finished: false,
        }
    }
}

impl<R: Read> Iterator for RecordReader<'_, R> {
    type Item = Result<AlignmentRecord, E>;

    fn next(
        &mut self,
    ) -> Option<Result<AlignmentRecord, E>> {
        if self.finished {
            return None
        }
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let res = match line {
                Ok(line) => {
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    read_tsv_line(&line, self.line_number).map_err(|e| Box::new(e) as E)
                },
                Err(e) => Err(Box::new(e) as E),
            };
            if res.is_err() {
                self.finished = true;
            }
            return Some(res)
        }
        self.finished = true;
        None
    }
}
