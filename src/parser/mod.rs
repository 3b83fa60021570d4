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

//! Parser for converting SSEARCH36 output into [AlignmentRecord] records.
//!
//! Returns 1 record at a time using next(). A record is returned when the
//! subject row of an alignment block has been read.
//!
//! ## Usage
//!
//! ```rust
//! use mirtargets::Orientation;
//! use mirtargets::parser::ReportParser;
//! use std::io::Cursor;
//!
//! let mut report: Vec<u8> = Vec::new();
//! report.append(&mut b"  1>>>mir156a - 21 nt\n".to_vec());
//! report.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
//! report.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
//! report.append(&mut b"mir156 GTGCTCACTCTCTTCTGTCAA\n".to_vec());
//! report.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
//! report.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());
//!
//! let mut input = Cursor::new(report);
//! let mut parser = ReportParser::new(&mut input, Orientation::Forward).unwrap();
//!
//! let record = parser.next().unwrap().unwrap();
//! assert_eq!(record.query_id, "mir156a");
//! assert_eq!(record.target_id, "chr1_1");
//! assert_eq!(record.match_string, ":::::::::: ::::::::::");
//! assert_eq!(record.hsp_length, 20);
//!
//! assert!(parser.next().is_none());
//! ```
//!

// Format specific implementations
pub mod ssearch;
pub mod tsv;

use crate::AlignmentRecord;
use crate::Orientation;
use crate::parser::ssearch::Geometry;
use crate::parser::ssearch::LineClassifier;
use crate::parser::ssearch::PairState;
use crate::parser::ssearch::ReportLine;

use std::io::BufReader;
use std::io::Read;

use bstr::io::BufReadExt;
use bstr::io::ByteLines;
use log::debug;
use log::warn;

type E = Box<dyn std::error::Error>;

#[derive(Debug, Clone)]
pub struct CorruptReport {
    pub line_number: usize,
    pub message: String,
}

impl std::fmt::Display for CorruptReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "corrupt report at line {}: {}", self.line_number, self.message)
    }
}

impl std::error::Error for CorruptReport {}

/// Query and target the parser is currently inside of.
#[derive(Clone, Debug, Default)]
pub struct ParserContext {
    pub query_id: Option<String>,
    pub query_length: i64,
    /// Number of target headers and `>--` markers seen for this query.
    pub occurrence: usize,
    pub target_name: Option<String>,
    /// Coordinates of the alignment the next triad belongs to.
    pub geometry: Option<Geometry>,
    pub pair: PairState,
}

impl ParserContext {
    /// Current target name with the occurrence suffix.
    pub fn target_id(&self) -> Option<String> {
        self.target_name.as_ref().map(|name| format!("{}_{}", name, self.occurrence))
    }
}

pub struct ReportParser<'a, R: Read> {
    lines: ByteLines<BufReader<&'a mut R>>,
    classifier: LineClassifier,
    context: ParserContext,
    orientation: Orientation,

    line_number: usize,
    finished: bool,
}

impl<'a, R: Read> ReportParser<'a, R> {
    pub fn new(
        conn: &'a mut R,
        orientation: Orientation,
    ) -> Result<Self, E> {
        let lines = BufReader::new(conn).byte_lines();
        let classifier = LineClassifier::new()?;
        Ok(Self {
            lines, classifier,
            context: ParserContext::default(),
            orientation,
            line_number: 0,
            finished: false,
        })
    }
}

impl<R: Read> ReportParser<'_, R> {
    pub fn context(
        &self,
    ) -> &ParserContext {
        &self.context
    }

    /// Number of lines consumed so far.
    pub fn line_number(
        &self,
    ) -> usize {
        self.line_number
    }

    fn corrupt(
        &self,
        message: &str,
    ) -> E {
        Box::new(CorruptReport{ line_number: self.line_number, message: message.to_string() })
    }

    /// Update the context with `line`.
    ///
    /// Returns the finished record if `line` completed a triad.
    fn consume_line(
        &mut self,
        line: &[u8],
    ) -> Result<Option<AlignmentRecord>, E> {
        if line.first() == Some(&b'#') {
            return Ok(None)
        }

        let in_alignment = self.context.geometry.is_some();
        let classified = self.classifier.classify(line, &self.context.pair, in_alignment)?;

        match classified {
            ReportLine::QueryHeader { query_id, query_length } => {
                debug!("Query {} ({} nt)", query_id, query_length);
                self.context = ParserContext {
                    query_id: Some(query_id),
                    query_length,
                    ..Default::default()
                };
            },
            ReportLine::TargetHeader { target_name } => {
                self.context.occurrence += 1;
                self.context.target_name = Some(target_name);
                self.context.geometry = None;
            },
            ReportLine::AltLocus => {
                self.context.occurrence += 1;
                self.context.geometry = None;
            },
            ReportLine::Geometry { sw_score, coordinates } => {
                if self.context.query_id.is_none() {
                    return Err(self.corrupt("alignment coordinates before the first query header"))
                }
                let geometry = Geometry::new(sw_score, coordinates, self.context.query_length, self.orientation)
                    .ok_or_else(|| self.corrupt("alignment coordinates out of range"))?;
                self.context.geometry = Some(geometry);
            },
            ReportLine::QueryLine { anchor, sequence } => {
                if anchor.is_empty() {
                    warn!("Empty alignment row at line {}", self.line_number);
                }
                self.context.pair = PairState::AwaitingMatch{ anchor, query_string: sequence };
            },
            ReportLine::MatchLine { symbols } => {
                let pair = std::mem::take(&mut self.context.pair);
                if let PairState::AwaitingMatch { anchor, query_string } = pair {
                    self.context.pair = PairState::AwaitingSubject{ anchor, query_string, match_string: symbols };
                }
            },
            ReportLine::SubjectLine { sequence } => {
                let pair = std::mem::take(&mut self.context.pair);
                if let PairState::AwaitingSubject { query_string, match_string, .. } = pair {
                    return self.build_record(match_string, query_string, sequence).map(Some)
                }
            },
            ReportLine::Ignored => {},
        }
        Ok(None)
    }

    fn build_record(
        &self,
        match_string: String,
        query_string: String,
        subject_string: String,
    ) -> Result<AlignmentRecord, E> {
        let query_id = self.context.query_id.clone().ok_or_else(|| self.corrupt("alignment outside of a query"))?;
        let target_id = self.context.target_id().ok_or_else(|| self.corrupt(&format!("alignment for {} has no target", query_id)))?;
        let geometry = self.context.geometry.clone().ok_or_else(|| self.corrupt("alignment has no coordinates"))?;

        debug!("{} vs {}: sw score {:?}, {}-{} ({})", query_id, target_id, geometry.sw_score, geometry.start, geometry.end, geometry.strand);

        Ok(AlignmentRecord {
            query_id,
            target_id,
            match_string,
            query_string,
            subject_string,
            q_start: geometry.q_start,
            q_end: geometry.q_end,
            start: geometry.start,
            end: geometry.end,
            strand: geometry.strand,
            hsp_length: geometry.hsp_length,
        })
    }
}

impl<R: Read> Iterator for ReportParser<'_, R> {
    type Item = Result<AlignmentRecord, E>;

    fn next(
        &mut self,
    ) -> Option<Result<AlignmentRecord, E>> {
        if self.finished {
            return None
        }
        while let Some(line) = self.lines.next() {
            self.line_number += 1;
            let res = match line {
                Ok(line) => self.consume_line(&line),
                Err(e) => Err(Box::new(e) as E),
            };
            match res {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e))
                },
            }
        }
        self.finished = true;
        None
    }
}
