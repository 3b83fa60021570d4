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
use std::ops::Range;

use bstr::ByteSlice;
use regex::bytes::Captures;
use regex::bytes::Regex;

use crate::Orientation;
use crate::Strand;

type E = Box<dyn std::error::Error>;

/// Alignment coordinates from a `Smith-Waterman score: ... (a-b:c-d)` line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Geometry {
    pub sw_score: Option<i64>,
    pub q_start: i64,
    pub q_end: i64,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub hsp_length: i64,
}

impl Geometry {
    /// Derives the record coordinates from the `(a-b:c-d)` part of the line.
    ///
    /// The target region is extended to the full length of the miRNA. In
    /// [Forward](Orientation::Forward) mode the query coordinates are
    /// reported in the opposite sense, so `q_start` is `b` and `q_end` is
    /// `a`.
    ///
    /// Returns None if a derived coordinate overflows.
    pub fn new(
        sw_score: Option<i64>,
        coordinates: [i64; 4],
        query_length: i64,
        orientation: Orientation,
    ) -> Option<Self> {
        let [a, b, c, d] = coordinates;
        let diff_start = a.checked_sub(1)?;
        let diff_end = query_length;
        let (q_start, q_end, strand) = match orientation {
            Orientation::Reverse => (a, b, Strand::Minus),
            Orientation::Forward => (b, a, Strand::Plus),
        };
        Some(Geometry {
            sw_score,
            q_start, q_end,
            start: c.checked_sub(diff_start)?,
            end: d.checked_add(diff_end)?,
            strand,
            hsp_length: d.checked_sub(c)?,
        })
    }
}

/// Progress through a query/match/subject triad.
///
/// The anchor is the column range of the nucleotides on the query line and
/// is used to cut the next two lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PairState {
    #[default]
    Idle,
    AwaitingMatch { anchor: Range<usize>, query_string: String },
    AwaitingSubject { anchor: Range<usize>, query_string: String, match_string: String },
}

/// A classified line of SSEARCH36 output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportLine {
    QueryHeader { query_id: String, query_length: i64 },
    TargetHeader { target_name: String },
    AltLocus,
    Geometry { sw_score: Option<i64>, coordinates: [i64; 4] },
    QueryLine { anchor: Range<usize>, sequence: String },
    MatchLine { symbols: String },
    SubjectLine { sequence: String },
    Ignored,
}

/// Recognizes the lines of SSEARCH36 default output.
///
/// Patterns are tried in a fixed order and the first one that matches wins:
/// query header, target header, alternate locus (`>--`), geometry, and
/// finally the query/match/subject rows of an alignment block.
///
pub struct LineClassifier {
    query_header: Regex,
    target_header: Regex,
    alt_locus: Regex,
    geometry: Regex,
    query_line: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self, E> {
        Ok(LineClassifier {
            query_header: Regex::new(r"(?-u)^\s+\d+>>>(\S+) - (\d+) nt")?,
            target_header: Regex::new(r"(?-u)^>>(\S+) .*\(\d+ nt\)$")?,
            alt_locus: Regex::new(r"(?-u)^>--$")?,
            geometry: Regex::new(r"(?-u)^Smith-Waterman(?: score: (-?\d+))?.*\((\d+)-(\d+):(\d+)-(\d+)\)$")?,
            query_line: Regex::new(r"(?-u)^\S+\s+([ACGTU-]*)\s*$")?,
        })
    }

    /// Classify `line` given the state of the current triad.
    ///
    /// Query rows are only recognized when `in_alignment` is true, ie. after
    /// a geometry line of the current target. Match and subject rows are
    /// whatever lines follow a query row; they are cut at the anchor and not
    /// checked further.
    ///
    pub fn classify(
        &self,
        line: &[u8],
        state: &PairState,
        in_alignment: bool,
    ) -> Result<ReportLine, E> {
        let trimmed = line.trim_end();

        if let Some(caps) = self.query_header.captures(trimmed) {
            return Ok(ReportLine::QueryHeader {
                query_id: capture_string(&caps, 1),
                query_length: capture_int(&caps, 2)?,
            })
        }

        if let Some(caps) = self.target_header.captures(trimmed) {
            return Ok(ReportLine::TargetHeader {
                target_name: capture_string(&caps, 1),
            })
        }

        if self.alt_locus.is_match(trimmed) {
            return Ok(ReportLine::AltLocus)
        }

        if let Some(caps) = self.geometry.captures(trimmed) {
            let sw_score = match caps.get(1) {
                Some(_) => Some(capture_int(&caps, 1)?),
                None => None,
            };
            return Ok(ReportLine::Geometry {
                sw_score,
                coordinates: [capture_int(&caps, 2)?, capture_int(&caps, 3)?, capture_int(&caps, 4)?, capture_int(&caps, 5)?],
            })
        }

        let res = match state {
            PairState::Idle => {
                match self.query_line.captures(trimmed).and_then(|caps| caps.get(1)) {
                    Some(run) if in_alignment => {
                        ReportLine::QueryLine {
                            anchor: run.range(),
                            sequence: run.as_bytes().to_str_lossy().into_owned(),
                        }
                    },
                    _ => ReportLine::Ignored,
                }
            },
            PairState::AwaitingMatch { anchor, .. } => {
                ReportLine::MatchLine { symbols: slice_at_anchor(line, anchor) }
            },
            PairState::AwaitingSubject { anchor, .. } => {
                ReportLine::SubjectLine { sequence: slice_at_anchor(line, anchor) }
            },
        };
        Ok(res)
    }
}

/// Cut the columns in `anchor` from `line`.
///
/// Lines that end before the anchor does are padded with spaces. Every byte
/// becomes one character, so the result always has `anchor.len()`
/// characters.
pub fn slice_at_anchor(
    line: &[u8],
    anchor: &Range<usize>,
) -> String {
    let mut columns: Vec<u8> = vec![b' '; anchor.len()];
    if anchor.start < line.len() {
        let end = anchor.end.min(line.len());
        columns[0..(end - anchor.start)].copy_from_slice(&line[anchor.start..end]);
    }
    columns.iter().map(|x| *x as char).collect()
}

fn capture_string(
    caps: &Captures,
    idx: usize,
) -> String {
    caps.get(idx).map(|x| x.as_bytes().to_str_lossy().into_owned()).unwrap_or_default()
}

fn capture_int(
    caps: &Captures,
    idx: usize,
) -> Result<i64, E> {
    let bytes = caps.get(idx).map(|x| x.as_bytes()).unwrap_or_default();
    Ok(bytes.to_str()?.parse::<i64>()?)
}
