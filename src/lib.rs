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

//! mirtargets is a library and a command-line client for:
//!
//!   - Converting the default pairwise output of
//!     [SSEARCH36](https://github.com/wrpearson/fasta36) into tab-separated
//!     alignment records.
//!   - Scoring miRNA-target alignments with the positional penalty scheme of
//!     [psRNATarget](https://www.zhaolab.org/psRNATarget/) (Fahlgren 2009),
//!     and keeping the alignments that pass the cutoffs.
//!
//! ## Usage
//!
//! ### Command line
//!
//! The mirtargets CLI supports the following subcommands:
//!   - `mirtargets parse` convert SSEARCH36 output to the intermediate .tsv format.
//!   - `mirtargets score` score alignments stored in the intermediate .tsv format.
//!   - `mirtargets run` parse and score in one go.
//!
//! The intermediate .tsv format contains the columns `query_id`,
//! `target_id`, `match_aln`, `query_aln`, `subject_aln`, `q_start`, `q_end`,
//! `s_start`, `s_end`, `strand`, and `hsp_length`. The target id carries a
//! `_<n>` suffix numbering the alignments of a query against its targets.
//!
//! ### Rust API
//!
//! The API provides functions for operating on structs that implement [Read]
//! and/or [Write]. These are meant for use cases where an entire stream
//! should be processed.
//!
//! For use cases requiring access to a single record at a time, the following
//! structs are provided:
//!
//!   - [ReportParser](parser::ReportParser): takes a [Read] containing SSEARCH36 output and converts it into [AlignmentRecord].
//!   - [RecordReader](parser::tsv::RecordReader): takes a [Read] containing intermediate .tsv data and converts it into [AlignmentRecord].
//!   - [Printer](printer::Printer): takes an iterator over [AlignmentRecord] and formats them as intermediate .tsv lines.
//!   - [PenaltyScorer](scorer::PenaltyScorer): classifies [AlignmentRecord] one at a time.
//!

use std::io::Read;
use std::io::Write;

use log::info;

use crate::config::ScoringConfig;
use crate::printer::tsv::format_scored_header;
use crate::printer::tsv::format_scored_line;
use crate::scorer::Classification;
use crate::scorer::PenaltyScorer;
use crate::scorer::ScoringStats;

pub mod config;
pub mod parser;
pub mod printer;
pub mod scorer;
pub mod streams;

type E = Box<dyn std::error::Error>;

/// Orientation of the miRNA in the alignments.
///
/// [Forward](Orientation::Forward) means SSEARCH36 was run with `-i` and
/// the miRNA is shown 3'-5' against the 5'-3' target. [Reverse](Orientation::Reverse)
/// means the input was already reverse complemented and the miRNA reads
/// 5'-3'.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Forward,
    Reverse,
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fwd" | "forward" => Ok(Orientation::Forward),
            "rev" | "reverse" => Ok(Orientation::Reverse),
            _ => Err(format!("'{}' is not a valid Orientation", s)),
        }
    }
}

/// Strand of the target sequence the alignment is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl std::str::FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" => Ok(Strand::Minus),
            _ => Err(format!("'{}' is not a valid Strand", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MalformedTargetId {
    pub target_id: String,
}

impl std::fmt::Display for MalformedTargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "target id '{}' does not end in an _<n> occurrence suffix", self.target_id)
    }
}

impl std::error::Error for MalformedTargetId {}

/// A single miRNA-target alignment.
///
/// `match_string`, `query_string`, and `subject_string` are the three rows
/// of the SSEARCH36 alignment block and always have the same length. The
/// match string contains `:` for identities, `.` for G:U pairs, and a space
/// for mismatches and gaps.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlignmentRecord {
    /// Name of the miRNA.
    pub query_id: String,
    /// Name of the target with the `_<n>` occurrence suffix.
    pub target_id: String,
    pub match_string: String,
    pub query_string: String,
    pub subject_string: String,
    pub q_start: i64,
    pub q_end: i64,
    /// Start of the target region extended to cover the whole miRNA.
    pub start: i64,
    /// End of the target region extended by the miRNA length.
    pub end: i64,
    pub strand: Strand,
    pub hsp_length: i64,
}

impl AlignmentRecord {
    /// Returns true if the three alignment rows have the same length.
    pub fn has_equal_lengths(&self) -> bool {
        let n = self.match_string.chars().count();
        n == self.query_string.chars().count() && n == self.subject_string.chars().count()
    }

    /// Target id without the trailing `_<n>` occurrence suffix.
    ///
    /// Terminates with a [MalformedTargetId] if the id does not end in `_`
    /// followed by at least one digit.
    pub fn contig_id(&self) -> Result<&str, MalformedTargetId> {
        split_occurrence_suffix(&self.target_id).map(|(contig, _)| contig).ok_or_else(|| {
            MalformedTargetId{ target_id: self.target_id.clone() }
        })
    }
}

/// Splits `target_id` into the contig name and the occurrence number.
///
/// Returns None if `target_id` does not end in `_<digits>`.
pub fn split_occurrence_suffix(
    target_id: &str,
) -> Option<(&str, &str)> {
    let (contig, suffix) = target_id.rsplit_once('_')?;
    if !suffix.is_empty() && suffix.bytes().all(|x| x.is_ascii_digit()) {
        Some((contig, suffix))
    } else {
        None
    }
}

/// Convert SSEARCH36 output from [Read] to intermediate .tsv data in [Write].
///
/// Returns the number of alignment records written.
///
/// ## Usage
///
/// ```rust
/// use mirtargets::parse_from_read_to_write;
/// use mirtargets::Orientation;
/// use std::io::Cursor;
///
/// let mut report: Vec<u8> = Vec::new();
/// report.append(&mut b"  1>>>mir156a - 21 nt\n".to_vec());
/// report.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
/// report.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
/// report.append(&mut b"\n".to_vec());
/// report.append(&mut b"mir156 GTGCTCACTCTCTTCTGTCAA\n".to_vec());
/// report.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
/// report.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(report);
/// let mut output: Vec<u8> = Vec::new();
/// let n_records = parse_from_read_to_write(Orientation::Forward, &mut input, &mut output).unwrap();
///
/// let expected = b"mir156a\tchr1_1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec();
///
/// assert_eq!(n_records, 1);
/// assert_eq!(output, expected);
/// ```
///
pub fn parse_from_read_to_write<R: Read, W: Write>(
    orientation: Orientation,
    conn_in: &mut R,
    conn_out: &mut W,
) -> Result<usize, E> {
    let mut reader = crate::parser::ReportParser::new(conn_in, orientation)?;
    let mut printer = crate::printer::Printer::new(&mut reader);
    let mut n_records = 0;
    for line in printer.by_ref() {
        conn_out.write_all(&line?)?;
        n_records += 1;
    }
    conn_out.flush()?;
    info!("Wrote {} alignment records", n_records);
    Ok(n_records)
}

/// Score intermediate .tsv data from [Read] and write the accepted alignments to [Write].
///
/// Alignments rejected by the cutoffs are written to `conn_failed` if it is
/// given. Alignments that pass the cutoffs but have too many G:U pairs are
/// only counted in the returned [ScoringStats].
///
/// ## Usage
///
/// ```rust
/// use mirtargets::score_from_read_to_write;
/// use mirtargets::config::ScoringConfig;
/// use std::io::Cursor;
///
/// let mut records: Vec<u8> = Vec::new();
/// records.append(&mut b"mir156a\tchr1_1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec());
/// // Same alignment again, only the first one is scored
/// records.append(&mut b"mir156a\tchr1_2\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec());
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(records);
/// let mut output: Vec<u8> = Vec::new();
/// let stats = score_from_read_to_write(&ScoringConfig::default(), &mut input, &mut output, None).unwrap();
///
/// let mut expected: Vec<u8> = Vec::new();
/// expected.append(&mut b"#query_id\tsubject_id\tmatch_aln\tquery_aln\tsubject_aln\tq_start\tq_end\ts_start\ts_end\texpect_value\tstrand\n".to_vec());
/// expected.append(&mut b"mir156a\tchr1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t1.5\t+\n".to_vec());
///
/// assert_eq!(output, expected);
/// assert_eq!(stats.accepted, 1);
/// assert_eq!(stats.duplicates, 1);
/// ```
///
pub fn score_from_read_to_write<R: Read, W: Write>(
    config: &ScoringConfig,
    conn_in: &mut R,
    conn_out: &mut W,
    conn_failed: Option<&mut dyn Write>,
) -> Result<ScoringStats, E> {
    let mut reader = crate::parser::tsv::RecordReader::new(conn_in);
    score_records(config, &mut reader, conn_out, conn_failed)
}

/// Parse SSEARCH36 output from [Read], score it, and write the accepted alignments to [Write].
///
/// Equivalent to [parse_from_read_to_write] followed by
/// [score_from_read_to_write] without the intermediate .tsv data. The
/// orientation in `config` is used for both stages.
///
/// ## Usage
///
/// ```rust
/// use mirtargets::run_from_read_to_write;
/// use mirtargets::config::ScoringConfig;
/// use std::io::Cursor;
///
/// let mut report: Vec<u8> = Vec::new();
/// report.append(&mut b"  1>>>mir156a - 21 nt\n".to_vec());
/// report.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
/// report.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
/// report.append(&mut b"\n".to_vec());
/// report.append(&mut b"mir156 GTGCTCACTCTCTTCTGTCAA\n".to_vec());
/// report.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
/// report.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());
///
/// let mut input: Cursor<Vec<u8>> = Cursor::new(report);
/// let mut output: Vec<u8> = Vec::new();
/// let stats = run_from_read_to_write(&ScoringConfig::default(), &mut input, &mut output, None).unwrap();
///
/// let mut expected: Vec<u8> = Vec::new();
/// expected.append(&mut b"#query_id\tsubject_id\tmatch_aln\tquery_aln\tsubject_aln\tq_start\tq_end\ts_start\ts_end\texpect_value\tstrand\n".to_vec());
/// expected.append(&mut b"mir156a\tchr1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t1.5\t+\n".to_vec());
///
/// assert_eq!(output, expected);
/// assert_eq!(stats.accepted, 1);
/// ```
///
pub fn run_from_read_to_write<R: Read, W: Write>(
    config: &ScoringConfig,
    conn_in: &mut R,
    conn_out: &mut W,
    conn_failed: Option<&mut dyn Write>,
) -> Result<ScoringStats, E> {
    let mut reader = crate::parser::ReportParser::new(conn_in, config.orientation)?;
    score_records(config, &mut reader, conn_out, conn_failed)
}

/// Scores every record from `records` and writes the results.
///
/// Writes the final .tsv header line to `conn_out` before the first record.
pub fn score_records<I, W: Write>(
    config: &ScoringConfig,
    records: &mut I,
    conn_out: &mut W,
    mut conn_failed: Option<&mut dyn Write>,
) -> Result<ScoringStats, E>
where I: Iterator<Item=Result<AlignmentRecord, E>> {
    let mut scorer = PenaltyScorer::new(config.clone())?;

    format_scored_header(conn_out)?;
    for record in records {
        let record = record?;
        match scorer.evaluate(&record)? {
            Some(Classification::Accepted(penalty)) => {
                let target_id = if config.keep_target_suffix {
                    record.target_id.as_str()
                } else {
                    record.contig_id()?
                };
                format_scored_line(&record, target_id, penalty.score, conn_out)?;
            },
            Some(Classification::RejectedByCutoffs(penalty)) => {
                if let Some(conn) = conn_failed.as_mut() {
                    format_scored_line(&record, &record.target_id, penalty.score, conn)?;
                }
            },
            // Counted by `scorer`, not written anywhere.
            Some(Classification::RejectedByGu(_)) => {},
            Some(Classification::Duplicate) => {},
            None => {},
        }
    }
    conn_out.flush()?;
    if let Some(conn) = conn_failed.as_mut() {
        conn.flush()?;
    }

    let stats = scorer.stats().clone();
    info!("{}", stats);
    Ok(stats)
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn split_occurrence_suffix_valid() {
        use super::split_occurrence_suffix;

        assert_eq!(split_occurrence_suffix("chr1_12"), Some(("chr1", "12")));
        assert_eq!(split_occurrence_suffix("scaffold_3_1"), Some(("scaffold_3", "1")));
    }

    #[test]
    fn split_occurrence_suffix_invalid() {
        use super::split_occurrence_suffix;

        assert_eq!(split_occurrence_suffix("chr1"), None);
        assert_eq!(split_occurrence_suffix("chr1_"), None);
        assert_eq!(split_occurrence_suffix("chr1_a2"), None);
    }

    #[test]
    fn contig_id_errors_without_suffix() {
        use crate::AlignmentRecord;

        let record = AlignmentRecord{ target_id: "chr1".to_string(), ..Default::default() };
        let got = record.contig_id();

        assert!(got.is_err());
        assert_eq!(got.unwrap_err().target_id, "chr1");
    }

    #[test]
    fn parse_strand_and_orientation() {
        use crate::{Orientation, Strand};

        assert_eq!("+".parse::<Strand>(), Ok(Strand::Plus));
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Minus));
        assert!("*".parse::<Strand>().is_err());
        assert_eq!(Strand::Minus.to_string(), "-");

        assert_eq!("rev".parse::<Orientation>(), Ok(Orientation::Reverse));
        assert_eq!("forward".parse::<Orientation>(), Ok(Orientation::Forward));
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn score_records_writes_failed_to_sink() {
        use super::score_from_read_to_write;
        use crate::config::ScoringConfig;
        use std::io::Cursor;
        use std::io::Write;

        // hsp_length 10 is below the default hsp_cutoff of 14
        let data: Vec<u8> = b"mir156a\tchr1_1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t10\n".to_vec();

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let mut output: Vec<u8> = Vec::new();
        let mut failed: Vec<u8> = Vec::new();
        let stats = score_from_read_to_write(&ScoringConfig::default(), &mut input, &mut output, Some(&mut failed as &mut dyn Write)).unwrap();

        let expected_output = b"#query_id\tsubject_id\tmatch_aln\tquery_aln\tsubject_aln\tq_start\tq_end\ts_start\ts_end\texpect_value\tstrand\n".to_vec();
        let expected_failed = b"mir156a\tchr1_1\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t1.5\t+\n".to_vec();

        assert_eq!(output, expected_output);
        assert_eq!(failed, expected_failed);
        assert_eq!(stats.rejected_by_cutoffs, 1);
        assert_eq!(stats.accepted, 0);
    }

    #[test]
    fn score_records_keeps_target_suffix() {
        use super::score_from_read_to_write;
        use crate::config::ScoringConfig;
        use std::io::Cursor;

        let data: Vec<u8> = b"mir156a\tchr1_4\t:::::::::: ::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCGCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec();
        let config = ScoringConfig{ keep_target_suffix: true, ..Default::default() };

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let mut output: Vec<u8> = Vec::new();
        score_from_read_to_write(&config, &mut input, &mut output, None).unwrap();

        let got = String::from_utf8(output).unwrap();
        let line = got.lines().nth(1).unwrap();

        assert!(line.starts_with("mir156a\tchr1_4\t"));
    }

    #[test]
    fn score_records_drops_gu_rejected() {
        use super::score_from_read_to_write;
        use crate::config::ScoringConfig;
        use std::io::Cursor;
        use std::io::Write;

        // Two G:U pairs at positions 14 and 15, GUs_cutoff lowered to 1.
        // Passes all other cutoffs but is written to neither output.
        let data: Vec<u8> = b"mir156a\tchr1_1\t::::::..:::::::::::::\tGTGCTCACTCTCTTCTGTCAA\tGTGCTCACTCTCTTCTGTCAA\t21\t1\t52164\t52205\t+\t20\n".to_vec();
        let config = ScoringConfig{ gus_cutoff: 1, ..Default::default() };

        let mut input: Cursor<Vec<u8>> = Cursor::new(data);
        let mut output: Vec<u8> = Vec::new();
        let mut failed: Vec<u8> = Vec::new();
        let stats = score_from_read_to_write(&config, &mut input, &mut output, Some(&mut failed as &mut dyn Write)).unwrap();

        assert_eq!(output.iter().filter(|x| **x == b'\n').count(), 1);
        assert!(failed.is_empty());
        assert_eq!(stats.rejected_by_gu, 1);
    }

    #[test]
    fn run_matches_parse_then_score() {
        use super::{parse_from_read_to_write, run_from_read_to_write, score_from_read_to_write};
        use crate::config::ScoringConfig;
        use crate::Orientation;
        use std::io::Cursor;

        let mut report: Vec<u8> = Vec::new();
        report.append(&mut b"  1>>>mir156a - 21 nt\n".to_vec());
        report.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
        report.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
        report.append(&mut b"mir156 GTGCTCACTCTCTTCTGTCAA\n".to_vec());
        report.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
        report.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());
        report.append(&mut b">--\n".to_vec());
        report.append(&mut b"Smith-Waterman score: 80; 90.5% identity (95.2% similar) in 21 nt overlap (1-21:1000-1020)\n".to_vec());
        report.append(&mut b"mir156 GTGCTCACTCTCTTCTGTCAA\n".to_vec());
        report.append(&mut b"       ::::::::::.:: :::::::\n".to_vec());
        report.append(&mut b"chr1   GTGCTCACTCTCTGCTGTCAA\n".to_vec());

        let config = ScoringConfig::default();

        let mut intermediate: Vec<u8> = Vec::new();
        parse_from_read_to_write(Orientation::Forward, &mut Cursor::new(report.clone()), &mut intermediate).unwrap();
        let mut two_step: Vec<u8> = Vec::new();
        score_from_read_to_write(&config, &mut Cursor::new(intermediate), &mut two_step, None).unwrap();

        let mut one_step: Vec<u8> = Vec::new();
        run_from_read_to_write(&config, &mut Cursor::new(report), &mut one_step, None).unwrap();

        assert_eq!(one_step, two_step);
        assert_eq!(String::from_utf8(one_step).unwrap().lines().count(), 3);
    }
}
