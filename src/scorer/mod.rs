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

//! psRNATarget penalty scoring for [AlignmentRecord] records.
//!
//! Scores the first `alignment_length` positions from the 5' end of the
//! miRNA (Fahlgren 2009). Mismatches cost 1, gap openings 2, gap extensions
//! and G:U pairs 0.5. Mismatches and gaps in the seed region are multiplied
//! by `penalty_multiplier`; G:U pairs never are. Each gapped position on the
//! query side adds `extra_penalty_query_gap` on top.
//!
//! Note that what psRNATarget calls G:U pairs are the `.` columns of the
//! SSEARCH36 match string.
//!
//! ## Usage
//!
//! ```rust
//! use mirtargets::{AlignmentRecord, Strand};
//! use mirtargets::config::ScoringConfig;
//! use mirtargets::scorer::{Classification, PenaltyScorer};
//!
//! let record = AlignmentRecord{
//!     query_id: "mir156a".to_string(),
//!     target_id: "chr1_1".to_string(),
//!     match_string: ":::::::::: ::::::::::".to_string(),
//!     query_string: "GTGCTCACTCTCTTCTGTCAA".to_string(),
//!     subject_string: "GTGCTCACTCGCTTCTGTCAA".to_string(),
//!     q_start: 21, q_end: 1, start: 52164, end: 52205,
//!     strand: Strand::Plus, hsp_length: 20,
//! };
//!
//! let mut scorer = PenaltyScorer::new(ScoringConfig::default()).unwrap();
//!
//! match scorer.evaluate(&record).unwrap() {
//!     Some(Classification::Accepted(penalty)) => assert_eq!(penalty.score, 1.5),
//!     _ => panic!("expected an accepted alignment"),
//! }
//!
//! // The same alignment again is a duplicate
//! assert_eq!(scorer.evaluate(&record).unwrap(), Some(Classification::Duplicate));
//! ```
//!

pub mod event;

use crate::AlignmentRecord;
use crate::Orientation;
use crate::Strand;
use crate::config::ScoringConfig;
use crate::scorer::event::AlignmentEvent;
use crate::scorer::event::GapStates;

use std::collections::HashMap;

use log::debug;

type E = Box<dyn std::error::Error>;

/// Accepted range of subject string lengths, spaces excluded.
const SUBJECT_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 20..=23;

#[derive(Debug, Clone)]
pub struct UnrecognizedSymbol {
    pub query_id: String,
    pub target_id: String,
    pub position: usize,
    pub symbol: char,
    pub query: char,
    pub subject: char,
    pub gaps: GapStates,
}

impl std::fmt::Display for UnrecognizedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "unrecognized alignment symbol in {} vs {} at position {}: [{}] [{}] [{}] subject gap {}, query gap {}",
               self.query_id, self.target_id, self.position,
               self.symbol, self.query, self.subject,
               self.gaps.subject, self.gaps.query)
    }
}

impl std::error::Error for UnrecognizedSymbol {}

#[derive(Debug, Clone)]
pub struct UnequalAlignmentRows {
    pub query_id: String,
    pub target_id: String,
}

impl std::fmt::Display for UnequalAlignmentRows {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "alignment rows of {} vs {} have different lengths", self.query_id, self.target_id)
    }
}

impl std::error::Error for UnequalAlignmentRows {}

/// Penalty score and the counters it was derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PenaltyScore {
    /// Sum of the position penalties and the extra query gap penalties.
    pub score: f64,
    pub seed_mismatches: u32,
    pub total_mismatches: u32,
    pub gaps: u32,
    pub gu_count: u32,
}

/// Outcome of [PenaltyScorer::evaluate].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Classification {
    Accepted(PenaltyScore),
    RejectedByCutoffs(PenaltyScore),
    /// Passed the cutoffs but has more than `gus_cutoff` G:U pairs.
    RejectedByGu(PenaltyScore),
    Duplicate,
}

/// Identifies alignments of a query to the same target region.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub strand: Strand,
    pub query_id: String,
    pub contig_id: String,
    pub q_end: i64,
    pub q_start: i64,
    pub start: i64,
    pub end: i64,
}

impl DedupKey {
    pub fn from_record(
        record: &AlignmentRecord,
    ) -> Result<Self, E> {
        Ok(DedupKey {
            strand: record.strand,
            query_id: record.query_id.clone(),
            contig_id: record.contig_id()?.to_string(),
            q_end: record.q_end,
            q_start: record.q_start,
            start: record.start,
            end: record.end,
        })
    }
}

/// Record counts from a scoring run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoringStats {
    /// Records that passed the subject length filter.
    pub records: usize,
    /// Records discarded by the subject length filter.
    pub filtered: usize,
    pub duplicates: usize,
    pub accepted: usize,
    pub rejected_by_cutoffs: usize,
    pub rejected_by_gu: usize,
}

impl std::fmt::Display for ScoringStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} alignments: {} accepted, {} rejected by cutoffs, {} rejected by G:U count, {} duplicates ({} skipped by length)",
               self.records, self.accepted, self.rejected_by_cutoffs, self.rejected_by_gu, self.duplicates, self.filtered)
    }
}

/// Returns true if the subject string without spaces has 20 to 23 characters.
pub fn passes_length_filter(
    record: &AlignmentRecord,
) -> bool {
    let n = record.subject_string.chars().filter(|x| !x.is_whitespace()).count();
    SUBJECT_LENGTH_RANGE.contains(&n)
}

/// The scored part of the alignment rows, 5' end of the miRNA first.
///
/// Returns the match, query, and subject rows in that order.
pub fn scoring_window(
    record: &AlignmentRecord,
    config: &ScoringConfig,
) -> (Vec<char>, Vec<char>, Vec<char>) {
    let window = |row: &str| -> Vec<char> {
        match config.orientation {
            Orientation::Reverse => row.chars().take(config.alignment_length).collect(),
            Orientation::Forward => row.chars().rev().take(config.alignment_length).collect(),
        }
    };
    (window(&record.match_string), window(&record.query_string), window(&record.subject_string))
}

/// Compute the penalty score of `record`.
///
/// Depends only on the alignment rows and `config`.
///
/// Terminates with an [UnrecognizedSymbol] if the match string contains
/// something other than ` `, `.`, or `:` inside the scored window, and with
/// [UnequalAlignmentRows] if the rows have different lengths.
///
pub fn compute_penalty(
    record: &AlignmentRecord,
    config: &ScoringConfig,
) -> Result<PenaltyScore, E> {
    if !record.has_equal_lengths() {
        return Err(Box::new(UnequalAlignmentRows{ query_id: record.query_id.clone(), target_id: record.target_id.clone() }))
    }

    let (symbols, query, subject) = scoring_window(record, config);

    let mut res = PenaltyScore::default();
    let mut gaps = GapStates::default();
    let mut extra_query_gap_penalty: i64 = 0;

    for (idx, ((symbol, q), s)) in symbols.iter().zip(query.iter()).zip(subject.iter()).enumerate() {
        let position = idx + 1;
        let before = gaps;
        let event = gaps.classify(*symbol, *q, *s);

        if event == AlignmentEvent::Invalid {
            return Err(Box::new(UnrecognizedSymbol{
                query_id: record.query_id.clone(),
                target_id: record.target_id.clone(),
                position,
                symbol: *symbol, query: *q, subject: *s,
                gaps: before,
            }))
        }

        let mut cost = event.cost();
        if event.is_mismatch() {
            res.total_mismatches += 1;
        }
        if event.is_gap() {
            res.gaps += 1;
        }
        if event.is_query_gap() {
            extra_query_gap_penalty += config.extra_penalty_query_gap;
        }
        if event == AlignmentEvent::Wobble {
            res.gu_count += 1;
        }
        if event.is_mismatch() && config.in_seed(position) {
            cost *= config.penalty_multiplier;
            res.seed_mismatches += 1;
        }
        res.score += cost;

        debug!("    {}:{}    {}    {} {} {}", position, cost, res.score, q, symbol, s);
    }
    res.score += extra_query_gap_penalty as f64;

    Ok(res)
}

/// Returns true if `penalty` passes every cutoff in `config` except the G:U count.
pub fn passes_cutoffs(
    record: &AlignmentRecord,
    penalty: &PenaltyScore,
    config: &ScoringConfig,
) -> bool {
    penalty.score <= config.e_cutoff &&
        penalty.seed_mismatches <= config.num_mismatch_seed &&
        record.hsp_length >= config.hsp_cutoff &&
        penalty.gaps <= config.gap_cutoff &&
        penalty.total_mismatches <= config.total_mismatches_cutoff &&
        record.subject_string.chars().count() <= config.maximum_alignment_length
}

/// Classifies alignments one at a time.
///
/// Keeps track of the alignments seen so far, only the first alignment of a
/// query to a given target region is scored.
pub struct PenaltyScorer {
    config: ScoringConfig,
    seen: HashMap<DedupKey, usize>,
    stats: ScoringStats,
}

impl PenaltyScorer {
    /// Terminates with an [InvalidConfig](crate::config::InvalidConfig) if
    /// the seed region does not fit the scored window.
    pub fn new(
        config: ScoringConfig,
    ) -> Result<Self, E> {
        config.validate()?;
        Ok(PenaltyScorer {
            config,
            seen: HashMap::new(),
            stats: ScoringStats::default(),
        })
    }

    pub fn config(
        &self,
    ) -> &ScoringConfig {
        &self.config
    }

    pub fn stats(
        &self,
    ) -> &ScoringStats {
        &self.stats
    }

    /// Number of times an alignment with `key` has been evaluated.
    pub fn seen_count(
        &self,
        key: &DedupKey,
    ) -> usize {
        self.seen.get(key).copied().unwrap_or(0)
    }

    /// Classify `record`.
    ///
    /// Returns None if the subject string is too short or too long to be
    /// scored. These records are not counted as rejections.
    ///
    /// Terminates with a [MalformedTargetId](crate::MalformedTargetId) if
    /// the target id has no occurrence suffix, or with the errors from
    /// [compute_penalty].
    ///
    pub fn evaluate(
        &mut self,
        record: &AlignmentRecord,
    ) -> Result<Option<Classification>, E> {
        if !passes_length_filter(record) {
            self.stats.filtered += 1;
            return Ok(None)
        }
        self.stats.records += 1;

        let key = DedupKey::from_record(record)?;
        let count = self.seen.entry(key).or_insert(0);
        *count += 1;
        if *count > 1 {
            self.stats.duplicates += 1;
            return Ok(Some(Classification::Duplicate))
        }

        debug!("Processing: {}\t{}", record.query_id, record.target_id);
        let penalty = compute_penalty(record, &self.config)?;

        let res = if !passes_cutoffs(record, &penalty, &self.config) {
            self.stats.rejected_by_cutoffs += 1;
            Classification::RejectedByCutoffs(penalty)
        } else if penalty.gu_count > self.config.gus_cutoff {
            self.stats.rejected_by_gu += 1;
            Classification::RejectedByGu(penalty)
        } else {
            self.stats.accepted += 1;
            Classification::Accepted(penalty)
        };

        Ok(Some(res))
    }
}
