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

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapState {
    Open,
    #[default]
    Closed,
}

impl std::fmt::Display for GapState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GapState::Open => write!(f, "open"),
            GapState::Closed => write!(f, "closed"),
        }
    }
}

/// What happened at one column of the alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignmentEvent {
    Mismatch,
    GapOpenQuery,
    GapOpenSubject,
    GapExtendQuery,
    GapExtendSubject,
    /// G:U pair, `.` in the match string.
    Wobble,
    ExactMatch,
    Invalid,
}

impl AlignmentEvent {
    /// Penalty before the seed region multiplier.
    pub fn cost(&self) -> f64 {
        match self {
            AlignmentEvent::Mismatch => 1.0,
            AlignmentEvent::GapOpenQuery | AlignmentEvent::GapOpenSubject => 2.0,
            AlignmentEvent::GapExtendQuery | AlignmentEvent::GapExtendSubject => 0.5,
            AlignmentEvent::Wobble => 0.5,
            AlignmentEvent::ExactMatch | AlignmentEvent::Invalid => 0.0,
        }
    }

    /// Mismatches and gaps, the events that count towards the mismatch
    /// cutoffs and get multiplied in the seed region.
    pub fn is_mismatch(&self) -> bool {
        matches!(self,
                 AlignmentEvent::Mismatch |
                 AlignmentEvent::GapOpenQuery | AlignmentEvent::GapOpenSubject |
                 AlignmentEvent::GapExtendQuery | AlignmentEvent::GapExtendSubject)
    }

    pub fn is_gap(&self) -> bool {
        self.is_mismatch() && *self != AlignmentEvent::Mismatch
    }

    pub fn is_query_gap(&self) -> bool {
        matches!(self, AlignmentEvent::GapOpenQuery | AlignmentEvent::GapExtendQuery)
    }
}

/// Gap state on the query and subject side.
///
/// A gap opens on the first `-` on its side and stays open until a `.` or a
/// `:` column closes both sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GapStates {
    pub query: GapState,
    pub subject: GapState,
}

impl GapStates {
    /// Classify a column and update the gap states.
    ///
    /// `symbol` is the character in the match string, `query` and `subject`
    /// the characters in the two sequences. The first matching case wins, so
    /// a column with `-` on both sides opens the query gap first.
    pub fn classify(
        &mut self,
        symbol: char,
        query: char,
        subject: char,
    ) -> AlignmentEvent {
        match symbol {
            ' ' => {
                if query != '-' && subject != '-' {
                    AlignmentEvent::Mismatch
                } else if query == '-' && self.query == GapState::Closed {
                    self.query = GapState::Open;
                    AlignmentEvent::GapOpenQuery
                } else if subject == '-' && self.subject == GapState::Closed {
                    self.subject = GapState::Open;
                    AlignmentEvent::GapOpenSubject
                } else if query == '-' {
                    AlignmentEvent::GapExtendQuery
                } else {
                    AlignmentEvent::GapExtendSubject
                }
            },
            '.' => {
                *self = GapStates::default();
                AlignmentEvent::Wobble
            },
            ':' => {
                *self = GapStates::default();
                AlignmentEvent::ExactMatch
            },
            _ => AlignmentEvent::Invalid,
        }
    }
}
