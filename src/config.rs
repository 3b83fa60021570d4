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
use crate::Orientation;

#[derive(Debug, Clone)]
pub struct InvalidConfig {
    pub message: String,
}

impl std::fmt::Display for InvalidConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid scoring configuration: {}", self.message)
    }
}

impl std::error::Error for InvalidConfig {}

/// Cutoffs and penalties used by [PenaltyScorer](crate::scorer::PenaltyScorer).
///
/// The defaults reproduce the psRNATarget settings.
///
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    /// Maximum penalty score (`expect_value`) of an accepted alignment.
    pub e_cutoff: f64,
    /// Maximum number of mismatches and gaps in the seed region.
    pub num_mismatch_seed: u32,
    pub hsp_cutoff: i64,
    pub gap_cutoff: u32,
    pub gus_cutoff: u32,
    /// Multiplier for mismatch and gap penalties in the seed region.
    pub penalty_multiplier: f64,
    /// First position (1-based) of the seed region.
    pub seed_start: usize,
    /// Last position (1-based, inclusive) of the seed region.
    pub seed_end: usize,
    /// Number of positions from the 5' end of the miRNA that are scored.
    pub alignment_length: usize,
    pub maximum_alignment_length: usize,
    pub total_mismatches_cutoff: u32,
    /// Added to the score for every gapped position on the query side.
    pub extra_penalty_query_gap: i64,
    pub orientation: Orientation,
    pub keep_target_suffix: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            e_cutoff: 5.0,
            num_mismatch_seed: 2,
            hsp_cutoff: 14,
            gap_cutoff: 1,
            gus_cutoff: 7,
            penalty_multiplier: 1.5,
            seed_start: 2,
            seed_end: 13,
            alignment_length: 19,
            maximum_alignment_length: 22,
            total_mismatches_cutoff: 8,
            extra_penalty_query_gap: 1,
            orientation: Orientation::Forward,
            keep_target_suffix: false,
        }
    }
}

impl ScoringConfig {
    /// Checks that the seed region fits inside the scored window.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.seed_start >= self.seed_end {
            return Err(InvalidConfig{ message: format!("seed_start ({}) has to be smaller than seed_end ({})", self.seed_start, self.seed_end) });
        }
        if self.seed_start < 1 {
            return Err(InvalidConfig{ message: "seed_start has to be 1 or greater".to_string() });
        }
        if self.alignment_length < self.seed_end {
            return Err(InvalidConfig{ message: format!("alignment_length ({}) has to be >= seed_end ({})", self.alignment_length, self.seed_end) });
        }
        Ok(())
    }

    /// Returns true if 1-based `position` is inside the seed region.
    pub fn in_seed(&self, position: usize) -> bool {
        position >= self.seed_start && position <= self.seed_end
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn default_is_valid() {
        use super::ScoringConfig;

        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn seed_start_after_seed_end() {
        use super::ScoringConfig;

        let config = ScoringConfig{ seed_start: 13, seed_end: 2, ..Default::default() };

        assert!(config.validate().is_err());
    }

    #[test]
    fn seed_start_equals_seed_end() {
        use super::ScoringConfig;

        let config = ScoringConfig{ seed_start: 5, seed_end: 5, ..Default::default() };

        assert!(config.validate().is_err());
    }

    #[test]
    fn seed_start_zero() {
        use super::ScoringConfig;

        let config = ScoringConfig{ seed_start: 0, ..Default::default() };
        let got = config.validate().unwrap_err();

        assert_eq!(got.message, "seed_start has to be 1 or greater");
    }

    #[test]
    fn window_shorter_than_seed() {
        use super::ScoringConfig;

        let config = ScoringConfig{ alignment_length: 12, ..Default::default() };

        assert!(config.validate().is_err());
    }

    #[test]
    fn seed_bounds_are_inclusive() {
        use super::ScoringConfig;

        let config = ScoringConfig::default();

        assert!(!config.in_seed(1));
        assert!(config.in_seed(2));
        assert!(config.in_seed(13));
        assert!(!config.in_seed(14));
    }
}
