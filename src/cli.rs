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
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mirtargets::Orientation;
use mirtargets::config::ScoringConfig;

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // Convert SSEARCH36 output to the intermediate .tsv format
    Parse {
        // Input file
        #[arg(group = "input", required = false, help = "SSEARCH36 output, reads stdin if omitted or -")]
        input_file: Option<PathBuf>,

        // Orientation
        #[arg(long = "rev", default_value_t = false, help = "Query sequences were reverse complemented before alignment")]
        rev: bool,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Score alignments stored in the intermediate .tsv format
    Score {
        // Input file
        #[arg(group = "input", required = false, help = "Intermediate .tsv file, reads stdin if omitted or -")]
        input_file: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,

        // Output file for alignments that fail the cutoffs
        #[arg(short = 'o', long = "outfile_failed", required = false)]
        failed_file: Option<PathBuf>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },

    // Parse and score SSEARCH36 output
    Run {
        // Input file
        #[arg(group = "input", required = false, help = "SSEARCH36 output, reads stdin if omitted or -")]
        input_file: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,

        // Output file for alignments that fail the cutoffs
        #[arg(short = 'o', long = "outfile_failed", required = false)]
        failed_file: Option<PathBuf>,

        // Verbosity
        #[arg(long = "verbose", default_value_t = false)]
        verbose: bool,
    },
}

#[derive(Args)]
pub struct ScoringArgs {
    // Cutoffs
    #[arg(long = "E_cutoff", default_value_t = 5.0, help = "Maximum penalty score")]
    pub e_cutoff: f64,

    #[arg(long = "num_mismatch_seed", default_value_t = 2, help = "Maximum mismatches and gaps in the seed region")]
    pub num_mismatch_seed: u32,

    #[arg(long = "hsp_cutoff", default_value_t = 14, help = "Minimum aligned length")]
    pub hsp_cutoff: i64,

    #[arg(long = "gap_cutoff", default_value_t = 1, help = "Maximum gapped positions")]
    pub gap_cutoff: u32,

    #[arg(long = "GUs_cutoff", default_value_t = 7, help = "Maximum G:U pairs")]
    pub gus_cutoff: u32,

    #[arg(long = "total_mismatches_cutoff", default_value_t = 8, help = "Maximum mismatches and gaps")]
    pub total_mismatches_cutoff: u32,

    #[arg(long = "maximum_alignment_length", default_value_t = 22, help = "Maximum length of the subject alignment string")]
    pub maximum_alignment_length: usize,

    // Penalties
    #[arg(long = "penalty_multiplier", default_value_t = 1.5, help = "Multiplier for mismatches and gaps in the seed region")]
    pub penalty_multiplier: f64,

    #[arg(long = "extra_penalty_query_gap", default_value_t = 1, help = "Extra penalty for each gapped position in the query")]
    pub extra_penalty_query_gap: i64,

    // Scored window
    #[arg(long = "seed_start", default_value_t = 2, help = "First position of the seed region from the miRNA 5' end")]
    pub seed_start: usize,

    #[arg(long = "seed_end", default_value_t = 13, help = "Last position of the seed region from the miRNA 5' end")]
    pub seed_end: usize,

    #[arg(long = "alignment_length", default_value_t = 19, help = "Number of positions from the miRNA 5' end to score")]
    pub alignment_length: usize,

    // Orientation
    #[arg(long = "rev", default_value_t = false, help = "Query sequences were reverse complemented before alignment")]
    pub rev: bool,

    // Output
    #[arg(long = "keep_target_suffix", default_value_t = false, help = "Keep the _<n> suffix in target ids")]
    pub keep_target_suffix: bool,
}

impl ScoringArgs {
    pub fn to_config(&self) -> ScoringConfig {
        ScoringConfig {
            e_cutoff: self.e_cutoff,
            num_mismatch_seed: self.num_mismatch_seed,
            hsp_cutoff: self.hsp_cutoff,
            gap_cutoff: self.gap_cutoff,
            gus_cutoff: self.gus_cutoff,
            penalty_multiplier: self.penalty_multiplier,
            seed_start: self.seed_start,
            seed_end: self.seed_end,
            alignment_length: self.alignment_length,
            maximum_alignment_length: self.maximum_alignment_length,
            total_mismatches_cutoff: self.total_mismatches_cutoff,
            extra_penalty_query_gap: self.extra_penalty_query_gap,
            orientation: if self.rev { Orientation::Reverse } else { Orientation::Forward },
            keep_target_suffix: self.keep_target_suffix,
        }
    }
}
