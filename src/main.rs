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
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use log::error;

use mirtargets::Orientation;
use mirtargets::config::ScoringConfig;
use mirtargets::streams::open_failed_output;
use mirtargets::streams::open_input;

mod cli;

type E = Box<dyn std::error::Error>;

/// Initializes the logger with verbosity given in `log_max_level`.
fn init_log(log_max_level: usize) -> Result<(), log::SetLoggerError> {
    stderrlog::new()
    .module(module_path!())
    .quiet(false)
    .verbosity(log_max_level)
    .timestamp(stderrlog::Timestamp::Off)
    .init()
}

fn verbosity(verbose: bool) -> usize {
    if verbose { 3 } else { 1 }
}

/// Scores the records in `input_file`, parsing them from SSEARCH36 output
/// first if `from_report` is set.
fn score(
    input_file: &Option<PathBuf>,
    config: &ScoringConfig,
    failed_file: &Option<PathBuf>,
    from_report: bool,
) -> Result<(), E> {
    config.validate()?;

    let mut conn_failed = match failed_file {
        Some(path) => Some(open_failed_output(path)?),
        None => None,
    };
    let mut conn_in = open_input(input_file.as_deref())?;
    let mut conn_out = BufWriter::new(std::io::stdout().lock());

    let failed = conn_failed.as_mut().map(|x| x as &mut dyn Write);
    if from_report {
        mirtargets::run_from_read_to_write(config, &mut conn_in, &mut conn_out, failed)?;
    } else {
        mirtargets::score_from_read_to_write(config, &mut conn_in, &mut conn_out, failed)?;
    }
    Ok(())
}

fn run(
    cli: &cli::Cli,
) -> Result<(), E> {
    // Subcommands:
    match &cli.command {
        // Parse
        Some(cli::Commands::Parse {
            input_file,
            rev,
            verbose,
        }) => {
            init_log(verbosity(*verbose))?;

            let orientation = if *rev { Orientation::Reverse } else { Orientation::Forward };
            let mut conn_in = open_input(input_file.as_deref())?;
            let mut conn_out = BufWriter::new(std::io::stdout().lock());

            mirtargets::parse_from_read_to_write(orientation, &mut conn_in, &mut conn_out)?;
            conn_out.flush()?;
        },

        // Score
        Some(cli::Commands::Score {
            input_file,
            scoring,
            failed_file,
            verbose,
        }) => {
            init_log(verbosity(*verbose))?;
            score(input_file, &scoring.to_config(), failed_file, false)?;
        },

        // Run
        Some(cli::Commands::Run {
            input_file,
            scoring,
            failed_file,
            verbose,
        }) => {
            init_log(verbosity(*verbose))?;
            score(input_file, &scoring.to_config(), failed_file, true)?;
        },

        None => {
            cli::Cli::command().print_help()?;
        },
    }
    Ok(())
}

fn is_broken_pipe(
    err: &E,
) -> bool {
    err.downcast_ref::<std::io::Error>().is_some_and(|e| e.kind() == std::io::ErrorKind::BrokenPipe)
}

/// Exit status for a run that ended in `err`.
///
/// A closed stdout ends the run quietly.
fn exit_status(
    err: &E,
) -> i32 {
    if is_broken_pipe(err) {
        0
    } else {
        error!("{}", err);
        1
    }
}

fn main() {
    let cli = cli::Cli::parse();

    if let Err(e) = run(&cli) {
        std::process::exit(exit_status(&e));
    }
}

// Tests
#[cfg(test)]
mod tests {

    struct FailingWriter {
        kind: std::io::ErrorKind,
    }

    impl std::io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(self.kind))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(self.kind))
        }
    }

    fn report() -> Vec<u8> {
        let mut data: Vec<u8> = Vec::new();
        data.append(&mut b"  1>>>ath-miR156a - 21 nt\n".to_vec());
        data.append(&mut b">>chr1 Chromosome 1 (100000 nt)\n".to_vec());
        data.append(&mut b"Smith-Waterman score: 95; 95.2% identity (100.0% similar) in 21 nt overlap (1-21:52164-52184)\n".to_vec());
        data.append(&mut b"ath-mi GTGCTCACTCTCTTCTGTCAA\n".to_vec());
        data.append(&mut b"       :::::::::: ::::::::::\n".to_vec());
        data.append(&mut b"chr1   GTGCTCACTCGCTTCTGTCAA\n".to_vec());
        data
    }

    #[test]
    fn closed_stdout_exits_quietly() {
        use super::{exit_status, is_broken_pipe};
        use mirtargets::config::ScoringConfig;
        use mirtargets::Orientation;
        use std::io::{Cursor, ErrorKind};

        let mut conn_out = FailingWriter{ kind: ErrorKind::BrokenPipe };
        let err = mirtargets::parse_from_read_to_write(Orientation::Forward, &mut Cursor::new(report()), &mut conn_out).unwrap_err();

        assert!(is_broken_pipe(&err));
        assert_eq!(exit_status(&err), 0);

        let err = mirtargets::run_from_read_to_write(&ScoringConfig::default(), &mut Cursor::new(report()), &mut conn_out, None).unwrap_err();

        assert!(is_broken_pipe(&err));
        assert_eq!(exit_status(&err), 0);
    }

    #[test]
    fn other_errors_exit_with_failure() {
        use super::{exit_status, is_broken_pipe, E};
        use mirtargets::Orientation;
        use std::io::{Cursor, ErrorKind};

        let mut conn_out = FailingWriter{ kind: ErrorKind::PermissionDenied };
        let err = mirtargets::parse_from_read_to_write(Orientation::Forward, &mut Cursor::new(report()), &mut conn_out).unwrap_err();

        assert!(!is_broken_pipe(&err));
        assert_eq!(exit_status(&err), 1);

        let err: E = "corrupt report at line 5".into();
        assert!(!is_broken_pipe(&err));
        assert_eq!(exit_status(&err), 1);
    }
}
