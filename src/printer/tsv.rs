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
use std::io::Write;

use crate::AlignmentRecord;

type E = Box<dyn std::error::Error>;

/// Header line of the scored .tsv output.
pub const SCORED_HEADER: &str = "#query_id\tsubject_id\tmatch_aln\tquery_aln\tsubject_aln\tq_start\tq_end\ts_start\ts_end\texpect_value\tstrand";

/// Format a single alignment in the intermediate .tsv format
///
/// Writes bytes containing the formatted line containing the contents of
/// `record` to `conn`.
///
pub fn format_record_line<W: Write>(
    record: &AlignmentRecord,
    conn: &mut W,
) -> Result<(), E> {
    let separator: char = '\t';
    let fields: [String; 11] = [
        record.query_id.clone(),
        record.target_id.clone(),
        record.match_string.clone(),
        record.query_string.clone(),
        record.subject_string.clone(),
        record.q_start.to_string(),
        record.q_end.to_string(),
        record.start.to_string(),
        record.end.to_string(),
        record.strand.to_string(),
        record.hsp_length.to_string(),
    ];
    let mut formatted: String = fields.join(&separator.to_string());
    formatted += "\n";

    conn.write_all(formatted.as_bytes())?;
    Ok(())
}

/// Writes [SCORED_HEADER] to `conn`.
pub fn format_scored_header<W: Write>(
    conn: &mut W,
) -> Result<(), E> {
    conn.write_all(SCORED_HEADER.as_bytes())?;
    conn.write_all(b"\n")?;
    Ok(())
}

/// Format a single scored alignment
///
/// The penalty `score` goes in the `expect_value` column and the target id
/// is written as `target_id`, which lets the caller decide whether the
/// occurrence suffix is kept.
///
pub fn format_scored_line<W: Write>(
    record: &AlignmentRecord,
    target_id: &str,
    score: f64,
    conn: &mut W,
) -> Result<(), E> {
    let formatted = format!("{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                            record.query_id, target_id,
                            record.match_string, record.query_string, record.subject_string,
                            record.q_start, record.q_end, record.start, record.end,
                            score, record.strand);
    conn.write_all(formatted.as_bytes())?;
    Ok(())
}
