// Primitives for reading CSV files.

use std::fs::File;

use crate::hcv::io_common::ParsedBallot;
use crate::hcv::*;

/// Reads the rows of ballots, starting at `firstVoteRowIndex`.
///
/// The identifier column and the ignored columns are removed from the choices.
/// Blank fields are kept so that the columns of each position can be found later.
pub fn read_csv_rows(path: &str, cfs: &FileSource) -> HcvResult<Vec<ParsedBallot>> {
    let id_idx_o = cfs.id_column_index_int()?;
    let ignored = cfs.ignore_columns_int()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let id = match id_idx_o {
            Some(id_idx) => Some(
                line.get(id_idx)
                    .context(CsvLineTooShortSnafu { lineno })?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };

        let choices: Vec<String> = line
            .iter()
            .enumerate()
            .filter(|(col, _)| Some(*col) != id_idx_o && !ignored.contains(col))
            .map(|(_, s)| s.to_string())
            .collect();
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot {
            id,
            lineno,
            choices,
        });
    }
    Ok(res)
}

fn get_records(path: &str, cfs: &FileSource) -> HcvResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    // Rows may have trailing empty fields removed by the export.
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}
