use std::collections::HashMap;
use std::path::Path;

use log::debug;

use crate::hcv::config_reader::{PositionConfig, SourceLayout};

/// One row of the source file, stripped of the identifier and ignored columns.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub lineno: usize,
    pub choices: Vec<String>,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Keeps the last row of each voter. Rows without an identifier are all kept.
///
/// The kept rows stay in file order.
pub fn keep_last_by_id(rows: Vec<ParsedBallot>) -> Vec<ParsedBallot> {
    let mut last_row: HashMap<String, usize> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if let Some(id) = &row.id {
            if let Some(previous) = last_row.insert(id.clone(), idx) {
                debug!(
                    "keep_last_by_id: voter {:?} on line {} replaces line {}",
                    id, row.lineno, rows[previous].lineno
                );
            }
        }
    }
    rows.into_iter()
        .enumerate()
        .filter(|(idx, row)| match &row.id {
            Some(id) => last_row.get(id) == Some(idx),
            None => true,
        })
        .map(|(_, row)| row)
        .collect()
}

/// Splits every row into the ballots of each position.
///
/// With the multiple layout, each position takes as many columns as it has
/// candidates, in the order of the positions. Short rows give short ballots.
pub fn split_positions(
    rows: &[ParsedBallot],
    positions: &[PositionConfig],
    layout: SourceLayout,
) -> Vec<Vec<Vec<String>>> {
    match layout {
        SourceLayout::Single => {
            vec![rows.iter().map(|r| r.choices.clone()).collect()]
        }
        SourceLayout::Multiple => {
            let mut res: Vec<Vec<Vec<String>>> = positions.iter().map(|_| Vec::new()).collect();
            for row in rows.iter() {
                let mut start = 0;
                for (pidx, pc) in positions.iter().enumerate() {
                    let end = (start + pc.candidates.len()).min(row.choices.len());
                    let fields = row.choices.get(start..end).unwrap_or_default();
                    res[pidx].push(fields.to_vec());
                    start += pc.candidates.len();
                }
            }
            res
        }
    }
}
