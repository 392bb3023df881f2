/*!

This is the long-form manual for `hare_clark` and `hcvote`.

## The counting rules

Each position has a number of vacancies and a list of candidates. Voters rank
the candidates in order of preference.

1. The quota is `ceil(ballots / (vacancies + 1) + 1)`. A candidate is elected
   only when their tally is strictly greater than the quota.
2. Every ballot starts with a weight of 1 and counts for its first preference.
3. In each round, all the candidates above the quota are elected together. Each
   of them passes on their surplus: the ballots sitting with them move to their
   next continuing preference, with their weight multiplied by the transfer value
   `(tally - quota) / tally`. Ballots with no continuing preference left are
   exhausted.
4. When nobody is elected in a round, the candidate with the fewest votes is
   excluded and their ballots move on at full value. Ties are broken by the order
   of the candidate list: the first candidate listed is excluded first.
5. As soon as the number of continuing candidates is no larger than the number of
   seats left, all of them are elected, in candidate-list order.

Candidates can be excluded before the first round. This is how a candidate
elected to one position is kept out of the following ones.

## Input formats

`hcvote` reads CSV files. Cells are either candidate names, which must match
exactly, or 1-based indexes into the candidate list. Blank cells are missing
preferences.

### `single`

One ballot per row, every column is a preference in rank order:

```text
First,Second,Third
Koala,Wombat,Platypus
Platypus,Koala,Wombat
```

Use `--header` (or `firstVoteRowIndex`) to skip the first row.

### `multiple`

The export of an online form with several questions, one per position. Each row
is one voter. For every position, in the order of the configuration, the next
`n` columns are the preferences of that position, where `n` is its number of
candidates. Columns listed in `ignoreColumns` (for example a timestamp) are
skipped, and `idColumnIndex` points to a column identifying the voter: when a
voter appears several times, only their last row is kept.

|Timestamp |Student ID |President 1 |President 2 |Secretary 1 |Secretary 2 |
|----------|-----------|------------|------------|------------|------------|
|10:01     |s1         |Alice       |Bob         |Dave        |            |

## Optional preferences

By default a ballot must rank every candidate. With optional preferences
(`--optional-preferences`, or `optionalPreferences` in the configuration), voters
may leave preferences out. Gaps are removed before counting: a ballot with a
first and a third preference is counted as a first and a second preference.

Invalid ballots are dropped. Set `raiseOnInvalid` to stop with an error instead.

## Configuration

```json
{
  "outputSettings": { "contestName": "Club elections 2022" },
  "source": {
    "filePath": "responses.csv",
    "layout": "multiple",
    "firstVoteRowIndex": 2,
    "idColumnIndex": "B",
    "ignoreColumns": ["A"]
  },
  "positions": [
    { "name": "President", "vacancies": 1, "candidates": ["Alice", "Bob", "Carol"] },
    { "name": "Secretary", "vacancies": 1, "candidates": ["Alice", "Dave", "Erin"] }
  ],
  "rules": {
    "optionalPreferences": true,
    "raiseOnInvalid": false,
    "excludeElected": true
  }
}
```

Column indexes start at 1 and may also be written as spreadsheet letters. The
`filePath` is relative to the configuration file. `excludeElected` (on by
default) keeps candidates elected to a position out of the later ones.

 */
