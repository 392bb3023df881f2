/*!
Counting engine for the Hare-Clark electoral system, the quota-based single
transferable vote used to fill several vacancies of one position.

```
use hare_clark::{CountRules, Position};
# use hare_clark::CountError;

let candidates = ["Anna".to_string(), "Bob".to_string(), "Clara".to_string()];
let mut position = Position::new(1, &candidates, CountRules::DEFAULT_RULES)?;
position.add_ballot(["Anna", "Bob", "Clara"])?;
position.add_ballot([2, 1, 3])?;
position.add_ballot(["Anna", "Clara", "Bob"])?;

let elected = position.count(&[], false)?;
assert_eq!(elected, vec!["Anna".to_string()]);
# Ok::<(), CountError>(())
```
*/
mod config;

pub mod builder;
pub mod manual;
pub mod quick_start;

use log::{debug, info, log, Level};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

// Index of a candidate in the roster. The ordering of the ids is the roster order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(usize);

// Continuing candidate -> weight. Iterates in roster order.
type Tally = BTreeMap<CandidateId, f64>;

// A ballot while counting. The ranks never change, only the cursor and the weight do.
#[derive(PartialEq, Debug, Clone)]
struct CountedBallot {
    ranks: Vec<CandidateId>,
    // Position in `ranks` of the current preference. None once exhausted.
    current: Option<usize>,
    weight: f64,
}

impl CountedBallot {
    fn new(ranks: Vec<CandidateId>) -> CountedBallot {
        let current = if ranks.is_empty() { None } else { Some(0) };
        CountedBallot {
            ranks,
            current,
            weight: 1.0,
        }
    }

    fn current_candidate(&self) -> Option<CandidateId> {
        self.current.map(|idx| self.ranks[idx])
    }

    /// Moves to the first later preference that is still continuing.
    fn advance(&mut self, remaining: &BTreeSet<CandidateId>) {
        if let Some(start) = self.current {
            self.current = self
                .ranks
                .iter()
                .enumerate()
                .skip(start + 1)
                .find(|(_, cid)| remaining.contains(cid))
                .map(|(idx, _)| idx);
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
struct TransferInternal {
    transfers: BTreeMap<CandidateId, f64>,
    exhausted: f64,
}

/// A single position to fill, with its candidates and the ballots cast for it.
///
/// The lifecycle is: construct, add ballots, count exactly once, then read the
/// elected candidates.
#[derive(PartialEq, Debug, Clone)]
pub struct Position {
    vacancies: u32,
    candidates: Vec<String>,
    candidate_ids: HashMap<String, CandidateId>,
    rules: CountRules,
    ballots: Vec<Vec<String>>,
    result: Option<CountResult>,
}

impl Position {
    /// Creates a position with `vacancies` seats.
    ///
    /// The candidate names must be unique. Their order defines no preference, it
    /// is only used to resolve integer ballot entries and to break ties.
    pub fn new(
        vacancies: u32,
        candidates: &[String],
        rules: CountRules,
    ) -> Result<Position, CountError> {
        if vacancies == 0 {
            return Err(CountError::NoVacancies);
        }
        let mut candidate_ids: HashMap<String, CandidateId> = HashMap::new();
        for (idx, name) in candidates.iter().enumerate() {
            if candidate_ids
                .insert(name.clone(), CandidateId(idx))
                .is_some()
            {
                return Err(CountError::DuplicateCandidate(name.clone()));
            }
        }
        Ok(Position {
            vacancies,
            candidates: candidates.to_vec(),
            candidate_ids,
            rules,
            ballots: Vec::new(),
            result: None,
        })
    }

    pub fn vacancies(&self) -> u32 {
        self.vacancies
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn n_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// The accepted ballots, in submission order, with every entry resolved to a name.
    pub fn ballots(&self) -> &[Vec<String>] {
        &self.ballots
    }

    pub fn n_ballots(&self) -> usize {
        self.ballots.len()
    }

    pub fn rules(&self) -> &CountRules {
        &self.rules
    }

    pub fn strict_length(&self) -> bool {
        self.rules.strict_length
    }

    pub fn set_strict_length(&mut self, strict_length: bool) {
        self.rules.strict_length = strict_length;
    }

    pub fn raise_on_invalid(&self) -> bool {
        self.rules.raise_on_invalid
    }

    pub fn set_raise_on_invalid(&mut self, raise_on_invalid: bool) {
        self.rules.raise_on_invalid = raise_on_invalid;
    }

    /// The number of votes a candidate must strictly exceed to be elected:
    /// `ceil(ballots / (vacancies + 1) + 1)`.
    pub fn quota(&self) -> u64 {
        let n = self.ballots.len() as u64;
        let d = self.vacancies as u64 + 1;
        let ceil_div = n / d + u64::from(n % d != 0);
        ceil_div + 1
    }

    pub fn is_counted(&self) -> bool {
        self.result.is_some()
    }

    /// The elected candidates, in the order they were elected.
    pub fn elected(&self) -> Result<&[String], CountError> {
        self.result().map(|r| r.elected.as_slice())
    }

    /// The full report of the count.
    pub fn result(&self) -> Result<&CountResult, CountError> {
        self.result.as_ref().ok_or(CountError::ResultNotReady)
    }

    /// Adds one ballot, most preferred candidate first.
    ///
    /// Entries may be candidate names or 1-based indexes into the roster. An invalid
    /// ballot is returned as an error if `raise_on_invalid` is set, and silently
    /// dropped otherwise. In both cases it is not added.
    pub fn add_ballot<I, E>(&mut self, prefs: I) -> Result<(), CountError>
    where
        I: IntoIterator<Item = E>,
        E: Into<BallotEntry>,
    {
        let entries: Vec<BallotEntry> = prefs.into_iter().map(Into::into).collect();
        match self.validate_ballot(&entries) {
            Ok(ballot) => {
                self.ballots.push(ballot);
                Ok(())
            }
            Err(reason) if self.rules.raise_on_invalid => Err(CountError::InvalidBallot(reason)),
            Err(reason) => {
                debug!("add_ballot: dropping ballot {:?}: {}", entries, reason);
                Ok(())
            }
        }
    }

    /// Adds several ballots in order.
    ///
    /// A rejected ballot does not stop the others from being added. If
    /// `raise_on_invalid` is set, the first rejection is returned once all the
    /// ballots have been processed.
    pub fn add_ballots<B, I, E>(&mut self, ballots: B) -> Result<(), CountError>
    where
        B: IntoIterator<Item = I>,
        I: IntoIterator<Item = E>,
        E: Into<BallotEntry>,
    {
        let mut first_error: Option<CountError> = None;
        for prefs in ballots {
            if let Err(e) = self.add_ballot(prefs) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn validate_ballot(&self, entries: &[BallotEntry]) -> Result<Vec<String>, InvalidBallot> {
        if entries.is_empty() {
            return Err(InvalidBallot::Empty);
        }
        if self.rules.strict_length && entries.len() != self.candidates.len() {
            return Err(InvalidBallot::WrongLength {
                expected: self.candidates.len(),
                found: entries.len(),
            });
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ballot: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            let name = self.resolve_entry(entry)?;
            if !seen.insert(name) {
                return Err(InvalidBallot::DuplicateCandidate(name.to_string()));
            }
            ballot.push(name.to_string());
        }
        Ok(ballot)
    }

    fn resolve_entry(&self, entry: &BallotEntry) -> Result<&str, InvalidBallot> {
        match entry {
            BallotEntry::Index(index) => usize::try_from(*index)
                .ok()
                .filter(|idx| *idx >= 1 && *idx <= self.candidates.len())
                .map(|idx| self.candidates[idx - 1].as_str())
                .ok_or(InvalidBallot::IndexOutOfRange {
                    index: *index,
                    candidates: self.candidates.len(),
                }),
            BallotEntry::Name(name) => self
                .candidate_ids
                .get(name)
                .map(|cid| self.candidates[cid.0].as_str())
                .ok_or_else(|| InvalidBallot::UnknownCandidate(name.clone())),
        }
    }

    /// Runs the count and returns the elected candidates, in the order they were elected.
    ///
    /// Arguments:
    /// * `pre_excluded` candidates removed before the first round, with their ballots
    ///   passed on at full value. Names that are not candidates for this position are
    ///   ignored. This is used when several positions share candidates who may only
    ///   win one of them.
    /// * `verbose` logs every election, exclusion and transfer at the `info` level
    ///   instead of `debug`.
    pub fn count(
        &mut self,
        pre_excluded: &[String],
        verbose: bool,
    ) -> Result<Vec<String>, CountError> {
        if self.result.is_some() {
            return Err(CountError::AlreadyCounted);
        }
        if self.ballots.is_empty() {
            return Err(CountError::NoBallots);
        }
        let level = if verbose { Level::Info } else { Level::Debug };
        info!(
            "Counting {} ballots for {} vacancies, quota: {}",
            self.ballots.len(),
            self.vacancies,
            self.quota()
        );

        let ballots: Vec<CountedBallot> = self
            .ballots
            .iter()
            .map(|b| {
                CountedBallot::new(
                    b.iter()
                        .filter_map(|name| self.candidate_ids.get(name).cloned())
                        .collect(),
                )
            })
            .collect();

        let excluded_ids: Vec<CandidateId> = pre_excluded
            .iter()
            .filter_map(|name| self.candidate_ids.get(name).cloned())
            .collect();

        let result = run_count(
            &self.candidates,
            self.vacancies as usize,
            self.quota(),
            ballots,
            &excluded_ids,
            level,
        );
        info!("Elected: {:?}", result.elected);
        let elected = result.elected.clone();
        self.result = Some(result);
        Ok(elected)
    }
}

fn run_count(
    candidates: &[String],
    vacancies: usize,
    quota: u64,
    mut ballots: Vec<CountedBallot>,
    pre_excluded: &[CandidateId],
    level: Level,
) -> CountResult {
    let name = |cid: &CandidateId| candidates[cid.0].clone();
    let quota_f = quota as f64;

    let mut remaining: BTreeSet<CandidateId> = (0..candidates.len()).map(CandidateId).collect();
    let mut elected: Vec<CandidateId> = Vec::new();

    // Pre-exclusion, at full value, one candidate at a time.
    let mut pre_excluded_names: Vec<String> = Vec::new();
    let mut pre_exclusion_transfers: Vec<TransferStats> = Vec::new();
    for cid in pre_excluded.iter() {
        if !remaining.remove(cid) {
            continue;
        }
        let sources: BTreeMap<CandidateId, f64> = [(*cid, 1.0)].into_iter().collect();
        let stats = transfer_ballots(&mut ballots, &sources, &remaining);
        log!(level, "{} is excluded before the count", name(cid));
        pre_excluded_names.push(name(cid));
        pre_exclusion_transfers.extend(to_transfer_stats(
            &stats,
            &sources,
            TransferReason::Exclusion,
            candidates,
        ));
    }

    // Not enough candidates to fill the seats: everyone left is elected.
    if remaining.len() < vacancies {
        log!(
            level,
            "Only {} candidates for {} vacancies, all are elected",
            remaining.len(),
            vacancies
        );
        elected.extend(remaining.iter().cloned());
        return CountResult {
            elected: elected.iter().map(name).collect(),
            quota,
            pre_excluded: pre_excluded_names,
            pre_exclusion_transfers,
            round_stats: Vec::new(),
        };
    }

    let mut round_stats: Vec<RoundStats> = Vec::new();
    let mut round_id: u32 = 0;
    loop {
        round_id += 1;
        let tally = compute_tally(&ballots, &remaining);
        debug!("run_count: round {} tally: {:?}", round_id, tally);
        let mut stats = RoundStats {
            round: round_id,
            tally: tally.iter().map(|(cid, w)| (name(cid), *w)).collect(),
            elected: Vec::new(),
            excluded: None,
            transfers: Vec::new(),
        };

        // Everyone above the quota in this snapshot is elected together. The
        // transfers are computed against the same snapshot.
        let newly_elected = find_elected(&tally, quota_f, vacancies - elected.len());
        if !newly_elected.is_empty() {
            let sources: BTreeMap<CandidateId, f64> = newly_elected
                .iter()
                .map(|cid| {
                    let votes = tally[cid];
                    (*cid, (votes - quota_f) / votes)
                })
                .collect();
            for cid in newly_elected.iter() {
                remaining.remove(cid);
                elected.push(*cid);
                stats.elected.push(name(cid));
            }
            let transfers = transfer_ballots(&mut ballots, &sources, &remaining);
            for cid in newly_elected.iter() {
                log!(
                    level,
                    "Round {}: {} has {:.4} votes, more than the quota, and is elected (transfer value {:.4}). {} vacancies and {} candidates remaining",
                    round_id,
                    name(cid),
                    tally[cid],
                    sources[cid],
                    vacancies - elected.len(),
                    remaining.len()
                );
            }
            stats.transfers.extend(to_transfer_stats(
                &transfers,
                &sources,
                TransferReason::Surplus,
                candidates,
            ));
        }

        if elected.len() == vacancies {
            round_stats.push(stats);
            break;
        }

        let seats_left = vacancies - elected.len();
        if remaining.len() <= seats_left {
            log!(
                level,
                "Round {}: {} candidates for {} vacancies, all remaining candidates are elected",
                round_id,
                remaining.len(),
                seats_left
            );
            for cid in remaining.iter() {
                elected.push(*cid);
                stats.elected.push(name(cid));
            }
            remaining.clear();
            round_stats.push(stats);
            break;
        }

        if newly_elected.is_empty() {
            // There are more continuing candidates than seats left, so the tally is not empty.
            if let Some(cid) = find_excluded(&tally) {
                remaining.remove(&cid);
                let sources: BTreeMap<CandidateId, f64> = [(cid, 1.0)].into_iter().collect();
                let transfers = transfer_ballots(&mut ballots, &sources, &remaining);
                log!(
                    level,
                    "Round {}: {} has the fewest votes ({:.4}) and is excluded",
                    round_id,
                    name(&cid),
                    tally[&cid]
                );
                stats.excluded = Some(name(&cid));
                stats.transfers.extend(to_transfer_stats(
                    &transfers,
                    &sources,
                    TransferReason::Exclusion,
                    candidates,
                ));
            }
        }
        round_stats.push(stats);
    }

    CountResult {
        elected: elected.iter().map(name).collect(),
        quota,
        pre_excluded: pre_excluded_names,
        pre_exclusion_transfers,
        round_stats,
    }
}

// Every continuing candidate gets an entry, including the ones without any vote.
fn compute_tally(ballots: &[CountedBallot], remaining: &BTreeSet<CandidateId>) -> Tally {
    let mut tally: Tally = remaining.iter().map(|cid| (*cid, 0.0)).collect();
    for b in ballots.iter() {
        if let Some(w) = b.current_candidate().and_then(|cid| tally.get_mut(&cid)) {
            *w += b.weight;
        }
    }
    tally
}

/// The candidates strictly above the quota, in roster order, never more than the seats left.
fn find_elected(tally: &Tally, quota: f64, seats_left: usize) -> Vec<CandidateId> {
    tally
        .iter()
        .filter(|(_, votes)| **votes > quota)
        .map(|(cid, _)| *cid)
        .take(seats_left)
        .collect()
}

/// The candidate with the smallest tally. Ties go to the first one in roster order.
fn find_excluded(tally: &Tally) -> Option<CandidateId> {
    let mut lowest: Option<(CandidateId, f64)> = None;
    for (cid, votes) in tally.iter() {
        match lowest {
            Some((_, min_votes)) if *votes >= min_votes => {}
            _ => lowest = Some((*cid, *votes)),
        }
    }
    lowest.map(|(cid, _)| cid)
}

/// Moves every ballot currently with one of the `sources` to its next continuing
/// preference, scaling its weight by the transfer value of its source.
///
/// The sources must already be removed from `remaining`.
fn transfer_ballots(
    ballots: &mut [CountedBallot],
    sources: &BTreeMap<CandidateId, f64>,
    remaining: &BTreeSet<CandidateId>,
) -> BTreeMap<CandidateId, TransferInternal> {
    let mut stats: BTreeMap<CandidateId, TransferInternal> = sources
        .keys()
        .map(|cid| (*cid, TransferInternal::default()))
        .collect();
    for b in ballots.iter_mut() {
        let from = match b.current_candidate() {
            Some(cid) if sources.contains_key(&cid) => cid,
            _ => continue,
        };
        b.weight *= sources[&from];
        b.advance(remaining);
        let e = stats.entry(from).or_default();
        match b.current_candidate() {
            Some(to) => *e.transfers.entry(to).or_insert(0.0) += b.weight,
            None => e.exhausted += b.weight,
        }
    }
    stats
}

fn to_transfer_stats(
    stats: &BTreeMap<CandidateId, TransferInternal>,
    sources: &BTreeMap<CandidateId, f64>,
    reason: TransferReason,
    candidates: &[String],
) -> Vec<TransferStats> {
    stats
        .iter()
        .map(|(cid, ti)| TransferStats {
            from: candidates[cid.0].clone(),
            reason,
            transfer_value: sources.get(cid).cloned().unwrap_or(1.0),
            transfers: ti
                .transfers
                .iter()
                .map(|(to, w)| (candidates[to.0].clone(), *w))
                .collect(),
            exhausted: ti.exhausted,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn idx(index: i64) -> BallotEntry {
        BallotEntry::Index(index)
    }

    fn nm(name: &str) -> BallotEntry {
        BallotEntry::Name(name.to_string())
    }

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    fn animals() -> Vec<String> {
        names(&["Platypus", "Wombat", "Emu", "Koala"])
    }

    fn simple_ballots() -> Vec<Vec<&'static str>> {
        vec![
            vec!["Platypus", "Koala", "Wombat", "Emu"],
            vec!["Platypus", "Koala", "Wombat", "Emu"],
            vec!["Wombat", "Emu", "Koala", "Platypus"],
            vec!["Koala", "Platypus", "Emu", "Wombat"],
            vec!["Emu", "Wombat", "Platypus", "Koala"],
            vec!["Emu", "Platypus", "Wombat", "Koala"],
            vec!["Platypus", "Koala", "Emu", "Wombat"],
            vec!["Emu", "Wombat", "Platypus", "Koala"],
        ]
    }

    fn simple_position() -> Position {
        let mut p = Position::new(2, &animals(), CountRules::DEFAULT_RULES).unwrap();
        p.add_ballots(simple_ballots()).unwrap();
        p
    }

    #[test]
    fn loading_ballots() {
        let p = simple_position();
        let expected: Vec<Vec<String>> = simple_ballots().iter().map(|b| names(b)).collect();
        assert_eq!(p.ballots(), expected.as_slice());
        assert_eq!(p.quota(), 4);
        assert_eq!(p.vacancies(), 2);
        assert_eq!(p.candidates(), animals().as_slice());
        assert_eq!(p.n_ballots(), 8);
        assert_eq!(p.n_candidates(), 4);
        assert!(p.strict_length());
        assert!(!p.raise_on_invalid());
        assert!(!p.is_counted());
        assert_eq!(p.elected(), Err(CountError::ResultNotReady));
        assert_eq!(p.result().err(), Some(CountError::ResultNotReady));
    }

    #[test]
    fn full_count() {
        init();
        let mut p = simple_position();
        let elected = p.count(&[], true).unwrap();
        assert_eq!(elected, names(&["Platypus", "Emu"]));
        assert!(p.is_counted());
        assert_eq!(p.elected().unwrap(), names(&["Platypus", "Emu"]).as_slice());

        let result = p.result().unwrap();
        assert_eq!(result.quota, 4);
        assert_eq!(result.round_stats.len(), 3);
        // Wombat and Koala tie on 1 vote; Wombat comes first in the roster.
        assert_eq!(result.round_stats[0].excluded, Some("Wombat".to_string()));
        assert_eq!(result.round_stats[1].excluded, Some("Koala".to_string()));
        assert_eq!(result.round_stats[2].elected, names(&["Platypus", "Emu"]));
        assert_eq!(
            result.round_stats[0].tally,
            vec![
                ("Platypus".to_string(), 3.0),
                ("Wombat".to_string(), 1.0),
                ("Emu".to_string(), 3.0),
                ("Koala".to_string(), 1.0)
            ]
        );
    }

    #[test]
    fn full_count_with_pre_excluded() {
        init();
        let mut p = simple_position();
        let elected = p.count(&names(&["Platypus"]), false).unwrap();
        // Koala reaches exactly the quota (4) after the pre-exclusion and is not elected
        // on the spot; both end up elected when only two candidates are left.
        assert_eq!(elected, names(&["Emu", "Koala"]));
        let result = p.result().unwrap();
        assert_eq!(result.pre_excluded, names(&["Platypus"]));
        assert_eq!(result.pre_exclusion_transfers.len(), 1);
        assert_eq!(
            result.pre_exclusion_transfers[0].transfers,
            vec![("Koala".to_string(), 3.0)]
        );
        assert!(result.round_stats[0].elected.is_empty());
    }

    #[test]
    fn count_again() {
        let mut p = simple_position();
        p.count(&[], false).unwrap();
        assert_eq!(p.count(&[], false), Err(CountError::AlreadyCounted));
    }

    #[test]
    fn no_ballots() {
        let mut p = Position::new(2, &animals(), CountRules::DEFAULT_RULES).unwrap();
        assert_eq!(p.count(&[], false), Err(CountError::NoBallots));
        assert!(!p.is_counted());
    }

    #[test]
    fn less_candidates_than_vacancies() {
        let candidates = names(&["Koala", "Emu"]);
        let rules = CountRules {
            strict_length: true,
            raise_on_invalid: true,
        };
        let mut p = Position::new(5, &candidates, rules).unwrap();
        p.add_ballots([[1, 2], [2, 1]]).unwrap();
        assert_eq!(p.count(&[], false).unwrap(), candidates);
        assert!(p.result().unwrap().round_stats.is_empty());
    }

    #[test]
    fn pre_exclusion_leaves_too_few_candidates() {
        let mut p = simple_position();
        let elected = p
            .count(&names(&["Platypus", "Emu", "Koala", "Nobody"]), false)
            .unwrap();
        assert_eq!(elected, names(&["Wombat"]));
        assert_eq!(p.result().unwrap().pre_excluded.len(), 3);
    }

    #[test]
    fn hare_clark_worked_example() {
        init();
        let candidates = names(&["Platypus", "Wombat", "Kangaroo", "Koala"]);
        let mut p = Position::new(3, &candidates, CountRules::DEFAULT_RULES).unwrap();
        for _ in 0..1000 {
            p.add_ballot(["Platypus", "Wombat", "Kangaroo", "Koala"])
                .unwrap();
        }
        for _ in 0..2000 {
            p.add_ballot(["Platypus", "Kangaroo", "Wombat", "Koala"])
                .unwrap();
        }
        assert_eq!(p.quota(), 751);

        let elected = p.count(&[], true).unwrap();
        // Wombat gets 749.67 from Platypus, just under the quota, and only passes it
        // with the surplus of Kangaroo.
        assert_eq!(elected, names(&["Platypus", "Kangaroo", "Wombat"]));

        let result = p.result().unwrap();
        let first = &result.round_stats[0].transfers[0];
        assert_eq!(first.from, "Platypus");
        assert_eq!(first.reason, TransferReason::Surplus);
        assert!((first.transfer_value - 2249.0 / 3000.0).abs() < 1e-12);
        let (to_wombat, to_kangaroo) = (first.transfers[0].clone(), first.transfers[1].clone());
        assert_eq!(to_wombat.0, "Wombat");
        assert!((to_wombat.1 - 749.6666).abs() < 1e-3);
        assert_eq!(to_kangaroo.0, "Kangaroo");
        assert!((to_kangaroo.1 - 1499.3333).abs() < 1e-3);
        assert_eq!(result.round_stats.len(), 3);
    }

    #[test]
    fn multiple_elected_in_one_round() {
        let candidates = names(&["A", "B", "C", "D"]);
        let mut rules = CountRules::DEFAULT_RULES;
        rules.strict_length = false;
        let mut p = Position::new(2, &candidates, rules).unwrap();
        for _ in 0..5 {
            p.add_ballot(["A", "B", "C"]).unwrap();
            p.add_ballot(["B", "A", "D"]).unwrap();
        }
        p.add_ballot(["C"]).unwrap();
        // 11 ballots, quota = ceil(11 / 3 + 1) = 5. A and B have 5 each: nobody exceeds.
        assert_eq!(p.quota(), 5);
        let elected = p.count(&[], false).unwrap();
        assert_eq!(elected, names(&["A", "B"]));

        let mut p = Position::new(2, &candidates, rules).unwrap();
        for _ in 0..6 {
            p.add_ballot(["A", "B", "C"]).unwrap();
            p.add_ballot(["B", "A", "D"]).unwrap();
        }
        p.add_ballots(vec![vec!["C", "D"], vec!["A", "C"], vec!["B", "D"], vec!["A"], vec!["B"]])
            .unwrap();
        // 17 ballots, quota 7: A and B both have 8 and are elected in the same round.
        assert_eq!(p.quota(), 7);
        let elected = p.count(&[], false).unwrap();
        assert_eq!(elected, names(&["A", "B"]));
        let result = p.result().unwrap();
        assert_eq!(result.round_stats.len(), 1);
        assert_eq!(result.round_stats[0].elected, names(&["A", "B"]));
        // The surplus of A does not go to B, elected in the same round.
        let from_a = &result.round_stats[0].transfers[0];
        assert_eq!(from_a.from, "A");
        assert_eq!(from_a.transfers.len(), 1);
        assert_eq!(from_a.transfers[0].0, "C");
    }

    #[test]
    fn exactly_at_quota_is_not_elected() {
        let candidates = names(&["A", "B", "C"]);
        let mut p = Position::new(1, &candidates, CountRules::DEFAULT_RULES).unwrap();
        // 4 ballots, quota = ceil(4 / 2 + 1) = 3.
        for _ in 0..3 {
            p.add_ballot(["A", "B", "C"]).unwrap();
        }
        p.add_ballot(["B", "C", "A"]).unwrap();
        assert_eq!(p.quota(), 3);
        p.count(&[], false).unwrap();
        let result = p.result().unwrap();
        assert!(result.round_stats[0].elected.is_empty());
        assert_eq!(result.round_stats[0].excluded, Some("C".to_string()));
        assert_eq!(result.elected, names(&["A"]));
    }

    #[test]
    fn quota_formula() {
        let candidates = names(&["A", "B", "C"]);
        for vacancies in 1..5u32 {
            let mut p = Position::new(vacancies, &candidates, CountRules::DEFAULT_RULES).unwrap();
            for n in 1..40u64 {
                p.add_ballot(["A", "B", "C"]).unwrap();
                let expected = (n as f64 / (vacancies as f64 + 1.0) + 1.0).ceil() as u64;
                assert_eq!(p.quota(), expected, "n={} vacancies={}", n, vacancies);
            }
        }
    }

    #[test]
    fn invalid_ballots() {
        let invalid: Vec<(Vec<BallotEntry>, InvalidBallot)> = vec![
            (
                vec![idx(1), idx(2)],
                InvalidBallot::WrongLength {
                    expected: 4,
                    found: 2,
                },
            ),
            (
                vec![idx(1), idx(2), idx(3), idx(4), idx(5)],
                InvalidBallot::WrongLength {
                    expected: 4,
                    found: 5,
                },
            ),
            (
                vec![
                    nm("Platypus"),
                    nm("Possum"),
                    nm("Koala"),
                    nm("Wombat"),
                ],
                InvalidBallot::UnknownCandidate("Possum".to_string()),
            ),
            (
                vec![idx(1), idx(2), idx(0), idx(3)],
                InvalidBallot::IndexOutOfRange {
                    index: 0,
                    candidates: 4,
                },
            ),
            (
                vec![idx(1), idx(2), idx(-1), idx(3)],
                InvalidBallot::IndexOutOfRange {
                    index: -1,
                    candidates: 4,
                },
            ),
            (
                vec![nm("Emu"), idx(3), nm("Koala"), nm("Wombat")],
                InvalidBallot::DuplicateCandidate("Emu".to_string()),
            ),
            (vec![], InvalidBallot::Empty),
        ];
        for raise_on_invalid in [false, true] {
            for (ballot, reason) in invalid.iter() {
                let mut p = Position::new(2, &animals(), CountRules::DEFAULT_RULES).unwrap();
                p.set_raise_on_invalid(raise_on_invalid);
                assert_eq!(p.raise_on_invalid(), raise_on_invalid);
                let res = p.add_ballot(ballot.clone());
                if raise_on_invalid {
                    assert_eq!(res, Err(CountError::InvalidBallot(reason.clone())));
                } else {
                    assert_eq!(res, Ok(()));
                }
                assert!(p.ballots().is_empty());
                assert_eq!(p.quota(), 1);
            }
        }
    }

    #[test]
    fn dropped_ballot_then_no_ballots() {
        let mut p = Position::new(2, &animals(), CountRules::DEFAULT_RULES).unwrap();
        p.add_ballot([1, 2]).unwrap();
        assert_eq!(p.n_ballots(), 0);
        assert_eq!(p.count(&[], false), Err(CountError::NoBallots));
    }

    #[test]
    fn add_ballots_continues_after_rejection() {
        let mut p = Position::new(2, &animals(), CountRules::DEFAULT_RULES).unwrap();
        p.set_raise_on_invalid(true);
        let res = p.add_ballots(vec![
            vec![idx(1), idx(2), idx(3), idx(4)],
            vec![idx(1), idx(2)],
            vec![nm("Koala"), nm("Emu"), nm("Wombat"), nm("Platypus")],
            vec![idx(9), idx(2), idx(3), idx(4)],
        ]);
        assert_eq!(
            res,
            Err(CountError::InvalidBallot(InvalidBallot::WrongLength {
                expected: 4,
                found: 2
            }))
        );
        assert_eq!(p.n_ballots(), 2);
        assert_eq!(p.ballots()[0], animals());
        assert_eq!(p.ballots()[1], names(&["Koala", "Emu", "Wombat", "Platypus"]));
    }

    #[test]
    fn optional_preferences() {
        let mut p = Position::new(1, &animals(), CountRules::DEFAULT_RULES).unwrap();
        p.add_ballot(["Emu", "Koala"]).unwrap();
        assert_eq!(p.n_ballots(), 0);
        p.set_strict_length(false);
        p.add_ballot(["Emu", "Koala"]).unwrap();
        p.add_ballot([3]).unwrap();
        p.add_ballot(["Koala", "Wombat", "Platypus", "Emu"]).unwrap();
        assert_eq!(p.n_ballots(), 3);
        assert_eq!(p.ballots()[1], names(&["Emu"]));
        // 3 ballots, quota = ceil(3 / 2 + 1) = 3.
        assert_eq!(p.count(&[], false).unwrap(), names(&["Emu"]));
    }

    #[test]
    fn exhausted_ballots_drop_their_weight() {
        let candidates = names(&["A", "B", "C"]);
        let rules = CountRules {
            strict_length: false,
            raise_on_invalid: true,
        };
        let mut p = Position::new(1, &candidates, rules).unwrap();
        p.add_ballots(vec![
            vec!["A"],
            vec!["A"],
            vec!["B", "C"],
            vec!["B", "C"],
            vec!["C", "A"],
            vec!["C", "B"],
            vec!["C"],
        ])
        .unwrap();
        p.count(&[], false).unwrap();
        let result = p.result().unwrap();
        // A and B tie on 2; A is excluded first and both its ballots exhaust.
        let first = &result.round_stats[0];
        assert_eq!(first.excluded, Some("A".to_string()));
        assert_eq!(first.transfers[0].exhausted, 2.0);
        assert!(first.transfers[0].transfers.is_empty());
        assert_eq!(result.elected, names(&["C"]));
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            Position::new(0, &animals(), CountRules::DEFAULT_RULES),
            Err(CountError::NoVacancies)
        );
        assert_eq!(
            Position::new(1, &names(&["A", "B", "A"]), CountRules::DEFAULT_RULES),
            Err(CountError::DuplicateCandidate("A".to_string()))
        );
    }

    #[test]
    fn rules_from_text() {
        let mut rules = CountRules::default();
        rules.set_from_str("optional_preferences", "true").unwrap();
        assert!(!rules.strict_length);
        rules.set_from_str("raise_on_invalid", "TRUE").unwrap();
        assert!(rules.raise_on_invalid);
        assert_eq!(
            rules.set_from_str("raise_on_invalid", "yes"),
            Err(CountError::ConfigurationType {
                option: "raise_on_invalid".to_string(),
                found: "yes".to_string()
            })
        );
        assert_eq!(
            rules.set_from_str("strict", "true"),
            Err(CountError::UnknownOption("strict".to_string()))
        );
    }

    #[test]
    fn random_elections_fill_every_seat() {
        init();
        let mut rng = StdRng::seed_from_u64(0x4a5e);
        for _ in 0..200 {
            let n_candidates = rng.gen_range(1..9usize);
            let vacancies = rng.gen_range(1..=n_candidates) as u32;
            let candidates: Vec<String> = (0..n_candidates).map(|i| format!("C{}", i)).collect();
            let rules = CountRules {
                strict_length: false,
                raise_on_invalid: true,
            };
            let mut p = Position::new(vacancies, &candidates, rules).unwrap();
            let n_ballots = rng.gen_range(1..60);
            for _ in 0..n_ballots {
                let mut ranks: Vec<usize> = (1..=n_candidates).collect();
                ranks.shuffle(&mut rng);
                ranks.truncate(rng.gen_range(1..=n_candidates));
                p.add_ballot(ranks).unwrap();
            }
            let mut pre_excluded: Vec<String> = Vec::new();
            if rng.gen_bool(0.3) {
                pre_excluded.push(candidates[rng.gen_range(0..n_candidates)].clone());
            }

            let elected = p.count(&pre_excluded, false).unwrap();
            let available = n_candidates - pre_excluded.len();
            assert_eq!(elected.len(), available.min(vacancies as usize));
            let unique: HashSet<&String> = elected.iter().collect();
            assert_eq!(unique.len(), elected.len());
            for e in elected.iter() {
                assert!(candidates.contains(e));
                assert!(!pre_excluded.contains(e));
            }
        }
    }
}
