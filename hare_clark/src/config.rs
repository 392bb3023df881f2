// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One entry of a preference list, as submitted by the caller.
///
/// Entries are resolved against the candidate roster once, when the ballot
/// is added. Everything after intake only sees candidate names.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum BallotEntry {
    /// A 1-based index into the candidate roster.
    Index(i64),
    /// A candidate name, which must match a registered candidate exactly.
    Name(String),
}

impl From<&str> for BallotEntry {
    fn from(name: &str) -> Self {
        BallotEntry::Name(name.to_string())
    }
}

impl From<String> for BallotEntry {
    fn from(name: String) -> Self {
        BallotEntry::Name(name)
    }
}

impl From<&String> for BallotEntry {
    fn from(name: &String) -> Self {
        BallotEntry::Name(name.clone())
    }
}

impl From<i32> for BallotEntry {
    fn from(index: i32) -> Self {
        BallotEntry::Index(index as i64)
    }
}

impl From<i64> for BallotEntry {
    fn from(index: i64) -> Self {
        BallotEntry::Index(index)
    }
}

impl From<u32> for BallotEntry {
    fn from(index: u32) -> Self {
        BallotEntry::Index(index as i64)
    }
}

impl From<usize> for BallotEntry {
    fn from(index: usize) -> Self {
        BallotEntry::Index(index as i64)
    }
}

// ******** Output data structures *********

/// Why some weight moved from one candidate to the others.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TransferReason {
    /// The candidate exceeded the quota and passed on its surplus.
    Surplus,
    /// The candidate was excluded and passed on its full tally.
    Exclusion,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TransferStats {
    pub from: String,
    pub reason: TransferReason,
    pub transfer_value: f64,
    /// Weight received by each continuing candidate, in roster order.
    pub transfers: Vec<(String, f64)>,
    /// Weight carried by ballots that had no continuing preference left.
    pub exhausted: f64,
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The tally of the continuing candidates at the start of the round, in roster order.
    pub tally: Vec<(String, f64)>,
    pub elected: Vec<String>,
    pub excluded: Option<String>,
    pub transfers: Vec<TransferStats>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CountResult {
    /// The elected candidates, in the order they were elected.
    pub elected: Vec<String>,
    pub quota: u64,
    /// The candidates removed before the first round.
    pub pre_excluded: Vec<String>,
    pub pre_exclusion_transfers: Vec<TransferStats>,
    pub round_stats: Vec<RoundStats>,
}

/// The reasons for rejecting a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InvalidBallot {
    Empty,
    WrongLength { expected: usize, found: usize },
    UnknownCandidate(String),
    IndexOutOfRange { index: i64, candidates: usize },
    DuplicateCandidate(String),
}

impl Error for InvalidBallot {}

impl Display for InvalidBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidBallot::Empty => write!(f, "the ballot has no preferences"),
            InvalidBallot::WrongLength { expected, found } => write!(
                f,
                "the ballot has {} preferences, expected {}",
                found, expected
            ),
            InvalidBallot::UnknownCandidate(name) => {
                write!(f, "{:?} is not a candidate for this position", name)
            }
            InvalidBallot::IndexOutOfRange { index, candidates } => write!(
                f,
                "index {} is outside the candidate range 1..={}",
                index, candidates
            ),
            InvalidBallot::DuplicateCandidate(name) => {
                write!(f, "{:?} appears more than once on the ballot", name)
            }
        }
    }
}

/// Errors returned by the counting engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CountError {
    /// Only returned when `raise_on_invalid` is set.
    InvalidBallot(InvalidBallot),
    AlreadyCounted,
    NoBallots,
    ResultNotReady,
    /// A boolean option received something that is not a boolean.
    ConfigurationType {
        option: String,
        found: String,
    },
    UnknownOption(String),
    DuplicateCandidate(String),
    NoVacancies,
}

impl Error for CountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CountError::InvalidBallot(reason) => Some(reason),
            _ => None,
        }
    }
}

impl Display for CountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountError::InvalidBallot(reason) => write!(f, "invalid ballot: {}", reason),
            CountError::AlreadyCounted => write!(f, "the election has already been counted"),
            CountError::NoBallots => write!(f, "no ballots have been added, nothing to count"),
            CountError::ResultNotReady => write!(
                f,
                "the election has not been counted yet, call count() first"
            ),
            CountError::ConfigurationType { option, found } => write!(
                f,
                "option {} expects a boolean, found {:?}",
                option, found
            ),
            CountError::UnknownOption(option) => write!(f, "unknown option {:?}", option),
            CountError::DuplicateCandidate(name) => {
                write!(f, "candidate {:?} is registered more than once", name)
            }
            CountError::NoVacancies => write!(f, "a position needs at least one vacancy"),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CountRules {
    /// Every ballot must rank all the candidates. When off, trailing
    /// preferences may be left out (optional preferential voting).
    pub strict_length: bool,
    /// Return an error for an invalid ballot instead of dropping it.
    pub raise_on_invalid: bool,
}

impl CountRules {
    pub const DEFAULT_RULES: CountRules = CountRules {
        strict_length: true,
        raise_on_invalid: false,
    };

    /// Sets one option from its textual form.
    ///
    /// Accepted names are `strict_length`, `optional_preferences` (the inverse of
    /// `strict_length`) and `raise_on_invalid`. Values must be `true` or `false`.
    pub fn set_from_str(&mut self, option: &str, value: &str) -> Result<(), CountError> {
        match option {
            "strict_length" => self.strict_length = parse_bool_option(option, value)?,
            "optional_preferences" => self.strict_length = !parse_bool_option(option, value)?,
            "raise_on_invalid" => self.raise_on_invalid = parse_bool_option(option, value)?,
            _ => return Err(CountError::UnknownOption(option.to_string())),
        }
        Ok(())
    }
}

impl Default for CountRules {
    fn default() -> Self {
        CountRules::DEFAULT_RULES
    }
}

/// Reads the value of a boolean option.
pub fn parse_bool_option(option: &str, value: &str) -> Result<bool, CountError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CountError::ConfigurationType {
            option: option.to_string(),
            found: value.to_string(),
        }),
    }
}
