pub use crate::config::*;
use crate::Position;

/// A builder for adding ballots from raw text.
///
/// It does the normalisation the counting engine expects from its callers: blank
/// fields are gaps and are compacted out, integers are roster indexes and anything
/// else is a candidate name.
///
/// ```
/// pub use hare_clark::builder::Builder;
/// pub use hare_clark::CountRules;
/// # use hare_clark::CountError;
///
/// let mut builder = Builder::new(&CountRules::DEFAULT_RULES)?
///     .vacancies(1)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot_simple(&["Anna".to_string(), "".to_string(), "Bob".to_string()])?;
/// builder.add_ballot_simple(&["2".to_string(), "1".to_string()])?;
///
/// let position = builder.build()?;
/// assert_eq!(position.n_ballots(), 2);
/// # Ok::<(), CountError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: CountRules,
    pub(crate) _vacancies: u32,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Vec<BallotEntry>>,
}

impl Builder {
    pub fn new(rules: &CountRules) -> Result<Builder, CountError> {
        Ok(Builder {
            _rules: *rules,
            _vacancies: 1,
            _candidates: None,
            _ballots: Vec::new(),
        })
    }

    pub fn vacancies(self, vacancies: u32) -> Result<Builder, CountError> {
        if vacancies == 0 {
            return Err(CountError::NoVacancies);
        }
        Ok(Builder {
            _vacancies: vacancies,
            ..self
        })
    }

    pub fn candidates(self, cands: &[String]) -> Result<Builder, CountError> {
        Ok(Builder {
            _candidates: Some(cands.to_vec()),
            _ballots: Vec::new(),
            ..self
        })
    }

    /// Adds a ballot made of text fields, in order of preference.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_ballot_simple(&mut self, fields: &[String]) -> Result<(), CountError> {
        let entries: Vec<BallotEntry> = fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(|f| match f.parse::<i64>() {
                Ok(index) => BallotEntry::Index(index),
                Err(_) => BallotEntry::Name(f.to_string()),
            })
            .collect();
        self.add_ballot(entries)
    }

    /// Adds a ballot whose entries are already typed. They must not contain gaps.
    pub fn add_ballot(&mut self, entries: Vec<BallotEntry>) -> Result<(), CountError> {
        self._ballots.push(entries);
        Ok(())
    }

    /// Creates the position and submits every ballot to it.
    ///
    /// Invalid ballots follow the `raise_on_invalid` rule of the position.
    pub fn build(self) -> Result<Position, CountError> {
        let candidates = self._candidates.unwrap_or_default();
        let mut position = Position::new(self._vacancies, &candidates, self._rules)?;
        position.add_ballots(self._ballots)?;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(fs: &[&str]) -> Vec<String> {
        fs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gaps_are_compacted() {
        let rules = CountRules {
            strict_length: false,
            raise_on_invalid: true,
        };
        let mut builder = Builder::new(&rules)
            .unwrap()
            .vacancies(2)
            .unwrap()
            .candidates(&fields(&["Anna", "Bob", "Clara"]))
            .unwrap();
        builder
            .add_ballot_simple(&fields(&["Clara", "", " Anna "]))
            .unwrap();
        builder.add_ballot_simple(&fields(&["", "3", ""])).unwrap();
        let position = builder.build().unwrap();
        assert_eq!(position.vacancies(), 2);
        assert_eq!(
            position.ballots(),
            &[fields(&["Clara", "Anna"]), fields(&["Clara"])]
        );
    }

    #[test]
    fn strict_rules_reject_short_ballots() {
        let mut builder = Builder::new(&CountRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&fields(&["Anna", "Bob"]))
            .unwrap();
        builder.add_ballot_simple(&fields(&["Anna", ""])).unwrap();
        builder.add_ballot_simple(&fields(&["Bob", "Anna"])).unwrap();
        let position = builder.build().unwrap();
        assert_eq!(position.n_ballots(), 1);

        let rules = CountRules {
            strict_length: true,
            raise_on_invalid: true,
        };
        let mut builder = Builder::new(&rules)
            .unwrap()
            .candidates(&fields(&["Anna", "Bob"]))
            .unwrap();
        builder.add_ballot_simple(&fields(&["Anna", ""])).unwrap();
        assert_eq!(
            builder.build().err(),
            Some(CountError::InvalidBallot(InvalidBallot::WrongLength {
                expected: 2,
                found: 1
            }))
        );
    }

    #[test]
    fn zero_vacancies() {
        assert!(matches!(
            Builder::new(&CountRules::DEFAULT_RULES).unwrap().vacancies(0),
            Err(CountError::NoVacancies)
        ));
    }
}
