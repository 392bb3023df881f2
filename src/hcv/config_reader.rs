use crate::hcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
}

/// How the ballots of the positions are laid out in the rows of the source file.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SourceLayout {
    /// One position, every remaining column is a preference.
    Single,
    /// Several positions side by side, each taking as many columns as it has candidates.
    Multiple,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub layout: Option<String>,
    #[serde(rename = "firstVoteRowIndex")]
    pub(crate) _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "ignoreColumns")]
    pub ignore_columns: Option<Vec<JSValue>>,
}

impl FileSource {
    /// The number of rows to skip before the first ballot.
    pub fn first_vote_row_index(&self) -> HcvResult<usize> {
        if self._first_vote_row_index.is_none() {
            return Ok(0);
        }
        let x = read_js_int(&self._first_vote_row_index)?;
        Ok(x - 1)
    }

    pub fn id_column_index_int(&self) -> HcvResult<Option<usize>> {
        if self.id_column_index.is_some() {
            read_js_int(&self.id_column_index).map(|x| Some(x - 1))
        } else {
            Ok(None)
        }
    }

    pub fn ignore_columns_int(&self) -> HcvResult<Vec<usize>> {
        let mut res: Vec<usize> = Vec::new();
        for c in self.ignore_columns.iter().flatten() {
            res.push(read_js_int(&Some(c.clone()))? - 1);
        }
        Ok(res)
    }

    pub fn layout(&self) -> HcvResult<SourceLayout> {
        match self.layout.as_deref() {
            None | Some("single") => Ok(SourceLayout::Single),
            Some("multiple") => Ok(SourceLayout::Multiple),
            Some(x) => whatever!("unknown layout: {}", x),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PositionConfig {
    pub name: Option<String>,
    pub vacancies: u32,
    pub candidates: Vec<String>,
}

impl PositionConfig {
    pub fn display_name(&self, idx: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Position {}", idx + 1))
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct HcvRules {
    #[serde(rename = "optionalPreferences")]
    pub optional_preferences: Option<JSValue>,
    #[serde(rename = "raiseOnInvalid")]
    pub raise_on_invalid: Option<JSValue>,
    #[serde(rename = "excludeElected")]
    pub exclude_elected: Option<JSValue>,
}

impl HcvRules {
    pub fn count_rules(&self) -> HcvResult<CountRules> {
        let optional_preferences =
            read_js_bool("optionalPreferences", &self.optional_preferences, false)?;
        Ok(CountRules {
            strict_length: !optional_preferences,
            raise_on_invalid: read_js_bool("raiseOnInvalid", &self.raise_on_invalid, false)?,
        })
    }

    pub fn exclude_elected(&self) -> HcvResult<bool> {
        read_js_bool("excludeElected", &self.exclude_elected, true)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct HcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub source: FileSource,
    pub positions: Vec<PositionConfig>,
    #[serde(default)]
    pub rules: HcvRules,
}

pub fn read_config(path: &str) -> HcvResult<HcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let config: HcvConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> HcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Values start at 1. Columns may also be given with spreadsheet letters (A, B, ..., AA).
fn read_js_int(x: &Option<JSValue>) -> HcvResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_lowercase().chars().fold(0, |acc, c| {
                acc * 26 + (c as usize) - ('a' as usize) + 1
            }))
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    let found = match x {
        Some(js) => js.to_string(),
        None => "nothing".to_string(),
    };
    match res {
        Some(n) if n > 0 => Ok(n),
        _ => ParsingJsonNumberSnafu { found }.fail(),
    }
}

fn read_js_bool(option: &str, x: &Option<JSValue>, default: bool) -> HcvResult<bool> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        Some(JSValue::Bool(b)) => Ok(*b),
        Some(JSValue::String(s)) => parse_bool_option(option, s).context(ConfigurationSnafu {}),
        Some(js) => Err(CountError::ConfigurationType {
            option: option.to_string(),
            found: js.to_string(),
        })
        .context(ConfigurationSnafu {}),
    }
}
