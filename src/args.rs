use clap::Parser;

/// This is a Hare-Clark counting program.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election configuration in JSON format.
    /// For more information about the file format, read the manual of the hare_clark crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, hcvote will
    /// check that the counted output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The CSV file containing the ballots. Setting this option overrides the file
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default 1) The number of vacancies, when counting a single position without a configuration file.
    #[clap(long, value_parser)]
    pub vacancies: Option<u32>,

    /// The candidates of the position, in order, when counting a single position without a configuration file.
    /// Integer preferences in the ballots refer to this order (starting at 1).
    #[clap(long, value_parser, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// If passed as an argument, the first row of the input is a header and is skipped.
    #[clap(long, takes_value = false)]
    pub header: bool,

    /// If passed as an argument, ballots do not need to rank every candidate.
    #[clap(long, takes_value = false)]
    pub optional_preferences: bool,

    /// If passed as an argument, an invalid ballot stops the count with an error instead of being dropped.
    #[clap(long, takes_value = false)]
    pub raise_invalid: bool,

    /// (list of candidate names) Candidates to exclude before counting, for example because
    /// they were already elected to another position.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
