use clap::Parser;

/// This is a menu-driven election manager: admins define elections, candidates and voters,
/// voters cast one ballot each, and results are shown once published.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, default election_data.json) The JSON file holding all the elections. It is
    /// created with a default admin account (admin / admin123) if it does not exist.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// (candidate-order or random, default candidate-order) How to pick the winner when several
    /// candidates share the highest count. With candidate-order, the candidate registered first wins.
    #[clap(long, value_parser)]
    pub tiebreak: Option<String>,

    /// (number, default 0) The seed used by the random tiebreak. The same seed always
    /// resolves a given tie the same way.
    #[clap(long, value_parser)]
    pub seed: Option<u32>,

    // Other arguments
    /// If passed as an argument, the screen is not cleared between menu pages.
    #[clap(long, takes_value = false)]
    pub no_clear: bool,

    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
