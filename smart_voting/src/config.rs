// ********* Stored data structures ***********

use std::fmt::Display;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::ordered_map;

/// A contestant in one election.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
}

/// A registered participant.
///
/// The voter ID is not part of the record: it is the key under which the
/// record is stored in its election.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    pub name: String,
    pub age: u32,
    pub voted: bool,
}

/// Free-text feedback left by a voter along with their ballot.
///
/// The voter may since have been removed from the election.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "voter")]
    pub voter_id: String,
    pub text: String,
}

/// One election: its ballot, its electorate and its tally.
///
/// Invariant: every candidate has exactly one entry in `votes` and every
/// entry in `votes` belongs to a candidate.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Election {
    pub(crate) candidates: Vec<Candidate>,
    #[serde(with = "ordered_map")]
    pub(crate) voters: Vec<(String, Voter)>,
    #[serde(with = "ordered_map")]
    pub(crate) votes: Vec<(String, u64)>,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) results_published: bool,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub username: String,
    pub password: String,
}

/// Everything that is persisted: the admin accounts and all the elections,
/// keyed by name in creation order.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub(crate) admins: Vec<Admin>,
    #[serde(with = "ordered_map")]
    pub(crate) elections: Vec<(String, Election)>,
}

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

impl StoreState {
    /// The state of a store that has never been written: the default admin
    /// account and no elections.
    pub fn initial() -> StoreState {
        StoreState {
            admins: vec![Admin {
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password: DEFAULT_ADMIN_PASSWORD.to_string(),
            }],
            elections: Vec::new(),
        }
    }
}

/// A reference to an entry of a roster, as typed by an operator.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum EntryRef {
    /// The 1-based position in display order.
    Position(usize),
    /// The system-assigned identifier.
    Id(String),
}

impl EntryRef {
    /// Numbers are positions, anything else is taken as an identifier.
    pub fn parse(input: &str) -> EntryRef {
        let trimmed = input.trim();
        match trimmed.parse::<usize>() {
            Ok(pos) => EntryRef::Position(pos),
            Err(_) => EntryRef::Id(trimmed.to_string()),
        }
    }
}

impl Display for EntryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRef::Position(pos) => write!(f, "#{}", pos),
            EntryRef::Id(id) => write!(f, "{}", id),
        }
    }
}

// ******** Output data structures *********

/// An eligible voter, ready to fill in a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub election: String,
    pub voter_id: String,
    pub voter_name: String,
    /// The choices, in ballot order. Selections are 1-based positions in this list.
    pub candidates: Vec<Candidate>,
}

/// Where a voter ID stands in the voting state machine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VoterStatus {
    NotFound,
    Eligible { election: String },
    Voted { election: String },
}

#[derive(PartialEq, Debug, Clone)]
pub struct CandidateTally {
    pub candidate: Candidate,
    pub votes: u64,
    /// Share of the total, between 0 and 100.
    pub percentage: f64,
}

impl CandidateTally {
    pub fn percentage_label(&self) -> String {
        format!("{:.2}%", self.percentage)
    }
}

// Flag to indicate if a tiebreak happened.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TiebreakSituation {
    Clean,
    TiebreakOccured,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Tabulation {
    pub total_votes: u64,
    /// One row per candidate, in ballot order.
    pub rows: Vec<CandidateTally>,
    pub winner: Candidate,
    /// All the candidates sharing the highest count, in ballot order.
    /// Only contains the winner when there is no tie.
    pub leaders: Vec<Candidate>,
    pub tiebreak: TiebreakSituation,
}

/// What a results viewer is allowed to see.
#[derive(PartialEq, Debug, Clone)]
pub enum ResultsView {
    /// The results have not been published. No count is disclosed.
    NotPublished,
    /// Published, but nobody has voted for a current candidate.
    NoVotes,
    Published(Tabulation),
}

// ********* Errors **********

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ElectionError {
    #[snafu(display("Election '{name}' already exists"))]
    DuplicateName { name: String },

    #[snafu(display("The election name cannot be empty"))]
    EmptyName {},

    #[snafu(display("No {kind} matches {reference}"))]
    NotFound {
        kind: &'static str,
        reference: String,
    },

    #[snafu(display("Voter must be at least 18 years old (got {age})"))]
    Underage { age: u32 },

    #[snafu(display("Invalid age: {input:?}"))]
    InvalidAge { input: String },

    #[snafu(display("Invalid voter ID: {voter_id:?}"))]
    UnknownVoter { voter_id: String },

    #[snafu(display("Voter {voter_id} has already voted"))]
    AlreadyVoted { voter_id: String },

    #[snafu(display("Invalid candidate selection: {selection:?}"))]
    InvalidSelection { selection: String },

    #[snafu(display("Candidate {candidate_id} has no entry in the tally"))]
    MissingTally { candidate_id: String },

    #[snafu(display("Invalid credentials"))]
    InvalidCredentials {},

    #[snafu(display("Storage failure on {}: {source}", path.display()))]
    StorageFailure {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("Store {} is not a valid election file: {source}", path.display()))]
    CorruptStore {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[snafu(display("Store {} is not a valid election file: {reason}", path.display()))]
    InconsistentStore { reason: String, path: PathBuf },

    #[snafu(display("Could not encode the elections for {}: {source}", path.display()))]
    EncodingFailure {
        source: serde_json::Error,
        path: PathBuf,
    },
}

impl ElectionError {
    /// Storage errors end the session. Everything else only aborts the
    /// current operation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ElectionError::StorageFailure { .. }
                | ElectionError::CorruptStore { .. }
                | ElectionError::InconsistentStore { .. }
                | ElectionError::EncodingFailure { .. }
        )
    }
}

pub type ElectionResult<T> = Result<T, ElectionError>;

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Among the candidates sharing the highest count, the one registered
    /// first wins.
    UseCandidateOrder,
    // The winner among tied candidates is picked by hashing the seed with the
    // candidate IDs: hard to guess in advance, but reproducible.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultRules {
    pub tiebreak_mode: TieBreakMode,
}

impl ResultRules {
    pub const DEFAULT_RULES: ResultRules = ResultRules {
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
    };
}

impl Default for ResultRules {
    fn default() -> Self {
        ResultRules::DEFAULT_RULES
    }
}
