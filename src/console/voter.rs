use std::io::{BufRead, Write};

use log::debug;
use snafu::ResultExt;

use smart_voting::*;

use super::{AppResult, Console, ElectionSnafu};

impl<R: ElectionRepository, I: BufRead, O: Write> Console<R, I, O> {
    /// Signs a voter in and takes their ballot.
    ///
    /// The choice and the suggestion are both collected before anything is
    /// recorded, so that they are committed together.
    pub(super) fn voter_login(&mut self) -> AppResult<()> {
        self.system.reload().context(ElectionSnafu)?;
        self.clear()?;
        self.title("VOTER LOGIN")?;
        let voter_id = self.prompt("Enter your Voter ID: ")?;
        let authenticated = self.system.authenticate(&voter_id);
        let ballot = match self.recover(authenticated)? {
            Some(b) => b,
            None => return Ok(()),
        };

        self.clear()?;
        self.title(&format!("VOTING PAGE ({})", ballot.election))?;
        self.say(&format!("Welcome, {}!\n", ballot.voter_name))?;
        if ballot.candidates.is_empty() {
            self.say("No candidates to vote for yet.")?;
            return self.pause();
        }
        let lines: Vec<String> = ballot
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| format!("{}. {} ({})", idx + 1, c.name, c.party))
            .collect();
        self.say("Candidates:")?;
        self.say_lines(&lines)?;

        let choice = self.prompt("\nSelect candidate number: ")?;
        let selection = match self.recover(ballot.choose(&choice))? {
            Some(n) => n,
            None => return Ok(()),
        };
        let suggestion =
            self.prompt("Would you like to add a suggestion/feedback? (press Enter to skip): ")?;
        debug!("voter_login: ballot filled in");
        let cast = self.system.cast_vote(
            &ballot.election,
            &ballot.voter_id,
            selection,
            Some(suggestion.as_str()),
        );
        if self.recover(cast)?.is_some() {
            self.say("\nYour vote has been recorded successfully!")?;
            self.pause()?;
        }
        Ok(())
    }
}
