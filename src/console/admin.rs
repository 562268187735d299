use std::io::{BufRead, Write};

use log::{debug, info};
use snafu::ResultExt;

use smart_voting::*;

use super::commands::{AdminCommand, ManageCommand, MenuCommand};
use super::{AppResult, Console, ElectionSnafu};

impl<R: ElectionRepository, I: BufRead, O: Write> Console<R, I, O> {
    pub(super) fn admin_login(&mut self) -> AppResult<()> {
        // Another session may have written the store in the meantime.
        self.system.reload().context(ElectionSnafu)?;
        self.clear()?;
        self.title("ADMIN LOGIN")?;
        let username = self.prompt("Username: ")?;
        let password = self.prompt("Password: ")?;
        let checked = self.system.check_admin(&username, &password);
        if self.recover(checked)?.is_some() {
            self.admin_menu()?;
        }
        Ok(())
    }

    fn admin_menu(&mut self) -> AppResult<()> {
        loop {
            self.clear()?;
            self.title("ADMIN DASHBOARD")?;
            self.print_menu::<AdminCommand>()?;
            let choice = self.prompt("\nEnter your choice: ")?;
            match AdminCommand::parse(&choice) {
                Some(AdminCommand::CreateElection) => self.create_election()?,
                Some(AdminCommand::ViewElections) => self.view_elections()?,
                Some(AdminCommand::Logout) => {
                    info!("admin_menu: logout");
                    return Ok(());
                }
                None => self.invalid_choice(&choice)?,
            }
        }
    }

    fn create_election(&mut self) -> AppResult<()> {
        self.clear()?;
        self.title("CREATE ELECTION")?;
        let name = self.prompt("Election Name: ")?;
        let created = self.system.create_election(&name);
        if self.recover(created)?.is_some() {
            self.say(&format!("Election '{}' created successfully!", name.trim()))?;
            self.pause()?;
        }
        Ok(())
    }

    fn view_elections(&mut self) -> AppResult<()> {
        self.clear()?;
        self.title("ELECTIONS")?;
        let names: Vec<String> = self
            .system
            .list_elections()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        if names.is_empty() {
            self.say("No elections created yet.")?;
            return self.pause();
        }
        let lines: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(idx, n)| format!("{}. {}", idx + 1, n))
            .collect();
        self.say_lines(&lines)?;
        let choice = self.prompt("\nSelect an election (number): ")?;
        let selected = choice
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| idx.checked_sub(1))
            .and_then(|idx| names.get(idx));
        match selected {
            Some(name) => self.manage_election(name),
            None => self.invalid_choice(&choice),
        }
    }

    fn manage_election(&mut self, name: &str) -> AppResult<()> {
        debug!("manage_election: {:?}", name);
        loop {
            self.clear()?;
            self.title(&format!("MANAGE: {}", name))?;
            self.print_menu::<ManageCommand>()?;
            let choice = self.prompt("\nEnter your choice: ")?;
            let command = match ManageCommand::parse(&choice) {
                Some(c) => c,
                None => {
                    self.invalid_choice(&choice)?;
                    continue;
                }
            };
            match command {
                ManageCommand::AddCandidate => self.add_candidate(name)?,
                ManageCommand::AddVoter => self.add_voter(name)?,
                ManageCommand::ViewCandidates => {
                    let lines = self.candidate_lines(name);
                    self.show_page("CANDIDATES", lines)?;
                }
                ManageCommand::ViewVoters => {
                    let lines = self.voter_lines(name);
                    self.show_page("VOTERS", lines)?;
                }
                ManageCommand::RemoveCandidate => self.remove_candidate(name)?,
                ManageCommand::RemoveVoter => self.remove_voter(name)?,
                ManageCommand::ViewResults => {
                    let lines = self.result_lines(name);
                    self.show_page("RESULTS", lines)?;
                }
                ManageCommand::PublishResults => {
                    let published = self.system.publish_results(name);
                    if self.recover(published)?.is_some() {
                        self.say("Results published successfully!")?;
                        self.pause()?;
                    }
                }
                ManageCommand::DeleteElection => {
                    let confirmed =
                        self.confirm(&format!("Are you sure you want to delete '{}'?", name))?;
                    let deleted = self.system.delete_election(name, confirmed);
                    match self.recover(deleted)? {
                        Some(true) => {
                            self.say(&format!("Election '{}' deleted successfully!", name))?;
                            self.pause()?;
                            return Ok(());
                        }
                        Some(false) => {
                            self.say("Deletion canceled.")?;
                            self.pause()?;
                        }
                        None => {}
                    }
                }
                ManageCommand::GoBack => return Ok(()),
            }
        }
    }

    fn add_candidate(&mut self, election: &str) -> AppResult<()> {
        self.clear()?;
        self.title("ADD CANDIDATE")?;
        let name = self.prompt("Candidate Name: ")?;
        let party = self.prompt("Party Name: ")?;
        let added = self.system.add_candidate(election, &name, &party);
        if let Some(id) = self.recover(added)? {
            self.say(&format!(
                "Candidate '{}' added successfully! (ID: {})",
                name.trim(),
                id
            ))?;
            self.pause()?;
        }
        Ok(())
    }

    fn add_voter(&mut self, election: &str) -> AppResult<()> {
        self.clear()?;
        self.title("ADD VOTER")?;
        let name = self.prompt("Voter Name: ")?;
        let age = self.prompt("Age: ")?;
        let added = self.system.add_voter(election, &name, &age);
        if let Some(id) = self.recover(added)? {
            self.say(&format!(
                "Voter '{}' added successfully with ID: {}",
                name.trim(),
                id
            ))?;
            self.pause()?;
        }
        Ok(())
    }

    fn remove_candidate(&mut self, election: &str) -> AppResult<()> {
        self.clear()?;
        self.title("REMOVE CANDIDATE")?;
        let lines = self.candidate_lines(election);
        self.say_lines(&lines)?;
        let input = self.prompt("\nCandidate number or ID to remove: ")?;
        let entry = EntryRef::parse(&input);
        let found = self
            .system
            .election(election)
            .and_then(|e| e.resolve_candidate(&entry).map(|c| c.name.clone()));
        let candidate_name = match self.recover(found)? {
            Some(n) => n,
            None => return Ok(()),
        };
        let confirmed = self.confirm(&format!(
            "Are you sure you want to remove '{}'?",
            candidate_name
        ))?;
        let removed = self.system.remove_candidate(election, &entry, confirmed);
        match self.recover(removed)? {
            Some(Some(c)) => {
                self.say(&format!("Candidate '{}' removed successfully!", c.name))?;
                self.pause()
            }
            Some(None) => {
                self.say("Removal canceled.")?;
                self.pause()
            }
            None => Ok(()),
        }
    }

    fn remove_voter(&mut self, election: &str) -> AppResult<()> {
        self.clear()?;
        self.title("REMOVE VOTER")?;
        let lines = self.voter_lines(election);
        self.say_lines(&lines)?;
        let input = self.prompt("\nVoter number or ID to remove: ")?;
        let entry = EntryRef::parse(&input);
        let found = self
            .system
            .election(election)
            .and_then(|e| e.resolve_voter(&entry).map(|(_, v)| v.name.clone()));
        let voter_name = match self.recover(found)? {
            Some(n) => n,
            None => return Ok(()),
        };
        let confirmed =
            self.confirm(&format!("Are you sure you want to remove '{}'?", voter_name))?;
        let removed = self.system.remove_voter(election, &entry, confirmed);
        match self.recover(removed)? {
            Some(Some((id, _))) => {
                self.say(&format!("Voter {} removed successfully!", id))?;
                self.pause()
            }
            Some(None) => {
                self.say("Removal canceled.")?;
                self.pause()
            }
            None => Ok(()),
        }
    }

    fn show_page(&mut self, title: &str, lines: Vec<String>) -> AppResult<()> {
        self.clear()?;
        self.title(title)?;
        self.say_lines(&lines)?;
        self.pause()
    }

    // ********* Rendering **********

    fn candidate_lines(&self, election: &str) -> Vec<String> {
        let candidates = match self.system.election(election) {
            Ok(e) => e.candidates(),
            Err(e) => return vec![e.to_string()],
        };
        if candidates.is_empty() {
            return vec!["No candidates added yet.".to_string()];
        }
        candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| format!("{}. {} - {} ({})", idx + 1, c.id, c.name, c.party))
            .collect()
    }

    fn voter_lines(&self, election: &str) -> Vec<String> {
        let election = match self.system.election(election) {
            Ok(e) => e,
            Err(e) => return vec![e.to_string()],
        };
        let lines: Vec<String> = election
            .voters()
            .enumerate()
            .map(|(idx, (id, v))| {
                format!(
                    "{}. {} - {} ({} yrs) - {}",
                    idx + 1,
                    id,
                    v.name,
                    v.age,
                    if v.voted { "Voted" } else { "Not Voted" }
                )
            })
            .collect();
        if lines.is_empty() {
            vec!["No voters registered yet.".to_string()]
        } else {
            lines
        }
    }

    fn result_lines(&self, election: &str) -> Vec<String> {
        let view = match self.system.view_results(election) {
            Ok(v) => v,
            Err(e) => return vec![e.to_string()],
        };
        match view {
            ResultsView::NotPublished => vec!["Results not published yet.".to_string()],
            ResultsView::NoVotes => vec!["No votes cast yet.".to_string()],
            ResultsView::Published(t) => {
                let mut lines: Vec<String> = t
                    .rows
                    .iter()
                    .map(|r| {
                        format!(
                            "{} ({}): {} votes ({})",
                            r.candidate.name,
                            r.candidate.party,
                            r.votes,
                            r.percentage_label()
                        )
                    })
                    .collect();
                lines.push(String::new());
                lines.push(format!("Total votes: {}", t.total_votes));
                if t.tiebreak == TiebreakSituation::TiebreakOccured {
                    let names: Vec<&str> = t.leaders.iter().map(|c| c.name.as_str()).collect();
                    lines.push(format!("Tie between: {}", names.join(", ")));
                }
                lines.push(format!("Winner: {} ({})", t.winner.name, t.winner.party));
                lines
            }
        }
    }
}
