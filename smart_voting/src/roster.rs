// Candidates and voters of a single election.

use log::{debug, info};
use snafu::{ensure, OptionExt};

use crate::config::*;
use crate::ids::IdKind;
use crate::store::ElectionRepository;
use crate::ElectionSystem;

pub const MINIMUM_AGE: u32 = 18;

/// Reads an age typed by an operator.
///
/// Fails with `InvalidAge` if the input is not a non-negative integer and with
/// `Underage` below [`MINIMUM_AGE`].
pub fn parse_age(input: &str) -> ElectionResult<u32> {
    let trimmed = input.trim();
    let age = trimmed
        .parse::<u32>()
        .ok()
        .context(InvalidAgeSnafu { input: trimmed })?;
    ensure!(age >= MINIMUM_AGE, UnderageSnafu { age });
    Ok(age)
}

impl Election {
    /// The ballot, in registration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The electorate as (voter ID, voter) pairs, in registration order.
    pub fn voters(&self) -> impl Iterator<Item = (&str, &Voter)> {
        self.voters.iter().map(|(id, v)| (id.as_str(), v))
    }

    pub fn voter(&self, voter_id: &str) -> Option<&Voter> {
        self.voters
            .iter()
            .find(|(id, _)| id == voter_id)
            .map(|(_, v)| v)
    }

    /// The tally as (candidate ID, count) pairs.
    pub fn tally(&self) -> &[(String, u64)] {
        &self.votes
    }

    pub fn votes_for(&self, candidate_id: &str) -> Option<u64> {
        self.votes
            .iter()
            .find(|(cid, _)| cid == candidate_id)
            .map(|(_, count)| *count)
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn results_published(&self) -> bool {
        self.results_published
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.voters.iter().map(|(id, _)| id.as_str()))
    }

    fn candidate_position(&self, entry: &EntryRef) -> ElectionResult<usize> {
        let found = match entry {
            EntryRef::Position(pos) => pos
                .checked_sub(1)
                .filter(|idx| *idx < self.candidates.len()),
            EntryRef::Id(id) => self.candidates.iter().position(|c| c.id == *id),
        };
        found.context(NotFoundSnafu {
            kind: "candidate",
            reference: entry.to_string(),
        })
    }

    fn voter_position(&self, entry: &EntryRef) -> ElectionResult<usize> {
        let found = match entry {
            EntryRef::Position(pos) => pos.checked_sub(1).filter(|idx| *idx < self.voters.len()),
            EntryRef::Id(id) => self.voters.iter().position(|(vid, _)| vid == id),
        };
        found.context(NotFoundSnafu {
            kind: "voter",
            reference: entry.to_string(),
        })
    }

    pub fn resolve_candidate(&self, entry: &EntryRef) -> ElectionResult<&Candidate> {
        let idx = self.candidate_position(entry)?;
        Ok(&self.candidates[idx])
    }

    pub fn resolve_voter(&self, entry: &EntryRef) -> ElectionResult<(&str, &Voter)> {
        let idx = self.voter_position(entry)?;
        let (id, voter) = &self.voters[idx];
        Ok((id.as_str(), voter))
    }

    pub(crate) fn insert_candidate(&mut self, id: String, name: &str, party: &str) {
        self.candidates.push(Candidate {
            id: id.clone(),
            name: name.to_string(),
            party: party.to_string(),
        });
        self.votes.push((id, 0));
    }

    // The tally entry goes with the candidate. Votes already cast for this
    // candidate are dropped, and their voters stay marked as having voted.
    pub(crate) fn remove_candidate_at(&mut self, idx: usize) -> (Candidate, u64) {
        let candidate = self.candidates.remove(idx);
        let mut dropped = 0;
        self.votes.retain(|(cid, count)| {
            if *cid == candidate.id {
                dropped += *count;
                false
            } else {
                true
            }
        });
        (candidate, dropped)
    }

    pub(crate) fn insert_voter(&mut self, id: String, name: &str, age: u32) {
        self.voters.push((
            id,
            Voter {
                name: name.to_string(),
                age,
                voted: false,
            },
        ));
    }
}

impl<R: ElectionRepository> ElectionSystem<R> {
    fn fresh_id(&mut self, kind: IdKind) -> String {
        let taken = self.state.all_ids();
        self.ids.fresh_id(kind, |id| taken.contains(id))
    }

    /// Registers a candidate at the end of the ballot, with an empty tally.
    /// Returns the new candidate ID.
    pub fn add_candidate(
        &mut self,
        election: &str,
        name: &str,
        party: &str,
    ) -> ElectionResult<String> {
        self.election(election)?;
        let id = self.fresh_id(IdKind::Candidate);
        self.election_mut(election)?
            .insert_candidate(id.clone(), name.trim(), party.trim());
        info!("add_candidate: {} ({}) added to {:?}", id, name, election);
        self.persist()?;
        Ok(id)
    }

    /// Removes a candidate and its tally entry.
    ///
    /// Returns `None`, without touching anything, if the removal was not
    /// confirmed.
    pub fn remove_candidate(
        &mut self,
        election: &str,
        entry: &EntryRef,
        confirmed: bool,
    ) -> ElectionResult<Option<Candidate>> {
        let idx = self.election(election)?.candidate_position(entry)?;
        if !confirmed {
            debug!("remove_candidate: removal of {} declined", entry);
            return Ok(None);
        }
        let (candidate, dropped) = self.election_mut(election)?.remove_candidate_at(idx);
        info!(
            "remove_candidate: {} removed from {:?}, {} votes dropped",
            candidate.id, election, dropped
        );
        self.persist()?;
        Ok(Some(candidate))
    }

    /// Registers a voter. `age` is the raw operator input, see [`parse_age`].
    /// Returns the new voter ID.
    pub fn add_voter(&mut self, election: &str, name: &str, age: &str) -> ElectionResult<String> {
        self.election(election)?;
        let age = parse_age(age)?;
        let id = self.fresh_id(IdKind::Voter);
        self.election_mut(election)?
            .insert_voter(id.clone(), name.trim(), age);
        info!("add_voter: {} registered in {:?}", id, election);
        self.persist()?;
        Ok(id)
    }

    /// Removes a voter. Their suggestions are kept.
    ///
    /// Returns `None`, without touching anything, if the removal was not
    /// confirmed.
    pub fn remove_voter(
        &mut self,
        election: &str,
        entry: &EntryRef,
        confirmed: bool,
    ) -> ElectionResult<Option<(String, Voter)>> {
        let idx = self.election(election)?.voter_position(entry)?;
        if !confirmed {
            debug!("remove_voter: removal of {} declined", entry);
            return Ok(None);
        }
        let removed = self.election_mut(election)?.voters.remove(idx);
        info!("remove_voter: {} removed from {:?}", removed.0, election);
        self.persist()?;
        Ok(Some(removed))
    }
}
