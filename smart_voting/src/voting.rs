// The voting engine: one ballot per registered voter.
//
// A voter ID goes through NotFound -> Eligible -> Voted. The last state is
// terminal: there is no way to withdraw or change a ballot.

use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use crate::config::*;
use crate::store::ElectionRepository;
use crate::ElectionSystem;

/// Reads a 1-based candidate selection typed by a voter.
pub fn parse_selection(input: &str) -> ElectionResult<usize> {
    let trimmed = input.trim();
    trimmed
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .context(InvalidSelectionSnafu { selection: trimmed })
}

impl Ballot {
    /// Reads the selection typed by the voter and checks it against the
    /// ballot. Returns the 1-based position of the chosen candidate.
    pub fn choose(&self, input: &str) -> ElectionResult<usize> {
        let selection = parse_selection(input)?;
        ensure!(
            selection <= self.candidates.len(),
            InvalidSelectionSnafu {
                selection: input.trim()
            }
        );
        Ok(selection)
    }
}

impl Election {
    /// Records the ballot of `voter_id` for the candidate at position
    /// `selection` (1-based), and the optional suggestion.
    ///
    /// All the checks run before anything is modified: on error the election
    /// is left untouched. Returns the ID of the chosen candidate.
    pub(crate) fn record_vote(
        &mut self,
        voter_id: &str,
        selection: usize,
        suggestion: Option<&str>,
    ) -> ElectionResult<String> {
        let voter_idx = self
            .voters
            .iter()
            .position(|(id, _)| id == voter_id)
            .context(UnknownVoterSnafu { voter_id })?;
        ensure!(
            !self.voters[voter_idx].1.voted,
            AlreadyVotedSnafu { voter_id }
        );
        let candidate = selection
            .checked_sub(1)
            .and_then(|idx| self.candidates.get(idx))
            .context(InvalidSelectionSnafu {
                selection: selection.to_string(),
            })?;
        let tally_idx = self
            .votes
            .iter()
            .position(|(cid, _)| *cid == candidate.id)
            .context(MissingTallySnafu {
                candidate_id: candidate.id.as_str(),
            })?;
        let candidate_id = candidate.id.clone();

        // Nothing can fail past this point.
        self.votes[tally_idx].1 += 1;
        self.voters[voter_idx].1.voted = true;
        if let Some(text) = suggestion.map(str::trim).filter(|t| !t.is_empty()) {
            self.suggestions.push(Suggestion {
                voter_id: voter_id.to_string(),
                text: text.to_string(),
            });
        }
        Ok(candidate_id)
    }
}

impl<R: ElectionRepository> ElectionSystem<R> {
    /// Looks up a voter ID across all the elections, in creation order.
    pub fn voter_status(&self, voter_id: &str) -> VoterStatus {
        let voter_id = voter_id.trim();
        for (name, election) in self.state.elections.iter() {
            if let Some(voter) = election.voter(voter_id) {
                return if voter.voted {
                    VoterStatus::Voted {
                        election: name.clone(),
                    }
                } else {
                    VoterStatus::Eligible {
                        election: name.clone(),
                    }
                };
            }
        }
        VoterStatus::NotFound
    }

    /// Signs a voter in with their ID and hands out their ballot.
    pub fn authenticate(&self, voter_id: &str) -> ElectionResult<Ballot> {
        let voter_id = voter_id.trim();
        let election_name = match self.voter_status(voter_id) {
            VoterStatus::NotFound => {
                debug!("authenticate: unknown voter id {:?}", voter_id);
                return UnknownVoterSnafu { voter_id }.fail();
            }
            VoterStatus::Voted { .. } => {
                warn!("authenticate: {} attempted to vote again", voter_id);
                return AlreadyVotedSnafu { voter_id }.fail();
            }
            VoterStatus::Eligible { election } => election,
        };
        let election = self.election(&election_name)?;
        let voter = election
            .voter(voter_id)
            .context(UnknownVoterSnafu { voter_id })?;
        Ok(Ballot {
            election: election_name.clone(),
            voter_id: voter_id.to_string(),
            voter_name: voter.name.clone(),
            candidates: election.candidates.clone(),
        })
    }

    /// Casts the vote of an eligible voter and persists it.
    ///
    /// The eligibility is checked again here. `selection` is the 1-based
    /// position on the ballot. A suggestion that is blank once trimmed is
    /// ignored.
    pub fn cast_vote(
        &mut self,
        election: &str,
        voter_id: &str,
        selection: usize,
        suggestion: Option<&str>,
    ) -> ElectionResult<()> {
        let voter_id = voter_id.trim();
        let res = self
            .election_mut(election)?
            .record_vote(voter_id, selection, suggestion);
        if let Err(ElectionError::AlreadyVoted { .. }) = &res {
            warn!("cast_vote: {} attempted to vote again", voter_id);
        }
        res?;
        // The choice itself is not logged.
        info!("cast_vote: ballot recorded in {:?}", election);
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::system;
    use crate::*;

    use super::parse_selection;

    fn sum_votes(e: &Election) -> u64 {
        e.tally().iter().map(|(_, c)| *c).sum()
    }

    fn count_voted(e: &Election) -> u64 {
        e.voters().filter(|(_, v)| v.voted).count() as u64
    }

    #[test]
    fn selections() {
        assert_eq!(parse_selection(" 2 ").unwrap(), 2);
        for bad in ["0", "", "x", "-1"] {
            assert!(matches!(
                parse_selection(bad),
                Err(ElectionError::InvalidSelection { .. })
            ));
        }
    }

    #[test]
    fn ballot_choices() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        s.add_candidate("Mayor", "Bob", "Blue").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();
        let ballot = s.authenticate(&v).unwrap();
        assert_eq!(ballot.choose("2").unwrap(), 2);
        for bad in ["3", "0", "Bob"] {
            assert!(matches!(
                ballot.choose(bad),
                Err(ElectionError::InvalidSelection { .. })
            ));
        }
    }

    #[test]
    fn state_machine() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();

        assert_eq!(s.voter_status("VNOBODY"), VoterStatus::NotFound);
        assert_eq!(
            s.voter_status(&v),
            VoterStatus::Eligible {
                election: "Mayor".to_string()
            }
        );
        assert!(matches!(
            s.authenticate("VNOBODY"),
            Err(ElectionError::UnknownVoter { .. })
        ));

        let ballot = s.authenticate(&format!(" {} ", v)).unwrap();
        assert_eq!(ballot.election, "Mayor");
        assert_eq!(ballot.voter_id, v);
        assert_eq!(ballot.voter_name, "Sam");
        assert_eq!(ballot.candidates.len(), 1);

        s.cast_vote(&ballot.election, &ballot.voter_id, 1, None)
            .unwrap();
        assert_eq!(
            s.voter_status(&v),
            VoterStatus::Voted {
                election: "Mayor".to_string()
            }
        );
        assert!(matches!(
            s.authenticate(&v),
            Err(ElectionError::AlreadyVoted { .. })
        ));
    }

    #[test]
    fn second_vote_changes_nothing() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        s.add_candidate("Mayor", "Bob", "Blue").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();

        s.cast_vote("Mayor", &v, 1, None).unwrap();
        let before = s.election("Mayor").unwrap().clone();
        let saves = s.repository().save_count();

        assert!(matches!(
            s.cast_vote("Mayor", &v, 2, Some("again")),
            Err(ElectionError::AlreadyVoted { .. })
        ));
        assert_eq!(s.election("Mayor").unwrap(), &before);
        assert_eq!(s.repository().save_count(), saves);
    }

    #[test]
    fn invalid_selection_is_atomic() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();
        let before = s.election("Mayor").unwrap().clone();

        for sel in [0, 2, 100] {
            assert!(matches!(
                s.cast_vote("Mayor", &v, sel, Some("hello")),
                Err(ElectionError::InvalidSelection { .. })
            ));
        }
        assert_eq!(s.election("Mayor").unwrap(), &before);
        assert!(!s.election("Mayor").unwrap().voter(&v).unwrap().voted);
    }

    #[test]
    fn voter_must_belong_to_the_election() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.create_election("Sheriff").unwrap();
        s.add_candidate("Sheriff", "Wyatt", "Independent").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();
        assert!(matches!(
            s.cast_vote("Sheriff", &v, 1, None),
            Err(ElectionError::UnknownVoter { .. })
        ));
    }

    #[test]
    fn missing_tally_entry_refuses_the_vote() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        let v = s.add_voter("Mayor", "Sam", "30").unwrap();
        s.election_mut("Mayor").unwrap().votes.clear();

        assert!(matches!(
            s.cast_vote("Mayor", &v, 1, None),
            Err(ElectionError::MissingTally { .. })
        ));
        assert!(!s.election("Mayor").unwrap().voter(&v).unwrap().voted);
    }

    #[test]
    fn suggestions_are_trimmed_and_optional() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        let a = s.add_voter("Mayor", "Ann", "30").unwrap();
        let b = s.add_voter("Mayor", "Ben", "31").unwrap();
        let c = s.add_voter("Mayor", "Cat", "32").unwrap();

        s.cast_vote("Mayor", &a, 1, Some("   ")).unwrap();
        s.cast_vote("Mayor", &b, 1, Some("  Open earlier  ")).unwrap();
        s.cast_vote("Mayor", &c, 1, None).unwrap();

        let e = s.election("Mayor").unwrap();
        assert_eq!(
            e.suggestions(),
            &[Suggestion {
                voter_id: b,
                text: "Open earlier".to_string()
            }]
        );
    }

    #[test]
    fn tally_matches_voters_who_voted() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        for (name, party) in [("Alice", "Green"), ("Bob", "Blue"), ("Cid", "Gold")] {
            s.add_candidate("Mayor", name, party).unwrap();
        }
        let voters: Vec<String> = (0..9)
            .map(|i| s.add_voter("Mayor", &format!("V{}", i), "50").unwrap())
            .collect();
        for (i, v) in voters.iter().enumerate().take(7) {
            s.cast_vote("Mayor", v, i % 3 + 1, None).unwrap();
            let e = s.election("Mayor").unwrap();
            assert_eq!(sum_votes(e), count_voted(e));
        }
        // Repeated attempts do not move the tally.
        for v in voters.iter().take(7) {
            assert!(s.cast_vote("Mayor", v, 1, None).is_err());
        }
        let e = s.election("Mayor").unwrap();
        assert_eq!(sum_votes(e), 7);
        assert_eq!(count_voted(e), 7);
    }

    #[test]
    fn removing_a_candidate_drops_its_votes() {
        let mut s = system();
        s.create_election("Mayor").unwrap();
        s.add_candidate("Mayor", "Alice", "Green").unwrap();
        s.add_candidate("Mayor", "Bob", "Blue").unwrap();
        let voters: Vec<String> = (0..5)
            .map(|i| s.add_voter("Mayor", &format!("V{}", i), "50").unwrap())
            .collect();
        for (i, v) in voters.iter().enumerate() {
            // Alice gets 3, Bob gets 2.
            s.cast_vote("Mayor", v, if i < 3 { 1 } else { 2 }, None)
                .unwrap();
        }
        let prior = sum_votes(s.election("Mayor").unwrap());
        s.remove_candidate("Mayor", &EntryRef::Position(1), true)
            .unwrap();

        let e = s.election("Mayor").unwrap();
        assert_eq!(e.tally().len(), 1);
        assert_eq!(sum_votes(e), prior - 3);
        assert_eq!(count_voted(e), 5);
        for v in voters.iter() {
            assert!(matches!(
                s.authenticate(v),
                Err(ElectionError::AlreadyVoted { .. })
            ));
        }
    }
}
