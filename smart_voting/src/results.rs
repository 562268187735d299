use log::{debug, info};

use crate::config::*;
use crate::store::ElectionRepository;
use crate::ElectionSystem;

/// Computes what a results viewer may see of an election.
///
/// Nothing is disclosed until the results are published. Percentages are
/// shares of the total number of votes, the winner is the candidate with the
/// highest count, and ties are resolved according to `rules`.
pub fn tabulate(election: &Election, rules: &ResultRules) -> ResultsView {
    if !election.results_published {
        debug!("tabulate: results not published");
        return ResultsView::NotPublished;
    }

    // Only the tally entries of current candidates count.
    let counts: Vec<(&Candidate, u64)> = election
        .candidates
        .iter()
        .map(|c| (c, election.votes_for(&c.id).unwrap_or(0)))
        .collect();
    let total_votes: u64 = counts.iter().map(|(_, count)| *count).sum();
    if total_votes == 0 {
        debug!("tabulate: no votes cast");
        return ResultsView::NoVotes;
    }

    let rows: Vec<CandidateTally> = counts
        .into_iter()
        .map(|(c, votes)| CandidateTally {
            candidate: c.clone(),
            votes,
            percentage: (votes as f64 / total_votes as f64) * 100.0,
        })
        .collect();
    debug!("tabulate: total {} rows {:?}", total_votes, rows);

    let max_count: u64 = rows.iter().map(|r| r.votes).max().unwrap_or(0);
    let leaders: Vec<Candidate> = rows
        .iter()
        .filter(|r| r.votes == max_count)
        .map(|r| r.candidate.clone())
        .collect();

    match select_winner(&leaders, rules.tiebreak_mode) {
        Some((winner, tiebreak)) => ResultsView::Published(Tabulation {
            total_votes,
            rows,
            winner,
            leaders,
            tiebreak,
        }),
        None => ResultsView::NoVotes,
    }
}

// Leaders are in ballot order.
fn select_winner(
    leaders: &[Candidate],
    tiebreak: TieBreakMode,
) -> Option<(Candidate, TiebreakSituation)> {
    match leaders {
        [] => None,
        [winner] => Some((winner.clone(), TiebreakSituation::Clean)),
        _ => {
            let winner = match tiebreak {
                TieBreakMode::UseCandidateOrder => leaders.first(),
                TieBreakMode::Random(seed) => leaders
                    .iter()
                    .min_by_key(|c| tiebreak_digest(seed, &c.id)),
            }?;
            debug!(
                "select_winner: {} tied, {:?} resolved to {}",
                leaders.len(),
                tiebreak,
                winner.id
            );
            Some((winner.clone(), TiebreakSituation::TiebreakOccured))
        }
    }
}

fn tiebreak_digest(seed: u32, candidate_id: &str) -> String {
    sha256::digest(format!("{:08}{}", seed, candidate_id))
}

impl<R: ElectionRepository> ElectionSystem<R> {
    /// Makes the results of an election visible. There is no way back.
    pub fn publish_results(&mut self, election: &str) -> ElectionResult<()> {
        let e = self.election_mut(election)?;
        e.results_published = true;
        info!("publish_results: results of {:?} published", election);
        self.persist()
    }

    pub fn view_results(&self, election: &str) -> ElectionResult<ResultsView> {
        Ok(tabulate(self.election(election)?, &self.rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::system;
    use crate::MemoryStore;

    fn race(names: &[&str], ballots: &[usize]) -> ElectionSystem<MemoryStore> {
        let mut s = system();
        s.create_election("Race").unwrap();
        for n in names {
            s.add_candidate("Race", n, "P").unwrap();
        }
        for sel in ballots {
            let v = s.add_voter("Race", "Voter", "30").unwrap();
            s.cast_vote("Race", &v, *sel, None).unwrap();
        }
        s
    }

    fn published(view: ResultsView) -> Tabulation {
        match view {
            ResultsView::Published(t) => t,
            other => panic!("expected a tabulation, got {:?}", other),
        }
    }

    #[test]
    fn nothing_before_publication() {
        let s = race(&["Alice", "Bob"], &[1, 1, 2]);
        assert_eq!(s.view_results("Race").unwrap(), ResultsView::NotPublished);
    }

    #[test]
    fn no_votes() {
        let mut s = race(&["Alice", "Bob"], &[]);
        s.publish_results("Race").unwrap();
        assert_eq!(s.view_results("Race").unwrap(), ResultsView::NoVotes);
        assert!(s.election("Race").unwrap().results_published());
    }

    #[test]
    fn counts_and_percentages() {
        let mut s = race(&["Alice", "Bob", "Cid"], &[1, 2, 2, 3, 2, 1, 2, 2]);
        s.publish_results("Race").unwrap();
        let t = published(s.view_results("Race").unwrap());

        assert_eq!(t.total_votes, 8);
        let names: Vec<&str> = t.rows.iter().map(|r| r.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Cid"]);
        let counts: Vec<u64> = t.rows.iter().map(|r| r.votes).collect();
        assert_eq!(counts, vec![2, 5, 1]);
        let labels: Vec<String> = t.rows.iter().map(|r| r.percentage_label()).collect();
        assert_eq!(labels, vec!["25.00%", "62.50%", "12.50%"]);
        assert_eq!(t.winner.name, "Bob");
        assert_eq!(t.leaders.len(), 1);
        assert_eq!(t.tiebreak, TiebreakSituation::Clean);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        let mut s = race(&["Alice", "Bob"], &[1, 2, 2]);
        s.publish_results("Race").unwrap();
        let t = published(s.view_results("Race").unwrap());
        assert_eq!(t.rows[0].percentage_label(), "33.33%");
        assert_eq!(t.rows[1].percentage_label(), "66.67%");
    }

    #[test]
    fn ties_go_to_the_first_registered_candidate() {
        let mut s = race(&["Alice", "Bob", "Cid"], &[3, 2, 1, 2, 3]);
        s.publish_results("Race").unwrap();
        let t = published(s.view_results("Race").unwrap());
        assert_eq!(t.winner.name, "Bob");
        let leaders: Vec<&str> = t.leaders.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(leaders, vec!["Bob", "Cid"]);
        assert_eq!(t.tiebreak, TiebreakSituation::TiebreakOccured);
    }

    #[test]
    fn seeded_tiebreak_is_reproducible() {
        let leaders: Vec<Candidate> = ["CAAAAA", "CBBBBB", "CCCCCC", "CDDDDD"]
            .iter()
            .map(|id| Candidate {
                id: id.to_string(),
                name: id.to_lowercase(),
                party: "P".to_string(),
            })
            .collect();
        let expected = leaders
            .iter()
            .min_by_key(|c| tiebreak_digest(11, &c.id))
            .unwrap()
            .clone();

        let mut reversed = leaders.clone();
        reversed.reverse();
        let (w1, tb) = select_winner(&leaders, TieBreakMode::Random(11)).unwrap();
        let (w2, _) = select_winner(&reversed, TieBreakMode::Random(11)).unwrap();
        assert_eq!(w1, expected);
        assert_eq!(w1, w2);
        assert_eq!(tb, TiebreakSituation::TiebreakOccured);

        let (w, _) = select_winner(&reversed, TieBreakMode::UseCandidateOrder).unwrap();
        assert_eq!(w.id, "CDDDDD");
        assert!(select_winner(&[], TieBreakMode::UseCandidateOrder).is_none());
    }

    #[test]
    fn stray_tally_entries_are_not_counted() {
        let mut s = race(&["Alice", "Bob"], &[2]);
        s.publish_results("Race").unwrap();
        s.election_mut("Race")
            .unwrap()
            .votes
            .push(("CGONE1".to_string(), 3));
        let t = published(s.view_results("Race").unwrap());
        assert_eq!(t.total_votes, 1);
        assert_eq!(t.rows[1].percentage_label(), "100.00%");
        assert_eq!(t.winner.name, "Bob");
    }

    #[test]
    fn removed_candidates_leave_the_results() {
        let mut s = race(&["Alice", "Bob"], &[1, 1, 2]);
        s.remove_candidate("Race", &EntryRef::Position(1), true)
            .unwrap();
        s.publish_results("Race").unwrap();
        let t = published(s.view_results("Race").unwrap());
        assert_eq!(t.total_votes, 1);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].percentage_label(), "100.00%");
        assert_eq!(t.winner.name, "Bob");
    }
}
