/*!
Election registry with one vote per voter.

An [`ElectionSystem`] holds every election of a store in memory and writes the
whole store back through an [`ElectionRepository`] after each change:

```
use smart_voting::*;

let mut system = ElectionSystem::open(MemoryStore::new(), ResultRules::DEFAULT_RULES)?;
system.create_election("City Council")?;
system.add_candidate("City Council", "Alice", "Green")?;
let sam = system.add_voter("City Council", "Sam", "30")?;

let ballot = system.authenticate(&sam)?;
system.cast_vote(&ballot.election, &ballot.voter_id, 1, None)?;
system.publish_results("City Council")?;

match system.view_results("City Council")? {
    ResultsView::Published(t) => assert_eq!(t.winner.name, "Alice"),
    _ => unreachable!(),
}
# Ok::<(), ElectionError>(())
```
*/

mod config;
pub mod ids;
pub mod manual;
mod ordered_map;
pub mod results;
pub mod roster;
pub mod store;
pub mod voting;

use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::ids::{IdGenerator, IdKind};
pub use crate::store::{ElectionRepository, JsonFileStore, MemoryStore, DEFAULT_STORE_PATH};

impl StoreState {
    pub fn admins(&self) -> &[Admin] {
        &self.admins
    }

    /// The elections, in creation order.
    pub fn elections(&self) -> impl Iterator<Item = (&str, &Election)> {
        self.elections.iter().map(|(name, e)| (name.as_str(), e))
    }

    pub fn election(&self, name: &str) -> Option<&Election> {
        self.elections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    pub(crate) fn election_mut(&mut self, name: &str) -> Option<&mut Election> {
        self.elections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Every candidate and voter identifier, across all the elections.
    pub fn all_ids(&self) -> HashSet<String> {
        self.elections
            .iter()
            .flat_map(|(_, e)| e.ids())
            .map(|id| id.to_string())
            .collect()
    }

    /// Describes the first broken invariant of the state, if any: an
    /// identifier used twice across the store, a candidate without a tally
    /// entry, or a tally entry without a candidate.
    pub fn inconsistency(&self) -> Option<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (name, e) in self.elections.iter() {
            if let Some(id) = e.ids().find(|id| !seen.insert(*id)) {
                return Some(format!("ID {} is used more than once ({:?})", id, name));
            }
            let candidate_ids: HashSet<&str> =
                e.candidates.iter().map(|c| c.id.as_str()).collect();
            let tally_ids: HashSet<&str> = e.votes.iter().map(|(cid, _)| cid.as_str()).collect();
            if let Some(c) = e
                .candidates
                .iter()
                .find(|c| !tally_ids.contains(c.id.as_str()))
            {
                return Some(format!("candidate {} of {:?} has no tally entry", c.id, name));
            }
            if let Some((cid, _)) = e
                .votes
                .iter()
                .find(|(cid, _)| !candidate_ids.contains(cid.as_str()))
            {
                return Some(format!(
                    "tally entry {} of {:?} belongs to no candidate",
                    cid, name
                ));
            }
        }
        None
    }
}

/// The elections of one store, and the operations on them.
///
/// Every successful mutation is persisted before the call returns. An error
/// leaves the in-memory state unchanged, except for a failed save which is
/// reported as a fatal error (see [`ElectionError::is_fatal`]).
pub struct ElectionSystem<R: ElectionRepository> {
    repository: R,
    state: StoreState,
    ids: IdGenerator,
    rules: ResultRules,
}

impl<R: ElectionRepository> ElectionSystem<R> {
    /// Loads the store and starts a session on it.
    pub fn open(mut repository: R, rules: ResultRules) -> ElectionResult<ElectionSystem<R>> {
        let state = repository.load()?;
        info!(
            "open: loaded {} elections, tiebreak mode {:?}",
            state.elections.len(),
            rules.tiebreak_mode
        );
        Ok(ElectionSystem {
            repository,
            state,
            ids: IdGenerator::new(),
            rules,
        })
    }

    pub fn with_id_generator(self, ids: IdGenerator) -> ElectionSystem<R> {
        ElectionSystem { ids, ..self }
    }

    /// Replaces the in-memory state with the committed one.
    pub fn reload(&mut self) -> ElectionResult<()> {
        self.state = self.repository.load()?;
        debug!("reload: {} elections", self.state.elections.len());
        Ok(())
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn rules(&self) -> &ResultRules {
        &self.rules
    }

    fn persist(&mut self) -> ElectionResult<()> {
        self.repository.save(&self.state)?;
        info!("persist: store saved");
        Ok(())
    }

    /// Succeeds if an admin account matches both fields exactly.
    pub fn check_admin(&self, username: &str, password: &str) -> ElectionResult<()> {
        let found = self
            .state
            .admins
            .iter()
            .any(|a| a.username == username && a.password == password);
        ensure!(found, InvalidCredentialsSnafu);
        info!("check_admin: {} logged in", username);
        Ok(())
    }

    /// The names of the elections, in creation order.
    pub fn list_elections(&self) -> Vec<&str> {
        self.state.elections.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn election(&self, name: &str) -> ElectionResult<&Election> {
        self.state.election(name).context(NotFoundSnafu {
            kind: "election",
            reference: name,
        })
    }

    pub(crate) fn election_mut(&mut self, name: &str) -> ElectionResult<&mut Election> {
        self.state.election_mut(name).context(NotFoundSnafu {
            kind: "election",
            reference: name,
        })
    }

    /// Creates an empty election. The name is trimmed and must not be taken.
    pub fn create_election(&mut self, name: &str) -> ElectionResult<()> {
        let name = name.trim();
        ensure!(!name.is_empty(), EmptyNameSnafu);
        if self.state.election(name).is_some() {
            warn!("create_election: {:?} already exists", name);
            return DuplicateNameSnafu { name }.fail();
        }
        self.state
            .elections
            .push((name.to_string(), Election::default()));
        info!("create_election: created {:?}", name);
        self.persist()
    }

    /// Deletes an election with everything it contains.
    ///
    /// Returns false, without touching anything, if the deletion was not
    /// confirmed.
    pub fn delete_election(&mut self, name: &str, confirmed: bool) -> ElectionResult<bool> {
        let idx = self
            .state
            .elections
            .iter()
            .position(|(n, _)| n == name)
            .context(NotFoundSnafu {
                kind: "election",
                reference: name,
            })?;
        if !confirmed {
            debug!("delete_election: deletion of {:?} declined", name);
            return Ok(false);
        }
        let (_, removed) = self.state.elections.remove(idx);
        info!(
            "delete_election: deleted {:?} ({} candidates, {} voters)",
            name,
            removed.candidates.len(),
            removed.voters.len()
        );
        self.persist()?;
        Ok(true)
    }
}
