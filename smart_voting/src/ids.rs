use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters following the prefix.
pub const ID_SUFFIX_LEN: usize = 5;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum IdKind {
    Candidate,
    Voter,
}

impl IdKind {
    pub fn prefix(self) -> char {
        match self {
            IdKind::Candidate => 'C',
            IdKind::Voter => 'V',
        }
    }
}

/// Produces identifiers such as `CX3K9Q` (candidates) or `V07ZTA` (voters).
pub struct IdGenerator {
    rng: Box<dyn RngCore>,
}

impl IdGenerator {
    pub fn new() -> IdGenerator {
        IdGenerator {
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// A generator that always produces the same sequence of identifiers.
    pub fn seeded(seed: u64) -> IdGenerator {
        IdGenerator {
            rng: Box::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn draw(&mut self, kind: IdKind) -> String {
        let mut id = String::with_capacity(ID_SUFFIX_LEN + 1);
        id.push(kind.prefix());
        for _ in 0..ID_SUFFIX_LEN {
            let idx = self.rng.gen_range(0..ID_ALPHABET.len());
            id.push(ID_ALPHABET[idx] as char);
        }
        id
    }

    /// Draws identifiers until one is not taken.
    pub fn fresh_id(&mut self, kind: IdKind, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.draw(kind);
            if !is_taken(&id) {
                return id;
            }
            warn!("fresh_id: {} is already in use, drawing again", id);
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator::new()
    }
}
