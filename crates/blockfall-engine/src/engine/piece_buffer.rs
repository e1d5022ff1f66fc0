use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Strategy used to generate the piece sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum PieceGeneration {
    /// Every run of 7 pieces contains each kind exactly once, in shuffled order.
    #[default]
    SevenBag,
    /// Each piece is drawn independently and uniformly.
    Uniform,
}

/// Deterministic source of upcoming pieces.
///
/// With [`PieceGeneration::SevenBag`] a shuffled set of all 7 kinds is appended whenever
/// 7 or fewer pieces remain queued, so no kind is ever absent for more than 12 draws.
/// With [`PieceGeneration::Uniform`] the queue is topped up with independent draws.
///
/// The queue always holds at least 8 pieces, which lets callers preview the next ones.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceBuffer, PieceGeneration, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut buffer = PieceBuffer::with_seed(PieceGeneration::SevenBag, seed);
///
/// let first = buffer.pop_next();
/// let upcoming: Vec<_> = buffer.next_pieces().take(5).collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBuffer {
    generation: PieceGeneration,
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
}

impl Default for PieceBuffer {
    fn default() -> Self {
        Self::new(PieceGeneration::default())
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece generator. Two buffers built from the same seed and
/// generation mode yield the same sequence, which is how all individuals of one
/// generation are made to play identical games.
///
/// Serialized as a 32-character hexadecimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{num:032x}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex seed: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex seed: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceBuffer {
    /// Creates a buffer seeded from the thread-local generator.
    #[must_use]
    pub fn new(generation: PieceGeneration) -> Self {
        Self::with_seed(generation, rand::rng().random())
    }

    #[must_use]
    pub fn with_seed(generation: PieceGeneration, seed: PieceSeed) -> Self {
        let mut this = Self {
            generation,
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.refill();
        this
    }

    #[must_use]
    pub fn generation(&self) -> PieceGeneration {
        self.generation
    }

    fn refill(&mut self) {
        while self.queue.len() <= PieceKind::LEN {
            match self.generation {
                PieceGeneration::SevenBag => {
                    let mut bag = PieceKind::ALL;
                    bag.shuffle(&mut self.rng);
                    self.queue.extend(bag);
                }
                PieceGeneration::Uniform => {
                    let kind = self.rng.random();
                    self.queue.push_back(kind);
                }
            }
        }
    }

    /// Draws the next piece.
    pub fn pop_next(&mut self) -> PieceKind {
        let kind = self
            .queue
            .pop_front()
            .expect("piece queue should never be empty");
        self.refill();
        kind
    }

    /// Upcoming pieces, in draw order.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }
}
