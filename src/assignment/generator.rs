//! Assignment generation.
//!
//! The default strategy is a Monte-Carlo derangement search: shuffle the
//! givers and the receiver pool, hand each giver the first receiver that is
//! allowed and still free, and throw the whole pass away on a dead end.
//! Passes repeat with fresh shuffles until one succeeds or the attempt bound
//! is spent.
//!
//! # Example
//!
//! ```
//! use gift_exchange_core::assignment::{
//!     AssignmentGenerator, ExclusionPair, ExclusionSet, GeneratorConfig, ParticipantId,
//! };
//!
//! let participants: Vec<ParticipantId> =
//!     ["alice", "bob", "carol", "dave"].into_iter().map(ParticipantId::from).collect();
//! let exclusions: ExclusionSet = [ExclusionPair::new("alice", "bob")].into_iter().collect();
//!
//! let mut generator = AssignmentGenerator::new(GeneratorConfig::new().with_seed(7)).unwrap();
//! let assignments = generator.generate(&participants, &exclusions).unwrap();
//!
//! assert_eq!(assignments.len(), 4);
//! assert!(assignments.is_valid_for(&participants, &exclusions));
//! ```

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::config::{GeneratorConfig, Strategy};
use super::error::{GenerationError, Result};
use super::matching;
use super::types::{Assignment, AssignmentSet, ExclusionSet, ParticipantId};

/// Generates assignment sets from a participant list and exclusion set.
///
/// Owns its randomness source. Build it with [`AssignmentGenerator::new`]
/// to seed from the configuration, or [`AssignmentGenerator::with_rng`] to
/// supply any [`Rng`].
#[derive(Debug)]
pub struct AssignmentGenerator<R = StdRng> {
    config: GeneratorConfig,
    rng: R,
}

impl AssignmentGenerator<StdRng> {
    /// Creates a generator seeded from `config.seed`, or from OS entropy
    /// when no seed is set.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> AssignmentGenerator<R> {
    /// Creates a generator using the given randomness source.
    ///
    /// `config.seed` is ignored; the caller owns seeding of `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the configuration is invalid.
    pub fn with_rng(config: GeneratorConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produces a complete assignment set, or fails without a partial result.
    ///
    /// Calling again with the same inputs yields an equally valid and
    /// usually different set.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::InvalidInput`] if there are fewer than two
    ///   participants, a duplicate participant, or an exclusion pair that is
    ///   a self-pair or names an unknown participant. No search is made.
    /// - [`GenerationError::Unsatisfiable`] if no valid set was found.
    pub fn generate(
        &mut self,
        participants: &[ParticipantId],
        exclusions: &ExclusionSet,
    ) -> Result<AssignmentSet> {
        let allowed = allowed_edges(participants, exclusions)?;

        let (pairs, attempts) = match self.config.strategy {
            Strategy::RandomizedRetry => self.randomized_retry(&allowed)?,
            Strategy::Matching => {
                let pairs = matching::perfect_matching(&allowed, &mut self.rng).ok_or_else(|| {
                    tracing::warn!(
                        participants = participants.len(),
                        exclusions = exclusions.len(),
                        "No perfect matching exists for the given exclusions"
                    );
                    GenerationError::Unsatisfiable { attempts: 1 }
                })?;
                (pairs, 1)
            }
        };

        let set = AssignmentSet::from_assignments(
            pairs
                .into_iter()
                .map(|(giver, receiver)| {
                    Assignment::new(participants[giver].clone(), participants[receiver].clone())
                })
                .collect(),
        );
        debug_assert!(set.is_valid_for(participants, exclusions));

        tracing::info!(
            participants = participants.len(),
            exclusions = exclusions.len(),
            attempts,
            strategy = self.config.strategy.as_str(),
            "Generated assignments"
        );

        Ok(set)
    }

    /// Runs shuffled greedy passes until one completes.
    ///
    /// Returns the `(giver, receiver)` index pairs and the attempt number
    /// that succeeded.
    fn randomized_retry(&mut self, allowed: &[Vec<bool>]) -> Result<(Vec<(usize, usize)>, u32)> {
        let mut givers: Vec<usize> = (0..allowed.len()).collect();
        let mut receivers = givers.clone();

        for attempt in 1..=self.config.max_attempts {
            givers.shuffle(&mut self.rng);
            receivers.shuffle(&mut self.rng);

            if let Some(pairs) = greedy_pass(allowed, &givers, &receivers) {
                return Ok((pairs, attempt));
            }
            tracing::debug!(attempt, "Assignment pass hit a dead end, reshuffling");
        }

        tracing::warn!(
            attempts = self.config.max_attempts,
            participants = allowed.len(),
            "Attempt bound exhausted without a valid assignment"
        );
        Err(GenerationError::Unsatisfiable {
            attempts: self.config.max_attempts,
        })
    }
}

/// Generates an assignment set with the default configuration and an
/// entropy-seeded generator.
///
/// # Errors
///
/// See [`AssignmentGenerator::generate`].
pub fn generate(participants: &[ParticipantId], exclusions: &ExclusionSet) -> Result<AssignmentSet> {
    AssignmentGenerator::new(GeneratorConfig::default())?.generate(participants, exclusions)
}

/// Validates the inputs and builds the allowed-edge matrix.
///
/// `allowed[g][r]` is `true` when participant `g` may give to participant `r`.
fn allowed_edges(
    participants: &[ParticipantId],
    exclusions: &ExclusionSet,
) -> Result<Vec<Vec<bool>>> {
    if participants.len() < 2 {
        return Err(GenerationError::InvalidInput(format!(
            "at least 2 participants required, got {}",
            participants.len()
        )));
    }

    let mut index: HashMap<&ParticipantId, usize> = HashMap::with_capacity(participants.len());
    for (i, id) in participants.iter().enumerate() {
        if index.insert(id, i).is_some() {
            return Err(GenerationError::InvalidInput(format!(
                "duplicate participant: {id}"
            )));
        }
    }

    let n = participants.len();
    let mut allowed: Vec<Vec<bool>> = (0..n).map(|g| (0..n).map(|r| g != r).collect()).collect();

    for pair in exclusions.iter() {
        if pair.is_self_pair() {
            return Err(GenerationError::InvalidInput(format!(
                "exclusion pair names the same participant twice: {}",
                pair.first()
            )));
        }
        let a = *index.get(pair.first()).ok_or_else(|| {
            GenerationError::InvalidInput(format!(
                "exclusion pair references unknown participant: {}",
                pair.first()
            ))
        })?;
        let b = *index.get(pair.second()).ok_or_else(|| {
            GenerationError::InvalidInput(format!(
                "exclusion pair references unknown participant: {}",
                pair.second()
            ))
        })?;
        allowed[a][b] = false;
        allowed[b][a] = false;
    }

    Ok(allowed)
}

/// One first-fit pass. Returns `None` as soon as any giver has no free,
/// allowed receiver left.
fn greedy_pass(
    allowed: &[Vec<bool>],
    givers: &[usize],
    receivers: &[usize],
) -> Option<Vec<(usize, usize)>> {
    let mut taken = vec![false; allowed.len()];
    let mut pairs = Vec::with_capacity(givers.len());

    for &giver in givers {
        let receiver = receivers
            .iter()
            .copied()
            .find(|&r| allowed[giver][r] && !taken[r])?;
        taken[receiver] = true;
        pairs.push((giver, receiver));
    }

    Some(pairs)
}
