#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic rank pool builder for the Battle Factory.
//!
//! Each rank draws its rental candidates from a fixed list of source tiers.
//! The builder walks those tiers in priority order and keeps the first
//! candidate seen for every species, skipping malformed records and sets
//! that depend on a disabled battle mechanic, until the pool is full.

use std::collections::HashSet;

use battle_factory_core::{
    FactoryDataView, FactoryRank, MechanicFlags, MonId, ProgressStore, SourceTier, SpeciesId,
    FACTORY_RANK_POOL_MAX_SIZE,
};

/// Configuration parameters required to construct the rank pool builder.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    max_pool_size: usize,
}

impl Config {
    /// Creates a new configuration capping every pool at `max_pool_size` entries.
    #[must_use]
    pub const fn new(max_pool_size: usize) -> Self {
        Self { max_pool_size }
    }

    /// Maximum number of candidates kept per rank.
    #[must_use]
    pub const fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(FACTORY_RANK_POOL_MAX_SIZE)
    }
}

/// Candidate pools for every rank, in source-tier priority order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RankPools {
    pools: [Vec<MonId>; 4],
}

impl RankPools {
    /// Candidates available at the provided rank.
    #[must_use]
    pub fn pool(&self, rank: FactoryRank) -> &[MonId] {
        &self.pools[rank.index()]
    }

    /// Iterator over every rank paired with its pool, in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (FactoryRank, &[MonId])> + '_ {
        FactoryRank::ALL
            .into_iter()
            .map(move |rank| (rank, self.pool(rank)))
    }

    /// Total number of candidates across every rank.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }
}

/// Pure system that regenerates the four rank pools from static tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankPoolBuilder {
    config: Config,
}

impl RankPoolBuilder {
    /// Creates a new builder using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds every rank pool using the mechanic flags persisted in `store`.
    #[must_use]
    pub fn build_from_store<S>(&self, store: &S, data: FactoryDataView<'_>) -> RankPools
    where
        S: ProgressStore + ?Sized,
    {
        self.build(MechanicFlags::from_store(store), data)
    }

    /// Builds every rank pool for the provided mechanic flags.
    ///
    /// The result depends only on the arguments, so repeated calls with the
    /// same flags and tables yield identical pools.
    #[must_use]
    pub fn build(&self, flags: MechanicFlags, data: FactoryDataView<'_>) -> RankPools {
        let mut pools = RankPools::default();
        for rank in FactoryRank::ALL {
            pools.pools[rank.index()] = self.build_rank(rank, flags, data);
        }

        log::debug!(
            "rebuilt factory rank pools with {flags:?}: sizes {:?}",
            pools.pools.iter().map(Vec::len).collect::<Vec<_>>()
        );
        pools
    }

    /// Builds the pool for a single rank.
    #[must_use]
    pub fn build_rank(
        &self,
        rank: FactoryRank,
        flags: MechanicFlags,
        data: FactoryDataView<'_>,
    ) -> Vec<MonId> {
        let max_size = self.config.max_pool_size();
        let mut pool = Vec::with_capacity(max_size);
        let mut seen_species: HashSet<SpeciesId> = HashSet::new();

        let candidates = rank
            .source_tiers()
            .iter()
            .flat_map(|tier| data.tier(*tier).iter().copied());

        for mon_id in candidates {
            if pool.len() >= max_size {
                break;
            }

            let Some(mon) = data.mon(mon_id) else {
                log::trace!("rank {}: skipping unknown candidate {mon_id:?}", rank.number());
                continue;
            };

            if !data.is_valid_species(mon.species) {
                log::trace!(
                    "rank {}: skipping {mon_id:?} with invalid species {:?}",
                    rank.number(),
                    mon.species
                );
                continue;
            }

            if seen_species.contains(&mon.species) {
                continue;
            }

            if data.catalog().excludes(mon, flags) {
                log::trace!("rank {}: {mon_id:?} needs a disabled mechanic", rank.number());
                continue;
            }

            let _ = seen_species.insert(mon.species);
            pool.push(mon_id);
        }

        pool
    }
}

/// Malformed tier entry detected while validating the static tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RosterIssue {
    /// The tier references a candidate that is missing from the roster.
    #[error("{tier:?} entry {position} references unknown candidate {mon:?}")]
    UnknownMon {
        /// Tier containing the entry.
        tier: SourceTier,
        /// Zero-based position of the entry within the tier.
        position: usize,
        /// Referenced candidate.
        mon: MonId,
    },
    /// The candidate has the empty species.
    #[error("{tier:?} entry {position} ({mon:?}) has no species")]
    MissingSpecies {
        /// Tier containing the entry.
        tier: SourceTier,
        /// Zero-based position of the entry within the tier.
        position: usize,
        /// Referenced candidate.
        mon: MonId,
    },
    /// The candidate's species lies outside the species table.
    #[error("{tier:?} entry {position} ({mon:?}) has out-of-range species {species:?}")]
    SpeciesOutOfRange {
        /// Tier containing the entry.
        tier: SourceTier,
        /// Zero-based position of the entry within the tier.
        position: usize,
        /// Referenced candidate.
        mon: MonId,
        /// Offending species identifier.
        species: SpeciesId,
    },
}

/// Checks every configured tier for entries the pool builder would skip as malformed.
///
/// Issues are reported in tier declaration order and never affect pool
/// building, which tolerates the same entries by skipping them.
#[must_use]
pub fn validate_roster(data: FactoryDataView<'_>) -> Vec<RosterIssue> {
    let mut issues = Vec::new();
    for (tier, entries) in data.tiers() {
        for (position, &mon) in entries.iter().enumerate() {
            let Some(record) = data.mon(mon) else {
                issues.push(RosterIssue::UnknownMon {
                    tier,
                    position,
                    mon,
                });
                continue;
            };

            if record.species == SpeciesId::NONE {
                issues.push(RosterIssue::MissingSpecies {
                    tier,
                    position,
                    mon,
                });
            } else if !data.is_valid_species(record.species) {
                issues.push(RosterIssue::SpeciesOutOfRange {
                    tier,
                    position,
                    mon,
                    species: record.species,
                });
            }
        }
    }
    issues
}
