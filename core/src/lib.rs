#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Battle Factory rules engine.
//!
//! This crate defines the vocabulary that connects the host save system, the
//! authoritative save block, and the pure systems. Systems never own
//! persistent state: they read and write progression counters through the
//! [`ProgressStore`] capability, borrow static candidate tables through a
//! [`FactoryDataView`], and report the transitions they performed as
//! [`CadenceEvent`] values.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Number of battles that make up a single Factory challenge.
pub const BATTLES_PER_CHALLENGE: u16 = 7;

/// Number of challenges between two boss milestones.
pub const BOSS_CADENCE_CHALLENGES: u16 = 3;

/// Number of battles between two consecutive boss milestones.
pub const BOSS_CADENCE_STRIDE: u16 = BATTLES_PER_CHALLENGE * BOSS_CADENCE_CHALLENGES;

/// Upper bound on the number of candidates kept in a single rank pool.
pub const FACTORY_RANK_POOL_MAX_SIZE: usize = 150;

/// Number of move slots carried by every candidate record.
pub const MAX_MON_MOVES: usize = 4;

/// Special opponents that can replace a regular Factory battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactoryBoss {
    /// First boss of the tier-one rotation.
    Steven,
    /// Second boss of the tier-one rotation.
    Wally,
    /// Third boss of the tier-one rotation.
    Norman,
    /// Final boss of the tier-one rotation.
    Red,
}

/// Tier-one bosses in the order they are visited.
///
/// The position of a boss within this table is its rotation slot.
pub const BOSS_ROTATION: [FactoryBoss; 4] = [
    FactoryBoss::Steven,
    FactoryBoss::Wally,
    FactoryBoss::Norman,
    FactoryBoss::Red,
];

impl FactoryBoss {
    /// Value persisted in the active-boss variable for this boss.
    #[must_use]
    pub const fn var_value(self) -> u16 {
        match self {
            Self::Steven => 1,
            Self::Wally => 2,
            Self::Norman => 3,
            Self::Red => 4,
        }
    }

    /// Decodes the active-boss variable. Unknown values decode as no boss.
    #[must_use]
    pub const fn from_var_value(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Steven),
            2 => Some(Self::Wally),
            3 => Some(Self::Norman),
            4 => Some(Self::Red),
            _ => None,
        }
    }

    /// Bit assigned to the boss inside a [`BossMask`].
    #[must_use]
    pub const fn mask_bit(self) -> u16 {
        match self {
            Self::Steven => 1 << 0,
            Self::Wally => 1 << 1,
            Self::Norman => 1 << 2,
            Self::Red => 1 << 3,
        }
    }

    /// Slot occupied by the boss within [`BOSS_ROTATION`].
    #[must_use]
    pub const fn rotation_slot(self) -> u16 {
        match self {
            Self::Steven => 0,
            Self::Wally => 1,
            Self::Norman => 2,
            Self::Red => 3,
        }
    }
}

/// Encodes an optional boss into the active-boss variable, where zero means none.
#[must_use]
pub const fn active_boss_var_value(boss: Option<FactoryBoss>) -> u16 {
    match boss {
        Some(boss) => boss.var_value(),
        None => 0,
    }
}

/// Set of bosses that have been defeated at least once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossMask(u16);

impl BossMask {
    /// Mask with every tier-one boss cleared.
    pub const TIER_ONE: Self = Self(
        FactoryBoss::Steven.mask_bit()
            | FactoryBoss::Wally.mask_bit()
            | FactoryBoss::Norman.mask_bit()
            | FactoryBoss::Red.mask_bit(),
    );

    /// Wraps the raw persisted bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits suitable for persisting.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Reports whether the boss has been marked as cleared.
    #[must_use]
    pub const fn contains(self, boss: FactoryBoss) -> bool {
        self.0 & boss.mask_bit() != 0
    }

    /// Marks the boss as cleared, returning `true` when the bit was newly set.
    ///
    /// Marking an already cleared boss leaves the mask untouched.
    pub fn insert(&mut self, boss: FactoryBoss) -> bool {
        let newly_set = !self.contains(boss);
        self.0 |= boss.mask_bit();
        newly_set
    }

    /// Reports whether every tier-one boss has been cleared.
    #[must_use]
    pub const fn tier_one_cleared(self) -> bool {
        self.0 & Self::TIER_ONE.0 == Self::TIER_ONE.0
    }
}

/// Frontier brain status reported to the facility's pre-battle flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrainStatus {
    /// No special opponent is due for the next battle.
    NotReady,
    /// A tier-one boss is due for the next battle.
    Boss(FactoryBoss),
    /// Every tier-one boss is cleared; the gold brain is due.
    Gold,
    /// The gold brain rematch is due, or forced by the debug override.
    Streak,
}

impl BrainStatus {
    /// Reports whether a special opponent is due.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        !matches!(self, Self::NotReady)
    }
}

/// Battle facilities that own a pair of symbol flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Facility {
    /// Battle Tower.
    Tower,
    /// Battle Dome.
    Dome,
    /// Battle Palace.
    Palace,
    /// Battle Arena.
    Arena,
    /// Battle Factory.
    Factory,
    /// Battle Pike.
    Pike,
    /// Battle Pyramid.
    Pyramid,
}

/// Battle formats that track independent win streaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattleMode {
    /// One-on-one battles.
    #[default]
    Singles,
    /// Two-on-two battles.
    Doubles,
    /// Multi battles with a partner.
    Multis,
    /// Multi battles over a link.
    LinkMultis,
}

impl BattleMode {
    /// Decodes the battle-mode variable, falling back to singles.
    #[must_use]
    pub const fn from_var_value(value: u16) -> Self {
        match value {
            1 => Self::Doubles,
            2 => Self::Multis,
            3 => Self::LinkMultis,
            _ => Self::Singles,
        }
    }

    /// Value persisted in the battle-mode variable.
    #[must_use]
    pub const fn var_value(self) -> u16 {
        match self {
            Self::Singles => 0,
            Self::Doubles => 1,
            Self::Multis => 2,
            Self::LinkMultis => 3,
        }
    }
}

/// Level caps that track independent win streaks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LevelMode {
    /// Level 50 battles.
    #[default]
    Lv50,
    /// Open level battles.
    Open,
}

impl LevelMode {
    /// Decodes the level-mode variable, falling back to level 50.
    #[must_use]
    pub const fn from_var_value(value: u16) -> Self {
        match value {
            1 => Self::Open,
            _ => Self::Lv50,
        }
    }

    /// Value persisted in the level-mode variable.
    #[must_use]
    pub const fn var_value(self) -> u16 {
        match self {
            Self::Lv50 => 0,
            Self::Open => 1,
        }
    }
}

/// Stable identifiers for the integer variables persisted by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VarKey {
    /// Boss scheduled for the next battle, encoded by [`FactoryBoss::var_value`].
    ActiveBoss,
    /// Progression gate; bosses are never scheduled while zero.
    BossUnlockState,
    /// Raw bits of the [`BossMask`] of cleared bosses.
    BossClearedMask,
    /// Pointer into [`BOSS_ROTATION`].
    BossRotationIndex,
    /// Active [`BattleMode`].
    BattleMode,
    /// Active [`LevelMode`].
    LevelMode,
    /// Factory win streak for a battle mode and level mode pair.
    WinStreak(BattleMode, LevelMode),
}

/// Stable identifiers for the boolean flags persisted by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlagKey {
    /// Silver symbol earned at the facility.
    SilverSymbol(Facility),
    /// Gold symbol earned at the facility.
    GoldSymbol(Facility),
    /// QA hook forcing the gold brain for the next battle.
    DebugForceGoldBoss,
    /// Factory battles draw fully random teams.
    RandomBattlesMode,
    /// Terastallisation is enabled for Factory battles.
    AllowTerastallisation,
    /// Mega evolution is enabled for Factory battles.
    AllowMegaEvolution,
    /// Z-moves are enabled for Factory battles.
    AllowZMoves,
}

/// Key-value capability over the host's persistent progression state.
///
/// Keys that were never written read as zero or `false`.
pub trait ProgressStore {
    /// Reads an integer variable.
    fn value(&self, key: VarKey) -> u16;

    /// Writes an integer variable.
    fn set_value(&mut self, key: VarKey, value: u16);

    /// Reads a boolean flag.
    fn flag(&self, key: FlagKey) -> bool;

    /// Sets a boolean flag.
    fn set_flag(&mut self, key: FlagKey);

    /// Clears a boolean flag.
    fn clear_flag(&mut self, key: FlagKey);
}

/// Transitions performed by the boss cadence system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CadenceEvent {
    /// A tier-one boss was written to the active-boss slot.
    BossScheduled {
        /// Boss scheduled for the next battle.
        boss: FactoryBoss,
        /// Win streak that reached the milestone.
        win_streak: u16,
    },
    /// The active-boss slot was reset to none.
    BossSlotCleared {
        /// Boss that occupied the slot before it was cleared, if any.
        previous: Option<FactoryBoss>,
    },
    /// The debug override forced the gold brain and bypassed the cadence.
    GoldBrainForced,
    /// A boss defeat was written to the cleared mask and rotation index.
    BossDefeatRecorded {
        /// Boss that was defeated.
        boss: FactoryBoss,
        /// Whether this was the boss's first recorded defeat.
        first_clear: bool,
        /// Rotation index after advancing.
        rotation_index: u16,
    },
    /// A defeat was reported while no boss was active.
    DefeatIgnored,
}

/// Difficulty ranks that own an independent candidate pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FactoryRank {
    /// Entry rank.
    One,
    /// Second rank.
    Two,
    /// Third rank.
    Three,
    /// Highest rank.
    Four,
}

impl FactoryRank {
    /// Every rank in ascending order.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// One-based rank number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Resolves a one-based rank number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => None,
        }
    }

    /// Zero-based position of the rank.
    #[must_use]
    pub const fn index(self) -> usize {
        self.number() as usize - 1
    }

    /// Source tiers drawn by the rank, in priority order.
    #[must_use]
    pub const fn source_tiers(self) -> &'static [SourceTier] {
        match self {
            Self::One => &[SourceTier::Gen9Pu, SourceTier::Gen9Zu, SourceTier::Gen9Nu],
            Self::Two => &[
                SourceTier::Gen9Nu,
                SourceTier::Gen9Ru,
                SourceTier::Gen9NationalDexRu,
            ],
            Self::Three => &[
                SourceTier::Gen9Ru,
                SourceTier::Gen9Uu,
                SourceTier::Gen9NationalDexUu,
            ],
            Self::Four => &[
                SourceTier::Gen9Uu,
                SourceTier::Gen9Ou,
                SourceTier::Gen9NationalDex,
            ],
        }
    }
}

/// Named competitive tiers that group candidate records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceTier {
    /// Generation 9 PU.
    #[serde(rename = "GEN9PU")]
    Gen9Pu,
    /// Generation 9 ZU.
    #[serde(rename = "GEN9ZU")]
    Gen9Zu,
    /// Generation 9 NU.
    #[serde(rename = "GEN9NU")]
    Gen9Nu,
    /// Generation 9 RU.
    #[serde(rename = "GEN9RU")]
    Gen9Ru,
    /// Generation 9 National Dex RU.
    #[serde(rename = "GEN9NATIONALDEXRU")]
    Gen9NationalDexRu,
    /// Generation 9 UU.
    #[serde(rename = "GEN9UU")]
    Gen9Uu,
    /// Generation 9 National Dex UU.
    #[serde(rename = "GEN9NATIONALDEXUU")]
    Gen9NationalDexUu,
    /// Generation 9 OU.
    #[serde(rename = "GEN9OU")]
    Gen9Ou,
    /// Generation 9 National Dex.
    #[serde(rename = "GEN9NATIONALDEX")]
    Gen9NationalDex,
}

/// Index of a candidate record within the roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonId(u16);

impl MonId {
    /// Creates a new candidate identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Species identifier; zero is the empty species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(u16);

impl SpeciesId {
    /// The empty species.
    pub const NONE: Self = Self(0);

    /// Creates a new species identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Held item identifier; zero is no item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u16);

impl ItemId {
    /// Creates a new item identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Move identifier; zero is an empty move slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(u16);

impl MoveId {
    /// Creates a new move identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Static description of a rental candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontierMon {
    /// Species of the candidate.
    pub species: SpeciesId,
    /// Item the candidate holds.
    #[serde(default)]
    pub held_item: ItemId,
    /// Moves known by the candidate; empty slots are [`MoveId`] zero.
    #[serde(default)]
    pub moves: [MoveId; MAX_MON_MOVES],
}

impl FrontierMon {
    /// Creates a candidate record.
    #[must_use]
    pub const fn new(species: SpeciesId, held_item: ItemId, moves: [MoveId; MAX_MON_MOVES]) -> Self {
        Self {
            species,
            held_item,
            moves,
        }
    }

    /// Reports whether the candidate knows the provided move.
    #[must_use]
    pub fn knows_move(&self, move_id: MoveId) -> bool {
        self.moves.contains(&move_id)
    }
}

/// Battle mechanics that can be toggled for Factory battles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MechanicFlags {
    /// Terastallisation is enabled.
    pub tera: bool,
    /// Mega evolution is enabled.
    pub mega: bool,
    /// Z-moves are enabled.
    pub z_move: bool,
}

impl MechanicFlags {
    /// Every mechanic enabled.
    pub const ALL: Self = Self::new(true, true, true);

    /// Every mechanic disabled.
    pub const NONE: Self = Self::new(false, false, false);

    /// Creates a flag set with explicit values.
    #[must_use]
    pub const fn new(tera: bool, mega: bool, z_move: bool) -> Self {
        Self { tera, mega, z_move }
    }

    /// Reads the mechanic-enable flags from the store.
    ///
    /// Unset flags read as disabled, so a store that never recorded the
    /// mechanic settings yields [`MechanicFlags::NONE`] rather than the
    /// [`Default`] of every mechanic enabled.
    #[must_use]
    pub fn from_store<S: ProgressStore + ?Sized>(store: &S) -> Self {
        Self {
            tera: store.flag(FlagKey::AllowTerastallisation),
            mega: store.flag(FlagKey::AllowMegaEvolution),
            z_move: store.flag(FlagKey::AllowZMoves),
        }
    }

    /// Writes the mechanic-enable flags to the store.
    pub fn write_to<S: ProgressStore + ?Sized>(self, store: &mut S) {
        for (key, enabled) in [
            (FlagKey::AllowTerastallisation, self.tera),
            (FlagKey::AllowMegaEvolution, self.mega),
            (FlagKey::AllowZMoves, self.z_move),
        ] {
            if enabled {
                store.set_flag(key);
            } else {
                store.clear_flag(key);
            }
        }
    }
}

/// New games start with every mechanic enabled.
impl Default for MechanicFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Identifiers that mark a candidate as depending on a toggleable mechanic.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MechanicCatalog {
    /// Move that signals a terastallisation set.
    pub tera_move: MoveId,
    /// Inclusive range of mega stones.
    pub mega_stones: RangeInclusive<ItemId>,
    /// Inclusive range of Z-crystals.
    pub z_crystals: RangeInclusive<ItemId>,
}

impl MechanicCatalog {
    /// Reports whether the candidate is unavailable under the provided flags.
    #[must_use]
    pub fn excludes(&self, mon: &FrontierMon, flags: MechanicFlags) -> bool {
        (!flags.tera && self.uses_tera(mon))
            || (!flags.mega && self.uses_mega_stone(mon))
            || (!flags.z_move && self.uses_z_crystal(mon))
    }

    /// Reports whether the candidate knows the tera-signaling move.
    #[must_use]
    pub fn uses_tera(&self, mon: &FrontierMon) -> bool {
        mon.knows_move(self.tera_move)
    }

    /// Reports whether the candidate holds a mega stone.
    #[must_use]
    pub fn uses_mega_stone(&self, mon: &FrontierMon) -> bool {
        self.mega_stones.contains(&mon.held_item)
    }

    /// Reports whether the candidate holds a Z-crystal.
    #[must_use]
    pub fn uses_z_crystal(&self, mon: &FrontierMon) -> bool {
        self.z_crystals.contains(&mon.held_item)
    }
}

impl Default for MechanicCatalog {
    fn default() -> Self {
        Self {
            tera_move: MoveId::new(851),
            mega_stones: ItemId::new(614)..=ItemId::new(661),
            z_crystals: ItemId::new(662)..=ItemId::new(696),
        }
    }
}

/// Read-only view over the static tables consumed by pool building.
#[derive(Clone, Copy, Debug)]
pub struct FactoryDataView<'a> {
    mons: &'a [FrontierMon],
    tiers: &'a [(SourceTier, Vec<MonId>)],
    species_count: u16,
    catalog: &'a MechanicCatalog,
}

impl<'a> FactoryDataView<'a> {
    /// Captures a view over the provided tables.
    ///
    /// `species_count` is one past the largest valid species identifier.
    #[must_use]
    pub fn new(
        mons: &'a [FrontierMon],
        tiers: &'a [(SourceTier, Vec<MonId>)],
        species_count: u16,
        catalog: &'a MechanicCatalog,
    ) -> Self {
        Self {
            mons,
            tiers,
            species_count,
            catalog,
        }
    }

    /// Looks up a candidate record.
    #[must_use]
    pub fn mon(&self, id: MonId) -> Option<&'a FrontierMon> {
        let mons = self.mons;
        mons.get(usize::from(id.get()))
    }

    /// Candidates listed in the tier, or an empty slice for unknown tiers.
    #[must_use]
    pub fn tier(&self, tier: SourceTier) -> &'a [MonId] {
        let tiers = self.tiers;
        tiers
            .iter()
            .find(|(name, _)| *name == tier)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Iterator over every configured tier in stored order.
    pub fn tiers(&self) -> impl Iterator<Item = (SourceTier, &'a [MonId])> + 'a {
        let tiers = self.tiers;
        tiers.iter().map(|(name, ids)| (*name, ids.as_slice()))
    }

    /// Reports whether the species identifier names a real species.
    #[must_use]
    pub const fn is_valid_species(&self, species: SpeciesId) -> bool {
        species.get() != SpeciesId::NONE.get() && species.get() < self.species_count
    }

    /// One past the largest valid species identifier.
    #[must_use]
    pub const fn species_count(&self) -> u16 {
        self.species_count
    }

    /// Mechanic identifiers used to filter candidates.
    #[must_use]
    pub const fn catalog(&self) -> &'a MechanicCatalog {
        self.catalog
    }
}

/// Owned static tables backing a [`FactoryDataView`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryData {
    /// Candidate records indexed by [`MonId`].
    pub mons: Vec<FrontierMon>,
    /// Named tiers in stored order.
    pub tiers: Vec<(SourceTier, Vec<MonId>)>,
    /// One past the largest valid species identifier.
    pub species_count: u16,
    /// Mechanic identifiers used to filter candidates.
    pub catalog: MechanicCatalog,
}

impl FactoryData {
    /// Borrows the tables as a view.
    #[must_use]
    pub fn view(&self) -> FactoryDataView<'_> {
        FactoryDataView::new(&self.mons, &self.tiers, self.species_count, &self.catalog)
    }
}
