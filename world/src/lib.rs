#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative progression state for the Battle Factory.
//!
//! [`SaveBlock`] is an in-memory implementation of [`ProgressStore`] that the
//! command-line adapter and the system tests use in place of the host save
//! system. The [`query`] module decodes typed progression values from any
//! store, so systems stay agnostic of the concrete backing storage.

use std::collections::{BTreeMap, BTreeSet};

use battle_factory_core::{FlagKey, ProgressStore, VarKey};

/// Persistent variables and flags owned by the save system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveBlock {
    vars: BTreeMap<VarKey, u16>,
    flags: BTreeSet<FlagKey>,
}

impl SaveBlock {
    /// Creates an empty save block where every variable reads as zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterator over every variable that has been written, in key order.
    pub fn vars(&self) -> impl Iterator<Item = (VarKey, u16)> + '_ {
        self.vars.iter().map(|(key, value)| (*key, *value))
    }

    /// Iterator over every flag that is currently set, in key order.
    pub fn flags(&self) -> impl Iterator<Item = FlagKey> + '_ {
        self.flags.iter().copied()
    }
}

impl ProgressStore for SaveBlock {
    fn value(&self, key: VarKey) -> u16 {
        self.vars.get(&key).copied().unwrap_or(0)
    }

    fn set_value(&mut self, key: VarKey, value: u16) {
        let previous = self.vars.insert(key, value);
        if previous != Some(value) {
            log::trace!("save var {key:?}: {previous:?} -> {value}");
        }
    }

    fn flag(&self, key: FlagKey) -> bool {
        self.flags.contains(&key)
    }

    fn set_flag(&mut self, key: FlagKey) {
        if self.flags.insert(key) {
            log::trace!("save flag {key:?} set");
        }
    }

    fn clear_flag(&mut self, key: FlagKey) {
        if self.flags.remove(&key) {
            log::trace!("save flag {key:?} cleared");
        }
    }
}

/// Query functions that decode typed progression values from a store.
pub mod query {
    use battle_factory_core::{
        BattleMode, BossMask, FactoryBoss, Facility, FlagKey, LevelMode, ProgressStore, VarKey,
        BOSS_ROTATION,
    };

    /// Boss currently occupying the active-boss slot.
    #[must_use]
    pub fn active_boss<S: ProgressStore + ?Sized>(store: &S) -> Option<FactoryBoss> {
        FactoryBoss::from_var_value(store.value(VarKey::ActiveBoss))
    }

    /// Reports whether boss scheduling has been unlocked.
    #[must_use]
    pub fn bosses_unlocked<S: ProgressStore + ?Sized>(store: &S) -> bool {
        store.value(VarKey::BossUnlockState) != 0
    }

    /// Bosses that have been defeated at least once.
    #[must_use]
    pub fn cleared_mask<S: ProgressStore + ?Sized>(store: &S) -> BossMask {
        BossMask::from_bits(store.value(VarKey::BossClearedMask))
    }

    /// Rotation slot the next boss search starts from.
    ///
    /// Out-of-range persisted values are wrapped into the rotation.
    #[must_use]
    pub fn rotation_index<S: ProgressStore + ?Sized>(store: &S) -> u16 {
        store.value(VarKey::BossRotationIndex) % rotation_len()
    }

    /// Battle mode of the current challenge.
    #[must_use]
    pub fn battle_mode<S: ProgressStore + ?Sized>(store: &S) -> BattleMode {
        BattleMode::from_var_value(store.value(VarKey::BattleMode))
    }

    /// Level mode of the current challenge.
    #[must_use]
    pub fn level_mode<S: ProgressStore + ?Sized>(store: &S) -> LevelMode {
        LevelMode::from_var_value(store.value(VarKey::LevelMode))
    }

    /// Win streak for the active battle mode and level mode.
    #[must_use]
    pub fn current_win_streak<S: ProgressStore + ?Sized>(store: &S) -> u16 {
        store.value(VarKey::WinStreak(battle_mode(store), level_mode(store)))
    }

    /// Reports whether the facility's silver symbol has been earned.
    #[must_use]
    pub fn has_silver_symbol<S: ProgressStore + ?Sized>(store: &S, facility: Facility) -> bool {
        store.flag(FlagKey::SilverSymbol(facility))
    }

    /// Reports whether the facility's gold symbol has been earned.
    #[must_use]
    pub fn has_gold_symbol<S: ProgressStore + ?Sized>(store: &S, facility: Facility) -> bool {
        store.flag(FlagKey::GoldSymbol(facility))
    }

    /// Reports whether the gold brain debug override is active.
    #[must_use]
    pub fn debug_force_gold_boss<S: ProgressStore + ?Sized>(store: &S) -> bool {
        store.flag(FlagKey::DebugForceGoldBoss)
    }

    /// Number of bosses in the tier-one rotation.
    #[must_use]
    pub const fn rotation_len() -> u16 {
        BOSS_ROTATION.len() as u16
    }
}
