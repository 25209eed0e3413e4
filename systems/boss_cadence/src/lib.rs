#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic boss cadence system for the Battle Factory.
//!
//! The system decides, from persistent progression counters alone, whether a
//! special opponent replaces the next facility battle. It never owns state:
//! every decision is read from and written back to the injected
//! [`ProgressStore`], and each transition is reported as a [`CadenceEvent`].

use battle_factory_core::{
    active_boss_var_value, BossMask, BrainStatus, CadenceEvent, FactoryBoss, Facility,
    ProgressStore, VarKey, BOSS_CADENCE_STRIDE, BOSS_ROTATION,
};
use battle_factory_world::query;

/// Pure system that schedules bosses and reports the frontier brain status.
#[derive(Clone, Copy, Debug)]
pub struct BossCadence {
    facility: Facility,
}

impl Default for BossCadence {
    fn default() -> Self {
        Self::new()
    }
}

impl BossCadence {
    /// Creates a cadence system bound to the Battle Factory's symbol flags.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            facility: Facility::Factory,
        }
    }

    /// Recomputes the active boss for the upcoming battle.
    ///
    /// The debug override wins over every other rule and always leaves the
    /// active-boss slot empty, since the forced gold brain is not a custom
    /// boss. Otherwise a boss is only written at a cadence milestone, once
    /// bosses are unlocked and the Factory silver symbol has been earned.
    pub fn prepare_for_next_battle<S>(&self, store: &mut S, out: &mut Vec<CadenceEvent>)
    where
        S: ProgressStore + ?Sized,
    {
        let previous = query::active_boss(store);

        // QA hook, not a gameplay rule.
        if query::debug_force_gold_boss(store) {
            log::debug!("debug override forces the gold brain; clearing {previous:?}");
            out.push(CadenceEvent::GoldBrainForced);
            clear_slot(store, previous, out);
            return;
        }

        match self.scheduled_boss(store) {
            Some(boss) => {
                let win_streak = query::current_win_streak(store);
                log::debug!("scheduling {boss:?} at win streak {win_streak}");
                store.set_value(VarKey::ActiveBoss, boss.var_value());
                out.push(CadenceEvent::BossScheduled { boss, win_streak });
            }
            None => clear_slot(store, previous, out),
        }
    }

    /// Records a victory over the active boss.
    ///
    /// The boss is marked in the cleared mask and the rotation index advances
    /// by one slot. The active-boss slot itself is left untouched for the
    /// battle-end flow to clear. Without an active boss the call is ignored.
    pub fn record_defeat<S>(&self, store: &mut S, out: &mut Vec<CadenceEvent>)
    where
        S: ProgressStore + ?Sized,
    {
        let Some(boss) = query::active_boss(store) else {
            log::warn!("boss defeat reported while no boss was active; ignoring");
            out.push(CadenceEvent::DefeatIgnored);
            return;
        };

        let mut mask = query::cleared_mask(store);
        let first_clear = mask.insert(boss);
        store.set_value(VarKey::BossClearedMask, mask.bits());

        let rotation_index = (query::rotation_index(store) + 1) % query::rotation_len();
        store.set_value(VarKey::BossRotationIndex, rotation_index);

        log::debug!(
            "recorded defeat of {boss:?} (first clear: {first_clear}), rotation index now {rotation_index}"
        );
        out.push(CadenceEvent::BossDefeatRecorded {
            boss,
            first_clear,
            rotation_index,
        });
    }

    /// Empties the active-boss slot once a boss battle has been resolved.
    pub fn clear_active_boss<S>(&self, store: &mut S, out: &mut Vec<CadenceEvent>)
    where
        S: ProgressStore + ?Sized,
    {
        let previous = query::active_boss(store);
        clear_slot(store, previous, out);
    }

    /// Reports which special opponent, if any, the next battle is due to face.
    ///
    /// Progress between milestones is invisible: any streak that
    /// does not land on a milestone reports [`BrainStatus::NotReady`], as
    /// does every streak before bosses unlock or the silver symbol is held.
    #[must_use]
    pub fn brain_status<S>(&self, store: &S) -> BrainStatus
    where
        S: ProgressStore + ?Sized,
    {
        if query::debug_force_gold_boss(store) {
            return BrainStatus::Streak;
        }

        if !self.boss_phase_open(store) || !is_milestone(query::current_win_streak(store)) {
            return BrainStatus::NotReady;
        }

        match next_boss(query::cleared_mask(store), query::rotation_index(store)) {
            Some(boss) => BrainStatus::Boss(boss),
            None if query::has_gold_symbol(store, self.facility) => BrainStatus::Streak,
            None => BrainStatus::Gold,
        }
    }

    /// Bosses only appear once unlocked and after the silver symbol is earned.
    fn boss_phase_open<S>(&self, store: &S) -> bool
    where
        S: ProgressStore + ?Sized,
    {
        query::bosses_unlocked(store) && query::has_silver_symbol(store, self.facility)
    }

    fn scheduled_boss<S>(&self, store: &S) -> Option<FactoryBoss>
    where
        S: ProgressStore + ?Sized,
    {
        if !self.boss_phase_open(store) {
            return None;
        }

        if !is_milestone(query::current_win_streak(store)) {
            return None;
        }

        next_boss(query::cleared_mask(store), query::rotation_index(store))
    }
}

/// Reports whether the battle following `win_streak` wins is a boss milestone.
///
/// Milestones fall on every battle whose number is a multiple of the cadence
/// stride, so streaks of 20, 41, 62 and so on qualify.
#[must_use]
pub const fn is_milestone(win_streak: u16) -> bool {
    let upcoming_battle = win_streak as u32 + 1;
    upcoming_battle % BOSS_CADENCE_STRIDE as u32 == 0
}

/// Finds the first uncleared boss, scanning the rotation from `rotation_index`.
///
/// Returns `None` once every tier-one boss is cleared.
#[must_use]
pub fn next_boss(cleared: BossMask, rotation_index: u16) -> Option<FactoryBoss> {
    let len = BOSS_ROTATION.len();
    let start = usize::from(rotation_index) % len;
    (0..len)
        .map(|offset| BOSS_ROTATION[(start + offset) % len])
        .find(|boss| !cleared.contains(*boss))
}

fn clear_slot<S>(store: &mut S, previous: Option<FactoryBoss>, out: &mut Vec<CadenceEvent>)
where
    S: ProgressStore + ?Sized,
{
    store.set_value(VarKey::ActiveBoss, active_boss_var_value(None));
    if previous.is_some() {
        out.push(CadenceEvent::BossSlotCleared { previous });
    }
}

#[cfg(test)]
mod tests {
    use super::{is_milestone, next_boss};
    use battle_factory_core::{BossMask, FactoryBoss};

    #[test]
    fn milestones_repeat_every_stride() {
        assert!(is_milestone(20));
        assert!(is_milestone(41));
        assert!(is_milestone(62));
        assert!(is_milestone(83));
        assert!(!is_milestone(0));
        assert!(!is_milestone(21));
        assert!(!is_milestone(55));
    }

    #[test]
    fn milestone_math_does_not_overflow() {
        assert!(!is_milestone(u16::MAX));
    }

    #[test]
    fn next_boss_wraps_around_rotation() {
        let mut cleared = BossMask::default();
        let _ = cleared.insert(FactoryBoss::Red);
        assert_eq!(next_boss(cleared, 3), Some(FactoryBoss::Steven));
    }

    #[test]
    fn next_boss_exhausts_tier() {
        assert_eq!(next_boss(BossMask::TIER_ONE, 2), None);
    }
}
