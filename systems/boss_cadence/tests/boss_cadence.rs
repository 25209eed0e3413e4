use battle_factory_core::{
    BattleMode, BossMask, BrainStatus, CadenceEvent, FactoryBoss, Facility, FlagKey, LevelMode,
    ProgressStore, VarKey, BOSS_ROTATION,
};
use battle_factory_system_boss_cadence::BossCadence;
use battle_factory_world::{query, SaveBlock};

const STREAK_KEY: VarKey = VarKey::WinStreak(BattleMode::Singles, LevelMode::Lv50);

fn factory_save(unlock_state: u16, win_streak: u16) -> SaveBlock {
    let mut save = SaveBlock::new();
    save.set_value(VarKey::BattleMode, BattleMode::Singles.var_value());
    save.set_value(VarKey::LevelMode, LevelMode::Lv50.var_value());
    save.set_value(VarKey::BossUnlockState, unlock_state);
    save.set_value(STREAK_KEY, win_streak);
    save.set_flag(FlagKey::SilverSymbol(Facility::Factory));
    save
}

fn prepare(save: &mut SaveBlock) -> Vec<CadenceEvent> {
    let mut events = Vec::new();
    BossCadence::new().prepare_for_next_battle(save, &mut events);
    events
}

fn record_defeat(save: &mut SaveBlock) -> Vec<CadenceEvent> {
    let mut events = Vec::new();
    BossCadence::new().record_defeat(save, &mut events);
    events
}

#[test]
fn locked_progression_never_schedules_a_boss() {
    for win_streak in [0, 20, 41, 55, 62, 83, 104] {
        let mut save = factory_save(0, win_streak);
        save.set_value(VarKey::ActiveBoss, FactoryBoss::Wally.var_value());

        let _ = prepare(&mut save);

        assert_eq!(
            query::active_boss(&save),
            None,
            "locked progression scheduled a boss at streak {win_streak}",
        );
        assert_eq!(BossCadence::new().brain_status(&save), BrainStatus::NotReady);
    }
}

#[test]
fn milestones_stay_quiet_until_the_silver_symbol_is_held() {
    for win_streak in [20, 41] {
        let mut save = factory_save(1, win_streak);
        save.clear_flag(FlagKey::SilverSymbol(Facility::Factory));

        assert_eq!(
            BossCadence::new().brain_status(&save),
            BrainStatus::NotReady,
            "streak {win_streak} without the silver symbol",
        );
        let events = prepare(&mut save);

        assert_eq!(query::active_boss(&save), None);
        assert!(events.is_empty());
    }
}

#[test]
fn silver_symbol_opens_the_boss_phase_at_the_next_milestone() {
    let mut save = factory_save(1, 20);
    save.clear_flag(FlagKey::SilverSymbol(Facility::Factory));
    let _ = prepare(&mut save);
    assert_eq!(query::active_boss(&save), None);

    save.set_flag(FlagKey::SilverSymbol(Facility::Factory));
    save.set_value(STREAK_KEY, 41);
    let _ = prepare(&mut save);

    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Steven));
}

#[test]
fn first_post_unlock_milestone_schedules_steven() {
    let mut save = factory_save(1, 41);

    let events = prepare(&mut save);

    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Steven));
    assert_eq!(
        events,
        vec![CadenceEvent::BossScheduled {
            boss: FactoryBoss::Steven,
            win_streak: 41,
        }],
    );
}

#[test]
fn recording_a_defeat_updates_mask_and_rotation_index() {
    let mut save = factory_save(0, 0);
    save.set_value(VarKey::ActiveBoss, FactoryBoss::Steven.var_value());

    let events = record_defeat(&mut save);

    assert!(query::cleared_mask(&save).contains(FactoryBoss::Steven));
    assert_eq!(save.value(VarKey::BossClearedMask), FactoryBoss::Steven.mask_bit());
    assert_eq!(save.value(VarKey::BossRotationIndex), 1);
    assert_eq!(
        query::active_boss(&save),
        Some(FactoryBoss::Steven),
        "recording a defeat must leave the active slot for the battle-end flow",
    );
    assert_eq!(
        events,
        vec![CadenceEvent::BossDefeatRecorded {
            boss: FactoryBoss::Steven,
            first_clear: true,
            rotation_index: 1,
        }],
    );
}

#[test]
fn repeated_defeat_sets_no_new_bits_but_still_advances_rotation() {
    let mut save = factory_save(1, 0);
    save.set_value(VarKey::BossClearedMask, FactoryBoss::Norman.mask_bit());
    save.set_value(VarKey::BossRotationIndex, 3);
    save.set_value(VarKey::ActiveBoss, FactoryBoss::Norman.var_value());

    let events = record_defeat(&mut save);

    assert_eq!(save.value(VarKey::BossClearedMask), FactoryBoss::Norman.mask_bit());
    assert_eq!(save.value(VarKey::BossRotationIndex), 0, "rotation index wraps");
    assert!(matches!(
        events.as_slice(),
        [CadenceEvent::BossDefeatRecorded {
            first_clear: false,
            ..
        }]
    ));
}

#[test]
fn defeat_without_active_boss_is_a_no_op() {
    let mut save = factory_save(1, 41);
    save.set_value(VarKey::BossRotationIndex, 2);
    let before = save.clone();

    let events = record_defeat(&mut save);

    assert_eq!(save, before);
    assert_eq!(events, vec![CadenceEvent::DefeatIgnored]);
}

#[test]
fn schedules_next_uncleared_boss_in_rotation() {
    let mut save = factory_save(1, 62);
    save.set_value(VarKey::BossClearedMask, FactoryBoss::Steven.mask_bit());
    save.set_value(VarKey::BossRotationIndex, 1);

    let _ = prepare(&mut save);

    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Wally));
}

#[test]
fn rotation_skips_cleared_bosses_from_its_start_slot() {
    let mut save = factory_save(1, 20);
    let mut mask = BossMask::default();
    let _ = mask.insert(FactoryBoss::Norman);
    let _ = mask.insert(FactoryBoss::Red);
    save.set_value(VarKey::BossClearedMask, mask.bits());
    save.set_value(VarKey::BossRotationIndex, 2);

    let _ = prepare(&mut save);

    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Steven));
}

#[test]
fn non_milestone_streak_clears_previous_boss() {
    let mut save = factory_save(1, 42);
    save.set_value(VarKey::ActiveBoss, FactoryBoss::Steven.var_value());

    let events = prepare(&mut save);

    assert_eq!(query::active_boss(&save), None);
    assert_eq!(
        events,
        vec![CadenceEvent::BossSlotCleared {
            previous: Some(FactoryBoss::Steven),
        }],
    );
}

#[test]
fn one_symbol_phase_is_gated_to_cadence_milestones() {
    let cadence = BossCadence::new();
    for win_streak in 42..62 {
        let save = factory_save(1, win_streak);
        assert_eq!(
            cadence.brain_status(&save),
            BrainStatus::NotReady,
            "streak {win_streak} sits between milestones",
        );
    }

    for win_streak in [41, 62] {
        let save = factory_save(1, win_streak);
        assert!(cadence.brain_status(&save).is_ready(), "streak {win_streak} is a milestone");
    }
}

#[test]
fn brain_status_names_the_boss_prepare_will_schedule() {
    let mut save = factory_save(1, 41);
    save.set_value(VarKey::BossClearedMask, FactoryBoss::Steven.mask_bit());
    save.set_value(VarKey::BossRotationIndex, 1);

    let status = BossCadence::new().brain_status(&save);
    let _ = prepare(&mut save);

    assert_eq!(status, BrainStatus::Boss(FactoryBoss::Wally));
    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Wally));
}

#[test]
fn cleared_tier_one_reports_gold_at_next_milestone() {
    let mut save = factory_save(1, 83);
    save.set_value(VarKey::BossClearedMask, BossMask::TIER_ONE.bits());

    assert_eq!(BossCadence::new().brain_status(&save), BrainStatus::Gold);

    let _ = prepare(&mut save);
    assert_eq!(
        query::active_boss(&save),
        None,
        "the gold tier is reported through the brain status, not the boss slot",
    );
}

#[test]
fn gold_symbol_turns_exhausted_tier_into_streak_rematches() {
    let mut save = factory_save(1, 104);
    save.set_value(VarKey::BossClearedMask, BossMask::TIER_ONE.bits());
    save.set_flag(FlagKey::GoldSymbol(Facility::Factory));

    assert_eq!(BossCadence::new().brain_status(&save), BrainStatus::Streak);
}

#[test]
fn debug_force_overrides_cadence_and_clears_active_custom_boss() {
    let mut save = factory_save(0, 0);
    save.set_flag(FlagKey::DebugForceGoldBoss);
    save.set_value(VarKey::ActiveBoss, FactoryBoss::Steven.var_value());

    assert_eq!(BossCadence::new().brain_status(&save), BrainStatus::Streak);

    let events = prepare(&mut save);

    assert_eq!(query::active_boss(&save), None);
    assert!(save.flag(FlagKey::DebugForceGoldBoss), "override stays armed");
    assert_eq!(
        events,
        vec![
            CadenceEvent::GoldBrainForced,
            CadenceEvent::BossSlotCleared {
                previous: Some(FactoryBoss::Steven),
            },
        ],
    );
}

#[test]
fn debug_force_wins_over_a_due_boss() {
    let mut save = factory_save(1, 41);
    save.set_flag(FlagKey::DebugForceGoldBoss);

    let _ = prepare(&mut save);

    assert_eq!(query::active_boss(&save), None);
}

#[test]
fn clear_active_boss_empties_the_slot() {
    let mut save = factory_save(1, 41);
    save.set_value(VarKey::ActiveBoss, FactoryBoss::Red.var_value());

    let mut events = Vec::new();
    BossCadence::new().clear_active_boss(&mut save, &mut events);

    assert_eq!(query::active_boss(&save), None);
    assert_eq!(
        events,
        vec![CadenceEvent::BossSlotCleared {
            previous: Some(FactoryBoss::Red),
        }],
    );
}

#[test]
fn streak_is_read_for_the_active_battle_and_level_mode() {
    let mut save = factory_save(1, 0);
    save.set_value(VarKey::BattleMode, BattleMode::Doubles.var_value());
    save.set_value(VarKey::LevelMode, LevelMode::Open.var_value());
    save.set_value(VarKey::WinStreak(BattleMode::Doubles, LevelMode::Open), 41);

    let _ = prepare(&mut save);

    assert_eq!(query::active_boss(&save), Some(FactoryBoss::Steven));
}

#[test]
fn full_rotation_campaign_reaches_gold() {
    let cadence = BossCadence::new();
    let mut save = factory_save(1, 0);
    let mut events = Vec::new();
    let mut faced = Vec::new();
    let mut win_streak = 41;

    for _ in BOSS_ROTATION {
        save.set_value(STREAK_KEY, win_streak);
        cadence.prepare_for_next_battle(&mut save, &mut events);
        let boss = query::active_boss(&save).expect("a boss is due at every milestone");
        faced.push(boss);

        cadence.record_defeat(&mut save, &mut events);
        cadence.clear_active_boss(&mut save, &mut events);
        win_streak += 21;
    }

    assert_eq!(faced, BOSS_ROTATION.to_vec());
    assert!(query::cleared_mask(&save).tier_one_cleared());
    assert_eq!(save.value(VarKey::BossRotationIndex), 0);

    save.set_value(STREAK_KEY, win_streak);
    assert_eq!(cadence.brain_status(&save), BrainStatus::Gold);
}
