use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use battle_factory_core::{
    active_boss_var_value, BattleMode, BossMask, FactoryBoss, Facility, FlagKey, LevelMode,
    MechanicFlags, ProgressStore, VarKey,
};
use battle_factory_world::SaveBlock;
use serde::Deserialize;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    unlock_state: u16,
    #[serde(default)]
    active_boss: Option<FactoryBoss>,
    #[serde(default)]
    cleared: Vec<FactoryBoss>,
    #[serde(default)]
    rotation_index: u16,
    #[serde(default)]
    battle_mode: BattleMode,
    #[serde(default)]
    level_mode: LevelMode,
    #[serde(default)]
    win_streak: u16,
    #[serde(default)]
    silver_symbol: bool,
    #[serde(default)]
    gold_symbol: bool,
    #[serde(default)]
    debug_force_gold_boss: bool,
    #[serde(default)]
    random_battles: bool,
    #[serde(default)]
    mechanics: MechanicsSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MechanicsSection {
    tera: bool,
    mega: bool,
    z_move: bool,
}

impl Default for MechanicsSection {
    fn default() -> Self {
        let flags = MechanicFlags::default();
        Self {
            tera: flags.tera,
            mega: flags.mega,
            z_move: flags.z_move,
        }
    }
}

/// Reads the save manifest stored at `path` into an in-memory save block.
pub(crate) fn load(path: &Path) -> Result<SaveBlock> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read save manifest at {}", path.display()))?;
    let save =
        parse(&contents).with_context(|| format!("invalid save manifest {}", path.display()))?;
    log::info!("loaded save manifest {}", path.display());
    Ok(save)
}

/// Parses a save manifest. The win streak is stored under the manifest's modes.
pub(crate) fn parse(contents: &str) -> Result<SaveBlock> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse save manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported save manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut cleared = BossMask::default();
    for boss in &manifest.cleared {
        if !cleared.insert(*boss) {
            bail!("boss {boss:?} is listed as cleared more than once");
        }
    }

    let mut save = SaveBlock::new();
    save.set_value(VarKey::BossUnlockState, manifest.unlock_state);
    save.set_value(
        VarKey::ActiveBoss,
        active_boss_var_value(manifest.active_boss),
    );
    save.set_value(VarKey::BossClearedMask, cleared.bits());
    save.set_value(VarKey::BossRotationIndex, manifest.rotation_index);
    save.set_value(VarKey::BattleMode, manifest.battle_mode.var_value());
    save.set_value(VarKey::LevelMode, manifest.level_mode.var_value());
    save.set_value(
        VarKey::WinStreak(manifest.battle_mode, manifest.level_mode),
        manifest.win_streak,
    );

    for (key, enabled) in [
        (FlagKey::SilverSymbol(Facility::Factory), manifest.silver_symbol),
        (FlagKey::GoldSymbol(Facility::Factory), manifest.gold_symbol),
        (FlagKey::DebugForceGoldBoss, manifest.debug_force_gold_boss),
        (FlagKey::RandomBattlesMode, manifest.random_battles),
    ] {
        if enabled {
            save.set_flag(key);
        }
    }

    let mechanics = manifest.mechanics;
    MechanicFlags::new(mechanics.tera, mechanics.mega, mechanics.z_move).write_to(&mut save);

    Ok(save)
}
