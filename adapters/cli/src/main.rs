#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Battle Factory rules engine.
//!
//! The binary loads static Factory data and save snapshots from TOML
//! manifests, runs the pure systems against an in-memory save block and
//! prints the outcome.

mod data_manifest;
mod save_manifest;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use battle_factory_core::{
    CadenceEvent, FactoryBoss, FactoryDataView, FactoryRank, MechanicFlags, ProgressStore, VarKey,
    BOSS_ROTATION, FACTORY_RANK_POOL_MAX_SIZE,
};
use battle_factory_system_boss_cadence::BossCadence;
use battle_factory_system_rank_pools::{validate_roster, Config, RankPoolBuilder, RankPools};
use battle_factory_world::{query, SaveBlock};
use clap::{Args, Parser, Subcommand};
use sha2::{Digest, Sha256};

#[derive(Debug, Parser)]
#[command(name = "battle-factory", version)]
#[command(about = "Rank pool builder and boss cadence engine for the Battle Factory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the rental pools for every rank and print a digest of the result
    Pools(PoolsArgs),
    /// Report malformed tier entries in a data manifest
    Validate(ValidateArgs),
    /// Run boss scheduling against a save manifest
    Cadence(CadenceArgs),
}

#[derive(Debug, Args)]
struct PoolsArgs {
    /// Path to the static data manifest
    #[arg(long)]
    data: PathBuf,

    /// Exclude sets that know the terastallisation move
    #[arg(long)]
    no_tera: bool,

    /// Exclude sets holding a mega stone
    #[arg(long)]
    no_mega: bool,

    /// Exclude sets holding a Z-crystal
    #[arg(long)]
    no_z_moves: bool,

    /// Maximum number of candidates kept per rank
    #[arg(long, default_value_t = FACTORY_RANK_POOL_MAX_SIZE)]
    max_size: usize,

    /// Only print the pool for this rank (1-4)
    #[arg(long)]
    rank: Option<u8>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Path to the static data manifest
    #[arg(long)]
    data: PathBuf,
}

#[derive(Debug, Args)]
struct CadenceArgs {
    /// Path to the save manifest
    #[arg(long)]
    save: PathBuf,

    /// Record a defeat of the scheduled boss and resolve the boss battle
    #[arg(long)]
    record_defeat: bool,

    /// Print every persisted variable after the run
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pools(args) => run_pools(&args),
        Command::Validate(args) => run_validate(&args),
        Command::Cadence(args) => run_cadence(&args),
    }
}

fn run_pools(args: &PoolsArgs) -> Result<()> {
    let data = data_manifest::load(&args.data)?;
    let view = data.view();

    let rank_filter = match args.rank {
        Some(number) => Some(
            FactoryRank::from_number(number)
                .with_context(|| format!("rank must be between 1 and 4, got {number}"))?,
        ),
        None => None,
    };

    let mut save = SaveBlock::new();
    MechanicFlags::new(!args.no_tera, !args.no_mega, !args.no_z_moves).write_to(&mut save);

    let builder = RankPoolBuilder::new(Config::new(args.max_size));
    let pools = builder.build_from_store(&save, view);

    for (rank, pool) in pools.iter() {
        if rank_filter.is_some_and(|wanted| wanted != rank) {
            continue;
        }
        let ids: Vec<String> = pool.iter().map(|id| id.get().to_string()).collect();
        println!("rank {} ({} candidates): [{}]", rank.number(), pool.len(), ids.join(", "));
    }
    println!("total candidates: {}", pools.total_len());
    println!("digest: {}", pools_digest(&pools, view));
    Ok(())
}

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let data = data_manifest::load(&args.data)?;
    let view = data.view();
    let issues = validate_roster(view);

    let entries: usize = view.tiers().map(|(_, entries)| entries.len()).sum();
    if issues.is_empty() {
        println!(
            "{} tier entries across {} candidates and {} species are well formed",
            entries,
            data.mons.len(),
            view.species_count()
        );
        return Ok(());
    }

    for issue in &issues {
        println!("{issue}");
    }
    bail!("{} of {} tier entries are malformed", issues.len(), entries)
}

fn run_cadence(args: &CadenceArgs) -> Result<()> {
    let mut save = save_manifest::load(&args.save)?;
    let cadence = BossCadence::new();
    let mut events = Vec::new();

    println!("win streak: {}", query::current_win_streak(&save));
    println!("brain status: {:?}", cadence.brain_status(&save));

    cadence.prepare_for_next_battle(&mut save, &mut events);
    print_events(&mut events);
    println!("active boss: {}", describe_active_boss(&save));

    if args.record_defeat {
        cadence.record_defeat(&mut save, &mut events);
        cadence.clear_active_boss(&mut save, &mut events);
        print_events(&mut events);
        println!("cleared bosses: {:?}", cleared_bosses(&save));
        println!("rotation index: {}", query::rotation_index(&save));
    }

    if args.dump {
        for (key, value) in save.vars() {
            println!("var {key:?} = {value}");
        }
        for flag in save.flags() {
            println!("flag {flag:?}");
        }
    }
    Ok(())
}

fn print_events(events: &mut Vec<CadenceEvent>) {
    for event in events.drain(..) {
        println!("event: {event:?}");
    }
}

fn describe_active_boss(save: &SaveBlock) -> String {
    match query::active_boss(save) {
        Some(boss) => format!("{boss:?}"),
        None => format!("none (raw value {})", save.value(VarKey::ActiveBoss)),
    }
}

fn cleared_bosses(save: &SaveBlock) -> Vec<FactoryBoss> {
    let mask = query::cleared_mask(save);
    BOSS_ROTATION
        .into_iter()
        .filter(|boss| mask.contains(*boss))
        .collect()
}

/// Hex SHA-256 over every pool's rank, length, candidate ids and their species.
fn pools_digest(pools: &RankPools, view: FactoryDataView<'_>) -> String {
    let mut hasher = Sha256::new();
    for (rank, pool) in pools.iter() {
        hasher.update([rank.number()]);
        hasher.update((pool.len() as u32).to_le_bytes());
        for id in pool {
            hasher.update(id.get().to_le_bytes());
            let species = view.mon(*id).map_or(0, |mon| mon.species.get());
            hasher.update(species.to_le_bytes());
        }
    }

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
