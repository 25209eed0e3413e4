use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use battle_factory_core::{
    FactoryData, FrontierMon, ItemId, MechanicCatalog, MonId, MoveId, SourceTier, SpeciesId,
    MAX_MON_MOVES,
};
use serde::Deserialize;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
struct Manifest {
    version: u32,
    species_count: u16,
    #[serde(default)]
    mechanics: Option<MechanicsSection>,
    #[serde(default)]
    mons: Vec<MonEntry>,
    #[serde(default)]
    tiers: BTreeMap<SourceTier, Vec<u16>>,
}

#[derive(Debug, Deserialize)]
struct MechanicsSection {
    tera_move: u16,
    mega_stones: [u16; 2],
    z_crystals: [u16; 2],
}

#[derive(Debug, Deserialize)]
struct MonEntry {
    species: u16,
    #[serde(default)]
    held_item: u16,
    #[serde(default)]
    moves: Vec<u16>,
}

/// Reads and parses the static data manifest stored at `path`.
pub(crate) fn load(path: &Path) -> Result<FactoryData> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read data manifest at {}", path.display()))?;
    let data =
        parse(&contents).with_context(|| format!("invalid data manifest {}", path.display()))?;
    log::info!(
        "loaded {} candidates in {} tiers from {}",
        data.mons.len(),
        data.tiers.len(),
        path.display()
    );
    Ok(data)
}

/// Parses a static data manifest. Candidate ids are positions in `[[mons]]`.
pub(crate) fn parse(contents: &str) -> Result<FactoryData> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse data manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported data manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let catalog = match manifest.mechanics {
        Some(section) => parse_mechanics(&section)?,
        None => MechanicCatalog::default(),
    };

    let mut mons = Vec::with_capacity(manifest.mons.len());
    for (index, entry) in manifest.mons.iter().enumerate() {
        let mon = parse_mon(entry).with_context(|| format!("invalid entry mons[{index}]"))?;
        mons.push(mon);
    }

    let tiers = manifest
        .tiers
        .into_iter()
        .map(|(tier, ids)| (tier, ids.into_iter().map(MonId::new).collect()))
        .collect();

    Ok(FactoryData {
        mons,
        tiers,
        species_count: manifest.species_count,
        catalog,
    })
}

fn parse_mechanics(section: &MechanicsSection) -> Result<MechanicCatalog> {
    let [mega_start, mega_end] = section.mega_stones;
    let [z_start, z_end] = section.z_crystals;
    if mega_start > mega_end {
        bail!("mega stone range {mega_start}..={mega_end} is empty");
    }
    if z_start > z_end {
        bail!("Z-crystal range {z_start}..={z_end} is empty");
    }

    Ok(MechanicCatalog {
        tera_move: MoveId::new(section.tera_move),
        mega_stones: ItemId::new(mega_start)..=ItemId::new(mega_end),
        z_crystals: ItemId::new(z_start)..=ItemId::new(z_end),
    })
}

fn parse_mon(entry: &MonEntry) -> Result<FrontierMon> {
    if entry.moves.len() > MAX_MON_MOVES {
        bail!(
            "{} moves listed; at most {MAX_MON_MOVES} are allowed",
            entry.moves.len()
        );
    }

    let mut moves = [MoveId::default(); MAX_MON_MOVES];
    for (slot, move_id) in moves.iter_mut().zip(&entry.moves) {
        *slot = MoveId::new(*move_id);
    }

    Ok(FrontierMon::new(
        SpeciesId::new(entry.species),
        ItemId::new(entry.held_item),
        moves,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tiers_in_tier_order() {
        let manifest = r#"
            version = 1
            species_count = 100

            [[mons]]
            species = 3
            held_item = 614
            moves = [76, 188]

            [[mons]]
            species = 6

            [tiers]
            GEN9OU = [1]
            GEN9PU = [0, 1]
        "#;

        let data = parse(manifest).expect("manifest parses");

        assert_eq!(data.mons.len(), 2);
        assert_eq!(data.mons[0].held_item, ItemId::new(614));
        assert_eq!(
            data.mons[0].moves,
            [MoveId::new(76), MoveId::new(188), MoveId::default(), MoveId::default()],
        );
        assert_eq!(
            data.tiers,
            vec![
                (SourceTier::Gen9Pu, vec![MonId::new(0), MonId::new(1)]),
                (SourceTier::Gen9Ou, vec![MonId::new(1)]),
            ],
        );
        assert_eq!(data.catalog, MechanicCatalog::default());
    }

    #[test]
    fn custom_mechanics_override_defaults() {
        let manifest = r#"
            version = 1
            species_count = 10

            [mechanics]
            tera_move = 900
            mega_stones = [10, 20]
            z_crystals = [21, 30]
        "#;

        let data = parse(manifest).expect("manifest parses");

        assert_eq!(data.catalog.tera_move, MoveId::new(900));
        assert_eq!(data.catalog.z_crystals, ItemId::new(21)..=ItemId::new(30));
    }

    #[test]
    fn rejects_unsupported_version() {
        let error = parse("version = 2\nspecies_count = 1\n").expect_err("version 2 is rejected");
        assert!(error.to_string().contains("unsupported data manifest version"));
    }

    #[test]
    fn rejects_too_many_moves() {
        let manifest = r#"
            version = 1
            species_count = 10

            [[mons]]
            species = 1
            moves = [1, 2, 3, 4, 5]
        "#;

        let error = parse(manifest).expect_err("five moves are rejected");
        assert!(format!("{error:#}").contains("at most 4"));
    }

    #[test]
    fn rejects_unknown_tier_names() {
        let manifest = r#"
            version = 1
            species_count = 10

            [tiers]
            GEN1OU = [0]
        "#;

        let error = parse(manifest).expect_err("GEN1OU is not a factory tier");
        assert!(format!("{error:#}").contains("GEN1OU"));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let manifest = r#"
            version = 1
            species_count = 10

            [mechanics]
            tera_move = 851
            mega_stones = [661, 614]
            z_crystals = [662, 696]
        "#;

        let error = parse(manifest).expect_err("inverted range is rejected");
        assert!(error.to_string().contains("mega stone range"));
    }
}
