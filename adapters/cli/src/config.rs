use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use wave_director_core::{CatalogTable, EntityTypeProfile, Role};
use wave_director_world::DirectorConfig;

/// Contents of a simulation TOML file; every table is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct SimulationConfig {
    /// Wave director tuning.
    pub(crate) director: DirectorConfig,
    /// Hostile entity types; replaces the built-in table when present.
    pub(crate) catalog: CatalogTable,
    /// Gateways the simulated arena can open.
    pub(crate) arena_gateways: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            director: DirectorConfig::default(),
            catalog: default_catalog(),
            arena_gateways: 4,
        }
    }
}

impl SimulationConfig {
    /// Loads the file at `path`, or the built-in defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::default().validated();
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("malformed TOML")?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        self.director
            .validate()
            .context("director settings rejected")?;
        self.catalog.validate().context("catalog rejected")?;
        ensure!(
            !self.catalog.profiles().is_empty(),
            "catalog must list at least one entity type"
        );
        Ok(self)
    }
}

fn default_catalog() -> CatalogTable {
    CatalogTable::new(vec![
        EntityTypeProfile::new("walker", 1.0, Role::Fodder, 1, 10.0),
        EntityTypeProfile::new("runner", 2.0, Role::Rusher, 2, 6.0),
        EntityTypeProfile::new("spitter", 3.0, Role::Ranged, 4, 4.0),
        EntityTypeProfile::new("brute", 6.0, Role::Tank, 6, 2.0),
        EntityTypeProfile::new("stalker", 9.0, Role::Special, 9, 0.5),
        EntityTypeProfile::new("brute_king", 30.0, Role::Special, u32::MAX, 0.0),
        EntityTypeProfile::new("spitter_queen", 30.0, Role::Special, u32::MAX, 0.0),
        EntityTypeProfile::new("abomination", 45.0, Role::Special, u32::MAX, 0.0),
    ])
}
