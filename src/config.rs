//! Process-wide configuration for the `Dict`: the resize policy and the
//! hash seed, loaded the way the teacher's `Settings::load` loads server
//! configuration — defaults plus environment overrides via the `config`
//! crate — rather than living as hidden singletons.

use ::config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use crate::database::dict::{HashSeed, ResizePolicy};

/// Environment variable prefix used when loading overrides, e.g.
/// `ZDICT_RESIZE_POLICY=avoid`.
pub const ENV_PREFIX: &str = "ZDICT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResizePolicyConfig {
    Enable,
    Avoid,
    Forbid,
}

impl From<ResizePolicyConfig> for ResizePolicy {
    fn from(v: ResizePolicyConfig) -> Self {
        match v {
            ResizePolicyConfig::Enable => ResizePolicy::Enable,
            ResizePolicyConfig::Avoid => ResizePolicy::Avoid,
            ResizePolicyConfig::Forbid => ResizePolicy::Forbid,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawDictConfig {
    resize_policy: ResizePolicyConfig,
    hash_seed_hi: u64,
    hash_seed_lo: u64,
}

/// Resolved configuration: the resize policy and the 16-byte hash seed.
#[derive(Debug, Clone, Copy)]
pub struct DictConfig {
    pub resize_policy: ResizePolicy,
    pub hash_seed: HashSeed,
}

impl DictConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults matching the compile-time constants in §2/§6 of
    /// SPEC_FULL.md. `ZDICT_HASH_SEED_HI`/`ZDICT_HASH_SEED_LO` and
    /// `ZDICT_RESIZE_POLICY` are recognized.
    pub fn load() -> Result<Self, ConfigError> {
        let default_seed = HashSeed::default();

        let cfg = Config::builder()
            .set_default("resize_policy", "enable")?
            .set_default("hash_seed_hi", default_seed.0 as i64)?
            .set_default("hash_seed_lo", default_seed.1 as i64)?
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let raw: RawDictConfig = cfg.try_deserialize()?;

        Ok(DictConfig {
            resize_policy: raw.resize_policy.into(),
            hash_seed: HashSeed(raw.hash_seed_hi, raw.hash_seed_lo),
        })
    }
}

impl Default for DictConfig {
    fn default() -> Self {
        DictConfig {
            resize_policy: ResizePolicy::default(),
            hash_seed: HashSeed::default(),
        }
    }
}
