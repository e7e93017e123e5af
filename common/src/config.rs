use std::time::Duration;

use anyhow::Context;

pub const ENV_MAX_REGION: &str = "MINESWEEPER_MAX_REGION";
pub const ENV_SAT_TIMEOUT_MS: &str = "MINESWEEPER_SAT_TIMEOUT_MS";
pub const ENV_MERGE_REGIONS: &str = "MINESWEEPER_MERGE_REGIONS";
pub const ENV_TRACE: &str = "MINESWEEPER_TRACE";

/// Tunables for a single agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Regions with more open cells than this are not handed to the solver.
    pub max_region_variables: usize,
    /// Time budget for all solver queries of one region. It is checked only
    /// before each query starts, since varisat can't interrupt a running
    /// search, so one slow query can overrun it.
    pub sat_timeout: Duration,
    /// Solve constraints that share open cells together.
    pub merge_regions: bool,
    /// Emit every turn at `info` level.
    pub trace: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            max_region_variables: 24,
            sat_timeout: Duration::from_secs(2),
            merge_regions: true,
            trace: false,
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `MINESWEEPER_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_MAX_REGION) {
            config.max_region_variables = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MAX_REGION}={value:?}"))?;
        }
        if let Some(value) = lookup(ENV_SAT_TIMEOUT_MS) {
            let millis: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SAT_TIMEOUT_MS}={value:?}"))?;
            config.sat_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(ENV_MERGE_REGIONS) {
            config.merge_regions = parse_flag(&value).context(ENV_MERGE_REGIONS)?;
        }
        if let Some(value) = lookup(ENV_TRACE) {
            config.trace = parse_flag(&value).context(ENV_TRACE)?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => anyhow::bail!("expected a boolean flag, got {other:?}"),
    }
}
