//! Command Line Configuration
//!
//! One binary serves both roles of the cluster; the role and its parameters
//! are picked on the command line:
//!
//! - `--mode dispatcher` hosts the name registry and reads task files on
//!   stdin (`--strategy` picks the fault-tolerance level).
//! - `--mode worker` serves batch executions and binds itself in the
//!   dispatcher's registry (`--registry` is required; `--dishonest` makes the
//!   worker corrupt that percentage of its batches, for exercising the
//!   verifying dispatcher).

use anyhow::{anyhow, bail, Result};
use std::net::SocketAddr;

/// Which role this process plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dispatcher,
    Worker,
}

/// Which fault model the dispatcher defends against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Workers may crash or overload, but never lie.
    Trusting,
    /// Workers may also return corrupted results; every batch is cross-checked.
    Verifying,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub bind: SocketAddr,
    /// Registry address a worker binds itself in. Workers only.
    pub registry: Option<SocketAddr>,
    /// Declared batch capacity. Workers only.
    pub capacity: usize,
    /// Percentage of batches a worker silently corrupts. Workers only.
    pub dishonest_percent: u8,
    pub strategy: StrategyKind,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} --mode <dispatcher|worker> --bind <addr:port> [options]\n\
         Dispatcher options:\n\
         \x20 --strategy <trusting|verifying>   fault model (default: verifying)\n\
         Worker options:\n\
         \x20 --registry <addr:port>            dispatcher registry (required)\n\
         \x20 --capacity <n>                    declared batch capacity (default: 4)\n\
         \x20 --dishonest <0-100>               percentage of corrupted batches (default: 0)\n\
         Example: {program} --mode dispatcher --bind 127.0.0.1:5000\n\
         Example: {program} --mode worker --bind 127.0.0.1:5001 --registry 127.0.0.1:5000 --capacity 6"
    )
}

impl Config {
    /// Parses `args` as produced by `std::env::args` (program name first).
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut mode: Option<Mode> = None;
        let mut bind: Option<SocketAddr> = None;
        let mut registry: Option<SocketAddr> = None;
        let mut capacity: usize = 4;
        let mut dishonest_percent: u8 = 0;
        let mut strategy = StrategyKind::Verifying;

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args
                .get(i + 1)
                .ok_or_else(|| anyhow!("{} expects a value", flag))?;

            match flag {
                "--mode" => {
                    mode = Some(match value.as_str() {
                        "dispatcher" => Mode::Dispatcher,
                        "worker" => Mode::Worker,
                        other => bail!("unknown mode {:?}", other),
                    });
                }
                "--bind" => {
                    bind = Some(value.parse()?);
                }
                "--registry" => {
                    registry = Some(value.parse()?);
                }
                "--capacity" => {
                    capacity = value.parse()?;
                    if capacity == 0 {
                        bail!("--capacity must be at least 1");
                    }
                }
                "--dishonest" => {
                    dishonest_percent = value.parse()?;
                    if dishonest_percent > 100 {
                        bail!("--dishonest is a percentage (0-100)");
                    }
                }
                "--strategy" => {
                    strategy = match value.as_str() {
                        "trusting" => StrategyKind::Trusting,
                        "verifying" => StrategyKind::Verifying,
                        other => bail!("unknown strategy {:?}", other),
                    };
                }
                other => bail!("unknown flag {:?}", other),
            }
            i += 2;
        }

        let mode = mode.ok_or_else(|| anyhow!("--mode is required"))?;
        let bind = bind.ok_or_else(|| anyhow!("--bind is required"))?;

        if mode == Mode::Worker && registry.is_none() {
            bail!("--registry is required in worker mode");
        }

        Ok(Self {
            mode,
            bind,
            registry,
            capacity,
            dishonest_percent,
            strategy,
        })
    }
}
