use crate::error::{MolSwarmError, MsResult};
use clap::Args;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// How the step loop is orchestrated across swarms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    Sequential,
    Batched,
    Pooled,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[command(flatten)]
    pub run: RunParams,
    #[command(flatten)]
    pub pso: PsoParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    #[arg(long, default_value_t = 150)]
    pub num_part: usize,
    #[arg(long, default_value_t = 1)]
    pub num_swarms: usize,
    #[arg(long, default_value_t = 10)]
    pub num_steps: usize,
    #[arg(long, default_value_t = 500)]
    pub num_track: usize,
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            num_part: 150,
            num_swarms: 1,
            num_steps: 10,
            num_track: 500,
            num_workers: 4,
            seed: 42,
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PsoParams {
    // === VELOCITY UPDATE ===
    #[arg(long, default_value_t = 0.9)]
    pub phi1: f32,
    #[arg(long, default_value_t = 2.0)]
    pub phi2: f32,
    #[arg(long, default_value_t = 2.0)]
    pub phi3: f32,

    // === CLAMPS ===
    #[arg(long, default_value_t = -1.0)]
    pub x_min: f32,
    #[arg(long, default_value_t = 1.0)]
    pub x_max: f32,
    #[arg(long, default_value_t = -0.6)]
    pub v_min: f32,
    #[arg(long, default_value_t = 0.6)]
    pub v_max: f32,
}

impl Default for PsoParams {
    fn default() -> Self {
        Self {
            phi1: 0.9,
            phi2: 2.0,
            phi3: 2.0,
            x_min: -1.0,
            x_max: 1.0,
            v_min: -0.6,
            v_max: 0.6,
        }
    }
}

impl PsoParams {
    pub fn validate(&self) -> MsResult<()> {
        if self.x_min >= self.x_max {
            return Err(MolSwarmError::Config(format!(
                "position bounds inverted: [{}, {}]",
                self.x_min, self.x_max
            )));
        }
        if self.v_min >= self.v_max {
            return Err(MolSwarmError::Config(format!(
                "velocity bounds inverted: [{}, {}]",
                self.v_min, self.v_max
            )));
        }
        Ok(())
    }
}
