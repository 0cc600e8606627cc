//! Tunable thresholds for the decision engine.
//!
//! Every constant here was tuned against the game's balance rather than
//! derived from it, so it lives in data. The compiled-in defaults come from
//! `data/tuning.json`; any field omitted from an override file falls back to
//! the same defaults.

use crate::constants::UnitClass;
use serde::Deserialize;
use std::{fs, io, path::Path, path::PathBuf};
use thiserror::Error;

pub const BUILTIN_TUNING: &str = include_str!("data/tuning.json");

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub reserve: ReserveConfig,
    pub needs: NeedsConfig,
    pub pathing: PathingConfig,
    pub combat: CombatConfig,
    pub power: PowerConfig,
    pub irrigation: IrrigationConfig,
}

impl Tuning {
    pub fn builtin() -> Self {
        serde_json::from_str(BUILTIN_TUNING).expect("builtin tuning should parse")
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, TuningError> {
        let contents = fs::read_to_string(path).map_err(|source| TuningError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Tuning::from_json_str(&contents)?;
        Ok(tuning)
    }
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Power buffers units keep back when committing to a plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    pub moderate_light: u32,
    pub moderate_heavy: u32,
    pub low_light: u32,
    pub low_heavy: u32,
    pub adjacent_light: u32,
    pub adjacent_heavy: u32,
    pub dig_allowance_light: u32,
    pub dig_allowance_heavy: u32,
}

impl ReserveConfig {
    /// Buffer kept on top of a full mining round trip.
    pub fn moderate(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.moderate_light,
            UnitClass::Heavy => self.moderate_heavy,
        }
    }

    /// Buffer below which a unit heads home to recharge.
    pub fn low(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.low_light,
            UnitClass::Heavy => self.low_heavy,
        }
    }

    /// Buffer for units mining right next to their facility.
    pub fn adjacent(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.adjacent_light,
            UnitClass::Heavy => self.adjacent_heavy,
        }
    }

    /// Minimum power left for digging before a mining trip is worth it.
    pub fn dig_allowance(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.dig_allowance_light,
            UnitClass::Heavy => self.dig_allowance_heavy,
        }
    }
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            moderate_light: 15,
            moderate_heavy: 150,
            low_light: 10,
            low_heavy: 100,
            adjacent_light: 2,
            adjacent_heavy: 25,
            dig_allowance_light: 50,
            dig_allowance_heavy: 600,
        }
    }
}

/// Rule thresholds for the facility needs backlog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    pub catchment_radius: u32,
    pub surrounded_free_spaces: usize,
    pub crowded_lichen_level: u32,
    pub crowded_fraction: f32,
    pub light_excavators: usize,
    pub max_miners_per_resource: usize,
    pub light_water_threshold: u32,
    pub light_metal_threshold: u32,
    pub heavy_water_threshold: u32,
    pub heavy_metal_threshold: u32,
    pub early_ore_turn: u32,
    pub early_ore_safe_water: u32,
    pub blaze_threshold: u32,
    pub lane_refresh_interval: u32,
    pub open_lane_min_distance: u32,
    /// Rubble on the open lane above which lights are sent to clear it.
    pub open_blaze_threshold: u32,
    pub open_blaze_min_water: u32,
    pub light_staffed: usize,
    pub light_staff_target: usize,
    pub heavy_staff_target: usize,
    pub attack_start_turn: u32,
    pub attackers_per_factory: usize,
    pub helper_min_distance: u32,
    pub icer_min_ice: usize,
    pub icer_start_turn: u32,
    pub emergency_water: u32,
    pub emergency_ice_light: u32,
    pub emergency_ice_heavy: u32,
}

impl NeedsConfig {
    pub fn emergency_ice(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.emergency_ice_light,
            UnitClass::Heavy => self.emergency_ice_heavy,
        }
    }
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            catchment_radius: 30,
            surrounded_free_spaces: 10,
            crowded_lichen_level: 40,
            crowded_fraction: 0.8,
            light_excavators: 4,
            max_miners_per_resource: 3,
            light_water_threshold: 200,
            light_metal_threshold: 100,
            heavy_water_threshold: 1000,
            heavy_metal_threshold: 100,
            early_ore_turn: 300,
            early_ore_safe_water: 100,
            blaze_threshold: 40,
            lane_refresh_interval: 25,
            open_lane_min_distance: 3,
            open_blaze_threshold: 50,
            open_blaze_min_water: 100,
            light_staffed: 4,
            light_staff_target: 6,
            heavy_staff_target: 2,
            attack_start_turn: 150,
            attackers_per_factory: 1,
            helper_min_distance: 4,
            icer_min_ice: 2,
            icer_start_turn: 20,
            emergency_water: 50,
            emergency_ice_light: 20,
            emergency_ice_heavy: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PathingConfig {
    /// Fixed search cost of one step, added to the destination's rubble.
    pub step_cost: u32,
    /// Reserved tiles are only avoided while the frontier holds at most
    /// this many entries.
    pub frontier_exclusion_limit: usize,
    pub light_rubble_threshold: u32,
    pub heavy_rubble_threshold: u32,
}

impl PathingConfig {
    pub fn rubble_threshold(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.light_rubble_threshold,
            UnitClass::Heavy => self.heavy_rubble_threshold,
        }
    }
}

impl Default for PathingConfig {
    fn default() -> Self {
        Self {
            step_cost: 5,
            frontier_exclusion_limit: 5,
            light_rubble_threshold: 20,
            heavy_rubble_threshold: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub aggro_radius: u32,
    pub aggro_start_turn: u32,
    pub attack_max_hops: usize,
    pub priority_strain_min_tiles: usize,
    /// Beyond this distance from home an evading unit retreats instead of feinting.
    pub retreat_distance: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            aggro_radius: 6,
            aggro_start_turn: 50,
            attack_max_hops: 8,
            priority_strain_min_tiles: 15,
            retreat_distance: 4,
        }
    }
}

/// Power level up to which a facility keeps `floor` power back from heavies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PowerFloor {
    pub ceiling: u32,
    pub floor: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub low_power_enter: u32,
    pub low_power_exit: u32,
    pub light_pickup_floor: u32,
    pub heavy_pickup_floors: Vec<PowerFloor>,
    pub slow_charge_light: u32,
    pub slow_charge_heavy: u32,
    pub solar_panel_min_power_light: u32,
    pub solar_panel_min_power_heavy: u32,
}

impl PowerConfig {
    pub fn slow_charge(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.slow_charge_light,
            UnitClass::Heavy => self.slow_charge_heavy,
        }
    }

    pub fn solar_panel_min_power(&self, class: UnitClass) -> u32 {
        match class {
            UnitClass::Light => self.solar_panel_min_power_light,
            UnitClass::Heavy => self.solar_panel_min_power_heavy,
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            low_power_enter: 300,
            low_power_exit: 1000,
            light_pickup_floor: 50,
            heavy_pickup_floors: vec![
                PowerFloor {
                    ceiling: 500,
                    floor: 50,
                },
                PowerFloor {
                    ceiling: 1000,
                    floor: 200,
                },
                PowerFloor {
                    ceiling: 2500,
                    floor: 500,
                },
                PowerFloor {
                    ceiling: 3500,
                    floor: 1000,
                },
            ],
            slow_charge_light: 5,
            slow_charge_heavy: 50,
            solar_panel_min_power_light: 40,
            solar_panel_min_power_heavy: 400,
        }
    }
}

/// Water thresholds for the irrigation ladder, by game phase.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IrrigationConfig {
    pub early_end: u32,
    pub early_always: u32,
    pub early_min: u32,
    pub mid_end: u32,
    pub mid_power_ceiling: u32,
    pub mid_always: u32,
    pub mid_two_of_three: u32,
    pub mid_even: u32,
    pub late_end: u32,
    pub late_per_step: u32,
    pub late_always: u32,
    pub late_two_of_three: u32,
    pub late_even: u32,
    pub final_end: u32,
    pub final_min: u32,
    pub last_min: u32,
}

impl Default for IrrigationConfig {
    fn default() -> Self {
        Self {
            early_end: 100,
            early_always: 120,
            early_min: 50,
            mid_end: 750,
            mid_power_ceiling: 5000,
            mid_always: 200,
            mid_two_of_three: 100,
            mid_even: 50,
            late_end: 980,
            late_per_step: 6,
            late_always: 400,
            late_two_of_three: 200,
            late_even: 50,
            final_end: 996,
            final_min: 50,
            last_min: 30,
        }
    }
}
