//! Typed per-turn world snapshot.
//!
//! The world-state decoder hands the core one [`Snapshot`] per turn. Entity
//! ids travel on the wire as the game's `"unit_12"` / `"factory_3"` strings
//! and are kept as compact integers internally.

use crate::board::*;
use crate::constants::*;
use crate::location::*;
use serde::*;
use std::fmt;
use thiserror::Error;

macro_rules! entity_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = SnapshotError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.strip_prefix(concat!($prefix, "_"))
                    .and_then(|n| n.parse().ok())
                    .map($name)
                    .ok_or_else(|| SnapshotError::BadId(s.to_string()))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

entity_id!(UnitId, "unit");
entity_id!(FactoryId, "factory");

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed entity id '{0}'")]
    BadId(String),
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cargo {
    pub ice: u32,
    pub ore: u32,
    pub water: u32,
    pub metal: u32,
}

impl Cargo {
    pub fn amount(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Ice => self.ice,
            Resource::Ore => self.ore,
        }
    }

    /// Ice plus ore, the part of a unit's cargo that counts toward capacity.
    pub fn raw_total(&self) -> u32 {
        self.ice + self.ore
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    #[serde(rename = "unit_id")]
    pub id: UnitId,
    #[serde(rename = "unit_type")]
    pub class: UnitClass,
    pub pos: Location,
    pub power: u32,
    #[serde(default)]
    pub cargo: Cargo,
}

impl Unit {
    pub fn is_heavy(&self) -> bool {
        self.class.is_heavy()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Factory {
    #[serde(rename = "unit_id")]
    pub id: FactoryId,
    pub pos: Location,
    pub power: u32,
    #[serde(default)]
    pub cargo: Cargo,
    pub strain_id: i32,
}

impl Factory {
    pub fn can_build(&self, class: UnitClass) -> bool {
        match class {
            UnitClass::Light => {
                self.cargo.metal >= LIGHT_METAL_COST && self.power >= LIGHT_POWER_COST
            }
            UnitClass::Heavy => {
                self.cargo.metal >= HEAVY_METAL_COST && self.power >= HEAVY_POWER_COST
            }
        }
    }
}

/// Everything the core sees about one turn.
#[derive(Clone, Debug, Deserialize)]
pub struct Snapshot {
    /// Turn number counted from the end of the placement phase.
    pub turn: u32,
    #[serde(default)]
    pub remaining_overage_time: u32,
    pub board: Board,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub opp_units: Vec<Unit>,
    #[serde(default)]
    pub factories: Vec<Factory>,
    #[serde(default)]
    pub opp_factories: Vec<Factory>,
}

impl Snapshot {
    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn factory(&self, id: FactoryId) -> Option<&Factory> {
        self.factories.iter().find(|f| f.id == id)
    }

    pub fn heavies(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_heavy())
    }

    pub fn lights(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.is_heavy())
    }
}
