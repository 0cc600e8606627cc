use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 48;

/// Length of one full day/night cycle in turns.
pub const CYCLE_LENGTH: u32 = 50;

/// Number of turns at the start of each cycle during which units recharge.
pub const DAY_LENGTH: u32 = 30;

/// Hard platform limit on the number of entries in a unit's action queue.
pub const MAX_QUEUE_LENGTH: usize = 20;

/// Total number of turns in a game.
pub const MAX_TURNS: u32 = 1000;

pub const LIGHT_METAL_COST: u32 = 10;
pub const LIGHT_POWER_COST: u32 = 50;
pub const HEAVY_METAL_COST: u32 = 100;
pub const HEAVY_POWER_COST: u32 = 500;

/// Returns true if the given turn falls inside the daylight part of the cycle.
pub fn is_day(turn: u32) -> bool {
    turn % CYCLE_LENGTH < DAY_LENGTH
}

/// Unit weight class. Every cost and capacity constant differs by class.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitClass {
    Light,
    Heavy,
}

impl UnitClass {
    /// Fixed power paid for every move, before the rubble surcharge.
    pub fn move_cost(self) -> u32 {
        match self {
            UnitClass::Light => 1,
            UnitClass::Heavy => 20,
        }
    }

    /// Rubble surcharge for entering a tile. Lights pay 1/20th, floored.
    pub fn rubble_move_cost(self, rubble: u32) -> u32 {
        match self {
            UnitClass::Light => rubble / 20,
            UnitClass::Heavy => rubble,
        }
    }

    /// Total power to enter a tile with the given rubble.
    pub fn step_cost(self, rubble: u32) -> u32 {
        self.move_cost() + self.rubble_move_cost(rubble)
    }

    pub fn dig_cost(self) -> u32 {
        match self {
            UnitClass::Light => 5,
            UnitClass::Heavy => 60,
        }
    }

    /// Resource gained per dig on an ice or ore tile.
    pub fn dig_resource_gain(self) -> u32 {
        match self {
            UnitClass::Light => 2,
            UnitClass::Heavy => 20,
        }
    }

    /// Rubble cleared per dig.
    pub fn dig_rubble_removed(self) -> u32 {
        match self {
            UnitClass::Light => 2,
            UnitClass::Heavy => 20,
        }
    }

    /// Lichen cleared per dig.
    pub fn dig_lichen_removed(self) -> u32 {
        match self {
            UnitClass::Light => 10,
            UnitClass::Heavy => 100,
        }
    }

    pub fn cargo_capacity(self) -> u32 {
        match self {
            UnitClass::Light => 100,
            UnitClass::Heavy => 1000,
        }
    }

    pub fn battery_capacity(self) -> u32 {
        match self {
            UnitClass::Light => 150,
            UnitClass::Heavy => 3000,
        }
    }

    /// Passive power gained per daylight turn.
    pub fn charge(self) -> u32 {
        match self {
            UnitClass::Light => 1,
            UnitClass::Heavy => 10,
        }
    }

    pub fn is_heavy(self) -> bool {
        self == UnitClass::Heavy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_rubble_surcharge_is_floored() {
        assert_eq!(UnitClass::Light.step_cost(19), 1);
        assert_eq!(UnitClass::Light.step_cost(40), 3);
        assert_eq!(UnitClass::Heavy.step_cost(40), 60);
    }

    #[test]
    fn daylight_window() {
        assert!(is_day(0));
        assert!(is_day(29));
        assert!(!is_day(30));
        assert!(!is_day(49));
        assert!(is_day(50));
    }
}
