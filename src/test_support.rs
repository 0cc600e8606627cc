//! Fixture builders shared by the unit tests.

use crate::board::*;
use crate::constants::*;
use crate::location::*;
use crate::snapshot::*;

pub fn loc(x: u32, y: u32) -> Location {
    Location::from_coords(x, y)
}

fn unit(id: u32, class: UnitClass, pos: Location, power: u32) -> Unit {
    Unit {
        id: UnitId(id),
        class,
        pos,
        power,
        cargo: Cargo::default(),
    }
}

/// Facilities get the strain id equal to their own id.
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    pub fn new(board: Board) -> Self {
        SnapshotBuilder {
            snapshot: Snapshot {
                turn: 0,
                remaining_overage_time: 60,
                board,
                units: Vec::new(),
                opp_units: Vec::new(),
                factories: Vec::new(),
                opp_factories: Vec::new(),
            },
        }
    }

    pub fn turn(mut self, turn: u32) -> Self {
        self.snapshot.turn = turn;
        self
    }

    pub fn factory(mut self, id: u32, pos: Location, power: u32, water: u32) -> Self {
        self.snapshot.factories.push(Factory {
            id: FactoryId(id),
            pos,
            power,
            cargo: Cargo {
                water,
                ..Default::default()
            },
            strain_id: id as i32,
        });
        self
    }

    pub fn factory_with_metal(
        mut self,
        id: u32,
        pos: Location,
        power: u32,
        water: u32,
        metal: u32,
    ) -> Self {
        self = self.factory(id, pos, power, water);
        if let Some(factory) = self.snapshot.factories.last_mut() {
            factory.cargo.metal = metal;
        }
        self
    }

    pub fn opp_factory(mut self, id: u32, pos: Location) -> Self {
        self.snapshot.opp_factories.push(Factory {
            id: FactoryId(id),
            pos,
            power: 1000,
            cargo: Cargo::default(),
            strain_id: id as i32,
        });
        self
    }

    pub fn light(mut self, id: u32, pos: Location, power: u32) -> Self {
        self.snapshot.units.push(unit(id, UnitClass::Light, pos, power));
        self
    }

    pub fn heavy(mut self, id: u32, pos: Location, power: u32) -> Self {
        self.snapshot.units.push(unit(id, UnitClass::Heavy, pos, power));
        self
    }

    pub fn heavy_with_cargo(
        mut self,
        id: u32,
        pos: Location,
        power: u32,
        ice: u32,
        ore: u32,
    ) -> Self {
        let mut heavy = unit(id, UnitClass::Heavy, pos, power);
        heavy.cargo.ice = ice;
        heavy.cargo.ore = ore;
        self.snapshot.units.push(heavy);
        self
    }

    pub fn opp_light(mut self, id: u32, pos: Location, power: u32) -> Self {
        self.snapshot.opp_units.push(unit(id, UnitClass::Light, pos, power));
        self
    }

    pub fn opp_heavy(mut self, id: u32, pos: Location, power: u32) -> Self {
        self.snapshot.opp_units.push(unit(id, UnitClass::Heavy, pos, power));
        self
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }
}
