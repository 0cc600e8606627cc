#![allow(dead_code)]

use lux_dispatch::board::*;
use lux_dispatch::constants::*;
use lux_dispatch::location::*;
use lux_dispatch::snapshot::*;

pub fn loc(x: u32, y: u32) -> Location {
    Location::from_coords(x, y)
}

pub fn unit(id: u32, class: UnitClass, pos: Location, power: u32) -> Unit {
    Unit {
        id: UnitId(id),
        class,
        pos,
        power,
        cargo: Cargo::default(),
    }
}

pub fn factory(id: u32, pos: Location, power: u32, water: u32, metal: u32) -> Factory {
    Factory {
        id: FactoryId(id),
        pos,
        power,
        cargo: Cargo {
            water,
            metal,
            ..Default::default()
        },
        strain_id: id as i32,
    }
}

pub fn snapshot(turn: u32, board: Board) -> Snapshot {
    Snapshot {
        turn,
        remaining_overage_time: 60,
        board,
        units: Vec::new(),
        opp_units: Vec::new(),
        factories: Vec::new(),
        opp_factories: Vec::new(),
    }
}

pub fn grow_lichen(board: &mut Board, strain: i32, tiles: impl IntoIterator<Item = Location>) {
    for tile in tiles {
        board.lichen_strains.set_at(tile, strain);
        board.lichen.set_at(tile, 20);
    }
}
