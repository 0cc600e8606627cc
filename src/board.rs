use crate::constants::*;
use crate::location::*;
use bitflags::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u8 {
        const NONE = 0;
        const ICE = 1;
        const ORE = 2;
    }
}

/// The two carryable resources that can be dug out of the board.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Ice,
    Ore,
}

impl Resource {
    pub fn flag(self) -> TileFlags {
        match self {
            Resource::Ice => TileFlags::ICE,
            Resource::Ore => TileFlags::ORE,
        }
    }
}

/// Strain value used by the game for tiles no facility has claimed.
pub const NO_STRAIN: i32 = -1;

/// A 48x48 array for board-sized data, indexed by `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardArray<T: Copy> {
    data: Vec<T>,
}

impl<T: Copy> BoardArray<T> {
    pub fn new(initial: T) -> Self {
        BoardArray {
            data: vec![initial; (BOARD_SIZE as usize) * (BOARD_SIZE as usize)],
        }
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        y * (BOARD_SIZE as usize) + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[Self::index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let index = Self::index(x, y);
        &mut self.data[index]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    #[inline]
    pub fn at(&self, loc: Location) -> T {
        *self.get(loc.x() as usize, loc.y() as usize)
    }

    #[inline]
    pub fn set_at(&mut self, loc: Location, value: T) {
        self.set(loc.x() as usize, loc.y() as usize, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &T)> {
        self.data.iter().enumerate().map(|(i, v)| {
            let x = i % (BOARD_SIZE as usize);
            let y = i / (BOARD_SIZE as usize);
            (Location::from_coords(x as u32, y as u32), v)
        })
    }

    /// Convert from the game's column-major `[x][y]` nested layout.
    fn from_columns<S: Copy>(
        name: &'static str,
        columns: Vec<Vec<S>>,
        convert: impl Fn(S) -> T,
        initial: T,
    ) -> Result<Self, BoardError> {
        let size = BOARD_SIZE as usize;
        if columns.len() != size || columns.iter().any(|c| c.len() != size) {
            return Err(BoardError::Shape {
                layer: name,
                expected: size,
            });
        }

        let mut array = BoardArray::new(initial);
        for (x, column) in columns.into_iter().enumerate() {
            for (y, value) in column.into_iter().enumerate() {
                array.set(x, y, convert(value));
            }
        }
        Ok(array)
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board layer '{layer}' must be {expected}x{expected}")]
    Shape { layer: &'static str, expected: usize },
}

/// Board layers as delivered by the world-state decoder, `[x][y]` indexed.
#[derive(Deserialize)]
struct RawBoard {
    rubble: Vec<Vec<u32>>,
    ice: Vec<Vec<u8>>,
    ore: Vec<Vec<u8>>,
    lichen: Vec<Vec<u32>>,
    lichen_strains: Vec<Vec<i32>>,
}

/// Map layers for one turn: resource presence, rubble, and lichen claims.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawBoard")]
pub struct Board {
    pub flags: BoardArray<TileFlags>,
    pub rubble: BoardArray<u32>,
    pub lichen: BoardArray<u32>,
    pub lichen_strains: BoardArray<i32>,
}

impl TryFrom<RawBoard> for Board {
    type Error = BoardError;

    fn try_from(raw: RawBoard) -> Result<Self, Self::Error> {
        let ice = BoardArray::from_columns("ice", raw.ice, |v| v > 0, false)?;
        let ore = BoardArray::from_columns("ore", raw.ore, |v| v > 0, false)?;

        let mut flags = BoardArray::new(TileFlags::NONE);
        for (loc, &has_ice) in ice.iter() {
            let mut tile = TileFlags::NONE;
            if has_ice {
                tile |= TileFlags::ICE;
            }
            if ore.at(loc) {
                tile |= TileFlags::ORE;
            }
            flags.set_at(loc, tile);
        }

        Ok(Board {
            flags,
            rubble: BoardArray::from_columns("rubble", raw.rubble, |v| v, 0)?,
            lichen: BoardArray::from_columns("lichen", raw.lichen, |v| v, 0)?,
            lichen_strains: BoardArray::from_columns(
                "lichen_strains",
                raw.lichen_strains,
                |v| v,
                NO_STRAIN,
            )?,
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl Board {
    /// A rubble-free board with no resources and no lichen.
    pub fn empty() -> Self {
        Board {
            flags: BoardArray::new(TileFlags::NONE),
            rubble: BoardArray::new(0),
            lichen: BoardArray::new(0),
            lichen_strains: BoardArray::new(NO_STRAIN),
        }
    }

    pub fn has_resource(&self, loc: Location, resource: Resource) -> bool {
        self.flags.at(loc).contains(resource.flag())
    }

    /// True for any ice or ore tile.
    pub fn is_resource_tile(&self, loc: Location) -> bool {
        self.flags.at(loc).intersects(TileFlags::ICE | TileFlags::ORE)
    }

    pub fn rubble_at(&self, loc: Location) -> u32 {
        self.rubble.at(loc)
    }

    /// Strain id claiming the tile, only when lichen is actually present.
    pub fn strain_at(&self, loc: Location) -> Option<i32> {
        let strain = self.lichen_strains.at(loc);
        if strain != NO_STRAIN && self.lichen.at(loc) > 0 {
            Some(strain)
        } else {
            None
        }
    }

    pub fn resource_tiles(&self, resource: Resource) -> impl Iterator<Item = Location> + '_ {
        let flag = resource.flag();
        self.flags
            .iter()
            .filter(move |(_, f)| f.contains(flag))
            .map(|(loc, _)| loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square<T: Copy>(value: T) -> Vec<Vec<T>> {
        vec![vec![value; BOARD_SIZE as usize]; BOARD_SIZE as usize]
    }

    #[test]
    fn raw_layers_are_read_column_major() {
        let mut ice = square(0u8);
        ice[3][7] = 1;
        let mut rubble = square(0u32);
        rubble[10][2] = 55;

        let raw = RawBoard {
            rubble,
            ice,
            ore: square(0u8),
            lichen: square(0u32),
            lichen_strains: square(NO_STRAIN),
        };
        let board = Board::try_from(raw).unwrap();

        assert!(board.has_resource(Location::from_coords(3, 7), Resource::Ice));
        assert!(!board.has_resource(Location::from_coords(7, 3), Resource::Ice));
        assert_eq!(board.rubble_at(Location::from_coords(10, 2)), 55);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let raw = RawBoard {
            rubble: vec![vec![0; 3]; 3],
            ice: square(0u8),
            ore: square(0u8),
            lichen: square(0u32),
            lichen_strains: square(NO_STRAIN),
        };
        assert!(matches!(
            Board::try_from(raw),
            Err(BoardError::Shape { layer: "rubble", .. })
        ));
    }

    #[test]
    fn strain_requires_lichen() {
        let mut board = Board::empty();
        let loc = Location::from_coords(4, 4);
        board.lichen_strains.set_at(loc, 7);
        assert_eq!(board.strain_at(loc), None);
        board.lichen.set_at(loc, 12);
        assert_eq!(board.strain_at(loc), Some(7));
    }
}
