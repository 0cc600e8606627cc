use crate::constants::*;
use serde::*;

/// A board tile, packed into 16 bits.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Location {
    packed: u16,
}

impl Location {
    pub fn from_coords(x: u32, y: u32) -> Self {
        Location {
            packed: ((x << 8) | y) as u16,
        }
    }

    /// Build a location from signed coordinates, returning `None` when the
    /// tile falls off the board.
    pub fn checked(x: i32, y: i32) -> Option<Self> {
        if (0..BOARD_SIZE as i32).contains(&x) && (0..BOARD_SIZE as i32).contains(&y) {
            Some(Location::from_coords(x as u32, y as u32))
        } else {
            None
        }
    }

    #[inline]
    pub fn x(self) -> u8 {
        ((self.packed >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn y(self) -> u8 {
        (self.packed & 0xFF) as u8
    }

    /// Offset by a signed delta, `None` if the result is off the board.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Location::checked(self.x() as i32 + dx, self.y() as i32 + dy)
    }

    /// Manhattan distance.
    pub fn distance_to(self, other: Self) -> u32 {
        let dx = self.x() as i32 - other.x() as i32;
        let dy = self.y() as i32 - other.y() as i32;

        (dx.abs() + dy.abs()) as u32
    }

    /// Squared euclidean distance, used where the ordering of candidate
    /// targets should favour tiles along a straight line.
    pub fn distance_sq(self, other: Self) -> u32 {
        let dx = self.x() as i32 - other.x() as i32;
        let dy = self.y() as i32 - other.y() as i32;

        (dx * dx + dy * dy) as u32
    }

    /// True when `other` is exactly one cardinal step away.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance_to(other) == 1
    }

    /// Four-way direction toward `target`. The dominant axis wins; an exact
    /// tie resolves to the vertical axis.
    pub fn direction_to(self, target: Self) -> Direction {
        let dx = target.x() as i32 - self.x() as i32;
        let dy = target.y() as i32 - self.y() as i32;

        if dx == 0 && dy == 0 {
            return Direction::Center;
        }

        if dx.abs() > dy.abs() {
            if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    /// The tile reached by stepping once in `direction`.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    /// Like [`Location::step`] but stays in place when the step would leave
    /// the board, mirroring what the game engine does with such a move.
    pub fn step_or_stay(self, direction: Direction) -> Self {
        self.step(direction).unwrap_or(self)
    }

    /// The in-bounds cardinal neighbours, in up/right/down/left order.
    pub fn cardinal_neighbors(self) -> impl Iterator<Item = Location> {
        Direction::CARDINAL
            .into_iter()
            .filter_map(move |d| self.step(d))
    }
}

impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.x(), self.y()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y) = <(i32, i32)>::deserialize(deserializer)?;
        Location::checked(x, y)
            .ok_or_else(|| de::Error::custom(format!("location ({}, {}) is off the board", x, y)))
    }
}

/// Movement direction, numbered the way the game engine expects.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Direction {
    Center = 0,
    Up = 1,
    Right = 2,
    Down = 3,
    Left = 4,
}

impl Direction {
    pub const CARDINAL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Center => (0, 0),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Center => Direction::Center,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}
