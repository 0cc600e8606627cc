//! Primitive actions and run-length compressed action queues.

use crate::board::Resource;
use crate::constants::*;
use crate::location::*;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

/// Cargo slot addressed by transfer and pickup actions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CargoSlot {
    Ice = 0,
    Ore = 1,
    Water = 2,
    Metal = 3,
    Power = 4,
}

impl From<Resource> for CargoSlot {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Ice => CargoSlot::Ice,
            Resource::Ore => CargoSlot::Ore,
        }
    }
}

/// What a single unit action does, without its repeat count.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ActionKind {
    Move(Direction),
    Transfer {
        direction: Direction,
        slot: CargoSlot,
        amount: u32,
    },
    Pickup { slot: CargoSlot, amount: u32 },
    Dig,
}

/// A unit action with its run-length repeat count. `n` is always at least 1.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Action {
    pub kind: ActionKind,
    pub n: u32,
}

impl Action {
    pub fn new(kind: ActionKind, n: u32) -> Self {
        Action { kind, n: n.max(1) }
    }

    pub fn move_to(direction: Direction) -> Self {
        Action::new(ActionKind::Move(direction), 1)
    }

    pub fn wait(n: u32) -> Self {
        Action::new(ActionKind::Move(Direction::Center), n)
    }

    pub fn dig(n: u32) -> Self {
        Action::new(ActionKind::Dig, n)
    }

    pub fn transfer(direction: Direction, slot: CargoSlot, amount: u32) -> Self {
        Action::new(
            ActionKind::Transfer {
                direction,
                slot,
                amount,
            },
            1,
        )
    }

    pub fn pickup(slot: CargoSlot, amount: u32, n: u32) -> Self {
        Action::new(ActionKind::Pickup { slot, amount }, n)
    }

    /// Direction the unit moves when this action executes, `Center` for
    /// anything that keeps it in place.
    pub fn movement(&self) -> Direction {
        match self.kind {
            ActionKind::Move(direction) => direction,
            _ => Direction::Center,
        }
    }

    pub fn is_dig(&self) -> bool {
        self.kind == ActionKind::Dig
    }

    /// The game's six-integer encoding `[type, direction, resource, amount, repeat, n]`.
    pub fn encode(&self) -> [u32; 6] {
        let (kind, direction, slot, amount) = match self.kind {
            ActionKind::Move(direction) => (0, direction.code() as u32, 0, 0),
            ActionKind::Transfer {
                direction,
                slot,
                amount,
            } => (1, direction.code() as u32, slot as u32, amount),
            ActionKind::Pickup { slot, amount } => (2, 0, slot as u32, amount),
            ActionKind::Dig => (3, 0, 0, 0),
        };
        [kind, direction, slot, amount, 0, self.n]
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode().serialize(serializer)
    }
}

/// Ordered unit plan. Adjacent identical actions are merged and the queue
/// never holds more than [`MAX_QUEUE_LENGTH`] entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionQueue {
    actions: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        ActionQueue {
            actions: Vec::new(),
        }
    }

    pub fn single(action: Action) -> Self {
        let mut queue = ActionQueue::new();
        queue.push(action);
        queue
    }

    /// Append an action, merging it into the tail entry when identical.
    pub fn push(&mut self, action: Action) {
        match self.actions.last_mut() {
            Some(last) if last.kind == action.kind => last.n += action.n,
            _ => self.actions.push(action),
        }
    }

    pub fn extend(&mut self, other: ActionQueue) {
        for action in other.actions {
            self.push(action);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn head(&self) -> Option<&Action> {
        self.actions.first()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Drop everything past the platform limit.
    pub fn truncate_to_limit(&mut self) {
        self.actions.truncate(MAX_QUEUE_LENGTH);
    }

    pub fn truncate(&mut self, len: usize) {
        self.actions.truncate(len);
    }

    /// Account for one executed turn: decrement the head's count and pop it
    /// once exhausted.
    pub fn advance(&mut self) {
        if let Some(head) = self.actions.first_mut() {
            head.n -= 1;
            if head.n == 0 {
                self.actions.remove(0);
            }
        }
    }

    /// Keep only the head entry, executed once.
    pub fn keep_next_only(&mut self) {
        self.actions.truncate(1);
        if let Some(head) = self.actions.first_mut() {
            head.n = 1;
        }
    }

    /// Tile the unit at `pos` will stand on after the head action executes.
    pub fn next_position(&self, pos: Location) -> Location {
        match self.head() {
            Some(action) => pos.step_or_stay(action.movement()),
            None => pos,
        }
    }

    /// Tile on which each action starts executing, paired with the action.
    pub fn positions(&self, start: Location) -> Vec<(Location, Action)> {
        let mut pos = start;
        let mut out = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            out.push((pos, *action));
            let direction = action.movement();
            for _ in 0..action.n {
                pos = pos.step_or_stay(direction);
            }
        }
        out
    }

    /// Compress a path into merged move actions.
    pub fn from_path(path: &[Location]) -> Self {
        let mut queue = ActionQueue::new();
        for pair in path.windows(2) {
            queue.push(Action::move_to(pair[0].direction_to(pair[1])));
        }
        queue
    }
}

impl Serialize for ActionQueue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.actions.len()))?;
        for action in &self.actions {
            seq.serialize_element(action)?;
        }
        seq.end()
    }
}

/// One-shot facility action.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FactoryAction {
    BuildLight = 0,
    BuildHeavy = 1,
    Water = 2,
}

impl Serialize for FactoryAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(*self as u8)
    }
}

/// Everything submitted for an entity in one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntityActions {
    Unit(ActionQueue),
    Factory(FactoryAction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_actions_merge() {
        let mut queue = ActionQueue::new();
        queue.push(Action::move_to(Direction::Down));
        queue.push(Action::move_to(Direction::Down));
        queue.push(Action::dig(4));
        queue.push(Action::dig(2));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.actions()[0].n, 2);
        assert_eq!(queue.actions()[1].n, 6);
    }

    #[test]
    fn advancing_decrements_then_pops() {
        let mut queue = ActionQueue::new();
        queue.push(Action::move_to(Direction::Right));
        queue.push(Action::move_to(Direction::Right));
        queue.push(Action::dig(1));

        queue.advance();
        assert_eq!(queue.head().unwrap().n, 1);
        queue.advance();
        assert!(queue.head().unwrap().is_dig());
        queue.advance();
        assert!(queue.is_empty());
        queue.advance();
        assert!(queue.is_empty());
    }

    #[test]
    fn positions_follow_the_moves() {
        let start = Location::from_coords(5, 5);
        let path = [
            start,
            Location::from_coords(5, 6),
            Location::from_coords(5, 7),
            Location::from_coords(6, 7),
        ];
        let mut queue = ActionQueue::from_path(&path);
        queue.push(Action::dig(3));

        let positions = queue.positions(start);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[1].0, Location::from_coords(5, 7));
        assert_eq!(positions[2].0, Location::from_coords(6, 7));
        assert_eq!(queue.next_position(start), Location::from_coords(5, 6));
    }

    #[test]
    fn encodes_to_game_arrays() {
        let transfer = Action::transfer(Direction::Left, CargoSlot::Ore, 30);
        assert_eq!(transfer.encode(), [1, 4, 1, 30, 0, 1]);
        let pickup = Action::pickup(CargoSlot::Power, 120, 1);
        assert_eq!(
            serde_json::to_string(&pickup).unwrap(),
            "[2,0,4,120,0,1]"
        );
        assert_eq!(
            serde_json::to_string(&EntityActions::Factory(FactoryAction::Water)).unwrap(),
            "2"
        );
    }

    #[test]
    fn limit_truncates_long_queues() {
        let mut queue = ActionQueue::new();
        for i in 0..30 {
            let direction = if i % 2 == 0 { Direction::Up } else { Direction::Down };
            queue.push(Action::move_to(direction));
        }
        queue.truncate_to_limit();
        assert_eq!(queue.len(), MAX_QUEUE_LENGTH);
    }
}
