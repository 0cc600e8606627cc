//! State shared by every decision made during a turn.
//!
//! [`Memory`] survives from turn to turn. [`TurnContext`] wraps it together
//! with the snapshot and the tuning for the duration of one turn; units are
//! planned one after another against it, so later units see every
//! reservation and claim made by earlier ones.

use crate::action::*;
use crate::board::*;
use crate::config::*;
use crate::constants::*;
use crate::geometry::*;
use crate::ledger::*;
use crate::location::*;
use crate::needs::*;
use crate::pathing::*;
use crate::snapshot::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::*;

/// Behavioural state of a unit, carried across turns.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum UnitState {
    #[default]
    Idle,
    Mining,
    MiningAdjacent,
    Recharging,
    LowBattery,
    Waiting,
    Helping,
    Attacking,
    Aggro,
    Evading,
    EvasionRecharge,
    Transferring,
    SolarPanel,
    SlowCharging,
}

impl UnitState {
    /// States whose queue is worth replacing as soon as something better
    /// comes along.
    pub fn is_soft(self) -> bool {
        matches!(
            self,
            UnitState::Waiting | UnitState::SolarPanel | UnitState::SlowCharging
        )
    }

    /// States that keep their place near the front of the unit ordering.
    pub fn is_continuing(self) -> bool {
        matches!(self, UnitState::MiningAdjacent | UnitState::Helping)
    }
}

/// What the agent remembers about one of its facilities.
#[derive(Clone, Debug, Default)]
pub struct FactoryMemory {
    pub tasks_light: FnvHashMap<UnitId, Task>,
    pub tasks_heavy: FnvHashMap<UnitId, Task>,
    /// Heavy bound to hauling ice for this facility.
    pub homer: Option<UnitId>,
    /// Second unit bound to hauling ice.
    pub icer: Option<UnitId>,
    pub low_power: bool,
    pub ice_tiles: usize,
    pub ore_tiles: usize,
    pub kind: FactoryKind,
    pub lanes: LaneCache,
}

impl FactoryMemory {
    pub fn tasks(&self, class: UnitClass) -> &FnvHashMap<UnitId, Task> {
        match class {
            UnitClass::Light => &self.tasks_light,
            UnitClass::Heavy => &self.tasks_heavy,
        }
    }

    pub fn tasks_mut(&mut self, class: UnitClass) -> &mut FnvHashMap<UnitId, Task> {
        match class {
            UnitClass::Light => &mut self.tasks_light,
            UnitClass::Heavy => &mut self.tasks_heavy,
        }
    }

    /// Units currently working for this facility.
    pub fn staffing(&self) -> usize {
        self.tasks_light.len() + self.tasks_heavy.len()
    }

    pub fn is_specialist(&self, unit: UnitId) -> bool {
        self.homer == Some(unit) || self.icer == Some(unit)
    }

    /// Flip the low-power flag with hysteresis: enter below the lower bound,
    /// leave above the upper one.
    pub fn update_low_power(&mut self, power: u32, config: &PowerConfig) {
        if self.low_power {
            if power > config.low_power_exit {
                self.low_power = false;
            }
        } else if power < config.low_power_enter {
            self.low_power = true;
        }
    }
}

/// Everything the agent carries from one turn to the next.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    pub queues: FnvHashMap<UnitId, ActionQueue>,
    pub states: FnvHashMap<UnitId, UnitState>,
    pub ledger: ReservationLedger,
    pub factories: FnvHashMap<FactoryId, FactoryMemory>,
    pub opp_strains: Vec<i32>,
}

impl Memory {
    /// Account for the turn that just executed: every queue's head runs once.
    pub fn pop_action_queues(&mut self) {
        for queue in self.queues.values_mut() {
            queue.advance();
        }
        self.queues.retain(|_, queue| !queue.is_empty());
    }

    /// Forget units and facilities missing from `snapshot`, including any
    /// specialist bindings that pointed at them.
    pub fn prune_dead(&mut self, snapshot: &Snapshot) {
        let live: FnvHashSet<UnitId> = snapshot.units.iter().map(|u| u.id).collect();
        let live_factories: FnvHashSet<FactoryId> =
            snapshot.factories.iter().map(|f| f.id).collect();

        self.queues.retain(|id, _| live.contains(id));
        self.states.retain(|id, _| live.contains(id));
        self.ledger.prune(&live);
        self.factories.retain(|id, _| live_factories.contains(id));

        for (fid, memory) in self.factories.iter_mut() {
            memory.tasks_light.retain(|id, _| live.contains(id));
            memory.tasks_heavy.retain(|id, _| live.contains(id));

            if memory.homer.map_or(false, |id| !live.contains(&id)) {
                debug!("{} lost its homer", fid);
                memory.homer = None;
            }
            if memory.icer.map_or(false, |id| !live.contains(&id)) {
                debug!("{} lost its icer", fid);
                memory.icer = None;
            }
        }
    }

    pub fn state(&self, unit: UnitId) -> UnitState {
        self.states.get(&unit).copied().unwrap_or_default()
    }

    pub fn set_state(&mut self, unit: UnitId, state: UnitState) {
        self.states.insert(unit, state);
    }

    /// Remove a unit's in-flight task from every facility.
    pub fn clear_task(&mut self, unit: UnitId) {
        for memory in self.factories.values_mut() {
            memory.tasks_light.remove(&unit);
            memory.tasks_heavy.remove(&unit);
        }
    }

    /// Facility the unit currently has an in-flight task for.
    pub fn task_factory(&self, unit: UnitId) -> Option<FactoryId> {
        self.factories
            .iter()
            .filter(|(_, m)| m.tasks_light.contains_key(&unit) || m.tasks_heavy.contains_key(&unit))
            .map(|(id, _)| *id)
            .min()
    }

    /// Facility the unit is bound to as a specialist.
    pub fn specialist_factory(&self, unit: UnitId) -> Option<FactoryId> {
        self.factories
            .iter()
            .filter(|(_, m)| m.is_specialist(unit))
            .map(|(id, _)| *id)
            .min()
    }
}

pub struct TurnContext<'a> {
    pub snapshot: &'a Snapshot,
    pub tuning: &'a Tuning,
    pub memory: &'a mut Memory,
    pub needs: Needs,
    /// Power each unit needs to get home, cached by the recharge check.
    pub cost_home: FnvHashMap<UnitId, u32>,
    /// Facility each unit was resolved to serve this turn.
    pub serving: FnvHashMap<UnitId, FactoryId>,
    /// Queues replaced this turn, to be submitted.
    pub submitted: FnvHashMap<UnitId, ActionQueue>,
}

impl<'a> TurnContext<'a> {
    /// Open a turn: rebuild the reservation set and capture opponent strains
    /// the first time opponent facilities are visible.
    pub fn begin(snapshot: &'a Snapshot, tuning: &'a Tuning, memory: &'a mut Memory) -> Self {
        let immobile = snapshot
            .units
            .iter()
            .filter(|u| memory.state(u.id) == UnitState::LowBattery)
            .collect::<Vec<_>>();
        memory.ledger.rebuild(snapshot, immobile);

        if memory.opp_strains.is_empty() && !snapshot.opp_factories.is_empty() {
            memory.opp_strains = snapshot.opp_factories.iter().map(|f| f.strain_id).collect();
            debug!("opponent strains: {:?}", memory.opp_strains);
        }

        TurnContext {
            snapshot,
            tuning,
            memory,
            needs: Needs::default(),
            cost_home: FnvHashMap::default(),
            serving: FnvHashMap::default(),
            submitted: FnvHashMap::default(),
        }
    }

    pub fn turn(&self) -> u32 {
        self.snapshot.turn
    }

    pub fn board(&self) -> &'a Board {
        &self.snapshot.board
    }

    pub fn grid(&self) -> CostGrid<'a> {
        CostGrid::new(&self.snapshot.board.rubble, &self.tuning.pathing)
    }

    pub fn factory_memory(&mut self, factory: FactoryId) -> &mut FactoryMemory {
        self.memory.factories.entry(factory).or_default()
    }

    /// Adopt a freshly built queue for `unit` and reserve its next tile.
    ///
    /// If that tile already belongs to someone else the plan is replaced by
    /// a single sidestep so two plans never share a tile.
    pub fn commit(&mut self, unit: &Unit, mut queue: ActionQueue) {
        queue.truncate_to_limit();

        let mut next = queue.next_position(unit.pos);
        if self.memory.ledger.is_reserved_by_other(next, unit.id) {
            let mut occupied = self.memory.ledger.occupied();
            if let Some(own) = self.memory.ledger.next_tile(unit.id) {
                occupied.remove(&own);
            }
            let home = self
                .serving
                .get(&unit.id)
                .and_then(|id| self.snapshot.factory(*id))
                .map_or(unit.pos, |f| f.pos);
            let direction = move_toward(unit.pos, home, &occupied, Some(Direction::Center));

            debug!("{} next tile {:?} is taken, stepping {:?}", unit.id, next, direction);
            queue = match direction {
                Direction::Center => ActionQueue::single(Action::wait(1)),
                d => ActionQueue::single(Action::move_to(d)),
            };
            next = unit.pos.step_or_stay(direction);
        }

        if !self.memory.ledger.reserve_next(unit.id, next) {
            if next != unit.pos {
                self.hold_position(unit);
                return;
            }
            warn!("{} is boxed in at {:?}", unit.id, unit.pos);
        }

        self.memory.queues.insert(unit.id, queue.clone());
        self.submitted.insert(unit.id, queue);
    }

    /// Keep the unit's current queue and reserve where it leads.
    pub fn keep(&mut self, unit: &Unit) {
        let next = self
            .memory
            .queues
            .get(&unit.id)
            .map_or(unit.pos, |q| q.next_position(unit.pos));

        if !self.memory.ledger.reserve_next(unit.id, next) {
            if next != unit.pos {
                debug!("{} would walk into held tile {:?}, holding", unit.id, next);
                self.hold_position(unit);
            } else {
                trace!("{} stays on a tile someone else holds", unit.id);
            }
        }
    }

    /// Replace the unit's plan with a one-turn wait on its own tile.
    fn hold_position(&mut self, unit: &Unit) {
        if !self.memory.ledger.reserve_next(unit.id, unit.pos) {
            warn!("{} is boxed in at {:?}", unit.id, unit.pos);
        }

        let queue = ActionQueue::single(Action::wait(1));
        self.memory.queues.insert(unit.id, queue.clone());
        self.submitted.insert(unit.id, queue);
    }
}
