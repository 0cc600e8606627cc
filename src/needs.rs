//! Per-facility labour backlog.
//!
//! Each turn every facility compares what it wants (water, metal, room for
//! lichen, pressure on the opponent) against what it has, producing one
//! ordered backlog per unit class. Tasks already in flight are struck off
//! one for one, and empty backlogs are dropped entirely.

use crate::board::*;
use crate::constants::*;
use crate::context::*;
use crate::geometry::*;
use crate::lichen::*;
use crate::location::*;
use crate::pathing::*;
use crate::snapshot::*;
use fnv::{FnvHashMap, FnvHashSet};
use itertools::Itertools;
use log::*;
use std::collections::VecDeque;

/// A unit of labour a facility can hand out.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Task {
    Mine(Resource),
    Excavate,
    /// Clear rubble along one of the facility's cached lanes.
    Blaze(LaneKind),
    Help(UnitId),
    Recharge,
    Attack,
    Aggro,
    Homer,
    Icer,
}

/// Classification of a facility by the resources in its catchment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum FactoryKind {
    #[default]
    Resourceless,
    Balanced,
    OreMine,
    IceMine,
    Rich,
    IcePref,
    OrePref,
}

pub fn classify(ice: usize, ore: usize) -> FactoryKind {
    if ice == 0 && ore == 0 {
        FactoryKind::Resourceless
    } else if ice == ore {
        FactoryKind::Balanced
    } else if ice == 0 {
        FactoryKind::OreMine
    } else if ore == 0 {
        FactoryKind::IceMine
    } else if ice >= 3 && ore >= 3 {
        FactoryKind::Rich
    } else if ice > ore {
        FactoryKind::IcePref
    } else {
        FactoryKind::OrePref
    }
}

/// Which cached route out of a facility.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LaneKind {
    Ice,
    Ore,
    /// Toward open ground the lichen could spread onto.
    Open,
}

impl From<Resource> for LaneKind {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Ice => LaneKind::Ice,
            Resource::Ore => LaneKind::Ore,
        }
    }
}

/// A cached route out of a facility and the rubble currently lying on it.
#[derive(Clone, Debug, Default)]
pub struct Lane {
    pub path: Vec<Location>,
    pub rubble: u32,
}

#[derive(Clone, Debug, Default)]
pub struct LaneCache {
    pub ice: Option<Lane>,
    pub ore: Option<Lane>,
    /// Route to the nearest tile lichen could grow onto.
    pub open: Option<Lane>,
    refreshed: Option<u32>,
}

impl LaneCache {
    pub fn is_due(&self, turn: u32, interval: u32) -> bool {
        self.refreshed.map_or(true, |last| turn >= last + interval)
    }

    /// Re-run the searches from the facility center. Resource tiles some
    /// unit already has dibs on are passed over.
    #[allow(clippy::too_many_arguments)]
    pub fn rebuild(
        &mut self,
        grid: &CostGrid,
        board: &Board,
        center: Location,
        forbidden: &FnvHashSet<Location>,
        claimed: &FnvHashSet<Location>,
        open_min_distance: u32,
        turn: u32,
    ) {
        let field = grid.cost_field(center, forbidden);
        let footprint: FnvHashSet<Location> = factory_tiles(center).into_iter().collect();
        let unclaimed = |resource: Resource| {
            board
                .resource_tiles(resource)
                .filter(|tile| !claimed.contains(tile))
        };

        self.ice = cheapest_lane(&field, center, unclaimed(Resource::Ice));
        self.ore = cheapest_lane(&field, center, unclaimed(Resource::Ore));
        let open = board.rubble.iter().map(|(loc, _)| loc).filter(|&loc| {
            board.rubble_at(loc) == 0
                && board.lichen.at(loc) == 0
                && !board.is_resource_tile(loc)
                && !footprint.contains(&loc)
                && center.distance_to(loc) >= open_min_distance
        });
        self.open = cheapest_lane(&field, center, open);
        self.refreshed = Some(turn);
        self.recost(board);
    }

    /// Refresh the rubble totals along the cached paths.
    pub fn recost(&mut self, board: &Board) {
        for lane in [&mut self.ice, &mut self.ore, &mut self.open].into_iter().flatten() {
            lane.rubble = path_rubble(&lane.path, &board.rubble);
        }
    }

    pub fn lane(&self, kind: LaneKind) -> Option<&Lane> {
        match kind {
            LaneKind::Ice => self.ice.as_ref(),
            LaneKind::Ore => self.ore.as_ref(),
            LaneKind::Open => self.open.as_ref(),
        }
    }

    /// First tile along the lane that still carries rubble.
    pub fn first_rubble(
        &self,
        kind: LaneKind,
        board: &Board,
        off_limits: &FnvHashSet<Location>,
    ) -> Option<Location> {
        self.lane(kind)?
            .path
            .iter()
            .skip(1)
            .copied()
            .find(|&loc| board.rubble_at(loc) > 0 && !off_limits.contains(&loc))
    }
}

/// Cheapest reachable tile among `tiles`, as a lane from `center`.
fn cheapest_lane(
    field: &CostField,
    center: Location,
    tiles: impl Iterator<Item = Location>,
) -> Option<Lane> {
    tiles
        .filter_map(|tile| field.get(&tile).map(|&(_, cost)| (tile, cost)))
        .min_by_key(|&(tile, cost)| (cost, tile))
        .map(|(tile, _)| lane_path(field, center, tile))
        .filter(|path| !path.is_empty())
        .map(|path| Lane { path, rubble: 0 })
}

/// Outstanding backlogs, keyed by facility. A facility with nothing left
/// to hand out has no entry.
#[derive(Clone, Debug, Default)]
pub struct Needs {
    light: FnvHashMap<FactoryId, VecDeque<Task>>,
    heavy: FnvHashMap<FactoryId, VecDeque<Task>>,
}

impl Needs {
    fn backlog(&self, class: UnitClass) -> &FnvHashMap<FactoryId, VecDeque<Task>> {
        match class {
            UnitClass::Light => &self.light,
            UnitClass::Heavy => &self.heavy,
        }
    }

    fn backlog_mut(&mut self, class: UnitClass) -> &mut FnvHashMap<FactoryId, VecDeque<Task>> {
        match class {
            UnitClass::Light => &mut self.light,
            UnitClass::Heavy => &mut self.heavy,
        }
    }

    pub fn set(&mut self, factory: FactoryId, class: UnitClass, tasks: Vec<Task>) {
        if tasks.is_empty() {
            self.backlog_mut(class).remove(&factory);
        } else {
            self.backlog_mut(class).insert(factory, tasks.into());
        }
    }

    pub fn has(&self, factory: FactoryId, class: UnitClass) -> bool {
        self.backlog(class).contains_key(&factory)
    }

    pub fn get(&self, factory: FactoryId, class: UnitClass) -> Option<&VecDeque<Task>> {
        self.backlog(class).get(&factory)
    }

    /// Take the next task, from the back when `from_back` is set.
    pub fn pop(&mut self, factory: FactoryId, class: UnitClass, from_back: bool) -> Option<Task> {
        let backlog = self.backlog_mut(class);
        let tasks = backlog.get_mut(&factory)?;
        let task = if from_back {
            tasks.pop_back()
        } else {
            tasks.pop_front()
        };
        if tasks.is_empty() {
            backlog.remove(&factory);
        }
        task
    }
}

/// Strike each in-flight task off the backlog once, first match first.
pub fn subtract_in_flight<'a>(
    mut todo: Vec<Task>,
    in_flight: impl IntoIterator<Item = &'a Task>,
) -> Vec<Task> {
    for task in in_flight {
        if let Some(index) = todo.iter().position(|t| t == task) {
            todo.remove(index);
        }
    }
    todo
}

/// Units of `class` whose nearest facility is `factory`.
pub fn homed_units(snapshot: &Snapshot, factory: FactoryId, class: UnitClass) -> usize {
    snapshot
        .units
        .iter()
        .filter(|u| u.class == class)
        .filter(|u| closest_factory(&snapshot.factories, u.pos).map(|f| f.id) == Some(factory))
        .count()
}

/// Raw light and heavy backlogs for one facility, before in-flight tasks
/// are subtracted.
pub fn define_needs(ctx: &TurnContext, factory: &Factory) -> (Vec<Task>, Vec<Task>) {
    let cfg = &ctx.tuning.needs;
    let board = ctx.board();
    let turn = ctx.turn();
    let opp_strains = &ctx.memory.opp_strains;
    let memory = ctx.memory.factories.get(&factory.id).cloned().unwrap_or_default();
    let (ice, ore) = (memory.ice_tiles, memory.ore_tiles);

    let occupied = ctx.memory.ledger.occupied();
    let (surrounded, free_spaces) =
        lichen_surrounded(board, factory.strain_id, opp_strains, &occupied, cfg);
    let zone = orthogonal_positions(board, factory.pos, 1, ctx.memory.ledger.my_factory_tiles());
    let zone_rubble = total_rubble(board, &zone);
    let lights_homed = homed_units(ctx.snapshot, factory.id, UnitClass::Light);

    trace!(
        "{} {:?} ice {} ore {} free {} zone rubble {}",
        factory.id,
        memory.kind,
        ice,
        ore,
        free_spaces,
        zone_rubble
    );

    let mut light = Vec::new();

    if surrounded || zone_rubble > 0 {
        light.extend(std::iter::repeat(Task::Excavate).take(cfg.light_excavators));
    }

    for resource in [Resource::Ice, Resource::Ore] {
        let available = if resource == Resource::Ice { ice } else { ore };
        let blocked = memory
            .lanes
            .lane(resource.into())
            .map_or(false, |lane| lane.rubble > cfg.blaze_threshold);
        if available > 0 && blocked {
            light.push(Task::Blaze(resource.into()));
        }
    }

    let hemmed_in = memory
        .lanes
        .lane(LaneKind::Open)
        .map_or(false, |lane| lane.rubble > cfg.open_blaze_threshold);
    if hemmed_in && factory.cargo.water >= cfg.open_blaze_min_water {
        light.push(Task::Blaze(LaneKind::Open));
    }

    if factory.cargo.water < cfg.light_water_threshold && ice >= 2 {
        let miners = (ice - 1).min(cfg.max_miners_per_resource);
        light.extend(std::iter::repeat(Task::Mine(Resource::Ice)).take(miners));
    }

    if factory.cargo.metal < cfg.light_metal_threshold && ore >= 1 {
        let miners = (ore - 1).min(cfg.max_miners_per_resource);
        light.extend(std::iter::repeat(Task::Mine(Resource::Ore)).take(miners));
    }

    if lights_homed >= cfg.light_staffed {
        let far_homer = memory
            .homer
            .and_then(|id| ctx.snapshot.unit(id))
            .filter(|homer| homer.pos.distance_to(factory.pos) >= cfg.helper_min_distance);
        if let Some(homer) = far_homer {
            light.push(Task::Help(homer.id));
        }

        if turn >= cfg.attack_start_turn && !opp_strains.is_empty() {
            light.extend(std::iter::repeat(Task::Attack).take(cfg.attackers_per_factory));
        }
    }

    let mut heavy = Vec::new();

    if turn < cfg.early_ore_turn && factory.cargo.water < cfg.early_ore_safe_water && ore > 0 {
        heavy.push(Task::Mine(Resource::Ore));
    }

    if memory.homer.is_none() && ice > 0 {
        heavy.push(Task::Homer);
    }

    if factory.cargo.water < cfg.heavy_water_threshold && ice > 0 {
        heavy.push(Task::Mine(Resource::Ice));
    }

    if memory.icer.is_none() && turn >= cfg.icer_start_turn && ice >= cfg.icer_min_ice {
        heavy.push(Task::Icer);
    }

    if surrounded {
        heavy.push(Task::Excavate);
    }

    if factory.cargo.metal < cfg.heavy_metal_threshold && ore > 0 {
        heavy.push(Task::Mine(Resource::Ore));
    }

    let combat = &ctx.tuning.combat;
    let intruder = ctx
        .snapshot
        .opp_units
        .iter()
        .any(|u| u.pos.distance_to(factory.pos) <= combat.aggro_radius);
    if turn >= combat.aggro_start_turn && intruder {
        heavy.push(Task::Aggro);
    }

    (light, heavy)
}

/// Refresh derived facility state and rebuild every backlog.
pub fn refresh_factories(ctx: &mut TurnContext) {
    let snapshot = ctx.snapshot;
    let board = ctx.board();
    let turn = ctx.turn();
    let centers: Vec<Location> = snapshot
        .factories
        .iter()
        .chain(snapshot.opp_factories.iter())
        .map(|f| f.pos)
        .collect();
    let forbidden = ctx.memory.ledger.opp_factory_tiles().clone();
    let claimed = ctx.memory.ledger.claimed_tiles(UnitClass::Light);
    let grid = ctx.grid();
    let cfg = ctx.tuning.needs.clone();
    let power = ctx.tuning.power.clone();

    for factory in &snapshot.factories {
        let (ice, ore) = nearby_resources(board, factory.pos, &centers, cfg.catchment_radius);
        let memory = ctx.factory_memory(factory.id);
        memory.ice_tiles = ice;
        memory.ore_tiles = ore;
        memory.kind = classify(ice, ore);
        memory.update_low_power(factory.power, &power);

        if memory.lanes.is_due(turn, cfg.lane_refresh_interval) {
            memory.lanes.rebuild(
                &grid,
                board,
                factory.pos,
                &forbidden,
                &claimed,
                cfg.open_lane_min_distance,
                turn,
            );
        } else {
            memory.lanes.recost(board);
        }
    }

    for factory in &snapshot.factories {
        let (light, heavy) = define_needs(ctx, factory);
        let memory = ctx.factory_memory(factory.id);
        let light = subtract_in_flight(light, memory.tasks_light.values());
        let heavy = subtract_in_flight(heavy, memory.tasks_heavy.values());

        debug!("{} needs light {:?} heavy {:?}", factory.id, light, heavy);
        ctx.needs.set(factory.id, UnitClass::Light, light);
        ctx.needs.set(factory.id, UnitClass::Heavy, heavy);
    }
}

/// Hand `unit` its next task: from its own facility if that has a backlog,
/// otherwise from the nearest facility that does. Well staffed facilities
/// give away their least urgent task, thin ones their most urgent.
pub fn next_task(ctx: &mut TurnContext, unit: &Unit, home: &Factory) -> Option<(FactoryId, Task)> {
    let staffed = ctx.tuning.needs.light_staffed;
    let candidates: Vec<FactoryId> = std::iter::once(home.id)
        .chain(
            ctx.snapshot
                .factories
                .iter()
                .filter(|f| f.id != home.id)
                .sorted_by_key(|f| (f.pos.distance_to(unit.pos), f.id))
                .map(|f| f.id),
        )
        .collect();

    for factory in candidates {
        if !ctx.needs.has(factory, unit.class) {
            continue;
        }

        let from_back = ctx
            .memory
            .factories
            .get(&factory)
            .map_or(0, |m| m.staffing())
            >= staffed;

        if let Some(task) = ctx.needs.pop(factory, unit.class, from_back) {
            if factory != home.id {
                trace!("{} borrowed by {} for {:?}", unit.id, factory, task);
            }
            return Some((factory, task));
        }
    }

    None
}
