//! Per-unit decision tree.
//!
//! Each unit, in turn order, resolves the facility it serves, drops a plan
//! that would collide or dig a tile that changed hands, answers emergencies
//! and threats, and finally either keeps its current queue or asks the
//! needs backlog for new work. Every path ends in exactly one `commit` or
//! `keep`, so each unit holds exactly one reservation for the next turn.

use crate::action::*;
use crate::board::*;
use crate::constants::*;
use crate::context::*;
use crate::evasion::*;
use crate::geometry::*;
use crate::location::*;
use crate::needs::*;
use crate::queue::*;
use crate::snapshot::*;
use log::*;

/// Turns an idle unit waits before it is considered again.
pub const IDLE_WAIT_TURNS: u32 = 2;

/// Backlog tasks a unit may try in one turn before settling for less.
const MAX_TASK_ATTEMPTS: usize = 3;

/// Facility `unit` works for this turn.
///
/// Specialists stay with the facility they are bound to. Anyone else serves
/// the nearest facility, unless it is the closest free heavy to a facility
/// with no heavy of its own, and in any case the facility it already has a
/// task in flight for wins.
pub fn resolve_factory<'a>(ctx: &TurnContext<'a>, unit: &Unit) -> Option<&'a Factory> {
    let snapshot = ctx.snapshot;

    if let Some(factory) = ctx
        .memory
        .specialist_factory(unit.id)
        .and_then(|id| snapshot.factory(id))
    {
        return Some(factory);
    }

    let mut serving = closest_factory(&snapshot.factories, unit.pos)?;

    if unit.is_heavy() {
        let free_heavies: Vec<&Unit> = snapshot
            .heavies()
            .filter(|u| ctx.memory.specialist_factory(u.id).is_none())
            .collect();

        let understaffed = snapshot
            .factories
            .iter()
            .filter(|f| homed_units(snapshot, f.id, UnitClass::Heavy) == 0)
            .filter(|f| {
                free_heavies
                    .iter()
                    .min_by_key(|u| (u.pos.distance_to(f.pos), u.id))
                    .map(|u| u.id)
                    == Some(unit.id)
            })
            .min_by_key(|f| (f.pos.distance_to(unit.pos), f.id));

        if let Some(factory) = understaffed {
            trace!("{} covering heavyless {}", unit.id, factory.id);
            serving = factory;
        }
    }

    if let Some(factory) = ctx
        .memory
        .task_factory(unit.id)
        .and_then(|id| snapshot.factory(id))
    {
        serving = factory;
    }

    Some(serving)
}

/// Drop the unit's plan and claims when its next tile is already taken.
/// Units parked on low battery cannot move anyway and keep theirs.
fn avoid_collision(ctx: &mut TurnContext, unit: &Unit) {
    if ctx.memory.state(unit.id) == UnitState::LowBattery {
        return;
    }

    let next = match ctx.memory.queues.get(&unit.id) {
        Some(queue) if !queue.is_empty() => queue.next_position(unit.pos),
        _ => return,
    };

    if ctx.memory.ledger.is_reserved_by_other(next, unit.id) {
        debug!("{} would collide at {:?}, dropping its plan", unit.id, next);
        ctx.memory.queues.remove(&unit.id);
        ctx.memory.ledger.release_target(unit.class, unit.id);
        ctx.memory.ledger.release_attack(unit.id);
    }
}

/// The attack queue with every dig on a tile no longer held by an opponent
/// strain removed, or `None` when every dig is still good.
pub fn validate_attack_queue(
    queue: &ActionQueue,
    pos: Location,
    board: &Board,
    opp_strains: &[i32],
) -> Option<ActionQueue> {
    let mut kept = ActionQueue::new();
    let mut stale = false;

    for (tile, action) in queue.positions(pos) {
        let still_theirs = board
            .strain_at(tile)
            .map_or(false, |strain| opp_strains.contains(&strain));
        if action.is_dig() && !still_theirs {
            stale = true;
            continue;
        }
        kept.push(action);
    }

    if stale {
        Some(kept)
    } else {
        None
    }
}

fn check_attack_queue(ctx: &mut TurnContext, unit: &Unit) {
    if ctx.memory.state(unit.id) != UnitState::Attacking {
        return;
    }
    let board = ctx.board();
    let fixed = match ctx.memory.queues.get(&unit.id) {
        Some(queue) => validate_attack_queue(queue, unit.pos, board, &ctx.memory.opp_strains),
        None => return,
    };
    let fixed = match fixed {
        Some(queue) => queue,
        None => return,
    };

    debug!("{} dropping digs on tiles that changed hands", unit.id);
    let opp_strains = ctx.memory.opp_strains.clone();
    if let Some(tiles) = ctx.memory.ledger.attack_tiles_mut(unit.id) {
        tiles.retain(|&tile| {
            board
                .strain_at(tile)
                .map_or(false, |strain| opp_strains.contains(&strain))
        });
    }

    if fixed.is_empty() {
        ctx.memory.queues.remove(&unit.id);
    } else {
        ctx.memory.queues.insert(unit.id, fixed);
    }
}

/// A facility about to run dry gets the ice a unit is carrying right away.
fn emergency_delivery<'a>(
    ctx: &mut TurnContext<'a>,
    unit: &'a Unit,
    home: &'a Factory,
) -> Option<ActionQueue> {
    let cfg = &ctx.tuning.needs;
    if home.cargo.water >= cfg.emergency_water || unit.cargo.ice < cfg.emergency_ice(unit.class) {
        return None;
    }
    if ctx.memory.state(unit.id) == UnitState::Transferring {
        return None;
    }

    let mut builder = QueueBuilder::new(ctx, unit, home);
    match builder.build_delivery_queue(Resource::Ice) {
        Ok(queue) => {
            debug!("{} rushing {} ice to {}", unit.id, unit.cargo.ice, home.id);
            Some(queue)
        }
        Err(reason) => {
            trace!("{} cannot deliver to {}: {}", unit.id, home.id, reason);
            None
        }
    }
}

fn run_task(builder: &mut QueueBuilder, task: Task) -> BuildResult {
    match task {
        Task::Mine(resource) => builder.build_mining_queue(MiningTarget::Resource(resource), task),
        Task::Homer | Task::Icer => {
            builder.build_mining_queue(MiningTarget::Resource(Resource::Ice), task)
        }
        Task::Excavate => {
            let tile = builder.excavation_target().ok_or(Infeasible::NoTarget)?;
            builder.build_mining_queue(MiningTarget::Rubble(tile), task)
        }
        Task::Blaze(lane) => {
            let tile = builder.blaze_target(lane).ok_or(Infeasible::NoTarget)?;
            builder.build_mining_queue(MiningTarget::Rubble(tile), task)
        }
        Task::Help(homer) => builder.build_helper_queue(homer),
        Task::Recharge => builder.build_recharge_queue(None),
        Task::Attack => builder.build_attack_queue(),
        Task::Aggro => builder.build_aggro_queue(),
    }
}

fn bind_specialist(ctx: &mut TurnContext, unit: &Unit, factory: FactoryId, task: Task) {
    let memory = ctx.factory_memory(factory);
    match task {
        Task::Homer if memory.homer != Some(unit.id) => {
            debug!("{} is now homer for {}", unit.id, factory);
            memory.homer = Some(unit.id);
        }
        Task::Icer if memory.icer != Some(unit.id) => {
            debug!("{} is now icer for {}", unit.id, factory);
            memory.icer = Some(unit.id);
        }
        _ => {}
    }
}

fn try_task<'a>(
    ctx: &mut TurnContext<'a>,
    unit: &'a Unit,
    factory: &'a Factory,
    task: Task,
) -> Option<ActionQueue> {
    let result = run_task(&mut QueueBuilder::new(ctx, unit, factory), task);
    match result {
        Ok(queue) => {
            trace!("{} took {:?} for {}", unit.id, task, factory.id);
            ctx.serving.insert(unit.id, factory.id);
            bind_specialist(ctx, unit, factory.id, task);
            Some(queue)
        }
        Err(reason) => {
            trace!("{} cannot {:?} for {}: {}", unit.id, task, factory.id, reason);
            None
        }
    }
}

/// Task the unit should pick back up before asking for new work: its
/// specialist role, or the task it is halfway through.
fn standing_task<'a>(ctx: &TurnContext<'a>, unit: &Unit) -> Option<(&'a Factory, Task)> {
    let snapshot = ctx.snapshot;

    if let Some(id) = ctx.memory.specialist_factory(unit.id) {
        let memory = ctx.memory.factories.get(&id)?;
        let task = if memory.homer == Some(unit.id) {
            Task::Homer
        } else {
            Task::Icer
        };
        return snapshot.factory(id).map(|f| (f, task));
    }

    if !ctx.memory.state(unit.id).is_continuing() {
        return None;
    }

    let id = ctx.memory.task_factory(unit.id)?;
    let task = *ctx.memory.factories.get(&id)?.tasks(unit.class).get(&unit.id)?;
    snapshot.factory(id).map(|f| (f, task))
}

/// New plan for an idle unit, trying in order: its standing task, a few
/// backlog tasks, the class default, solar duty, and finally a short wait.
fn plan<'a>(ctx: &mut TurnContext<'a>, unit: &'a Unit, home: &'a Factory) -> ActionQueue {
    if let Some((factory, task)) = standing_task(ctx, unit) {
        if let Some(queue) = try_task(ctx, unit, factory, task) {
            return queue;
        }
    }

    for _ in 0..MAX_TASK_ATTEMPTS {
        let (id, task) = match next_task(ctx, unit, home) {
            Some(next) => next,
            None => break,
        };
        let factory = match ctx.snapshot.factory(id) {
            Some(factory) => factory,
            None => continue,
        };
        if let Some(queue) = try_task(ctx, unit, factory, task) {
            return queue;
        }
    }

    if unit.is_heavy() {
        if let Some(queue) = try_task(ctx, unit, home, Task::Mine(Resource::Ice)) {
            return queue;
        }
    }

    let mut builder = QueueBuilder::new(ctx, unit, home);
    match builder.build_solar_queue() {
        Ok(queue) => queue,
        Err(reason) => {
            trace!("{} has nothing to do ({}), waiting", unit.id, reason);
            builder.build_waiting_queue(IDLE_WAIT_TURNS)
        }
    }
}

/// Decide `unit`'s queue for this turn.
pub fn dispatch_unit<'a>(ctx: &mut TurnContext<'a>, unit: &'a Unit) {
    let home = match resolve_factory(ctx, unit) {
        Some(factory) => factory,
        None => {
            ctx.keep(unit);
            return;
        }
    };
    ctx.serving.insert(unit.id, home.id);

    avoid_collision(ctx, unit);
    check_attack_queue(ctx, unit);

    if let Some(queue) = emergency_delivery(ctx, unit, home) {
        ctx.commit(unit, queue);
        return;
    }

    if let EvasionOutcome::Evade(queue) = evasion_check(ctx, unit, home) {
        ctx.commit(unit, queue);
        return;
    }

    let state = ctx.memory.state(unit.id);
    let recharging = matches!(
        state,
        UnitState::Recharging | UnitState::LowBattery | UnitState::EvasionRecharge
    );
    if !recharging {
        let mut builder = QueueBuilder::new(ctx, unit, home);
        if builder.need_recharge() {
            builder.clear_dibs();
            match builder.build_recharge_queue(None) {
                Ok(queue) => {
                    trace!("{} heading home to recharge", unit.id);
                    ctx.commit(unit, queue);
                    return;
                }
                Err(reason) => trace!("{} cannot recharge: {}", unit.id, reason),
            }
        }
    }

    let idle = ctx
        .memory
        .queues
        .get(&unit.id)
        .map_or(true, |queue| queue.is_empty());

    if idle || ctx.memory.state(unit.id).is_soft() {
        let queue = plan(ctx, unit, home);
        if ctx.memory.queues.get(&unit.id) == Some(&queue) {
            ctx.keep(unit);
        } else {
            ctx.commit(unit, queue);
        }
    } else {
        ctx.keep(unit);
    }
}
