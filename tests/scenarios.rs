mod common;

use common::*;
use lux_dispatch::action::*;
use lux_dispatch::board::*;
use lux_dispatch::constants::*;
use lux_dispatch::context::*;
use lux_dispatch::dispatch::validate_attack_queue;
use lux_dispatch::location::*;
use lux_dispatch::needs::Task;
use lux_dispatch::queue::*;
use lux_dispatch::snapshot::*;
use lux_dispatch::*;
use std::collections::HashSet;

#[test]
fn light_walks_to_ice_and_fills_its_cargo() {
    let mut board = Board::empty();
    board.flags.set_at(loc(5, 8), TileFlags::ICE);
    let mut snap = snapshot(10, board);
    snap.factories.push(factory(0, loc(5, 0), 1000, 500, 0));
    snap.units.push(unit(1, UnitClass::Light, loc(5, 5), 150));

    let tuning = Tuning::builtin();
    let mut memory = Memory::default();
    let mut ctx = TurnContext::begin(&snap, &tuning, &mut memory);
    let mut builder = QueueBuilder::new(&mut ctx, &snap.units[0], &snap.factories[0]);

    let queue = builder
        .build_mining_queue(MiningTarget::Resource(Resource::Ice), Task::Mine(Resource::Ice))
        .unwrap();
    assert_eq!(
        queue.actions(),
        &[
            Action::new(ActionKind::Move(Direction::Down), 3),
            Action::dig(25)
        ]
    );
}

#[test]
fn stranded_heavy_waits_exactly_long_enough() {
    let mut board = Board::empty();
    for y in 13..20 {
        board.rubble.set_at(loc(10, y), 100);
    }
    let mut snap = snapshot(20, board);
    snap.factories.push(factory(0, loc(10, 10), 1000, 500, 0));
    snap.units.push(unit(1, UnitClass::Heavy, loc(10, 20), 100));

    let tuning = Tuning::builtin();
    let mut memory = Memory::default();
    let mut ctx = TurnContext::begin(&snap, &tuning, &mut memory);
    let heavy = &snap.units[0];
    let mut builder = QueueBuilder::new(&mut ctx, heavy, &snap.factories[0]);

    let home = builder.return_tile(heavy.pos);
    let path = builder.path_to(heavy.pos, home, None);
    let deficit = builder.path_cost(&path) - heavy.power;

    let queue = builder.build_recharge_queue(None).unwrap();
    assert_eq!(ctx.memory.state(heavy.id), UnitState::LowBattery);
    assert_eq!(queue.len(), 1);

    let wait = queue.actions()[0];
    assert_eq!(wait.movement(), Direction::Center);

    let charge = UnitClass::Heavy.charge();
    let gained = |turns: u32| (20..20 + turns).filter(|&t| is_day(t)).count() as u32 * charge;
    assert!(gained(wait.n) >= deficit);
    assert!(gained(wait.n - 1) < deficit);
}

#[test]
fn second_light_takes_the_next_ore_tile() {
    let mut board = Board::empty();
    board.flags.set_at(loc(10, 15), TileFlags::ORE);
    board.flags.set_at(loc(10, 18), TileFlags::ORE);
    let mut snap = snapshot(10, board);
    snap.factories.push(factory(0, loc(10, 10), 1000, 500, 0));
    snap.units.push(unit(1, UnitClass::Light, loc(10, 13), 150));
    snap.units.push(unit(2, UnitClass::Light, loc(11, 13), 150));

    let tuning = Tuning::builtin();
    let mut memory = Memory::default();
    let mut ctx = TurnContext::begin(&snap, &tuning, &mut memory);
    let target = MiningTarget::Resource(Resource::Ore);
    let task = Task::Mine(Resource::Ore);

    for light in &snap.units {
        let mut builder = QueueBuilder::new(&mut ctx, light, &snap.factories[0]);
        builder.build_mining_queue(target, task).unwrap();
    }

    let ledger = &ctx.memory.ledger;
    assert_eq!(ledger.target_of(UnitClass::Light, UnitId(1)), Some(loc(10, 15)));
    assert_eq!(ledger.target_of(UnitClass::Light, UnitId(2)), Some(loc(10, 18)));
}

#[test]
fn dig_on_lost_lichen_is_dropped() {
    let mut board = Board::empty();
    grow_lichen(&mut board, 3, [loc(20, 10)]);
    let mut queue = ActionQueue::new();
    queue.push(Action::move_to(Direction::Right));
    queue.push(Action::dig(2));

    assert_eq!(validate_attack_queue(&queue, loc(19, 10), &board, &[3]), None);

    grow_lichen(&mut board, 0, [loc(20, 10)]);
    let fixed = validate_attack_queue(&queue, loc(19, 10), &board, &[3]).unwrap();
    assert_eq!(fixed.actions(), &[Action::move_to(Direction::Right)]);
}

fn busy_world() -> Snapshot {
    let mut board = Board::empty();
    for tile in [loc(10, 15), loc(11, 16), loc(30, 35), loc(31, 36)] {
        board.flags.set_at(tile, TileFlags::ICE);
    }
    for tile in [loc(15, 10), loc(35, 30)] {
        board.flags.set_at(tile, TileFlags::ORE);
    }
    for (x, y) in [(12, 14), (13, 14), (28, 33), (20, 20), (14, 9)] {
        board.rubble.set_at(loc(x, y), 30);
    }
    grow_lichen(&mut board, 2, (37..44).map(|x| loc(x, 14)));
    grow_lichen(&mut board, 0, (8..13).map(|x| loc(x, 7)));

    let mut snap = snapshot(140, board);
    snap.factories.push(factory(0, loc(10, 10), 2000, 300, 0));
    snap.factories.push(factory(1, loc(30, 30), 2000, 300, 0));
    snap.opp_factories.push(factory(2, loc(40, 10), 2000, 300, 0));
    snap.units.push(unit(1, UnitClass::Heavy, loc(10, 12), 1500));
    snap.units.push(unit(2, UnitClass::Heavy, loc(30, 32), 1500));
    snap.units.push(unit(3, UnitClass::Light, loc(12, 12), 150));
    snap.units.push(unit(4, UnitClass::Light, loc(13, 13), 150));
    snap.units.push(unit(5, UnitClass::Light, loc(28, 28), 150));
    snap.units.push(unit(6, UnitClass::Light, loc(32, 27), 150));
    snap.units.push(unit(7, UnitClass::Light, loc(12, 6), 150));
    snap.opp_units.push(unit(100, UnitClass::Heavy, loc(44, 20), 1000));
    snap
}

/// Power a plan burns on moves and digs before its first pickup.
fn planned_spend(queue: &ActionQueue, unit: &Unit, board: &Board) -> u32 {
    let mut pos = unit.pos;
    let mut spent = 0;

    for action in queue.actions() {
        match action.kind {
            ActionKind::Move(Direction::Center) | ActionKind::Transfer { .. } => {}
            ActionKind::Move(direction) => {
                for _ in 0..action.n {
                    pos = pos.step_or_stay(direction);
                    spent += unit.class.step_cost(board.rubble.at(pos));
                }
            }
            ActionKind::Dig => spent += action.n * unit.class.dig_cost(),
            ActionKind::Pickup { .. } => break,
        }
    }

    spent
}

#[test]
fn plans_never_collide_claims_stay_unique_and_budgets_hold() {
    let mut snap = busy_world();
    let mut agent = Agent::default();

    for _ in 0..15 {
        let actions = agent.act(&snap);

        for (id, action) in &actions {
            if let EntityActions::Unit(queue) = action {
                assert!(queue.len() <= MAX_QUEUE_LENGTH, "{} queue too long", id);

                let unit = snap.units.iter().find(|u| u.id.to_string() == *id).unwrap();
                if queue.actions().iter().any(|a| a.is_dig()) {
                    let reserve = agent.tuning.reserve.adjacent(unit.class);
                    let spent = planned_spend(queue, unit, &snap.board);
                    assert!(spent + reserve <= unit.power, "{} overspends: {}", id, spent);
                }
            }
        }

        let mut next_tiles = HashSet::new();
        for u in &snap.units {
            let queue = agent.memory.queues.get(&u.id);
            assert!(queue.map_or(false, |q| !q.is_empty()), "{} left idle", u.id);
            let next = queue.map_or(u.pos, |q| q.next_position(u.pos));
            assert!(next_tiles.insert(next), "{} collides at {:?}", u.id, next);
        }

        for class in [UnitClass::Light, UnitClass::Heavy] {
            let mut claimed = HashSet::new();
            for u in &snap.units {
                if let Some(tile) = agent.memory.ledger.target_of(class, u.id) {
                    assert!(claimed.insert(tile), "{:?} claimed twice", tile);
                }
            }
        }

        for u in snap.units.iter_mut() {
            if let Some(queue) = agent.memory.queues.get(&u.id) {
                u.pos = queue.next_position(u.pos);
            }
        }
        snap.turn += 1;
    }
}

#[test]
fn turn_output_serializes_to_the_wire_format() {
    let mut board = Board::empty();
    board.flags.set_at(loc(10, 14), TileFlags::ICE);
    let mut snap = snapshot(1, board);
    snap.factories.push(factory(0, loc(10, 10), 1000, 500, 0));
    snap.units.push(unit(1, UnitClass::Heavy, loc(10, 12), 1000));

    let mut agent = Agent::default();
    let actions = agent.act(&snap);
    let json = serde_json::to_value(&actions).unwrap();

    assert_eq!(json["factory_0"], serde_json::json!(2));
    assert_eq!(json["unit_1"][0], serde_json::json!([0, 3, 0, 0, 0, 2]));
    assert_eq!(json["unit_1"][1][0], serde_json::json!(3));
}
