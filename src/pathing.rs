//! Rubble-weighted shortest paths over the board.
//!
//! Unit paths come from a hand-rolled uniform-cost search because tiles
//! other units have reserved are only avoided while the frontier is still
//! small. Facility lanes are longer lived and use the library search.

use crate::board::*;
use crate::config::PathingConfig;
use crate::constants::*;
use crate::location::*;
use fnv::{FnvHashMap, FnvHashSet};
use pathfinding::prelude::{build_path, dijkstra_all};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Parent map produced by a full search from one origin.
pub type CostField = HashMap<Location, (Location, u32)>;

pub struct CostGrid<'a> {
    rubble: &'a BoardArray<u32>,
    step_cost: u32,
    frontier_limit: usize,
}

impl<'a> CostGrid<'a> {
    pub fn new(rubble: &'a BoardArray<u32>, config: &PathingConfig) -> Self {
        CostGrid {
            rubble,
            step_cost: config.step_cost,
            frontier_limit: config.frontier_exclusion_limit,
        }
    }

    fn enter_cost(&self, loc: Location, goal: Location, threshold: u32) -> u32 {
        let rubble = if loc == goal { 0 } else { self.rubble.at(loc) };
        let rubble = if rubble < threshold { 0 } else { rubble };

        self.step_cost + rubble
    }

    /// Cheapest 4-connected path from `start` to `goal`, both inclusive.
    ///
    /// `forbidden` tiles are never entered. `excluded` tiles are skipped only
    /// while the frontier holds at most `frontier_exclusion_limit` entries,
    /// so they act as soft obstacles near the start and become usable once
    /// the search has spread out. Rubble below `threshold` is ignored and the
    /// goal is always treated as clear. Returns an empty path when the goal
    /// cannot be reached.
    pub fn find_path(
        &self,
        start: Location,
        goal: Location,
        excluded: &FnvHashSet<Location>,
        forbidden: &FnvHashSet<Location>,
        threshold: u32,
    ) -> Vec<Location> {
        if start == goal {
            return vec![start];
        }

        let mut best: FnvHashMap<Location, u32> = FnvHashMap::default();
        let mut parents: FnvHashMap<Location, Location> = FnvHashMap::default();
        let mut visited: FnvHashSet<Location> = FnvHashSet::default();
        let mut frontier = BinaryHeap::new();
        let mut sequence: u32 = 0;

        best.insert(start, 0);
        frontier.push(Reverse((0u32, sequence, start)));

        while let Some(Reverse((cost, _, node))) = frontier.pop() {
            if node == goal {
                return unwind(&parents, start, goal);
            }

            if !visited.insert(node) {
                continue;
            }

            for neighbor in node.cardinal_neighbors() {
                if visited.contains(&neighbor) || forbidden.contains(&neighbor) {
                    continue;
                }

                if frontier.len() <= self.frontier_limit && excluded.contains(&neighbor) {
                    continue;
                }

                let next_cost = cost + self.enter_cost(neighbor, goal, threshold);
                if best.get(&neighbor).map_or(true, |&known| next_cost < known) {
                    best.insert(neighbor, next_cost);
                    parents.insert(neighbor, node);
                    sequence += 1;
                    frontier.push(Reverse((next_cost, sequence, neighbor)));
                }
            }
        }

        Vec::new()
    }

    /// Full search from `origin` over every reachable tile.
    pub fn cost_field(&self, origin: Location, forbidden: &FnvHashSet<Location>) -> CostField {
        let step_cost = self.step_cost;
        let rubble = self.rubble;

        dijkstra_all(&origin, |node: &Location| {
            node.cardinal_neighbors()
                .filter(|n| !forbidden.contains(n))
                .map(|n| (n, step_cost + rubble.at(n)))
                .collect::<Vec<_>>()
        })
    }
}

fn unwind(
    parents: &FnvHashMap<Location, Location>,
    start: Location,
    goal: Location,
) -> Vec<Location> {
    let mut path = vec![goal];
    let mut node = goal;

    while node != start {
        match parents.get(&node) {
            Some(&parent) => {
                path.push(parent);
                node = parent;
            }
            None => return Vec::new(),
        }
    }

    path.reverse();
    path
}

/// Path from the field's origin to `target`, empty if `target` was never reached.
pub fn lane_path(field: &CostField, origin: Location, target: Location) -> Vec<Location> {
    if target != origin && !field.contains_key(&target) {
        return Vec::new();
    }

    build_path(&target, field)
}

/// Power a unit of `class` pays to walk `path`. The first tile is where the
/// unit already stands and costs nothing.
pub fn path_cost(class: UnitClass, path: &[Location], rubble: &BoardArray<u32>) -> u32 {
    path.iter()
        .skip(1)
        .map(|&loc| class.step_cost(rubble.at(loc)))
        .sum()
}

/// Rubble still lying on a path, excluding the tile it starts from.
pub fn path_rubble(path: &[Location], rubble: &BoardArray<u32>) -> u32 {
    path.iter().skip(1).map(|&loc| rubble.at(loc)).sum()
}
