// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural checks over a graph of kernel indices.
//!
//! Kernels are numbered by registration order and edges are `(producer,
//! consumer)` index pairs. Three passes run at `create()` time:
//!
//! 1. **Connectivity**: union-find over the undirected edge set. Every kernel
//!    must end up in one component.
//! 2. **Acyclicity**: three-colour DFS that reports the first cycle it finds
//!    as a closed path (`a -> b -> a`).
//! 3. **Ordering**: Kahn's algorithm with a min-heap of ready indices, so that
//!    among kernels whose dependencies are met the earliest registered runs
//!    first.
//!
//! All three are O(V + E) (plus a log factor for the heap).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Forward adjacency lists, deduplicated.
pub(super) fn adjacency(count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); count];
    for &(from, to) in edges {
        if !adjacency[from].contains(&to) {
            adjacency[from].push(to);
        }
    }
    adjacency
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(count: usize) -> Self {
        Self {
            parent: (0..count).collect(),
            rank: vec![0; count],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Weakly-connected components, each listed in registration order and
/// ordered by their earliest member.
pub(super) fn connected_components(count: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut set = DisjointSet::new(count);
    for &(from, to) in edges {
        set.union(from, to);
    }

    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut root_slot: Vec<Option<usize>> = vec![None; count];
    for node in 0..count {
        let root = set.find(node);
        match root_slot[root] {
            Some(slot) => components[slot].push(node),
            None => {
                root_slot[root] = Some(components.len());
                components.push(vec![node]);
            }
        }
    }
    components
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// First cycle found, as a closed path of indices, or `None` if acyclic.
pub(super) fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut colour = vec![Colour::White; adjacency.len()];
    let mut path = Vec::new();
    for start in 0..adjacency.len() {
        if colour[start] == Colour::White {
            if let Some(cycle) = visit(start, adjacency, &mut colour, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    adjacency: &[Vec<usize>],
    colour: &mut [Colour],
    path: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    colour[node] = Colour::Grey;
    path.push(node);

    for &next in &adjacency[node] {
        match colour[next] {
            Colour::White => {
                if let Some(cycle) = visit(next, adjacency, colour, path) {
                    return Some(cycle);
                }
            }
            Colour::Grey => {
                let start = path.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Colour::Black => {}
        }
    }

    colour[node] = Colour::Black;
    path.pop();
    None
}

/// Topological order with registration-order tie-break, or `None` if the
/// graph has a cycle.
pub(super) fn topological_order(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut in_degree = vec![0usize; adjacency.len()];
    for targets in adjacency {
        for &to in targets {
            in_degree[to] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(node, _)| Reverse(node))
        .collect();

    let mut order = Vec::with_capacity(adjacency.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &adjacency[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() == adjacency.len() {
        Some(order)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_component() {
        let edges = [(0, 1), (2, 1), (2, 3)];
        assert_eq!(connected_components(4, &edges), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_two_pairs_are_two_components() {
        let edges = [(0, 1), (2, 3)];
        assert_eq!(
            connected_components(4, &edges),
            vec![vec![0, 1], vec![2, 3]]
        );
    }

    #[test]
    fn test_isolated_kernels() {
        assert_eq!(connected_components(2, &[]), vec![vec![0], vec![1]]);
        assert_eq!(connected_components(1, &[]), vec![vec![0]]);
    }

    #[test]
    fn test_simple_cycle() {
        let adj = adjacency(2, &[(0, 1), (1, 0)]);
        assert_eq!(find_cycle(&adj), Some(vec![0, 1, 0]));
        assert_eq!(topological_order(&adj), None);
    }

    #[test]
    fn test_self_loop() {
        let adj = adjacency(1, &[(0, 0)]);
        assert_eq!(find_cycle(&adj), Some(vec![0, 0]));
    }

    #[test]
    fn test_cycle_reported_from_entry_point() {
        // 0 -> 1 -> 2 -> 3 -> 1
        let adj = adjacency(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        assert_eq!(find_cycle(&adj), Some(vec![1, 2, 3, 1]));
    }

    #[test]
    fn test_diamond_is_acyclic() {
        let adj = adjacency(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert_eq!(find_cycle(&adj), None);
        assert_eq!(topological_order(&adj), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_ties_broken_by_registration_order() {
        // 3 and 1 are both roots; 1 was registered first.
        let adj = adjacency(4, &[(3, 0), (1, 2), (2, 0)]);
        assert_eq!(topological_order(&adj), Some(vec![1, 2, 3, 0]));

        // Registration order never overrides an edge.
        let adj = adjacency(3, &[(2, 0), (2, 1)]);
        assert_eq!(topological_order(&adj), Some(vec![2, 0, 1]));
    }

    #[test]
    fn test_duplicate_edges_collapsed() {
        let adj = adjacency(2, &[(0, 1), (0, 1)]);
        assert_eq!(adj[0], vec![1]);
        assert_eq!(topological_order(&adj), Some(vec![0, 1]));
    }
}
