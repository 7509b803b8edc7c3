//! Shortest paths over implicit graphs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::collections::HashMap;

#[derive(Clone, Copy, Debug)]
struct Frontier {
    cost: f64,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the cheapest node; ties prefer the higher
    // node, which has made more progress.
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost).then_with(|| self.node.cmp(&other.node))
    }
}

/// Dijkstra from `start` to `goal` over the graph described by `neighbors`,
/// which yields `(node, edge_cost)` pairs. Edge costs must be non-negative.
///
/// Returns the node sequence of a cheapest path, including both endpoints, or
/// `None` if `goal` is unreachable.
pub fn shortest_path<F, I>(start: usize, goal: usize, mut neighbors: F) -> Option<Vec<usize>>
where
    F: FnMut(usize) -> I,
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut best: HashMap<usize, f64> = HashMap::default();
    let mut prev: HashMap<usize, usize> = HashMap::default();
    let mut heap = BinaryHeap::new();

    best.insert(start, 0.0);
    heap.push(Frontier { cost: 0.0, node: start });

    while let Some(Frontier { cost, node }) = heap.pop() {
        if node == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while let Some(&p) = prev.get(&cur) {
                path.push(p);
                cur = p;
            }
            path.reverse();
            return Some(path);
        }
        if best.get(&node).is_some_and(|&b| cost > b) {
            continue;
        }
        for (next, edge) in neighbors(node) {
            let candidate = cost + edge;
            if best.get(&next).is_none_or(|&b| candidate < b) {
                best.insert(next, candidate);
                prev.insert(next, node);
                heap.push(Frontier { cost: candidate, node: next });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn prefers_cheaper_detour() {
        // 0 -> 3 directly costs 10, via 1 and 2 it costs 3.
        let edges = |n: usize| -> Vec<(usize, f64)> {
            match n {
                0 => vec![(1, 1.0), (3, 10.0)],
                1 => vec![(2, 1.0)],
                2 => vec![(3, 1.0)],
                _ => vec![],
            }
        };
        assert_eq!(shortest_path(0, 3, edges), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn unreachable_goal() {
        assert_eq!(shortest_path(0, 5, |n| if n < 2 { vec![(n + 1, 1.0)] } else { vec![] }), None);
    }

    #[test]
    fn start_is_goal() {
        assert_eq!(shortest_path(4, 4, |_| Vec::new()), Some(vec![4]));
    }
}
