use std::time::Duration;
use std::time::Instant;

use derive_more::Display;
use human_duration::human_duration;
use num_traits::Zero;
use rustc_hash::FxHashMap;

use crate::data_structures::indexed_heap::IndexedMinHeap;
use crate::float_cost::FloatCost;
use crate::space::AStarGraph;
use crate::space::Vertex;
use crate::space::WeightedEdge;

/// How a solve ended.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash)]
pub enum SolverOutcome {
    /// A least-cost path to the goal was found.
    #[display("SOLVED")]
    Solved,
    /// The open list ran out before reaching the goal.
    #[display("UNSOLVABLE")]
    Unsolvable,
    /// The time budget ran out first.
    #[display("TIMEOUT")]
    Timeout,
}

/// One-shot A* search between two vertices.
///
/// The search runs to completion in [`AStarSolver::new`]; the accessors only
/// report its result.
#[derive(Clone, Debug)]
pub struct AStarSolver<V>
where
    V: Vertex,
{
    outcome: SolverOutcome,
    solution: Vec<V>,
    solution_weight: f64,
    num_states_explored: usize,
    exploration_time: Duration,
}

impl<V> AStarSolver<V>
where
    V: Vertex,
{
    #[must_use]
    pub fn new<G>(graph: &G, start: V, end: V, timeout: Duration) -> Self
    where
        G: AStarGraph<V> + ?Sized,
    {
        log::debug!("A* {start:?} -> {end:?} (timeout {})", human_duration(&timeout));

        let mut search = AStarSearch::new(graph, start, end);
        let outcome = search.run(timeout);
        let exploration_time = search.clock.elapsed();

        let (solution, solution_weight) = match outcome {
            SolverOutcome::Solved => search.path(),
            SolverOutcome::Unsolvable | SolverOutcome::Timeout => (vec![], 0.0),
        };

        let solver = Self {
            outcome,
            solution,
            solution_weight,
            num_states_explored: search.num_states_explored,
            exploration_time,
        };
        log::debug!("A* finished: {solver}");
        solver
    }

    #[inline(always)]
    pub fn outcome(&self) -> SolverOutcome {
        self.outcome
    }
    /// Vertices from start to goal, both included. Empty unless solved.
    #[inline(always)]
    pub fn solution(&self) -> &[V] {
        &self.solution
    }
    #[inline(always)]
    pub fn into_solution(self) -> Vec<V> {
        self.solution
    }
    /// Total weight of the solution. Zero unless solved.
    #[inline(always)]
    pub fn solution_weight(&self) -> f64 {
        self.solution_weight
    }
    /// Number of vertices popped from the open list.
    #[inline(always)]
    pub fn num_states_explored(&self) -> usize {
        self.num_states_explored
    }
    #[inline(always)]
    pub fn exploration_time(&self) -> Duration {
        self.exploration_time
    }
}

impl<V> std::fmt::Display for AStarSolver<V>
where
    V: Vertex,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}(weight={}, |path|={}, explored={}, in {})",
            self.outcome,
            self.solution_weight,
            self.solution.len(),
            self.num_states_explored,
            human_duration(&self.exploration_time),
        )
    }
}

/// Bookkeeping for a single solve.
struct AStarSearch<'g, G, V>
where
    G: AStarGraph<V> + ?Sized,
    V: Vertex,
{
    graph: &'g G,
    start: V,
    goal: V,

    /// Open list ranked by `g + h`.
    fringe: IndexedMinHeap<V>,
    /// Best known distance from the start.
    distances: FxHashMap<V, FloatCost<f64>>,
    /// Predecessor on the best known path. The start has none.
    edge_to: FxHashMap<V, V>,

    num_states_explored: usize,
    clock: Instant,
}

impl<'g, G, V> AStarSearch<'g, G, V>
where
    G: AStarGraph<V> + ?Sized,
    V: Vertex,
{
    fn new(graph: &'g G, start: V, goal: V) -> Self {
        let mut search = Self {
            graph,
            start: start.clone(),
            goal,
            fringe: IndexedMinHeap::with_capacity(1024),
            distances: FxHashMap::default(),
            edge_to: FxHashMap::default(),
            num_states_explored: 0,
            clock: Instant::now(),
        };

        let h = search.graph.estimated_distance_to_goal(&start, &search.goal);
        search.distances.insert(start.clone(), FloatCost::zero());
        let pushed = search.fringe.insert(start, h);
        debug_assert!(pushed.is_ok());
        search
    }

    fn run(&mut self, timeout: Duration) -> SolverOutcome {
        loop {
            let Some(best) = self.fringe.peek() else {
                return SolverOutcome::Unsolvable;
            };
            if self.clock.elapsed() >= timeout {
                return SolverOutcome::Timeout;
            }
            // Goal-check on peek so the goal never gets expanded.
            if *best == self.goal {
                return SolverOutcome::Solved;
            }

            let Some(current) = self.fringe.pop() else {
                return SolverOutcome::Unsolvable;
            };
            self.num_states_explored += 1;
            log::trace!("Expanding {current:?}");

            for edge in self.graph.neighbors(&current) {
                self.relax(edge);
            }
        }
    }

    fn relax(&mut self, edge: WeightedEdge<V>) {
        let Some(&g) = self.distances.get(&edge.from) else {
            debug_assert!(false, "Relaxing {edge} from an unreached vertex");
            return;
        };
        let candidate = g + FloatCost::new(edge.weight);

        if let Some(&known) = self.distances.get(&edge.to) {
            if candidate >= known {
                return;
            }
        }

        let h = FloatCost::new(self.graph.estimated_distance_to_goal(&edge.to, &self.goal));
        let priority = (candidate + h).get();
        log::trace!("Reached {:?} at {candidate}", edge.to);
        self.distances.insert(edge.to.clone(), candidate);
        let updated = if self.fringe.contains(&edge.to) {
            self.fringe.change_priority(&edge.to, priority)
        } else {
            self.fringe.insert(edge.to.clone(), priority)
        };
        debug_assert!(updated.is_ok());
        self.edge_to.insert(edge.to, edge.from);
    }

    /// Walks predecessors back from the goal.
    fn path(&self) -> (Vec<V>, f64) {
        let weight = self.distances.get(&self.goal).map_or(0.0, FloatCost::get);

        let mut path = vec![self.goal.clone()];
        let mut current = &self.goal;
        while *current != self.start {
            match self.edge_to.get(current) {
                Some(previous) => {
                    debug_assert!(previous != current);
                    path.push(previous.clone());
                    current = previous;
                }
                None => {
                    debug_assert!(false, "Broken predecessor chain at {current:?}");
                    break;
                }
            }
        }
        path.reverse();
        (path, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    use ordered_float::OrderedFloat;
    use rand::Rng;
    use rand_chacha::ChaCha8Rng;
    use rand_chacha::rand_core::SeedableRng;

    /// Explicit graph with a zero heuristic unless positions are given.
    #[derive(Debug, Default)]
    struct TestGraph {
        edges: FxHashMap<u32, Vec<WeightedEdge<u32>>>,
        positions: FxHashMap<u32, (f64, f64)>,
    }

    impl TestGraph {
        fn add_edge(&mut self, from: u32, to: u32, weight: f64) {
            self.edges
                .entry(from)
                .or_default()
                .push(WeightedEdge::new(from, to, weight));
        }
        fn add_undirected(&mut self, a: u32, b: u32, weight: f64) {
            self.add_edge(a, b, weight);
            self.add_edge(b, a, weight);
        }
    }

    impl AStarGraph<u32> for TestGraph {
        fn neighbors(&self, v: &u32) -> Vec<WeightedEdge<u32>> {
            self.edges.get(v).cloned().unwrap_or_default()
        }
        fn estimated_distance_to_goal(&self, v: &u32, goal: &u32) -> f64 {
            match (self.positions.get(v), self.positions.get(goal)) {
                (Some((x0, y0)), Some((x1, y1))) => ((x0 - x1).powi(2) + (y0 - y1).powi(2)).sqrt(),
                _ => 0.0,
            }
        }
    }

    /// Unbounded 4-connected grid. Nothing is reachable outside the first
    /// quadrant, so searching for such a goal never ends.
    struct EndlessGrid;

    impl AStarGraph<(i64, i64)> for EndlessGrid {
        fn neighbors(&self, v: &(i64, i64)) -> Vec<WeightedEdge<(i64, i64)>> {
            let (x, y) = *v;
            [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]
                .into_iter()
                .filter(|&(x, y)| x >= 0 && y >= 0)
                .map(|to| WeightedEdge::new(*v, to, 1.0))
                .collect()
        }
        fn estimated_distance_to_goal(&self, _v: &(i64, i64), _goal: &(i64, i64)) -> f64 {
            0.0
        }
    }

    fn dijkstra(graph: &TestGraph, start: u32, goal: u32) -> Option<f64> {
        let mut best = FxHashMap::<u32, f64>::default();
        let mut open = BinaryHeap::new();
        best.insert(start, 0.0);
        open.push(Reverse((OrderedFloat(0.0f64), start)));
        while let Some(Reverse((OrderedFloat(d), v))) = open.pop() {
            if v == goal {
                return Some(d);
            }
            if d > best[&v] {
                continue;
            }
            for e in graph.neighbors(&v) {
                let nd = d + e.weight;
                if best.get(&e.to).is_none_or(|&old| nd < old) {
                    best.insert(e.to, nd);
                    open.push(Reverse((OrderedFloat(nd), e.to)));
                }
            }
        }
        None
    }

    fn path_weight(graph: &TestGraph, path: &[u32]) -> f64 {
        path.windows(2)
            .map(|w| {
                graph.edges[&w[0]]
                    .iter()
                    .filter(|e| e.to == w[1])
                    .map(|e| e.weight)
                    .min_by(f64::total_cmp)
                    .unwrap()
            })
            .sum()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn outcome_display() {
        assert_eq!(SolverOutcome::Solved.to_string(), "SOLVED");
        assert_eq!(SolverOutcome::Unsolvable.to_string(), "UNSOLVABLE");
        assert_eq!(SolverOutcome::Timeout.to_string(), "TIMEOUT");
    }

    #[test]
    fn prefers_cheaper_detour() {
        let mut graph = TestGraph::default();
        graph.add_edge(0, 1, 10.0);
        graph.add_edge(0, 2, 1.0);
        graph.add_edge(2, 3, 1.0);
        graph.add_edge(3, 1, 1.0);
        graph.add_edge(1, 4, 1.0);

        let solver = AStarSolver::new(&graph, 0, 4, TIMEOUT);
        assert_eq!(solver.outcome(), SolverOutcome::Solved);
        assert_eq!(solver.solution(), &[0, 2, 3, 1, 4]);
        assert_eq!(solver.solution_weight(), 4.0);
        assert!(solver.num_states_explored() >= 4);
    }

    #[test]
    fn start_is_goal() {
        let mut graph = TestGraph::default();
        graph.add_edge(0, 1, 1.0);

        let solver = AStarSolver::new(&graph, 0, 0, TIMEOUT);
        assert_eq!(solver.outcome(), SolverOutcome::Solved);
        assert_eq!(solver.solution(), &[0]);
        assert_eq!(solver.solution_weight(), 0.0);
        assert_eq!(solver.num_states_explored(), 0);
    }

    #[test]
    fn goal_is_not_expanded() {
        let mut graph = TestGraph::default();
        graph.add_edge(0, 1, 1.0);
        graph.add_edge(1, 2, 1.0);
        graph.add_edge(2, 3, 1.0);

        let solver = AStarSolver::new(&graph, 0, 2, TIMEOUT);
        assert_eq!(solver.solution(), &[0, 1, 2]);
        // Only 0 and 1 were popped.
        assert_eq!(solver.num_states_explored(), 2);
    }

    #[test]
    fn unreachable_goal() {
        let mut graph = TestGraph::default();
        graph.add_undirected(0, 1, 1.0);
        graph.add_undirected(1, 2, 1.0);
        graph.add_undirected(3, 4, 1.0);

        let solver = AStarSolver::new(&graph, 0, 4, TIMEOUT);
        assert_eq!(solver.outcome(), SolverOutcome::Unsolvable);
        assert!(solver.solution().is_empty());
        assert_eq!(solver.solution_weight(), 0.0);
        assert_eq!(solver.num_states_explored(), 3);
    }

    #[test]
    fn zero_timeout() {
        let mut graph = TestGraph::default();
        graph.add_edge(0, 1, 1.0);

        let solver = AStarSolver::new(&graph, 0, 1, Duration::ZERO);
        assert_eq!(solver.outcome(), SolverOutcome::Timeout);
        assert!(solver.solution().is_empty());
        assert_eq!(solver.solution_weight(), 0.0);
    }

    #[test]
    fn endless_search_times_out() {
        let timeout = Duration::from_millis(20);
        let solver = AStarSolver::new(&EndlessGrid, (0, 0), (-1, -1), timeout);
        assert_eq!(solver.outcome(), SolverOutcome::Timeout);
        assert!(solver.solution().is_empty());
        assert!(solver.num_states_explored() > 0);
        assert!(solver.exploration_time() >= timeout);
    }

    #[test]
    fn large_grid_with_tiny_timeout() {
        let mut graph = TestGraph::default();
        let side = 300u32;
        for x in 0..side {
            for y in 0..side {
                let v = x * side + y;
                if x + 1 < side {
                    graph.add_undirected(v, v + side, 1.0);
                }
                if y + 1 < side {
                    graph.add_undirected(v, v + 1, 1.0);
                }
            }
        }
        let solver = AStarSolver::new(&graph, 0, side * side - 1, Duration::from_micros(1));
        assert_eq!(solver.outcome(), SolverOutcome::Timeout);
    }

    #[test]
    fn random_graphs_match_dijkstra() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _instance in 0..30 {
            let n = rng.random_range(2..60u32);
            let mut graph = TestGraph::default();
            for _ in 0..(n * 3) {
                let a = rng.random_range(0..n);
                let b = rng.random_range(0..n);
                graph.add_edge(a, b, rng.random_range(0.0..10.0));
            }

            for _query in 0..10 {
                let start = rng.random_range(0..n);
                let goal = rng.random_range(0..n);
                let solver = AStarSolver::new(&graph, start, goal, TIMEOUT);
                match dijkstra(&graph, start, goal) {
                    Some(expected) => {
                        assert_eq!(solver.outcome(), SolverOutcome::Solved);
                        let path = solver.solution();
                        assert_eq!(path.first(), Some(&start));
                        assert_eq!(path.last(), Some(&goal));
                        assert_close(solver.solution_weight(), expected);
                        assert_close(path_weight(&graph, path), expected);
                    }
                    None => {
                        assert_eq!(solver.outcome(), SolverOutcome::Unsolvable);
                        assert!(solver.solution().is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn euclidean_heuristic_matches_dijkstra() {
        // Points on a plane, edge weights at least as long as the straight
        // line, so the euclidean heuristic is admissible and consistent.
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let n = 150u32;
        let mut graph = TestGraph::default();
        for v in 0..n {
            graph
                .positions
                .insert(v, (rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)));
        }
        for v in 0..n {
            for _ in 0..4 {
                let u = rng.random_range(0..n);
                let straight = graph.estimated_distance_to_goal(&v, &u);
                graph.add_undirected(v, u, straight * rng.random_range(1.0..1.5));
            }
        }

        for _query in 0..50 {
            let start = rng.random_range(0..n);
            let goal = rng.random_range(0..n);
            let solver = AStarSolver::new(&graph, start, goal, TIMEOUT);
            let expected = dijkstra(&graph, start, goal);
            assert_eq!(solver.outcome() == SolverOutcome::Solved, expected.is_some());
            if let Some(expected) = expected {
                assert_close(solver.solution_weight(), expected);
                assert_close(path_weight(&graph, solver.solution()), expected);
            }
        }
    }
}
