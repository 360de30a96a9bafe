//! Ban-set branch-and-bound enumeration.
//!
//! Ban-sets are explored breadth-first from the empty set. Every new
//! solution Z spawns one child per member, banning that member on top of the
//! parent's ban-set. Solutions are deduplicated by canonical key.
//!
//! With more than one worker, each wave of queued ban-sets is solved
//! concurrently and the results are folded back in enqueue order, so the
//! output matches the sequential driver exactly.

use std::collections::{HashSet, VecDeque};
use std::thread;

use crossbeam_channel::bounded;
use tracing::{trace, warn};

use super::deadline::Deadline;
use super::solver::{SolveOutcome, Solved, Solver};
use crate::adjustment::{canonical_key, AdjustmentSet, SearchStats};
use crate::error::{AdjustError, AdjustResult, ExecutionError};
use crate::graph::{CausalGraph, NodeId, NodeMask};

/// Everything the driver found.
#[derive(Debug, Clone, Default)]
pub(crate) struct Enumeration {
    pub(crate) sets: Vec<AdjustmentSet>,
    pub(crate) stats: SearchStats,
    pub(crate) timed_out: bool,
}

enum Fold {
    Continue,
    Stop,
}

/// Coordinator state: the queue, the seen sets and the results.
struct Driver<'a> {
    graph: &'a dyn CausalGraph,
    max_num_sets: usize,
    queue: VecDeque<Vec<NodeId>>,
    seen_bans: HashSet<Vec<NodeId>>,
    seen_keys: HashSet<String>,
    out: Enumeration,
}

impl<'a> Driver<'a> {
    fn new(graph: &'a dyn CausalGraph, max_num_sets: usize) -> Self {
        let mut seen_bans = HashSet::new();
        seen_bans.insert(Vec::new());
        Self {
            graph,
            max_num_sets,
            queue: VecDeque::from([Vec::new()]),
            seen_bans,
            seen_keys: HashSet::new(),
            out: Enumeration::default(),
        }
    }

    fn is_full(&self) -> bool {
        self.out.sets.len() >= self.max_num_sets
    }

    /// Applies one branch result, enqueueing children for new solutions.
    fn fold(&mut self, ban: &[NodeId], solved: Solved) -> Fold {
        self.out.stats.branches_explored += 1;
        self.out.stats.witness_searches += solved.witness_searches;

        match solved.outcome {
            SolveOutcome::Suppressed => {
                trace!("no amenable paths, results suppressed");
                Fold::Stop
            }
            SolveOutcome::Infeasible => {
                trace!(ban = ban.len(), "infeasible branch");
                self.out.stats.infeasible_branches += 1;
                Fold::Continue
            }
            SolveOutcome::Solution(z) => {
                let key = canonical_key(self.graph, &z);
                if !self.seen_keys.insert(key) {
                    trace!(ban = ban.len(), size = z.len(), "duplicate solution");
                    self.out.stats.duplicate_solutions += 1;
                    return Fold::Continue;
                }
                trace!(ban = ban.len(), size = z.len(), "new adjustment set");

                for &v in &z {
                    let mut child = ban.to_vec();
                    if let Err(at) = child.binary_search(&v) {
                        child.insert(at, v);
                    }
                    if self.seen_bans.insert(child.clone()) {
                        self.queue.push_back(child);
                    } else {
                        self.out.stats.skipped_ban_sets += 1;
                    }
                }
                self.out.sets.push(AdjustmentSet::new(self.graph, z));

                if self.is_full() {
                    Fold::Stop
                } else {
                    Fold::Continue
                }
            }
        }
    }

    fn timed_out(&mut self) {
        warn!(
            found = self.out.sets.len(),
            queued = self.queue.len(),
            "adjustment enumeration hit its deadline"
        );
        self.out.timed_out = true;
    }
}

fn ban_mask(node_count: usize, ban: &[NodeId]) -> NodeMask {
    NodeMask::from_nodes(node_count, ban.iter().copied())
}

/// Runs the enumeration on the calling thread.
pub(crate) fn enumerate(solver: &Solver<'_>, graph: &dyn CausalGraph, max_num_sets: usize, deadline: &Deadline) -> AdjustResult<Enumeration> {
    let mut driver = Driver::new(graph, max_num_sets);
    if driver.is_full() {
        return Ok(driver.out);
    }

    while let Some(ban) = driver.queue.pop_front() {
        if deadline.is_expired() {
            driver.timed_out();
            break;
        }
        let solved = match solver.solve(&ban_mask(graph.node_count(), &ban)) {
            Ok(solved) => solved,
            Err(ExecutionError::Timeout { .. }) => {
                driver.timed_out();
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if let Fold::Stop = driver.fold(&ban, solved) {
            break;
        }
    }
    Ok(driver.out)
}

/// Runs the enumeration in waves over `workers` threads.
pub(crate) fn enumerate_parallel(
    solver: &Solver<'_>,
    graph: &dyn CausalGraph,
    max_num_sets: usize,
    workers: usize,
    deadline: &Deadline,
) -> AdjustResult<Enumeration> {
    let mut driver = Driver::new(graph, max_num_sets);
    if driver.is_full() {
        return Ok(driver.out);
    }

    'waves: while !driver.queue.is_empty() {
        if deadline.is_expired() {
            driver.timed_out();
            break;
        }
        let wave: Vec<Vec<NodeId>> = driver.queue.drain(..).collect();
        let results = solve_wave(solver, graph.node_count(), &wave, workers)?;

        for (ban, result) in wave.iter().zip(results) {
            let solved = match result {
                Ok(solved) => solved,
                Err(ExecutionError::Timeout { .. }) => {
                    driver.timed_out();
                    break 'waves;
                }
                Err(e) => return Err(e.into()),
            };
            if let Fold::Stop = driver.fold(ban, solved) {
                break 'waves;
            }
        }
    }
    Ok(driver.out)
}

/// Solves every ban-set of a wave, returning results in wave order.
fn solve_wave(
    solver: &Solver<'_>,
    node_count: usize,
    wave: &[Vec<NodeId>],
    workers: usize,
) -> AdjustResult<Vec<Result<Solved, ExecutionError>>> {
    let workers = workers.clamp(1, wave.len().max(1));
    let (job_tx, job_rx) = bounded::<(usize, &[NodeId])>(wave.len().max(1));
    let (result_tx, result_rx) = bounded::<(usize, Result<Solved, ExecutionError>)>(wave.len().max(1));

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("adjust-branch-{idx}"))
                .spawn_scoped(scope, move || {
                    for (slot, ban) in &job_rx {
                        let result = solver.solve(&ban_mask(node_count, ban));
                        if result_tx.send((slot, result)).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| AdjustError::internal(format!("spawn branch worker: {e}")))?;
            handles.push(handle);
        }
        drop(job_rx);
        drop(result_tx);

        for (slot, ban) in wave.iter().enumerate() {
            job_tx
                .send((slot, ban.as_slice()))
                .map_err(|_| ExecutionError::Disconnected)?;
        }
        drop(job_tx);

        let mut slots: Vec<Option<Result<Solved, ExecutionError>>> = Vec::with_capacity(wave.len());
        slots.resize_with(wave.len(), || None);
        for (slot, result) in &result_rx {
            if let Some(entry) = slots.get_mut(slot) {
                *entry = Some(result);
            }
        }

        for handle in handles {
            handle.join().map_err(|_| ExecutionError::WorkerPanicked)?;
        }

        slots
            .into_iter()
            .map(|s| s.ok_or_else(|| AdjustError::from(ExecutionError::Disconnected)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MixedGraph;
    use crate::policy::{ColliderPolicy, NoAmenablePolicy};
    use crate::query::AdjustmentQuery;
    use crate::search::context::PrecomputeContext;

    const ALTERNATIVES: [&str; 4] = ["A --> X", "A --> B", "B --> Y", "X --> Y"];

    fn run(edges: &[&str], max: usize, workers: usize, policy: NoAmenablePolicy) -> Enumeration {
        let g = MixedGraph::from_edges(edges.iter().copied()).unwrap();
        let deadline = Deadline::unbounded();
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let ctx = PrecomputeContext::build(&g, &q, &deadline).unwrap();
        let solver = Solver::new(&g, &ctx, ColliderPolicy::NoncolliderFirst, policy, &deadline);
        if workers > 1 {
            enumerate_parallel(&solver, &g, max, workers, &deadline).unwrap()
        } else {
            enumerate(&solver, &g, max, &deadline).unwrap()
        }
    }

    fn keys(e: &Enumeration) -> Vec<String> {
        e.sets.iter().map(|s| s.key().to_string()).collect()
    }

    #[test]
    fn test_enumerates_alternative_blockers() {
        let e = run(&ALTERNATIVES, 10, 1, NoAmenablePolicy::Search);
        assert_eq!(keys(&e), vec!["A", "B"]);
        // {} -> A; {A} -> B; {A,B} infeasible.
        assert_eq!(e.stats.branches_explored, 3);
        assert_eq!(e.stats.infeasible_branches, 1);
        assert_eq!(e.stats.duplicate_solutions, 0);
        assert!(!e.timed_out);
    }

    #[test]
    fn test_stops_at_the_requested_count() {
        let e = run(&ALTERNATIVES, 1, 1, NoAmenablePolicy::Search);
        assert_eq!(keys(&e), vec!["A"]);
        assert_eq!(e.stats.branches_explored, 1);
    }

    #[test]
    fn test_zero_requested_sets_runs_nothing() {
        let e = run(&ALTERNATIVES, 0, 1, NoAmenablePolicy::Search);
        assert!(e.sets.is_empty());
        assert_eq!(e.stats.branches_explored, 0);
    }

    #[test]
    fn test_parallel_waves_match_sequential_output() {
        let seq = run(&ALTERNATIVES, 10, 1, NoAmenablePolicy::Search);
        let par = run(&ALTERNATIVES, 10, 4, NoAmenablePolicy::Search);
        assert_eq!(keys(&seq), keys(&par));
        assert_eq!(seq.stats, par.stats);
    }

    #[test]
    fn test_suppress_yields_nothing_and_empty_set_yields_one() {
        let fork = ["U --> X", "U --> Y"];
        let e = run(&fork, 10, 1, NoAmenablePolicy::Suppress);
        assert!(e.sets.is_empty());
        let e = run(&fork, 10, 1, NoAmenablePolicy::ReturnEmptySet);
        assert_eq!(keys(&e), vec![""]);
    }

    #[test]
    fn test_expired_deadline_marks_the_run_partial() {
        let g = MixedGraph::from_edges(ALTERNATIVES).unwrap();
        let deadline = Deadline::after(std::time::Duration::ZERO);
        let q = AdjustmentQuery::single("X", "Y").unwrap();
        let ctx = PrecomputeContext::build(&g, &q, &Deadline::unbounded()).unwrap();
        let solver = Solver::new(&g, &ctx, ColliderPolicy::NoncolliderFirst, NoAmenablePolicy::Search, &deadline);
        let e = enumerate(&solver, &g, 10, &deadline).unwrap();
        assert!(e.timed_out);
        assert!(e.sets.is_empty());
    }
}
