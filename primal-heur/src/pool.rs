//! Bounded per-heuristic solution pools.

/// A bounded, best-cost-first pool of `(solution, cost)` pairs.
///
/// Each heuristic writes to exactly one pool; the orchestrator reads them
/// after the workers have joined. Equal costs keep insertion order, and
/// entries beyond the capacity fall off the expensive end.
#[derive(Debug, Clone)]
pub struct SolutionPool {
    entries: Vec<(Vec<f64>, f64)>,
    capacity: usize,
}

impl SolutionPool {
    /// Pool that keeps the `capacity` cheapest solutions.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Insert a solution, keeping the pool ordered by cost.
    pub fn add(&mut self, sol: Vec<f64>, cost: f64) {
        let pos = self.entries.partition_point(|(_, c)| *c <= cost);
        self.entries.insert(pos, (sol, cost));
        self.entries.truncate(self.capacity);
    }

    /// Number of pooled solutions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `i`-th cheapest solution.
    pub fn get(&self, i: usize) -> (&[f64], f64) {
        let (sol, cost) = &self.entries[i];
        (sol, *cost)
    }

    /// The cheapest solution, if any.
    pub fn best(&self) -> Option<(&[f64], f64)> {
        self.entries.first().map(|(sol, cost)| (sol.as_slice(), *cost))
    }
}
