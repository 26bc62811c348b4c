//! Choosing a conflict-free subset of individually valid candidates.
//!
//! Two candidates conflict when they claim a common output. Greedy selection
//! walks candidates by descending fee and keeps whatever does not conflict
//! with earlier picks. Exact selection splits the conflict graph into
//! connected components and runs a branch-and-bound maximum-weight
//! independent set search on each component small enough to afford it.

use crate::transaction::{OutPoint, Transaction};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How a round resolves conflicts among valid candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Highest fee first, skipping anything that conflicts with an earlier pick
    #[default]
    Greedy,
    /// Fee-maximizing search per conflict component; components larger than
    /// `max_component` fall back to greedy
    Exact { max_component: usize },
}

impl SelectionPolicy {
    pub const DEFAULT_MAX_COMPONENT: usize = 16;

    pub const fn exact() -> Self {
        Self::Exact {
            max_component: Self::DEFAULT_MAX_COMPONENT,
        }
    }
}

/// A candidate that passed validation at the start of the round
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate<'a> {
    pub(crate) tx: &'a Transaction,
    pub(crate) fee: Decimal,
}

impl Candidate<'_> {
    /// Fee descending, then hash ascending.
    pub(crate) fn rank(&self, other: &Self) -> Ordering {
        other
            .fee
            .cmp(&self.fee)
            .then_with(|| self.tx.hash().cmp(other.tx.hash()))
    }

    fn claims(&self) -> HashSet<OutPoint> {
        self.tx.inputs().iter().map(|input| input.outpoint()).collect()
    }
}

/// Returns ascending positions into `ranked` (already sorted by rank) of a
/// conflict-free subset with maximum total fee per tractable component.
pub(crate) fn select_exact(ranked: &[Candidate<'_>], max_component: usize) -> Vec<usize> {
    let claims: Vec<HashSet<OutPoint>> = ranked.iter().map(Candidate::claims).collect();
    let mut chosen = Vec::with_capacity(ranked.len());

    for component in components(&claims) {
        if component.len() > max_component {
            debug!(
                size = component.len(),
                max_component, "Conflict component too large, selecting greedily"
            );
            chosen.extend(greedy(&component, &claims));
        } else {
            chosen.extend(Search::new(&component, ranked, &claims).run());
        }
    }

    chosen.sort_unstable();
    chosen
}

/// Connected components of the conflict graph, each in ascending rank order.
fn components(claims: &[HashSet<OutPoint>]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..claims.len()).collect();
    let mut first_claimant: HashMap<OutPoint, usize> = HashMap::new();

    for (position, claimed) in claims.iter().enumerate() {
        for outpoint in claimed {
            let first = *first_claimant.entry(*outpoint).or_insert(position);
            if first != position {
                union(&mut parent, position, first);
            }
        }
    }

    let mut grouped: HashMap<usize, Vec<usize>> = HashMap::new();
    for position in 0..claims.len() {
        let root = find(&mut parent, position);
        grouped.entry(root).or_default().push(position);
    }

    let mut components: Vec<Vec<usize>> = grouped.into_values().collect();
    components.sort_unstable_by_key(|component| component[0]);
    components
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let a = find(parent, a);
    let b = find(parent, b);
    if a != b {
        parent[a.max(b)] = a.min(b);
    }
}

fn greedy(component: &[usize], claims: &[HashSet<OutPoint>]) -> Vec<usize> {
    let mut consumed: HashSet<OutPoint> = HashSet::new();
    let mut chosen = Vec::new();

    for &position in component {
        if claims[position].is_disjoint(&consumed) {
            consumed.extend(claims[position].iter().copied());
            chosen.push(position);
        }
    }

    chosen
}

/// Branch-and-bound over one component. Members are explored in rank order,
/// include-branch first, and a solution only replaces the incumbent on a
/// strictly larger total, so the first optimum in rank order wins.
struct Search<'a> {
    members: &'a [usize],
    fees: Vec<Decimal>,
    // conflicts[i][j] for local indices i, j
    conflicts: Vec<Vec<bool>>,
    // remaining[i] = sum of fees[i..]
    remaining: Vec<Decimal>,
    current: Vec<usize>,
    best: Option<(Decimal, Vec<usize>)>,
}

impl<'a> Search<'a> {
    fn new(
        members: &'a [usize],
        ranked: &[Candidate<'_>],
        claims: &[HashSet<OutPoint>],
    ) -> Self {
        let fees: Vec<Decimal> = members.iter().map(|&m| ranked[m].fee).collect();

        let conflicts = members
            .iter()
            .map(|&a| {
                members
                    .iter()
                    .map(|&b| a != b && !claims[a].is_disjoint(&claims[b]))
                    .collect()
            })
            .collect();

        let mut remaining = vec![Decimal::ZERO; fees.len() + 1];
        for i in (0..fees.len()).rev() {
            remaining[i] = remaining[i + 1].saturating_add(fees[i]);
        }

        Self {
            members,
            fees,
            conflicts,
            remaining,
            current: Vec::with_capacity(members.len()),
            best: None,
        }
    }

    fn run(mut self) -> Vec<usize> {
        self.explore(0, Decimal::ZERO);

        self.best
            .map(|(_, local)| local.into_iter().map(|i| self.members[i]).collect())
            .unwrap_or_default()
    }

    fn explore(&mut self, depth: usize, total: Decimal) {
        if let Some((best, _)) = &self.best {
            if total.saturating_add(self.remaining[depth]) <= *best {
                return;
            }
        }

        if depth == self.fees.len() {
            self.best = Some((total, self.current.clone()));
            return;
        }

        let compatible = self
            .current
            .iter()
            .all(|&picked| !self.conflicts[depth][picked]);

        if compatible {
            self.current.push(depth);
            self.explore(depth + 1, total.saturating_add(self.fees[depth]));
            self.current.pop();
        }

        self.explore(depth + 1, total);
    }
}
