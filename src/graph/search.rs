//! Bidirectional breadth-first search over the co-star graph
//!
//! Two frontiers grow one full level at a time, alternating, one rooted at
//! the start and one at the goal. Every vertex dequeued is expanded from the
//! source first, so the graph is discovered only as far as the search needs.
//! The search stops at the first vertex discovered by one side that the
//! other side has already visited. Because whole levels are processed in
//! lockstep, the path through that meeting vertex is a shortest one.

use anyhow::Result;
use std::collections::{HashMap, VecDeque};

use super::{CoStarGraph, NeighborSource};
use crate::model::{EdgeAttr, Hop, PersonId};

/// One search direction: its queue plus parent links (keys double as the visited set)
struct Frontier {
    queue: VecDeque<PersonId>,
    parents: HashMap<PersonId, Option<(PersonId, EdgeAttr)>>,
}

impl Frontier {
    fn rooted_at(root: PersonId) -> Self {
        Self {
            queue: VecDeque::from([root]),
            parents: HashMap::from([(root, None)]),
        }
    }

    fn visited(&self, id: PersonId) -> bool {
        self.parents.contains_key(&id)
    }

    fn parent_of(&self, id: PersonId) -> Result<(PersonId, EdgeAttr)> {
        self.parents
            .get(&id)
            .cloned()
            .flatten()
            .ok_or_else(|| anyhow::anyhow!("Broken parent chain at person {}", id))
    }
}

impl<S: NeighborSource> CoStarGraph<S> {
    /// Shortest chain of co-appearances from `start` to `goal`
    ///
    /// Returns `Some(vec![])` when `start == goal` without touching the
    /// source, and `None` when the two are not connected in the part of the
    /// graph reachable through the source.
    pub fn shortest_path(&mut self, start: PersonId, goal: PersonId) -> Result<Option<Vec<Hop>>> {
        if start == goal {
            return Ok(Some(Vec::new()));
        }

        self.expand(start)?;
        self.expand(goal)?;

        let mut forward = Frontier::rooted_at(start);
        let mut backward = Frontier::rooted_at(goal);

        // A side whose queue runs dry has explored its whole component
        // without meeting the other, so there is no path.
        while !forward.queue.is_empty() && !backward.queue.is_empty() {
            if let Some(meeting) = self.advance_level(&mut forward, &backward)? {
                return reconstruct(start, goal, meeting, &forward, &backward).map(Some);
            }
            if let Some(meeting) = self.advance_level(&mut backward, &forward)? {
                return reconstruct(start, goal, meeting, &forward, &backward).map(Some);
            }
        }

        tracing::debug!(
            start = start.0,
            goal = goal.0,
            vertices = self.vertex_count(),
            expanded = self.expanded_count(),
            "no connecting path"
        );
        Ok(None)
    }

    /// Process every vertex queued on `own` at call time
    ///
    /// Returns the first newly discovered vertex already visited by `other`.
    fn advance_level(&mut self, own: &mut Frontier, other: &Frontier) -> Result<Option<PersonId>> {
        let width = own.queue.len();
        for _ in 0..width {
            let Some(u) = own.queue.pop_front() else {
                break;
            };
            self.expand(u)?;

            let discovered: Vec<(PersonId, EdgeAttr)> = self
                .neighbors(u)
                .filter(|(v, _)| !own.visited(*v))
                .map(|(v, attr)| (v, attr.clone()))
                .collect();

            for (v, attr) in discovered {
                own.parents.insert(v, Some((u, attr)));
                own.queue.push_back(v);
                if other.visited(v) {
                    return Ok(Some(v));
                }
            }
        }
        Ok(None)
    }
}

/// Stitch start → meeting (forward parents, reversed) to meeting → goal
fn reconstruct(
    start: PersonId,
    goal: PersonId,
    meeting: PersonId,
    forward: &Frontier,
    backward: &Frontier,
) -> Result<Vec<Hop>> {
    let mut hops = Vec::new();

    let mut current = meeting;
    while current != start {
        let (previous, via) = forward.parent_of(current)?;
        hops.push(Hop {
            from: previous,
            via,
            to: current,
        });
        current = previous;
    }
    hops.reverse();

    let mut current = meeting;
    while current != goal {
        let (next, via) = backward.parent_of(current)?;
        hops.push(Hop {
            from: current,
            via,
            to: next,
        });
        current = next;
    }

    Ok(hops)
}
