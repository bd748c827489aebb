//! Lazily expanded co-star graph
//!
//! Vertices are person ids; an undirected edge means "appeared together",
//! tagged with the connecting film. The adjacency held here is a
//! process-local cache of a subset of the store: a vertex's neighbour list
//! is only complete once that vertex has been expanded, and expansion is
//! tracked per `CoStarGraph` instance, never persisted.
//!
//! # Thread Safety
//!
//! Not thread-safe. Expansion mutates the adjacency, so every method that
//! can touch the store takes `&mut self`; one search runs at a time.

mod search;

use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{EdgeAttr, NeighborEdge, PersonId};
use crate::store::CastStore;

/// Where a vertex's neighbour edges come from on expansion
pub trait NeighborSource {
    fn neighbors_of(&self, person: PersonId) -> Result<Vec<NeighborEdge>>;
}

impl NeighborSource for CastStore {
    fn neighbors_of(&self, person: PersonId) -> Result<Vec<NeighborEdge>> {
        CastStore::neighbors_of(self, person)
    }
}

impl<S: NeighborSource + ?Sized> NeighborSource for &S {
    fn neighbors_of(&self, person: PersonId) -> Result<Vec<NeighborEdge>> {
        (**self).neighbors_of(person)
    }
}

/// In-memory adjacency over person ids, filled on demand from a [`NeighborSource`]
pub struct CoStarGraph<S> {
    source: S,
    /// At most one edge per neighbour id; ordered for deterministic traversal
    adjacency: HashMap<PersonId, BTreeMap<PersonId, EdgeAttr>>,
    expanded: HashSet<PersonId>,
}

impl<S: NeighborSource> CoStarGraph<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            adjacency: HashMap::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Add `id` with no neighbours unless it is already present
    pub fn ensure_vertex(&mut self, id: PersonId) {
        self.adjacency.entry(id).or_default();
    }

    /// Connect `u` and `v` in both directions with `attr`
    ///
    /// Only neighbour identity deduplicates: if either direction already has
    /// an edge, that direction keeps its existing attribute.
    pub fn add_edge(&mut self, u: PersonId, v: PersonId, attr: EdgeAttr) {
        self.ensure_vertex(u);
        self.ensure_vertex(v);

        if let Some(neighbors) = self.adjacency.get_mut(&u) {
            neighbors.entry(v).or_insert_with(|| attr.clone());
        }
        if let Some(neighbors) = self.adjacency.get_mut(&v) {
            neighbors.entry(u).or_insert(attr);
        }
    }

    /// Load `u`'s neighbour edges from the source, once per graph instance
    ///
    /// Returns whether a load actually happened.
    pub fn expand(&mut self, u: PersonId) -> Result<bool> {
        if self.expanded.contains(&u) {
            return Ok(false);
        }

        let edges = self.source.neighbors_of(u)?;
        self.ensure_vertex(u);
        for edge in edges {
            self.add_edge(edge.from, edge.to, edge.attr);
        }
        self.expanded.insert(u);
        Ok(true)
    }

    /// Neighbours currently loaded for `u`, in id order
    pub fn neighbors(&self, u: PersonId) -> impl Iterator<Item = (PersonId, &EdgeAttr)> + '_ {
        self.adjacency
            .get(&u)
            .into_iter()
            .flat_map(|neighbors| neighbors.iter().map(|(id, attr)| (*id, attr)))
    }

    /// The edge attribute between `u` and `v`, if loaded
    pub fn edge(&self, u: PersonId, v: PersonId) -> Option<&EdgeAttr> {
        self.adjacency.get(&u).and_then(|neighbors| neighbors.get(&v))
    }

    pub fn contains_vertex(&self, id: PersonId) -> bool {
        self.adjacency.contains_key(&id)
    }

    pub fn is_expanded(&self, id: PersonId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Drop every loaded vertex and expansion mark
    ///
    /// The next search reloads from the source, picking up rows written
    /// since the vertices were first expanded.
    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.expanded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilmId;
    use std::cell::Cell;

    fn attr(film: i64) -> EdgeAttr {
        EdgeAttr {
            film_id: FilmId(film),
            title: format!("Film {}", film),
            poster: None,
        }
    }

    /// Serves a fixed edge list and counts lookups
    struct StaticSource {
        edges: Vec<(i64, i64, i64)>,
        calls: Cell<usize>,
    }

    impl NeighborSource for StaticSource {
        fn neighbors_of(&self, person: PersonId) -> Result<Vec<NeighborEdge>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self
                .edges
                .iter()
                .filter_map(|&(a, b, film)| {
                    let (a, b) = (PersonId(a), PersonId(b));
                    if a == person {
                        Some(NeighborEdge { from: a, to: b, attr: attr(film) })
                    } else if b == person {
                        Some(NeighborEdge { from: b, to: a, attr: attr(film) })
                    } else {
                        None
                    }
                })
                .collect())
        }
    }

    fn graph(edges: Vec<(i64, i64, i64)>) -> CoStarGraph<StaticSource> {
        CoStarGraph::new(StaticSource {
            edges,
            calls: Cell::new(0),
        })
    }

    #[test]
    fn test_ensure_vertex_is_idempotent() {
        let mut g = graph(vec![]);
        g.ensure_vertex(PersonId(1));
        g.add_edge(PersonId(1), PersonId(2), attr(9));
        g.ensure_vertex(PersonId(1));

        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.neighbors(PersonId(1)).count(), 1);
    }

    #[test]
    fn test_add_edge_is_symmetric() {
        let mut g = graph(vec![]);
        g.add_edge(PersonId(1), PersonId(2), attr(9));

        assert_eq!(g.edge(PersonId(1), PersonId(2)), Some(&attr(9)));
        assert_eq!(g.edge(PersonId(2), PersonId(1)), Some(&attr(9)));
    }

    #[test]
    fn test_add_edge_keeps_first_attr_per_neighbour() {
        let mut g = graph(vec![]);
        g.add_edge(PersonId(1), PersonId(2), attr(9));
        g.add_edge(PersonId(2), PersonId(1), attr(10));
        g.add_edge(PersonId(1), PersonId(2), attr(11));

        assert_eq!(g.neighbors(PersonId(1)).count(), 1);
        assert_eq!(g.neighbors(PersonId(2)).count(), 1);
        assert_eq!(g.edge(PersonId(1), PersonId(2)), Some(&attr(9)));
    }

    #[test]
    fn test_expand_loads_once() {
        let mut g = graph(vec![(1, 2, 10), (1, 3, 11), (2, 3, 12)]);

        assert!(g.expand(PersonId(1)).unwrap());
        assert!(!g.expand(PersonId(1)).unwrap());
        assert_eq!(g.source().calls.get(), 1);

        let neighbors: Vec<PersonId> = g.neighbors(PersonId(1)).map(|(id, _)| id).collect();
        assert_eq!(neighbors, vec![PersonId(2), PersonId(3)]);
        // Reverse edges are present even though 2 and 3 were never expanded
        assert_eq!(g.edge(PersonId(3), PersonId(1)), Some(&attr(11)));
        assert!(!g.is_expanded(PersonId(3)));
    }

    #[test]
    fn test_expand_isolated_vertex_is_dead_end() {
        let mut g = graph(vec![(1, 2, 10)]);

        assert!(g.expand(PersonId(42)).unwrap());
        assert!(g.contains_vertex(PersonId(42)));
        assert_eq!(g.neighbors(PersonId(42)).count(), 0);
    }

    #[test]
    fn test_clear_forgets_expansion() {
        let mut g = graph(vec![(1, 2, 10)]);
        g.expand(PersonId(1)).unwrap();
        g.clear();

        assert_eq!(g.vertex_count(), 0);
        assert_eq!(g.expanded_count(), 0);
        assert!(g.expand(PersonId(1)).unwrap());
        assert_eq!(g.source().calls.get(), 2);
    }
}
