//! Read-only views over a [`StreetNetwork`] for path search.
//!
//! Movement policies sometimes need to search a *pruned* network (e.g. one
//! without the edges that would cross a player's own trail).  Rather than
//! copying the graph and deleting edges, they wrap the shared network in a
//! [`FilteredView`] whose predicate hides edges from the router.

use tn_core::EdgeId;

use crate::StreetNetwork;

/// A network as seen by a router: the full topology plus an edge visibility
/// test.
pub trait GraphView {
    fn network(&self) -> &StreetNetwork;

    /// `false` hides `edge` from path search.
    fn is_visible(&self, _edge: EdgeId) -> bool {
        true
    }
}

impl GraphView for StreetNetwork {
    fn network(&self) -> &StreetNetwork {
        self
    }
}

/// A borrowed network with a predicate deciding which edges exist.
///
/// Construction is O(1); the predicate is evaluated lazily as the router
/// relaxes edges.
pub struct FilteredView<'a, F>
where
    F: Fn(EdgeId) -> bool,
{
    network: &'a StreetNetwork,
    visible: F,
}

impl<'a, F> FilteredView<'a, F>
where
    F: Fn(EdgeId) -> bool,
{
    pub fn new(network: &'a StreetNetwork, visible: F) -> Self {
        Self { network, visible }
    }
}

impl<F> GraphView for FilteredView<'_, F>
where
    F: Fn(EdgeId) -> bool,
{
    fn network(&self) -> &StreetNetwork {
        self.network
    }

    fn is_visible(&self, edge: EdgeId) -> bool {
        (self.visible)(edge)
    }
}
