//! Model swap controller
//!
//! Replaces the displayed model when the user picks another catalog entry.
//! A swap is split into two transitions so it can be driven both by an
//! `async` caller and by a frame loop polling load states:
//!
//! 1. [`ModelSwapController::begin_select`] validates the index and issues a
//!    [`LoadTicket`] (`Idle -> Loading`).
//! 2. [`ModelSwapController::complete`] receives the load result for that
//!    ticket and, on success, grafts the new pivot and retires the old one
//!    (`Loading -> Idle`).
//!
//! Ordering inside `complete` is fixed: the pivot is built first, the handle
//! is detached before the outgoing pivot is removed, and the handle is only
//! attached after the new pivot is in the scene. The selection is committed
//! last, so a failed load leaves scene, handle and selection untouched.
//!
//! Overlapping selections resolve last-wins: a completion whose ticket is no
//! longer the pending target is reported as [`SwapOutcome::Superseded`] and
//! does not touch the scene. Selecting an entry whose load is already in
//! flight re-targets that load instead of starting a second one.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, info, warn};

use crate::catalog::AssetCatalog;
use crate::error::{LoadError, SwapError};
use crate::handle::InteractiveHandle;
use crate::loader::AssetLoader;

/// Scene operations the controller needs
pub trait SceneGraph {
    type Node: Copy + Eq + Hash + Debug;
    type Asset;

    /// Build a detached pivot named `name` holding the asset's top-level
    /// children, with every mesh marked shadow-casting
    fn graft_pivot(&mut self, name: &str, asset: Self::Asset) -> Self::Node;
    fn add_child(&mut self, parent: Self::Node, child: Self::Node);
    /// Remove `child` (and its subtree) from `parent`
    fn remove_child(&mut self, parent: Self::Node, child: Self::Node);
}

/// Identifies one issued load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
    pub index: usize,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Idle { current: usize },
    Loading { current: usize, target: usize },
}

/// Result of [`ModelSwapController::begin_select`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A new load must be issued for this ticket
    Started(LoadTicket),
    /// A load for this entry is already in flight and is now the target
    Joined(LoadTicket),
}

impl Selection {
    pub fn ticket(&self) -> LoadTicket {
        match self {
            Selection::Started(t) | Selection::Joined(t) => *t,
        }
    }

    /// Whether the caller has to start a load
    pub fn needs_load(&self) -> bool {
        matches!(self, Selection::Started(_))
    }
}

/// Result of a successful [`ModelSwapController::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome<N> {
    /// The new pivot is live and holds the handle
    Swapped {
        index: usize,
        pivot: N,
        removed: Option<N>,
    },
    /// A newer selection took over; nothing was changed
    Superseded(LoadTicket),
    /// Joined an in-flight load; its completion will do the swap
    Joined(LoadTicket),
}

/// Owns the selected index and the live pivot map
#[derive(Debug)]
pub struct ModelSwapController<N> {
    catalog: AssetCatalog,
    attachment: N,
    selected: usize,
    pending: Option<LoadTicket>,
    in_flight: HashMap<usize, LoadTicket>,
    live: HashMap<String, N>,
    next_generation: u64,
}

impl<N: Copy + Eq + Hash + Debug> ModelSwapController<N> {
    /// Create a controller attaching pivots under `attachment`
    ///
    /// `selected` is the entry considered displayed before the first swap,
    /// even though no pivot exists for it yet.
    pub fn new(catalog: AssetCatalog, attachment: N, selected: usize) -> Result<Self, SwapError> {
        if !catalog.contains_index(selected) {
            return Err(SwapError::IndexOutOfRange {
                index: selected,
                len: catalog.len(),
            });
        }

        Ok(Self {
            catalog,
            attachment,
            selected,
            pending: None,
            in_flight: HashMap::new(),
            live: HashMap::new(),
            next_generation: 0,
        })
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn attachment(&self) -> N {
        self.attachment
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_identifier(&self) -> &str {
        self.catalog.get(self.selected).unwrap_or_default()
    }

    pub fn state(&self) -> SwapState {
        match self.pending {
            Some(ticket) => SwapState::Loading {
                current: self.selected,
                target: ticket.index,
            },
            None => SwapState::Idle {
                current: self.selected,
            },
        }
    }

    /// Live pivot for a catalog identifier
    pub fn live_pivot(&self, identifier: &str) -> Option<N> {
        self.live.get(identifier).copied()
    }

    /// Pivot of the currently selected entry
    pub fn current_pivot(&self) -> Option<N> {
        self.live_pivot(self.selected_identifier())
    }

    /// Number of loads issued and not yet completed
    pub fn loads_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Validate `index` and make it the pending target
    pub fn begin_select(&mut self, index: usize) -> Result<Selection, SwapError> {
        let identifier = self
            .catalog
            .get(index)
            .ok_or(SwapError::IndexOutOfRange {
                index,
                len: self.catalog.len(),
            })?;

        if let Some(ticket) = self.in_flight.get(&index).copied() {
            debug!(identifier, generation = ticket.generation, "Joining in-flight load");
            self.pending = Some(ticket);
            return Ok(Selection::Joined(ticket));
        }

        self.next_generation += 1;
        let ticket = LoadTicket {
            generation: self.next_generation,
            index,
        };
        if let Some(previous) = self.pending.replace(ticket) {
            debug!(
                superseded = previous.generation,
                generation = ticket.generation,
                "Selection superseded a pending load"
            );
        }
        self.in_flight.insert(index, ticket);
        info!(identifier, generation = ticket.generation, "Loading model");

        Ok(Selection::Started(ticket))
    }

    /// Drop the pending target and keep the current selection
    ///
    /// Loads already in flight still have to be completed; they resolve as
    /// [`SwapOutcome::Superseded`].
    pub fn cancel_pending(&mut self) -> Option<LoadTicket> {
        let ticket = self.pending.take()?;
        debug!(generation = ticket.generation, "Pending selection cancelled");
        Some(ticket)
    }

    /// Feed the result of the load issued for `ticket`
    pub fn complete<S, H>(
        &mut self,
        ticket: LoadTicket,
        result: Result<S::Asset, LoadError>,
        scene: &mut S,
        handle: &mut H,
    ) -> Result<SwapOutcome<N>, SwapError>
    where
        S: SceneGraph<Node = N>,
        H: InteractiveHandle<N>,
    {
        if self.in_flight.get(&ticket.index) != Some(&ticket) {
            return Err(SwapError::UnknownTicket(ticket.generation));
        }
        self.in_flight.remove(&ticket.index);

        if self.pending != Some(ticket) {
            debug!(generation = ticket.generation, "Discarding stale load result");
            return Ok(SwapOutcome::Superseded(ticket));
        }
        self.pending = None;

        let identifier = self
            .catalog
            .get(ticket.index)
            .ok_or(SwapError::UnknownTicket(ticket.generation))?
            .to_string();

        let asset = match result {
            Ok(asset) => asset,
            Err(source) => {
                warn!(identifier = %identifier, error = %source, "Model load failed, keeping current model");
                return Err(SwapError::LoadFailure { identifier, source });
            }
        };

        let pivot = scene.graft_pivot(&identifier, asset);

        // Removal is keyed by the outgoing selection, not by the new entry
        let outgoing = self.selected_identifier().to_string();
        let removed = self.live.remove(&outgoing);
        if let Some(old) = removed {
            handle.detach();
            scene.remove_child(self.attachment, old);
        }

        scene.add_child(self.attachment, pivot);
        handle.attach(pivot);
        self.live.insert(identifier.clone(), pivot);
        self.selected = ticket.index;

        info!(identifier = %identifier, pivot = ?pivot, replaced = %outgoing, "Model swapped");

        Ok(SwapOutcome::Swapped {
            index: ticket.index,
            pivot,
            removed,
        })
    }

    /// Select `index`, load it through `loader` and swap it in
    pub async fn select_model<L, S, H>(
        &mut self,
        index: usize,
        loader: &L,
        scene: &mut S,
        handle: &mut H,
    ) -> Result<SwapOutcome<N>, SwapError>
    where
        L: AssetLoader<Asset = S::Asset>,
        S: SceneGraph<Node = N>,
        H: InteractiveHandle<N>,
    {
        let ticket = match self.begin_select(index)? {
            Selection::Started(ticket) => ticket,
            Selection::Joined(ticket) => return Ok(SwapOutcome::Joined(ticket)),
        };

        let identifier = self.catalog.get(index).unwrap_or_default().to_string();
        let result = loader.load(&identifier).await;
        self.complete(ticket, result, scene, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AssetGraph, AssetNode, MemoryScene, NodeId};
    use crate::handle::TransformGizmo;

    struct Fixture {
        controller: ModelSwapController<NodeId>,
        scene: MemoryScene,
        gizmo: TransformGizmo<NodeId>,
        marker: NodeId,
    }

    fn fixture() -> Fixture {
        let mut scene = MemoryScene::new();
        let marker = scene.add_group(scene.root(), "marker-group");
        let catalog = AssetCatalog::new(["A.glb", "B.glb", "C.glb"]).unwrap();
        Fixture {
            controller: ModelSwapController::new(catalog, marker, 1).unwrap(),
            scene,
            gizmo: TransformGizmo::turntable(),
            marker,
        }
    }

    fn model(name: &str) -> AssetGraph {
        AssetGraph::new(vec![AssetNode::mesh(name, 1)])
    }

    impl Fixture {
        fn select(&mut self, index: usize) -> Result<SwapOutcome<NodeId>, SwapError> {
            let ticket = self.controller.begin_select(index)?.ticket();
            self.resolve(ticket)
        }

        fn resolve(&mut self, ticket: LoadTicket) -> Result<SwapOutcome<NodeId>, SwapError> {
            let name = self.controller.catalog().get(ticket.index).unwrap().to_string();
            self.controller
                .complete(ticket, Ok(model(&name)), &mut self.scene, &mut self.gizmo)
        }

        fn fail(&mut self, ticket: LoadTicket) -> Result<SwapOutcome<NodeId>, SwapError> {
            self.controller.complete(
                ticket,
                Err(LoadError::Other("network down".to_string())),
                &mut self.scene,
                &mut self.gizmo,
            )
        }

        fn pivots_named(&self, name: &str) -> usize {
            self.scene.children_named(self.marker, name).len()
        }
    }

    #[test]
    fn test_swap_replaces_previous_selection() {
        let mut f = fixture();
        f.select(1).unwrap();
        assert_eq!(f.pivots_named("B.glb"), 1);

        let outcome = f.select(2).unwrap();
        let SwapOutcome::Swapped { index, pivot, removed } = outcome else {
            panic!("expected a swap, got {:?}", outcome);
        };

        assert_eq!(index, 2);
        assert_eq!(f.controller.selected_index(), 2);
        assert_eq!(f.pivots_named("C.glb"), 1);
        assert_eq!(f.pivots_named("B.glb"), 0);
        assert!(!f.scene.contains(removed.unwrap()));
        assert_eq!(f.gizmo.attached(), Some(pivot));
        assert_eq!(f.controller.state(), SwapState::Idle { current: 2 });
    }

    #[test]
    fn test_every_index_leaves_exactly_one_pivot() {
        let mut f = fixture();
        for i in [0, 1, 2, 0, 2, 1] {
            f.select(i).unwrap();
            f.select(i).unwrap();

            let children = f.scene.children(f.marker);
            assert_eq!(children.len(), 1);
            assert_eq!(f.pivots_named(f.controller.catalog().get(i).unwrap()), 1);
            assert_eq!(f.gizmo.attached(), Some(children[0]));
        }
    }

    #[test]
    fn test_reselect_current_does_not_accumulate() {
        let mut f = fixture();
        f.select(1).unwrap();
        let baseline = f.scene.node_count();

        for _ in 0..3 {
            f.select(1).unwrap();
        }

        assert_eq!(f.pivots_named("B.glb"), 1);
        assert_eq!(f.scene.node_count(), baseline);
    }

    #[test]
    fn test_failed_load_keeps_current_model() {
        let mut f = fixture();
        f.select(1).unwrap();
        let b_pivot = f.controller.current_pivot().unwrap();

        let ticket = f.controller.begin_select(2).unwrap().ticket();
        assert_eq!(
            f.controller.state(),
            SwapState::Loading { current: 1, target: 2 }
        );

        let err = f.fail(ticket).unwrap_err();
        assert!(matches!(err, SwapError::LoadFailure { ref identifier, .. } if identifier == "C.glb"));

        assert_eq!(f.controller.selected_index(), 1);
        assert_eq!(f.controller.state(), SwapState::Idle { current: 1 });
        assert_eq!(f.pivots_named("B.glb"), 1);
        assert_eq!(f.pivots_named("C.glb"), 0);
        assert_eq!(f.gizmo.attached(), Some(b_pivot));
    }

    #[test]
    fn test_out_of_range_fails_fast() {
        let mut f = fixture();
        f.select(1).unwrap();
        let nodes = f.scene.node_count();

        let err = f.controller.begin_select(3).unwrap_err();
        assert!(matches!(err, SwapError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(f.controller.state(), SwapState::Idle { current: 1 });
        assert_eq!(f.controller.loads_in_flight(), 0);
        assert_eq!(f.scene.node_count(), nodes);
    }

    #[test]
    fn test_stale_load_does_not_evict_newer_selection() {
        let mut f = fixture();
        f.select(1).unwrap();

        let to_a = f.controller.begin_select(0).unwrap().ticket();
        let to_c = f.controller.begin_select(2).unwrap().ticket();

        // Newer selection resolves first, then the stale one
        assert!(matches!(f.resolve(to_c).unwrap(), SwapOutcome::Swapped { index: 2, .. }));
        assert_eq!(f.resolve(to_a).unwrap(), SwapOutcome::Superseded(to_a));

        assert_eq!(f.controller.selected_index(), 2);
        assert_eq!(f.pivots_named("C.glb"), 1);
        assert_eq!(f.pivots_named("A.glb"), 0);
        assert_eq!(f.scene.children(f.marker).len(), 1);
    }

    #[test]
    fn test_stale_load_resolving_first_is_discarded() {
        let mut f = fixture();
        f.select(1).unwrap();

        let to_a = f.controller.begin_select(0).unwrap().ticket();
        let to_c = f.controller.begin_select(2).unwrap().ticket();

        assert_eq!(f.resolve(to_a).unwrap(), SwapOutcome::Superseded(to_a));
        assert_eq!(
            f.controller.state(),
            SwapState::Loading { current: 1, target: 2 }
        );
        assert_eq!(f.pivots_named("B.glb"), 1);

        f.resolve(to_c).unwrap();
        assert_eq!(f.controller.selected_index(), 2);
    }

    #[test]
    fn test_stale_failure_keeps_pending_target() {
        let mut f = fixture();
        f.select(1).unwrap();

        let to_a = f.controller.begin_select(0).unwrap().ticket();
        let to_c = f.controller.begin_select(2).unwrap().ticket();

        assert_eq!(f.fail(to_a).unwrap(), SwapOutcome::Superseded(to_a));
        assert!(matches!(f.controller.state(), SwapState::Loading { target: 2, .. }));

        f.resolve(to_c).unwrap();
        assert_eq!(f.pivots_named("C.glb"), 1);
    }

    #[test]
    fn test_reselecting_in_flight_entry_joins_load() {
        let mut f = fixture();
        f.select(1).unwrap();

        let first = f.controller.begin_select(0).unwrap();
        let _other = f.controller.begin_select(2).unwrap();
        let again = f.controller.begin_select(0).unwrap();

        assert!(first.needs_load());
        assert_eq!(again, Selection::Joined(first.ticket()));
        assert_eq!(f.controller.loads_in_flight(), 2);

        f.resolve(first.ticket()).unwrap();
        assert_eq!(f.controller.selected_index(), 0);
        assert_eq!(f.pivots_named("A.glb"), 1);
    }

    #[test]
    fn test_cancel_pending_keeps_current_pivot() {
        let mut f = fixture();
        f.select(1).unwrap();
        let pivot = f.controller.current_pivot().unwrap();

        let to_c = f.controller.begin_select(2).unwrap().ticket();
        assert_eq!(f.controller.cancel_pending(), Some(to_c));
        assert_eq!(f.controller.state(), SwapState::Idle { current: 1 });
        assert_eq!(f.controller.cancel_pending(), None);

        // The outstanding load still completes, without touching the scene
        assert_eq!(f.controller.loads_in_flight(), 1);
        assert_eq!(f.resolve(to_c).unwrap(), SwapOutcome::Superseded(to_c));
        assert_eq!(f.controller.loads_in_flight(), 0);
        assert_eq!(f.controller.current_pivot(), Some(pivot));
        assert_eq!(f.gizmo.attached(), Some(pivot));
        assert_eq!(f.pivots_named("C.glb"), 0);
    }

    #[test]
    fn test_completing_twice_is_rejected() {
        let mut f = fixture();
        let ticket = f.controller.begin_select(0).unwrap().ticket();
        f.resolve(ticket).unwrap();

        assert!(matches!(
            f.resolve(ticket),
            Err(SwapError::UnknownTicket(g)) if g == ticket.generation
        ));
        assert_eq!(f.pivots_named("A.glb"), 1);
    }

    #[test]
    fn test_handle_never_targets_removed_node() {
        let mut f = fixture();
        for i in [1, 2, 0, 0, 1] {
            f.select(i).unwrap();
            let target = f.gizmo.attached().unwrap();
            assert!(f.scene.contains(target));
            assert_eq!(f.scene.get(target).unwrap().parent, Some(f.marker));
        }
    }

    #[test]
    fn test_new_rejects_out_of_range_selection() {
        let catalog = AssetCatalog::new(["A.glb"]).unwrap();
        assert!(ModelSwapController::new(catalog, MemoryScene::new().root(), 1).is_err());
    }

    struct MapLoader;

    impl AssetLoader for MapLoader {
        type Asset = AssetGraph;

        async fn load(&self, identifier: &str) -> Result<AssetGraph, LoadError> {
            if identifier.starts_with("Broken") {
                Err(LoadError::NotFound(identifier.to_string()))
            } else {
                Ok(model(identifier))
            }
        }
    }

    #[tokio::test]
    async fn test_select_model_async() {
        let mut scene = MemoryScene::new();
        let marker = scene.add_group(scene.root(), "marker-group");
        let catalog = AssetCatalog::new(["A.glb", "Broken.glb"]).unwrap();
        let mut controller = ModelSwapController::new(catalog, marker, 0).unwrap();
        let mut gizmo = TransformGizmo::turntable();

        let outcome = controller
            .select_model(0, &MapLoader, &mut scene, &mut gizmo)
            .await
            .unwrap();
        assert!(matches!(outcome, SwapOutcome::Swapped { index: 0, removed: None, .. }));

        let err = controller
            .select_model(1, &MapLoader, &mut scene, &mut gizmo)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::LoadFailure { .. }));
        assert_eq!(controller.selected_identifier(), "A.glb");
        assert_eq!(scene.children_named(marker, "A.glb").len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_order_loads_resolve_last_wins() {
        use tokio::sync::{mpsc, oneshot};

        let mut f = fixture();
        f.select(1).unwrap();

        let to_a = f.controller.begin_select(0).unwrap().ticket();
        let to_c = f.controller.begin_select(2).unwrap().ticket();

        // Each load waits on its own channel so the test decides the order
        let (tx_a, rx_a) = oneshot::channel::<AssetGraph>();
        let (tx_c, rx_c) = oneshot::channel::<AssetGraph>();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        for (ticket, rx) in [(to_a, rx_a), (to_c, rx_c)] {
            let done = done_tx.clone();
            tokio::spawn(async move {
                let result = rx.await.map_err(|e| LoadError::Other(e.to_string()));
                let _ = done.send((ticket, result));
            });
        }

        tx_c.send(model("C.glb")).unwrap();
        let (ticket, result) = done_rx.recv().await.unwrap();
        let outcome = f
            .controller
            .complete(ticket, result, &mut f.scene, &mut f.gizmo)
            .unwrap();
        assert!(matches!(outcome, SwapOutcome::Swapped { index: 2, .. }));

        tx_a.send(model("A.glb")).unwrap();
        let (ticket, result) = done_rx.recv().await.unwrap();
        let outcome = f
            .controller
            .complete(ticket, result, &mut f.scene, &mut f.gizmo)
            .unwrap();
        assert_eq!(outcome, SwapOutcome::Superseded(to_a));

        assert_eq!(f.controller.selected_identifier(), "C.glb");
        assert_eq!(f.scene.children(f.marker).len(), 1);
        assert_eq!(f.controller.loads_in_flight(), 0);
    }
}
