//! Model loading and swapping
//!
//! Bridges [`ModelSwapController`] to the ECS: selections arrive as
//! [`SelectModel`] messages, loads go through the `AssetServer`, and a polling
//! system feeds finished loads back into the controller.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use arview_core::{
    LoadError, LoadTicket, ModelSwapController, SceneGraph, Selection, SwapError, SwapOutcome,
    SwapState,
};
use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;

use crate::gizmo::ModelGizmo;
use crate::scene::MarkerGroup;
use crate::settings::ViewerSettings;

/// Request to display the catalog entry at this index
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectModel(pub usize);

/// Marker for model pivots created by the swap controller
#[derive(Component, Debug)]
pub struct ModelPivot {
    pub identifier: String,
}

/// Swap controller plus the loads it is waiting on
#[derive(Resource, Default)]
pub struct ModelSwap {
    controller: Option<ModelSwapController<Entity>>,
    loading: HashMap<LoadTicket, Handle<Gltf>>,
    /// Last failed selection, cleared by the next successful swap
    pub last_error: Option<String>,
}

impl ModelSwap {
    pub fn controller(&self) -> Option<&ModelSwapController<Entity>> {
        self.controller.as_ref()
    }

    /// Catalog entry being loaded as the pending target, if any
    pub fn loading_identifier(&self) -> Option<&str> {
        let controller = self.controller.as_ref()?;
        match controller.state() {
            SwapState::Loading { target, .. } => controller.catalog().get(target),
            SwapState::Idle { .. } => None,
        }
    }

    /// Whether picking `index` in the selector should send a [`SelectModel`]
    pub fn wants_select(&self, index: usize) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|controller| selection_needed(controller, index))
    }
}

/// Picking the displayed entry only matters while another load is pending
/// or when the entry never made it on screen
pub fn selection_needed<N: Copy + Eq + Hash + Debug>(
    controller: &ModelSwapController<N>,
    index: usize,
) -> bool {
    index != controller.selected_index()
        || matches!(controller.state(), SwapState::Loading { .. })
        || controller.current_pivot().is_none()
}

/// Run one selection through the controller, returning the ticket to load
///
/// Selecting the entry that is already on screen keeps its pivot and drops
/// whatever else was pending, so the model is not reloaded.
pub fn route_selection<N: Copy + Eq + Hash + Debug>(
    controller: &mut ModelSwapController<N>,
    index: usize,
) -> Result<Option<LoadTicket>, SwapError> {
    if index == controller.selected_index() && controller.current_pivot().is_some() {
        controller.cancel_pending();
        return Ok(None);
    }

    match controller.begin_select(index)? {
        Selection::Started(ticket) => Ok(Some(ticket)),
        Selection::Joined(_) => Ok(None),
    }
}

/// Scene to spawn from a loaded glTF: the default one, else the first
fn pick_scene<T: Clone>(default_scene: Option<&T>, scenes: &[T]) -> Result<T, LoadError> {
    default_scene
        .or_else(|| scenes.first())
        .cloned()
        .ok_or_else(|| LoadError::Other("glTF file has no scenes".to_string()))
}

/// Outcome of a requested glTF, `None` while it is still loading
fn finished_load(
    asset_server: &AssetServer,
    gltf_assets: &Assets<Gltf>,
    handle: &Handle<Gltf>,
) -> Option<Result<Handle<Scene>, LoadError>> {
    match asset_server.get_load_state(handle.id())? {
        LoadState::Loaded => Some(match gltf_assets.get(handle) {
            Some(gltf) => pick_scene(gltf.default_scene.as_ref(), &gltf.scenes),
            None => Err(LoadError::Other("glTF asset missing after load".to_string())),
        }),
        LoadState::Failed(err) => Some(Err(LoadError::Other(err.to_string()))),
        _ => None,
    }
}

/// ECS view of the scene graph used while completing a swap
pub struct EcsScene<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub pivot_offset: Vec3,
}

impl SceneGraph for EcsScene<'_, '_, '_> {
    type Node = Entity;
    type Asset = Handle<Scene>;

    fn graft_pivot(&mut self, name: &str, asset: Handle<Scene>) -> Entity {
        // Shadow casting for the spawned meshes is enforced by cast_model_shadows
        self.commands
            .spawn((
                Name::new(name.to_string()),
                ModelPivot {
                    identifier: name.to_string(),
                },
                Transform::from_translation(self.pivot_offset),
                Visibility::default(),
            ))
            .with_child(SceneRoot(asset))
            .id()
    }

    fn add_child(&mut self, parent: Entity, child: Entity) {
        self.commands.entity(parent).add_child(child);
    }

    fn remove_child(&mut self, _parent: Entity, child: Entity) {
        // Despawn is recursive and unlinks the child from its parent
        self.commands.entity(child).despawn();
    }
}

/// Plugin for model loading
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelSwap>()
            .add_message::<SelectModel>()
            .add_systems(PostStartup, init_swap_controller)
            .add_systems(
                Update,
                (request_loads, poll_loads, cast_model_shadows).chain(),
            );
    }
}

/// Create the controller once the marker group exists and queue the initial model
fn init_swap_controller(
    mut swap: ResMut<ModelSwap>,
    settings: Res<ViewerSettings>,
    marker_groups: Query<Entity, With<MarkerGroup>>,
    mut select: MessageWriter<SelectModel>,
) {
    let Ok(marker_group) = marker_groups.single() else {
        tracing::error!("No marker group in the scene, model swapping disabled");
        return;
    };

    let initial = settings.catalog.initial;
    match ModelSwapController::new(settings.catalog.models.clone(), marker_group, initial) {
        Ok(controller) => {
            tracing::info!(
                "Model catalog ready: {} entries, initial {}",
                controller.catalog().len(),
                controller.selected_identifier()
            );
            swap.controller = Some(controller);
            select.write(SelectModel(initial));
        }
        Err(e) => {
            tracing::error!("Invalid model catalog: {}", e);
            swap.last_error = Some(e.to_string());
        }
    }
}

/// Turn selection messages into asset loads
fn request_loads(
    mut swap: ResMut<ModelSwap>,
    mut requests: MessageReader<SelectModel>,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
) {
    let swap = &mut *swap;
    let Some(controller) = swap.controller.as_mut() else {
        requests.clear();
        return;
    };

    for SelectModel(index) in requests.read().copied() {
        match route_selection(controller, index) {
            Ok(Some(ticket)) => {
                let Some(url) = settings.model_url(index) else {
                    continue;
                };
                tracing::info!("Requesting model: {}", url);
                swap.loading.insert(ticket, asset_server.load(url));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Ignoring model selection: {}", e);
                swap.last_error = Some(e.to_string());
            }
        }
    }
}

/// Check loading state and hand finished loads to the controller
fn poll_loads(
    mut commands: Commands,
    mut swap: ResMut<ModelSwap>,
    mut gizmo: ResMut<ModelGizmo>,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    let swap = &mut *swap;
    let Some(controller) = swap.controller.as_mut() else {
        return;
    };

    let finished: Vec<_> = swap
        .loading
        .iter()
        .filter_map(|(ticket, handle)| {
            finished_load(&asset_server, &gltf_assets, handle).map(|result| (*ticket, result))
        })
        .collect();

    let mut scene = EcsScene {
        commands: &mut commands,
        pivot_offset: settings.pivot_offset(),
    };
    for (ticket, result) in finished {
        swap.loading.remove(&ticket);
        match controller.complete(ticket, result, &mut scene, &mut *gizmo) {
            Ok(SwapOutcome::Swapped { .. }) => swap.last_error = None,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to load model: {}", e);
                swap.last_error = Some(e.to_string());
            }
        }
    }
}

/// Make every mesh spawned under a model pivot cast shadows
fn cast_model_shadows(
    mut commands: Commands,
    meshes: Query<Entity, (Added<Mesh3d>, With<NotShadowCaster>)>,
    parents: Query<&ChildOf>,
    pivots: Query<(), With<ModelPivot>>,
) {
    for entity in meshes.iter() {
        if parents.iter_ancestors(entity).any(|a| pivots.contains(a)) {
            commands.entity(entity).remove::<NotShadowCaster>();
        }
    }
}
