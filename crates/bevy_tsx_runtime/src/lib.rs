//! Bevy integration for Tiled tilesets
//!
//! This crate loads `.tsx` files as Bevy assets and queues the image of every
//! tile, so games can look up a tile id and get a texture handle back. It
//! does not spawn or render tiles.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use bevy_tsx_runtime::{TilesetReady, TilesetTextures, TsxCommandsExt, TsxRuntimePlugin};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TsxRuntimePlugin)
//!         .add_systems(Startup, load_tileset)
//!         .add_systems(Update, on_ready)
//!         .run();
//! }
//!
//! fn load_tileset(mut commands: Commands, asset_server: Res<AssetServer>) {
//!     commands.spawn_tileset(&asset_server, "level/level0/mytrees.tsx");
//! }
//!
//! fn on_ready(mut ready: MessageReader<TilesetReady>, textures: Query<&TilesetTextures>) {
//!     for msg in ready.read() {
//!         let door = textures.get(msg.entity).ok().and_then(|t| t.get(13));
//!         // ...
//!     }
//! }
//! ```
//!
//! To enable hot-reloading during development:
//! ```bash
//! cargo run --features bevy/file_watcher
//! ```

use bevy::asset::AssetEvent;
use bevy::ecs::message::{Message, MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy_tsx_core::Tileset;

// Re-export core types
pub use bevy_tsx_core;

pub mod loader;
pub mod textures;

pub use loader::{TsxLoadError, TsxLoader};
pub use textures::{image_asset_path, TilesetTextures};

/// Plugin for loading tilesets
///
/// This plugin provides:
/// - Asset loading for `.tsx` files
/// - Automatic texture loading when `TilesetHandle` components are added
/// - A `TilesetReady` message once every texture has settled
/// - Hot-reload support when using Bevy's `file_watcher` feature
pub struct TsxRuntimePlugin;

impl Plugin for TsxRuntimePlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<Tileset>()
            .init_asset_loader::<TsxLoader>()
            .add_message::<TilesetReady>()
            .add_systems(
                Update,
                (
                    initialize_tileset_handles,
                    handle_tileset_loading,
                    handle_tileset_hot_reload,
                )
                    .chain(),
            );
    }
}

/// Component for loading a tileset via the Bevy asset system
///
/// Once the tileset and all of its images are loaded, a [`TilesetTextures`]
/// component is inserted on the same entity.
///
/// ```rust,ignore
/// fn setup(mut commands: Commands, asset_server: Res<AssetServer>) {
///     commands.spawn(TilesetHandle(asset_server.load("level/level0/mytrees.tsx")));
/// }
/// ```
#[derive(Component)]
pub struct TilesetHandle(pub Handle<Tileset>);

/// Sent when a tileset and its textures finished loading
#[derive(Message, Debug, Clone)]
pub struct TilesetReady {
    /// Entity holding the `TilesetHandle` and `TilesetTextures`
    pub entity: Entity,
    pub name: String,
    /// Tiles whose image failed to load (`None` for an atlas image)
    pub failed: Vec<Option<u32>>,
}

/// Internal state tracking for TilesetHandle entities
#[derive(Component, Default)]
struct TilesetHandleState {
    /// Whether we've started loading textures
    loading_textures: bool,
    textures: Option<TilesetTextures>,
    /// Whether `TilesetReady` has been sent
    ready: bool,
}

/// System that initializes newly added TilesetHandle components
fn initialize_tileset_handles(
    mut commands: Commands,
    query: Query<Entity, Added<TilesetHandle>>,
) {
    for entity in query.iter() {
        commands.entity(entity).insert(TilesetHandleState::default());
    }
}

/// System that queues texture loads and reports readiness
fn handle_tileset_loading(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    tilesets: Res<Assets<Tileset>>,
    mut query: Query<(Entity, &TilesetHandle, &mut TilesetHandleState)>,
    mut ready: MessageWriter<TilesetReady>,
) {
    for (entity, handle, mut state) in query.iter_mut() {
        if state.ready {
            continue;
        }

        let Some(tileset) = tilesets.get(&handle.0) else {
            continue;
        };

        if !state.loading_textures {
            let mut textures = TilesetTextures::new();
            textures.load_from_tileset(tileset, &asset_server);
            info!(
                "Tileset '{}' loaded, queued {} images",
                tileset.name,
                textures.len()
            );
            state.textures = Some(textures);
            state.loading_textures = true;
        }

        let Some(textures) = &state.textures else {
            continue;
        };

        if !textures.all_loaded(&asset_server) {
            continue;
        }

        // A missing tile image is a packaging defect, not something to hide
        let failed = textures.failed(&asset_server);
        if !failed.is_empty() {
            textures.log_loading_state(&asset_server);
            warn!(
                "Tileset '{}': {} image(s) failed to load",
                tileset.name,
                failed.len()
            );
        }

        commands.entity(entity).insert(textures.clone());
        ready.write(TilesetReady {
            entity,
            name: tileset.name.clone(),
            failed,
        });
        state.ready = true;
        info!("Tileset '{}' ready", tileset.name);
    }
}

/// System that reloads textures when a tileset asset changes
fn handle_tileset_hot_reload(
    mut commands: Commands,
    mut asset_events: MessageReader<AssetEvent<Tileset>>,
    mut query: Query<(Entity, &TilesetHandle, &mut TilesetHandleState)>,
) {
    for event in asset_events.read() {
        let AssetEvent::Modified { id } = event else {
            continue;
        };

        for (entity, handle, mut state) in query.iter_mut() {
            if handle.0.id() != *id {
                continue;
            }

            info!("Hot-reloading tileset asset");
            commands.entity(entity).remove::<TilesetTextures>();
            *state = TilesetHandleState::default();
        }
    }
}

/// Extension trait for spawning tilesets via commands
pub trait TsxCommandsExt {
    /// Spawn an entity that loads the tileset at `path`
    fn spawn_tileset(&mut self, asset_server: &AssetServer, path: impl Into<String>) -> Entity;
}

impl TsxCommandsExt for Commands<'_, '_> {
    fn spawn_tileset(&mut self, asset_server: &AssetServer, path: impl Into<String>) -> Entity {
        let handle: Handle<Tileset> = asset_server.load(path.into());
        self.spawn(TilesetHandle(handle)).id()
    }
}
