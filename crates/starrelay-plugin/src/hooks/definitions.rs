//! The hook catalogue, propagation control, and event payloads.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use starrelay_core::error::AppError;

/// Prefix shared by every hook name.
pub const HOOK_PREFIX: &str = "on_";

/// Enumeration of every event a plugin can observe.
///
/// The string form of each variant (see [`HookPoint::as_str`]) is the wire
/// name existing callers use, and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Fired when the server announces its protocol version.
    OnProtocolVersion,
    /// Fired when the server drops the client connection.
    OnServerDisconnect,
    /// Fired when the server issues a handshake challenge.
    OnHandshakeChallenge,
    /// Fired when a chat message is delivered to the client.
    OnChatReceived,
    /// Fired when the server synchronizes universe time.
    OnUniverseTimeUpdate,
    /// Fired when the client answers the handshake challenge.
    OnHandshakeResponse,
    /// Fired when the client context (inventory, stats) is updated.
    OnClientContextUpdate,
    /// Fired when the client enters a world.
    OnWorldStart,
    /// Fired when the client leaves a world.
    OnWorldStop,
    /// Fired when a block of tiles is sent to the client.
    OnTileArrayUpdate,
    /// Fired when a single tile changes.
    OnTileUpdate,
    /// Fired when the liquid level of a tile changes.
    OnTileLiquidUpdate,
    /// Fired when the damage state of a tile changes.
    OnTileDamageUpdate,
    /// Fired when a tile modification is rejected by the server.
    OnTileModificationFailure,
    /// Fired when an item is given to the player.
    OnGiveItem,
    /// Fired when the server reports the outcome of a container swap.
    OnSwapInContainerResult,
    /// Fired when world environment data (sky, weather) changes.
    OnEnvironmentUpdate,
    /// Fired when the server reports the outcome of an entity interaction.
    OnEntityInteractResult,
    /// Fired when the client requests a batch of tile modifications.
    OnModifyTileList,
    /// Fired when the client damages a single tile.
    OnDamageTile,
    /// Fired when the client damages a group of tiles.
    OnDamageTileGroup,
    /// Fired when the client asks to pick up a dropped item.
    OnRequestDrop,
    /// Fired when the client spawns an entity.
    OnSpawnEntity,
    /// Fired when the client interacts with an entity.
    OnEntityInteract,
    /// Fired when the client connects a wire between two nodes.
    OnConnectWire,
    /// Fired when the client removes every wire from a node.
    OnDisconnectAllWires,
    /// Fired when the client opens a container.
    OnOpenContainer,
    /// Fired when the client closes a container.
    OnCloseContainer,
    /// Fired when the client swaps an item into a container slot.
    OnSwapInContainer,
    /// Fired when the client applies an item to a container slot.
    OnItemApplyInContainer,
    /// Fired when the client starts crafting inside a container.
    OnStartCraftingInContainer,
    /// Fired when the client stops crafting inside a container.
    OnStopCraftingInContainer,
    /// Fired when the client burns the contents of a container.
    OnBurnContainer,
    /// Fired when the client empties a container.
    OnClearContainer,
    /// Fired on every world state update.
    OnWorldUpdate,
    /// Fired when an entity is created.
    OnEntityCreate,
    /// Fired when an entity's state is updated.
    OnEntityUpdate,
    /// Fired when an entity is destroyed.
    OnEntityDestroy,
    /// Fired when a status effect is requested for an entity.
    OnStatusEffectRequest,
    /// Fired when world properties are changed.
    OnUpdateWorldProperties,
    /// Fired on every keep-alive heartbeat.
    OnHeartbeat,
    /// Fired when the server accepts or rejects a connection attempt.
    OnConnectResponse,
    /// Fired when the client sends a chat message. Commands are parsed here.
    OnChatSent,
    /// Fired when damage is dealt to an entity.
    OnDamageNotification,
    /// Fired when a client opens a connection to the relay.
    OnClientConnect,
    /// Fired when a client closes its connection.
    OnClientDisconnect,
    /// Fired when the client requests a warp.
    OnWarpCommand,
}

impl HookPoint {
    /// Every hook point, in declaration order.
    pub const ALL: [HookPoint; 47] = [
        Self::OnProtocolVersion,
        Self::OnServerDisconnect,
        Self::OnHandshakeChallenge,
        Self::OnChatReceived,
        Self::OnUniverseTimeUpdate,
        Self::OnHandshakeResponse,
        Self::OnClientContextUpdate,
        Self::OnWorldStart,
        Self::OnWorldStop,
        Self::OnTileArrayUpdate,
        Self::OnTileUpdate,
        Self::OnTileLiquidUpdate,
        Self::OnTileDamageUpdate,
        Self::OnTileModificationFailure,
        Self::OnGiveItem,
        Self::OnSwapInContainerResult,
        Self::OnEnvironmentUpdate,
        Self::OnEntityInteractResult,
        Self::OnModifyTileList,
        Self::OnDamageTile,
        Self::OnDamageTileGroup,
        Self::OnRequestDrop,
        Self::OnSpawnEntity,
        Self::OnEntityInteract,
        Self::OnConnectWire,
        Self::OnDisconnectAllWires,
        Self::OnOpenContainer,
        Self::OnCloseContainer,
        Self::OnSwapInContainer,
        Self::OnItemApplyInContainer,
        Self::OnStartCraftingInContainer,
        Self::OnStopCraftingInContainer,
        Self::OnBurnContainer,
        Self::OnClearContainer,
        Self::OnWorldUpdate,
        Self::OnEntityCreate,
        Self::OnEntityUpdate,
        Self::OnEntityDestroy,
        Self::OnStatusEffectRequest,
        Self::OnUpdateWorldProperties,
        Self::OnHeartbeat,
        Self::OnConnectResponse,
        Self::OnChatSent,
        Self::OnDamageNotification,
        Self::OnClientConnect,
        Self::OnClientDisconnect,
        Self::OnWarpCommand,
    ];

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnProtocolVersion => "on_protocol_version",
            Self::OnServerDisconnect => "on_server_disconnect",
            Self::OnHandshakeChallenge => "on_handshake_challenge",
            Self::OnChatReceived => "on_chat_received",
            Self::OnUniverseTimeUpdate => "on_universe_time_update",
            Self::OnHandshakeResponse => "on_handshake_response",
            Self::OnClientContextUpdate => "on_client_context_update",
            Self::OnWorldStart => "on_world_start",
            Self::OnWorldStop => "on_world_stop",
            Self::OnTileArrayUpdate => "on_tile_array_update",
            Self::OnTileUpdate => "on_tile_update",
            Self::OnTileLiquidUpdate => "on_tile_liquid_update",
            Self::OnTileDamageUpdate => "on_tile_damage_update",
            Self::OnTileModificationFailure => "on_tile_modification_failure",
            Self::OnGiveItem => "on_give_item",
            Self::OnSwapInContainerResult => "on_swap_in_container_result",
            Self::OnEnvironmentUpdate => "on_environment_update",
            Self::OnEntityInteractResult => "on_entity_interact_result",
            Self::OnModifyTileList => "on_modify_tile_list",
            Self::OnDamageTile => "on_damage_tile",
            Self::OnDamageTileGroup => "on_damage_tile_group",
            Self::OnRequestDrop => "on_request_drop",
            Self::OnSpawnEntity => "on_spawn_entity",
            Self::OnEntityInteract => "on_entity_interact",
            Self::OnConnectWire => "on_connect_wire",
            Self::OnDisconnectAllWires => "on_disconnect_all_wires",
            Self::OnOpenContainer => "on_open_container",
            Self::OnCloseContainer => "on_close_container",
            Self::OnSwapInContainer => "on_swap_in_container",
            Self::OnItemApplyInContainer => "on_item_apply_in_container",
            Self::OnStartCraftingInContainer => "on_start_crafting_in_container",
            Self::OnStopCraftingInContainer => "on_stop_crafting_in_container",
            Self::OnBurnContainer => "on_burn_container",
            Self::OnClearContainer => "on_clear_container",
            Self::OnWorldUpdate => "on_world_update",
            Self::OnEntityCreate => "on_entity_create",
            Self::OnEntityUpdate => "on_entity_update",
            Self::OnEntityDestroy => "on_entity_destroy",
            Self::OnStatusEffectRequest => "on_status_effect_request",
            Self::OnUpdateWorldProperties => "on_update_world_properties",
            Self::OnHeartbeat => "on_heartbeat",
            Self::OnConnectResponse => "on_connect_response",
            Self::OnChatSent => "on_chat_sent",
            Self::OnDamageNotification => "on_damage_notification",
            Self::OnClientConnect => "on_client_connect",
            Self::OnClientDisconnect => "on_client_disconnect",
            Self::OnWarpCommand => "on_warp_command",
        }
    }

    /// Looks up a hook point by its exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        if !name.starts_with(HOOK_PREFIX) {
            return None;
        }
        Self::ALL.iter().copied().find(|hook| hook.as_str() == name)
    }
}

/// Returns whether `name` follows the hook naming convention and names a
/// hook in the catalogue.
pub fn is_hook_name(name: &str) -> bool {
    HookPoint::from_name(name).is_some()
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HookPoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .ok_or_else(|| AppError::validation(format!("'{s}' is not a known hook name")))
    }
}

/// Propagation control returned by every hook invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HookAction {
    /// Let the remaining plugins see the event.
    #[default]
    Continue,
    /// The event was fully handled; no further plugin sees it.
    Stop,
}

impl HookAction {
    /// Returns whether propagation should stop.
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Event payload passed to hook handlers — a flexible key-value map whose
/// shape is defined by the protocol layer for each hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookPayload {
    /// Arbitrary data keyed by string.
    pub data: HashMap<String, serde_json::Value>,
}

impl HookPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from a JSON object. Non-object values are stored
    /// under the `"value"` key.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self {
                data: map.into_iter().collect(),
            },
            other => Self::new().with_data("value", other),
        }
    }

    /// Inserts a typed data value.
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    /// Inserts a string value.
    pub fn with_string(self, key: &str, value: &str) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts an integer value.
    pub fn with_int(self, key: &str, value: i64) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Inserts a boolean value.
    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with_data(key, serde_json::json!(value))
    }

    /// Gets a data value by key.
    pub fn get_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Gets a string data value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Gets an i64 data value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }

    /// Gets a bool data value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|v| v.as_bool())
    }
}
