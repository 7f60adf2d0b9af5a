pub mod codec;
pub mod field;
pub mod grid;
pub mod protocol;
pub mod snapshot;

pub use codec::{decode, encode};
pub use field::{Mark, MineField, UncoverOutcome, DEFAULT_DENSITY, FLOOD_FILL_RADIUS};
pub use grid::{Point, Rect};
pub use protocol::{
    AdminRequest, ClientRequest, HighscoreEntry, PlayerListEntry, StateUpdate, ViewCell, ViewPort,
};
pub use snapshot::{
    FieldSnapshot, PlayerRecord, RegistrySnapshot, FIELD_SNAPSHOT_VERSION,
    REGISTRY_SNAPSHOT_VERSION,
};
