mod engine;
mod error;
mod registry;
mod structure;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use registry::{
    LOCATION_BUCKETS, LocationEntry, PLACES_FILE_NAME, ROOM_BUCKETS, ROOMS_FILE_NAME,
    ReferenceRegistry, RoomEntry, TEXTURES_DIR_NAME,
};
pub use structure::{STRUCTURE_FILE_NAME, StructureCatalog};
pub use types::{LocationGroup, StorylineVariable, ValueAlias};
