use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::glyphs::KnownGlyphs;
use crate::save::{NUM_STORY_VARS, PlayerState, SEED_MAX_DIGITS, SaveGame};

use super::error::CoreError;
use super::registry::{LocationEntry, ReferenceRegistry, RoomEntry};
use super::structure::StructureCatalog;
use super::types::{LocationGroup, StorylineVariable};

/// Reference data shared by every session: rooms, locations and the
/// storyline structure. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: ReferenceRegistry,
    catalog: StructureCatalog,
}

#[derive(Debug, Clone)]
pub struct Session<'a> {
    engine: &'a Engine,
    player: PlayerState,
    variables: Vec<StorylineVariable>,
}

impl Engine {
    pub fn new(registry: ReferenceRegistry, catalog: StructureCatalog) -> Self {
        Self { registry, catalog }
    }

    pub fn load(lib_dir: &Path) -> Result<Self, CoreError> {
        Ok(Self::new(
            ReferenceRegistry::load(lib_dir)?,
            StructureCatalog::load(lib_dir)?,
        ))
    }

    pub fn registry(&self) -> &ReferenceRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &StructureCatalog {
        &self.catalog
    }

    pub fn lookup_room(&self, name: &str) -> Option<&RoomEntry> {
        self.registry.lookup_room(name)
    }

    pub fn lookup_location(&self, name: &str) -> Option<&LocationEntry> {
        self.registry.lookup_location(name)
    }

    pub fn open(&self, path: &Path) -> Result<Session<'_>, CoreError> {
        SaveGame::open(path).map(|save| self.session_from(save))
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session<'_>, CoreError> {
        SaveGame::from_bytes(bytes.as_ref()).map(|save| self.session_from(save))
    }

    fn session_from(&self, save: SaveGame) -> Session<'_> {
        if self.registry.lookup_room(&save.player.room_id).is_none() {
            warn!(room = %save.player.room_id, "save points at a room missing from the registry");
        }

        let mut variables = self.catalog.variables().to_vec();
        for (var, &value) in variables.iter_mut().zip(save.values.iter()).skip(1) {
            var.value = value;
        }
        Session {
            engine: self,
            player: save.player,
            variables,
        }
    }
}

impl<'a> Session<'a> {
    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn current_room(&self) -> Option<&'a RoomEntry> {
        self.engine.lookup_room(&self.player.room_id)
    }

    pub fn variable(&self, index: usize) -> Option<&StorylineVariable> {
        if index == 0 {
            return None;
        }
        self.variables.get(index)
    }

    /// Current value of a used slot.
    pub fn get_variable(&self, index: usize) -> Option<f64> {
        self.variable(index).filter(|v| v.used).map(|v| v.value)
    }

    pub fn set_variable(&mut self, index: usize, value: f64) -> Result<(), CoreError> {
        if index == 0 || index >= NUM_STORY_VARS {
            return Err(CoreError::invalid(format!(
                "storyline variable {index} is outside 1..={}",
                NUM_STORY_VARS - 1
            )));
        }
        let var = &mut self.variables[index];
        if !var.used {
            return Err(CoreError::invalid(format!(
                "storyline variable {index} is not used by the game"
            )));
        }
        if !is_natural(value) {
            return Err(CoreError::invalid(format!(
                "storyline variable {index} cannot hold {value}"
            )));
        }
        if var.maximum > 0.0 && value > var.maximum {
            return Err(CoreError::invalid(format!(
                "storyline variable {index} accepts at most {}",
                var.maximum
            )));
        }
        var.value = value;
        Ok(())
    }

    pub fn used_variables(&self) -> impl Iterator<Item = &StorylineVariable> {
        self.variables.iter().filter(|v| v.used)
    }

    /// Used variables grouped under their location, ordered by chapter then
    /// display position. Variables whose location is unknown are left out.
    pub fn variables_by_location(&self) -> Vec<LocationGroup<'_>> {
        let mut groups: BTreeMap<(u8, usize, usize), LocationGroup<'_>> = BTreeMap::new();
        for var in self.used_variables() {
            let Some(location) = self.engine.lookup_location(&var.location_name) else {
                continue;
            };
            let key = (
                location.chapter.raw(),
                location.display_position,
                location.index,
            );
            groups
                .entry(key)
                .or_insert_with(|| LocationGroup {
                    location,
                    variables: Vec::new(),
                })
                .variables
                .push(var);
        }
        groups.into_values().collect()
    }

    pub fn set_seed(&mut self, seed: &str) -> Result<(), CoreError> {
        if seed.is_empty()
            || seed.len() > SEED_MAX_DIGITS
            || !seed.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(CoreError::invalid(format!(
                "seed must be 1 to {SEED_MAX_DIGITS} digits, got {seed:?}"
            )));
        }
        self.player.seed = seed.to_string();
        Ok(())
    }

    /// Move the player to `name`, placing them at the room's spawn point.
    pub fn set_room(&mut self, name: &str) -> Result<(), CoreError> {
        let room = self
            .engine
            .lookup_room(name)
            .ok_or_else(|| CoreError::invalid(format!("unknown room {name:?}")))?;
        self.player.room_id = room.name.clone();
        self.player.x = room.spawn_x;
        self.player.y = room.spawn_y;
        Ok(())
    }

    pub fn set_coordinates(&mut self, x: f64, y: f64) -> Result<(), CoreError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CoreError::invalid("coordinates must be finite"));
        }
        self.player.x = x;
        self.player.y = y;
        Ok(())
    }

    pub fn set_hit_points(&mut self, current: f64, maximum: f64) -> Result<(), CoreError> {
        if !is_natural(current) || !is_natural(maximum) {
            return Err(CoreError::invalid(format!(
                "hit points must be whole non-negative numbers, got {current}/{maximum}"
            )));
        }
        self.player.hp_current = current;
        self.player.hp_max = maximum;
        Ok(())
    }

    pub fn set_known_glyphs(&mut self, glyphs: KnownGlyphs) -> Result<(), CoreError> {
        if glyphs.raw() < 0 {
            return Err(CoreError::invalid(format!(
                "known glyphs cannot be {}",
                glyphs.raw()
            )));
        }
        self.player.known_glyphs = glyphs;
        Ok(())
    }

    fn to_save(&self) -> SaveGame {
        SaveGame {
            player: self.player.clone(),
            values: self.variables.iter().map(|v| v.value).collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_save().to_bytes()
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        self.to_save().write(path)
    }
}

/// Values the save stores on digits-only lines.
fn is_natural(value: f64) -> bool {
    value.is_finite() && value >= 0.0 && value.fract() == 0.0
}
