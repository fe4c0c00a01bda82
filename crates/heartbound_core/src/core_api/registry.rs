use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::chapter::Chapter;
use crate::keyed_table::bucket_index;

use super::error::CoreError;

pub const ROOMS_FILE_NAME: &str = "room_coordinates.tsv";
pub const PLACES_FILE_NAME: &str = "places_list.tsv";
pub const TEXTURES_DIR_NAME: &str = "textures";

pub const ROOM_BUCKETS: usize = 547;
pub const LOCATION_BUCKETS: usize = 307;
pub const MAX_ROOM_AMOUNT: usize = 1000;
pub const MAX_PLACE_AMOUNT: usize = 1000;
/// Keys this long or longer all hash to the seed.
pub const REGISTRY_KEY_BOUND: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomEntry {
    pub index: usize,
    pub name: String,
    pub spawn_x: f64,
    pub spawn_y: f64,
    #[serde(skip)]
    next: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationEntry {
    pub index: usize,
    pub name: String,
    pub chapter: Chapter,
    pub display_position: usize,
    pub image_path: PathBuf,
    #[serde(skip)]
    next: Option<usize>,
}

/// Row that can sit on a bucket chain threaded through its own table.
trait Chained {
    fn name(&self) -> &str;
    fn next(&self) -> Option<usize>;
    fn set_next(&mut self, next: Option<usize>);
}

impl Chained for RoomEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn next(&self) -> Option<usize> {
        self.next
    }

    fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }
}

impl Chained for LocationEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn next(&self) -> Option<usize> {
        self.next
    }

    fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }
}

#[derive(Debug, Clone)]
struct ChainedTable<T> {
    rows: Vec<T>,
    buckets: Vec<Option<usize>>,
}

impl<T: Chained> ChainedTable<T> {
    fn build(mut rows: Vec<T>, bucket_count: usize) -> Self {
        let mut buckets: Vec<Option<usize>> = vec![None; bucket_count];
        for index in 0..rows.len() {
            let bucket = bucket_index(rows[index].name(), bucket_count, REGISTRY_KEY_BOUND);
            match buckets[bucket] {
                None => buckets[bucket] = Some(index),
                Some(mut current) => {
                    while let Some(next) = rows[current].next() {
                        current = next;
                    }
                    rows[current].set_next(Some(index));
                }
            }
        }
        Self { rows, buckets }
    }

    fn find(&self, name: &str) -> Option<&T> {
        let bucket = bucket_index(name, self.buckets.len(), REGISTRY_KEY_BOUND);
        let mut current = self.buckets[bucket];
        while let Some(index) = current {
            let row = &self.rows[index];
            if row.name() == name {
                return Some(row);
            }
            current = row.next();
        }
        None
    }
}

/// Room spawn points and location-to-chapter mapping, loaded once from the
/// bundled resource tables. Read-only after construction.
#[derive(Debug, Clone)]
pub struct ReferenceRegistry {
    rooms: ChainedTable<RoomEntry>,
    locations: ChainedTable<LocationEntry>,
}

impl ReferenceRegistry {
    pub fn load(lib_dir: &Path) -> Result<Self, CoreError> {
        let rooms_path = lib_dir.join(ROOMS_FILE_NAME);
        let places_path = lib_dir.join(PLACES_FILE_NAME);
        let rooms_text = read_table(&rooms_path)?;
        let places_text = read_table(&places_path)?;
        Self::from_tables(
            &rooms_text,
            &places_text,
            &lib_dir.join(TEXTURES_DIR_NAME),
        )
        .map_err(|e| CoreError::new(e.code, format!("{}: {}", lib_dir.display(), e.message)))
    }

    pub fn from_tables(
        rooms_tsv: &str,
        places_tsv: &str,
        texture_dir: &Path,
    ) -> Result<Self, CoreError> {
        let rooms = parse_rows(rooms_tsv, ROOMS_FILE_NAME, MAX_ROOM_AMOUNT, parse_room)?;
        let locations = parse_rows(places_tsv, PLACES_FILE_NAME, MAX_PLACE_AMOUNT, |i, cells| {
            parse_location(i, cells, texture_dir)
        })?;
        debug!(
            rooms = rooms.len(),
            locations = locations.len(),
            "reference tables loaded"
        );

        Ok(Self {
            rooms: ChainedTable::build(rooms, ROOM_BUCKETS),
            locations: ChainedTable::build(locations, LOCATION_BUCKETS),
        })
    }

    pub fn lookup_room(&self, name: &str) -> Option<&RoomEntry> {
        self.rooms.find(name)
    }

    pub fn lookup_location(&self, name: &str) -> Option<&LocationEntry> {
        self.locations.find(name)
    }

    /// Rooms in file order.
    pub fn rooms(&self) -> &[RoomEntry] {
        &self.rooms.rows
    }

    /// Locations in file order.
    pub fn locations(&self) -> &[LocationEntry] {
        &self.locations.rows
    }

    /// Locations of one chapter ordered by display position.
    pub fn chapter_locations(&self, chapter: Chapter) -> Vec<&LocationEntry> {
        let mut out: Vec<&LocationEntry> = self
            .locations
            .rows
            .iter()
            .filter(|l| l.chapter == chapter)
            .collect();
        out.sort_by_key(|l| (l.display_position, l.index));
        out
    }
}

fn read_table(path: &Path) -> Result<String, CoreError> {
    let bytes = fs::read(path).map_err(|e| CoreError::read_failure(path, &e))?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::corrupted(format!("{} is not UTF-8: {e}", path.display())))
}

/// Data rows after the header, with trailing blank lines discarded.
fn count_entries(text: &str) -> usize {
    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines.len()
}

fn parse_rows<T>(
    text: &str,
    file: &str,
    max_rows: usize,
    mut parse_row: impl FnMut(usize, &[&str]) -> Result<T, String>,
) -> Result<Vec<T>, CoreError> {
    let count = count_entries(text);
    if count > max_rows {
        return Err(CoreError::corrupted(format!(
            "{file} has {count} rows, at most {max_rows} allowed"
        )));
    }

    let mut rows = Vec::new();
    rows.try_reserve_exact(count).map_err(|_| {
        CoreError::new(
            super::CoreErrorCode::OutOfMemory,
            format!("{file}: out of memory"),
        )
    })?;

    for (position, line) in text.lines().skip(1).take(count).enumerate() {
        let cells: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
        let declared = cells
            .first()
            .and_then(|c| c.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                CoreError::corrupted(format!("{file} row {position}: missing index column"))
            })?;
        if declared != position {
            return Err(CoreError::corrupted(format!(
                "{file} row {position} declares index {declared}"
            )));
        }
        let row = parse_row(position, &cells)
            .map_err(|msg| CoreError::corrupted(format!("{file} row {position}: {msg}")))?;
        rows.push(row);
    }
    Ok(rows)
}

fn cell<'a>(cells: &[&'a str], column: usize, what: &str) -> Result<&'a str, String> {
    match cells.get(column).map(|c| c.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("missing {what}")),
    }
}

fn number<T: std::str::FromStr>(cells: &[&str], column: usize, what: &str) -> Result<T, String> {
    let raw = cell(cells, column, what)?;
    raw.parse::<T>()
        .map_err(|_| format!("invalid {what} {raw:?}"))
}

fn parse_room(index: usize, cells: &[&str]) -> Result<RoomEntry, String> {
    Ok(RoomEntry {
        index,
        name: cell(cells, 1, "room name")?.to_string(),
        spawn_x: number(cells, 2, "x coordinate")?,
        spawn_y: number(cells, 3, "y coordinate")?,
        next: None,
    })
}

fn parse_location(
    index: usize,
    cells: &[&str],
    texture_dir: &Path,
) -> Result<LocationEntry, String> {
    let raw_chapter: u8 = number(cells, 2, "chapter id")?;
    let chapter =
        Chapter::from_raw(raw_chapter).ok_or_else(|| format!("unknown chapter id {raw_chapter}"))?;
    let image = cell(cells, 4, "image file name")?;

    Ok(LocationEntry {
        index,
        name: cell(cells, 1, "location name")?.to_string(),
        chapter,
        display_position: number(cells, 3, "display position")?,
        image_path: texture_dir.join(image.trim_end_matches(['\r', '\n'])),
        next: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_api::CoreErrorCode;

    const ROOMS: &str = "Index\tRoom\tX\tY\n\
        0\tstart_room\t100\t200\n\
        1\tLore\t8\t16\n\
        2\thometown_house\t-40.5\t320\n";
    const PLACES: &str = "Index\tRoom/Object\tChapter\tPosition\tImage\n\
        0\tLore\t0\t0\tlore.png\n\
        1\tHometown House\t1\t1\thouse.png\r\n\
        2\tHometown Park\t1\t0\tpark.png";

    fn registry() -> ReferenceRegistry {
        ReferenceRegistry::from_tables(ROOMS, PLACES, Path::new("lib/textures")).expect("tables")
    }

    #[test]
    fn looks_up_rooms_including_collisions() {
        let r = registry();
        let start = r.lookup_room("start_room").expect("start_room");
        assert_eq!((start.spawn_x, start.spawn_y), (100.0, 200.0));
        assert_eq!(r.lookup_room("Lore").map(|room| room.index), Some(1));
        assert_eq!(r.lookup_room("hometown_house").map(|room| room.spawn_x), Some(-40.5));
        assert!(r.lookup_room("START_ROOM").is_none());
        assert!(r.lookup_room("").is_none());
    }

    #[test]
    fn looks_up_locations_with_image_paths() {
        let r = registry();
        let house = r.lookup_location("Hometown House").expect("house");
        assert_eq!(house.chapter, Chapter::Hometown);
        assert_eq!(house.image_path, Path::new("lib/textures/house.png"));

        let order: Vec<&str> = r
            .chapter_locations(Chapter::Hometown)
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(order, vec!["Hometown Park", "Hometown House"]);
    }

    #[test]
    fn forced_collisions_chain_through_rows() {
        let mut text = String::from("Index\tRoom\tX\tY\n");
        let mut names = Vec::new();
        let target = bucket_index("a", ROOM_BUCKETS, REGISTRY_KEY_BOUND);
        for i in 0..100_000 {
            let name = format!("room_{i}");
            if bucket_index(&name, ROOM_BUCKETS, REGISTRY_KEY_BOUND) == target {
                names.push(name);
                if names.len() == 3 {
                    break;
                }
            }
        }
        for (i, name) in names.iter().enumerate() {
            text.push_str(&format!("{i}\t{name}\t{i}\t0\n"));
        }
        let places = "Index\tRoom/Object\tChapter\tPosition\tImage\n";
        let r = ReferenceRegistry::from_tables(&text, places, Path::new("t")).expect("tables");
        for (i, name) in names.iter().enumerate() {
            assert_eq!(r.lookup_room(name).map(|room| room.index), Some(i));
        }
        assert!(r.lookup_room("a").is_none());
    }

    #[test]
    fn index_mismatch_is_corruption() {
        let rooms = "Index\tRoom\tX\tY\n0\ta\t0\t0\n1\tb\t0\t0\n2\tc\t0\t0\n5\td\t0\t0\n";
        let err = ReferenceRegistry::from_tables(rooms, PLACES, Path::new("t")).unwrap_err();
        assert_eq!(err.code, CoreErrorCode::FileCorrupted);
        assert!(err.message.contains("row 3 declares index 5"));
    }

    #[test]
    fn bad_chapter_is_corruption() {
        let places = "Index\tRoom/Object\tChapter\tPosition\tImage\n0\tLore\t9\t0\tlore.png\n";
        let err = ReferenceRegistry::from_tables(ROOMS, places, Path::new("t")).unwrap_err();
        assert_eq!(err.code, CoreErrorCode::FileCorrupted);
    }

    #[test]
    fn counts_rows_with_and_without_trailing_newline() {
        assert_eq!(count_entries("h\n0\n1\n"), 2);
        assert_eq!(count_entries("h\n0\n1"), 2);
        assert_eq!(count_entries("h\n0\n1\n\n\n"), 2);
        assert_eq!(count_entries("h"), 0);
    }
}
