use std::fmt::Write as _;

use heartbound_core::core_api::{LocationEntry, RoomEntry, Session, StorylineVariable};
use serde_json::{Map as JsonMap, Value as JsonValue};

const LABEL_WIDTH: usize = 44;
const VALUE_WIDTH: usize = 8;
const SHEET_WIDTH: usize = 76;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Include variables still at their default value.
    pub all_variables: bool,
}

pub fn render_json(session: &Session, options: RenderOptions) -> JsonValue {
    let player = session.player();
    let mut out = JsonMap::new();

    out.insert("seed".to_string(), JsonValue::String(player.seed.clone()));
    out.insert(
        "room_id".to_string(),
        JsonValue::String(player.room_id.clone()),
    );
    out.insert(
        "room_known".to_string(),
        JsonValue::Bool(session.current_room().is_some()),
    );
    out.insert("x".to_string(), number(player.x));
    out.insert("y".to_string(), number(player.y));
    out.insert("hp_current".to_string(), number(player.hp_current));
    out.insert("hp_max".to_string(), number(player.hp_max));
    out.insert(
        "known_glyphs".to_string(),
        JsonValue::from(player.known_glyphs.raw()),
    );
    out.insert(
        "known_glyphs_name".to_string(),
        JsonValue::String(player.known_glyphs.to_string()),
    );

    let mut chapters: Vec<JsonValue> = Vec::new();
    let mut current: Option<(String, Vec<JsonValue>)> = None;
    for group in session.variables_by_location() {
        let variables: Vec<JsonValue> = group
            .variables
            .iter()
            .filter(|v| options.all_variables || !v.is_default())
            .map(|v| variable_to_json(v))
            .collect();
        if variables.is_empty() {
            continue;
        }

        let chapter = group.location.chapter.to_string();
        if current.as_ref().is_some_and(|(name, _)| *name != chapter)
            && let Some((name, locations)) = current.take()
        {
            chapters.push(chapter_to_json(name, locations));
        }
        let mut location = location_to_json(group.location);
        location.insert("variables".to_string(), JsonValue::Array(variables));
        current
            .get_or_insert_with(|| (chapter, Vec::new()))
            .1
            .push(JsonValue::Object(location));
    }
    if let Some((name, locations)) = current {
        chapters.push(chapter_to_json(name, locations));
    }
    out.insert("chapters".to_string(), JsonValue::Array(chapters));

    JsonValue::Object(out)
}

pub fn render_text(session: &Session, options: RenderOptions) -> String {
    let player = session.player();
    let mut out = String::new();

    writeln!(&mut out, "{}", centered("HEARTBOUND SAVE", SHEET_WIDTH))
        .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, "  Seed: {:<20}Glyphs: {}", player.seed, player.known_glyphs)
        .expect("writing to String cannot fail");
    let room_note = if session.current_room().is_some() {
        ""
    } else {
        " (unknown)"
    };
    writeln!(
        &mut out,
        "  Room: {}{room_note}  at {}, {}",
        player.room_id,
        format_value(player.x),
        format_value(player.y)
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "    HP: {}/{}",
        format_value(player.hp_current),
        format_value(player.hp_max)
    )
    .expect("writing to String cannot fail");

    let mut last_chapter = None;
    for group in session.variables_by_location() {
        let variables: Vec<&&StorylineVariable> = group
            .variables
            .iter()
            .filter(|v| options.all_variables || !v.is_default())
            .collect();
        if variables.is_empty() {
            continue;
        }

        if last_chapter != Some(group.location.chapter) {
            writeln!(&mut out).expect("writing to String cannot fail");
            writeln!(&mut out, " ::: {} :::", group.location.chapter)
                .expect("writing to String cannot fail");
            last_chapter = Some(group.location.chapter);
        }
        writeln!(&mut out, "  {}", group.location.name).expect("writing to String cannot fail");
        for var in variables {
            writeln!(&mut out, "    {}", variable_line(var))
                .expect("writing to String cannot fail");
        }
    }

    if last_chapter.is_none() {
        writeln!(&mut out).expect("writing to String cannot fail");
        writeln!(&mut out, "  No storyline progress recorded.")
            .expect("writing to String cannot fail");
    }
    out
}

pub fn room_to_json(room: &RoomEntry) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("index".to_string(), JsonValue::from(room.index));
    out.insert("name".to_string(), JsonValue::String(room.name.clone()));
    out.insert("spawn_x".to_string(), number(room.spawn_x));
    out.insert("spawn_y".to_string(), number(room.spawn_y));
    JsonValue::Object(out)
}

pub fn location_json(location: &LocationEntry) -> JsonValue {
    JsonValue::Object(location_to_json(location))
}

fn location_to_json(location: &LocationEntry) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert("index".to_string(), JsonValue::from(location.index));
    out.insert("name".to_string(), JsonValue::String(location.name.clone()));
    out.insert(
        "chapter".to_string(),
        JsonValue::String(location.chapter.to_string()),
    );
    out.insert(
        "display_position".to_string(),
        JsonValue::from(location.display_position),
    );
    out.insert(
        "image_path".to_string(),
        JsonValue::String(location.image_path.display().to_string()),
    );
    out
}

fn chapter_to_json(name: String, locations: Vec<JsonValue>) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("chapter".to_string(), JsonValue::String(name));
    out.insert("locations".to_string(), JsonValue::Array(locations));
    JsonValue::Object(out)
}

fn variable_to_json(var: &StorylineVariable) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("index".to_string(), JsonValue::from(var.index));
    out.insert(
        "name".to_string(),
        JsonValue::String(var.display_name.clone()),
    );
    out.insert("value".to_string(), number(var.value));
    if let Some(alias) = var
        .alias_for_value(var.value)
        .and_then(|a| a.description.as_ref())
    {
        out.insert("meaning".to_string(), JsonValue::String(alias.clone()));
    }
    if let Some(unit) = &var.unit {
        out.insert("unit".to_string(), JsonValue::String(unit.clone()));
    }
    if var.maximum > 0.0 {
        out.insert("maximum".to_string(), number(var.maximum));
    }
    JsonValue::Object(out)
}

fn variable_line(var: &StorylineVariable) -> String {
    let mut value = format_value(var.value);
    if let Some(unit) = &var.unit {
        value = format!("{value} {unit}");
    }
    let meaning = var
        .alias_for_value(var.value)
        .and_then(|a| a.description.as_deref())
        .map(|d| format!("  ({d})"))
        .unwrap_or_default();
    format!(
        "{}{:>width$}{meaning}",
        fit_column(&var.label(), LABEL_WIDTH),
        value,
        width = VALUE_WIDTH
    )
}

/// Whole numbers render without a fraction, matching how the save stores them.
fn number(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        JsonValue::from(value as i64)
    } else {
        JsonValue::from(value)
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn fit_column(value: &str, width: usize) -> String {
    let mut text: String = value.chars().take(width).collect();
    let len = text.chars().count();
    if len < width {
        text.push_str(&" ".repeat(width - len));
    }
    text
}

fn centered(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    format!("{}{value}", " ".repeat((width - len) / 2))
}
