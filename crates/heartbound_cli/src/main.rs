use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use heartbound_core::core_api::{CoreError, Engine, Session};
use heartbound_core::glyphs::KnownGlyphs;
use heartbound_core::paths::{default_save_path, resolve_lib_dir};
use heartbound_core::save;
use heartbound_core::settings::{KEY_AUTOMATIC_RELOADING, KEY_LAST_SAVE_PATH, SettingsStore};
use heartbound_render::{RenderOptions, location_json, render_json, render_text, room_to_json};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding room_coordinates.tsv, places_list.tsv and save_structure.tsv.
    #[arg(long, global = true, value_name = "DIR")]
    lib_dir: Option<PathBuf>,
    /// Directory holding editor.cfg.
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print player attributes and storyline progress.
    Show {
        #[arg(value_name = "SAVE")]
        path: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        /// Include variables still at their default value.
        #[arg(long)]
        all: bool,
    },
    /// Check that a file is a well-formed save.
    Validate {
        #[arg(value_name = "SAVE")]
        path: Option<PathBuf>,
    },
    /// Apply edits and write the result to --output. With automatic_reloading
    /// on, the written file is reopened and becomes the last save.
    Edit {
        #[arg(value_name = "SAVE")]
        path: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        output: PathBuf,
        #[arg(long = "set-var", value_name = "N=VALUE", value_parser = parse_var_assignment)]
        set_var: Vec<(usize, f64)>,
        #[arg(long, value_name = "ROOM")]
        room: Option<String>,
        #[arg(long, value_name = "CUR/MAX", value_parser = parse_hit_points)]
        hp: Option<(f64, f64)>,
        #[arg(long, value_name = "DIGITS")]
        seed: Option<String>,
        #[arg(long, value_name = "0|1|2", value_parser = clap::value_parser!(u8).range(0..=2))]
        glyphs: Option<u8>,
        #[arg(long, requires = "y", allow_hyphen_values = true)]
        x: Option<f64>,
        #[arg(long, requires = "x", allow_hyphen_values = true)]
        y: Option<f64>,
    },
    /// Look up a room's spawn point.
    Room {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Look up a location's chapter and artwork.
    Location {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Read or change editor preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print a value. With --default, a missing key is stored with that value.
    Get {
        key: String,
        #[arg(long)]
        default: Option<String>,
    },
    Set {
        key: String,
        value: String,
    },
    Remove {
        key: String,
    },
    List,
}

fn parse_var_assignment(raw: &str) -> Result<(usize, f64), String> {
    let (index, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected N=VALUE, got {raw:?}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid variable number {index:?}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid value {value:?}"))?;
    Ok((index, value))
}

fn parse_hit_points(raw: &str) -> Result<(f64, f64), String> {
    let (current, maximum) = raw
        .split_once('/')
        .ok_or_else(|| format!("expected CUR/MAX, got {raw:?}"))?;
    let parse = |text: &str| {
        text.trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid hit points {text:?}"))
    };
    Ok((parse(current)?, parse(maximum)?))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Broken installation data: nothing useful can run without it.
fn exit_on_fatal(err: &CoreError) -> ! {
    eprintln!("Heartbound Save Editor - Error: {}", err.message);
    process::exit(1);
}

fn open_settings(config_dir: Option<&Path>) -> SettingsStore {
    match config_dir {
        Some(dir) => SettingsStore::open_in_dir(dir),
        None => SettingsStore::open_default(),
    }
}

/// Explicit path, then the last save opened, then the game's default location.
fn resolve_save_path(explicit: Option<PathBuf>, settings: &SettingsStore) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(last) = settings.lookup(KEY_LAST_SAVE_PATH) {
        return PathBuf::from(last);
    }
    default_save_path().unwrap_or_else(|| {
        eprintln!("No save path given and no default save location is known");
        process::exit(2);
    })
}

fn open_session<'a>(engine: &'a Engine, path: &Path, settings: &mut SettingsStore) -> Session<'a> {
    let session = engine.open(path).unwrap_or_else(|e| {
        eprintln!("Error opening save file: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    settings.set(KEY_LAST_SAVE_PATH, &path.to_string_lossy());
    session
}

fn print_json(value: &JsonValue) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let mut settings = open_settings(cli.config_dir.as_deref());

    match cli.command {
        Command::Settings { action } => run_settings(action, &mut settings),
        Command::Validate { path } => {
            let path = resolve_save_path(path, &settings);
            run_validate(&path);
        }
        command => {
            let lib_dir = resolve_lib_dir(cli.lib_dir.as_deref());
            debug!(lib_dir = %lib_dir.display(), "loading reference tables");
            let engine = Engine::load(&lib_dir).unwrap_or_else(|e| exit_on_fatal(&e));
            run_with_engine(command, &engine, &mut settings);
        }
    }

    settings.close();
}

fn run_with_engine(command: Command, engine: &Engine, settings: &mut SettingsStore) {
    match command {
        Command::Show { path, json, all } => {
            let path = resolve_save_path(path, settings);
            let session = open_session(engine, &path, settings);
            let options = RenderOptions {
                all_variables: all,
            };
            if json {
                print_json(&render_json(&session, options));
            } else {
                print!("{}", render_text(&session, options));
            }
        }
        Command::Edit {
            path,
            output,
            set_var,
            room,
            hp,
            seed,
            glyphs,
            x,
            y,
        } => {
            let path = resolve_save_path(path, settings);
            let mut session = open_session(engine, &path, settings);
            let apply = |what: &str, result: Result<(), CoreError>| {
                if let Err(e) = result {
                    eprintln!("Error applying {what} edit: {}", e.message);
                    process::exit(1);
                }
            };

            if let Some(seed) = seed {
                apply("seed", session.set_seed(&seed));
            }
            if let Some(room) = room {
                apply("room", session.set_room(&room));
            }
            if let (Some(x), Some(y)) = (x, y) {
                apply("coordinates", session.set_coordinates(x, y));
            }
            if let Some((current, maximum)) = hp {
                apply("hit points", session.set_hit_points(current, maximum));
            }
            if let Some(raw) = glyphs {
                apply(
                    "glyphs",
                    session.set_known_glyphs(KnownGlyphs::from_raw(i64::from(raw))),
                );
            }
            for (index, value) in set_var {
                apply("storyline variable", session.set_variable(index, value));
            }

            if let Err(e) = session.save(&output) {
                eprintln!("Error writing {}: {}", output.display(), e.message);
                process::exit(1);
            }
            println!("Wrote {}", output.display());

            if settings.get_bool(KEY_AUTOMATIC_RELOADING, true) {
                open_session(engine, &output, settings);
                debug!(path = %output.display(), "reloaded edited save");
            }
        }
        Command::Room { name, json } => {
            let Some(room) = engine.lookup_room(&name) else {
                eprintln!("Unknown room: {name}");
                process::exit(1);
            };
            if json {
                print_json(&room_to_json(room));
            } else {
                println!("{}\t{}\t{}\t{}", room.index, room.name, room.spawn_x, room.spawn_y);
            }
        }
        Command::Location { name, json } => {
            let Some(location) = engine.lookup_location(&name) else {
                eprintln!("Unknown location: {name}");
                process::exit(1);
            };
            if json {
                print_json(&location_json(location));
            } else {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    location.index,
                    location.name,
                    location.chapter,
                    location.display_position,
                    location.image_path.display()
                );
            }
        }
        Command::Validate { .. } | Command::Settings { .. } => {}
    }
}

fn run_validate(path: &Path) {
    let mut file = File::open(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    match save::validate(&mut file) {
        Ok(()) => println!("ok: {}", path.display()),
        Err(e) => {
            println!("invalid: {}: {}", path.display(), e.message);
            process::exit(1);
        }
    }
}

fn run_settings(action: SettingsAction, settings: &mut SettingsStore) {
    match action {
        SettingsAction::Get {
            key,
            default: Some(default),
        } => println!("{}", settings.get(&key, &default)),
        SettingsAction::Get { key, default: None } => match settings.lookup(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("No setting named {key}");
                process::exit(1);
            }
        },
        SettingsAction::Set { key, value } => settings.set(&key, &value),
        SettingsAction::Remove { key } => settings.remove(&key),
        SettingsAction::List => {
            for (key, value) in settings.iter() {
                println!("{key}={value}");
            }
        }
    }
}
