pub mod chapter;
pub mod core_api;
pub mod glyphs;
pub mod keyed_table;
pub mod paths;
pub mod save;
pub mod settings;

mod fs_util;
