use std::fs;
use std::path::Path;

use tracing::debug;

use crate::save::{NUM_STORY_VARS, ROW_OFFSET};

use super::error::CoreError;
use super::types::{StorylineVariable, ValueAlias};

pub const STRUCTURE_FILE_NAME: &str = "save_structure.tsv";

const COLUMN_OFFSET: usize = 6;
const PLAYER_ROWS: usize = 7;
const UNIT_HEADER: &str = "X";

/// Metadata for every storyline slot, read from the save-structure table.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureCatalog {
    variables: Vec<StorylineVariable>,
}

impl StructureCatalog {
    pub fn load(lib_dir: &Path) -> Result<Self, CoreError> {
        let path = lib_dir.join(STRUCTURE_FILE_NAME);
        let bytes = fs::read(&path).map_err(|e| CoreError::read_failure(&path, &e))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| CoreError::corrupted(format!("{} is not UTF-8: {e}", path.display())))?;
        Self::parse(&text)
            .map_err(|e| CoreError::new(e.code, format!("{}: {}", path.display(), e.message)))
    }

    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));
        let headers: Vec<&str> = lines
            .next()
            .ok_or_else(|| CoreError::corrupted("structure table is empty"))?
            .split('\t')
            .collect();
        if headers.len() < COLUMN_OFFSET {
            return Err(CoreError::corrupted(format!(
                "structure header has {} columns, expected at least {COLUMN_OFFSET}",
                headers.len()
            )));
        }
        let unit_column = headers.iter().position(|h| *h == UNIT_HEADER);

        let mut variables: Vec<StorylineVariable> =
            (0..NUM_STORY_VARS).map(StorylineVariable::unused).collect();

        for (line_no, line) in lines.enumerate().skip(PLAYER_ROWS) {
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split('\t').collect();
            let var = parse_row(&cells, &headers, unit_column)
                .map_err(|msg| CoreError::corrupted(format!("line {}: {msg}", line_no + 2)))?;
            let index = var.index;
            variables[index] = var;
        }

        debug!(
            used = variables.iter().filter(|v| v.used).count(),
            "save structure loaded"
        );
        Ok(Self { variables })
    }

    pub fn variable(&self, index: usize) -> Option<&StorylineVariable> {
        self.variables.get(index)
    }

    /// All slots, indexed by variable number.
    pub fn variables(&self) -> &[StorylineVariable] {
        &self.variables
    }

    pub fn used_count(&self) -> usize {
        self.variables.iter().filter(|v| v.used).count()
    }
}

fn parse_row(
    cells: &[&str],
    headers: &[&str],
    unit_column: Option<usize>,
) -> Result<StorylineVariable, String> {
    let text = |column: usize| cells.get(column).map(|c| c.trim()).unwrap_or("");

    let row: usize = text(0)
        .parse()
        .map_err(|_| format!("invalid row number {:?}", text(0)))?;
    let index = row
        .checked_sub(ROW_OFFSET)
        .filter(|i| (1..NUM_STORY_VARS).contains(i))
        .ok_or_else(|| format!("row {row} is outside the storyline range"))?;
    let declared: usize = text(1)
        .parse()
        .map_err(|_| format!("invalid storyline var {:?}", text(1)))?;
    if declared != index {
        return Err(format!("row {row} declares storyline var {declared}, expected {index}"));
    }

    let mut var = StorylineVariable::unused(index);
    var.used = true;
    var.location_name = text(2).to_string();
    var.display_name = text(3).to_string();
    var.info = non_empty(text(4));
    var.unit = unit_column.and_then(|c| non_empty(text(c)));

    let states = text(5);
    if !matches!(states, "" | "X" | "0|X") {
        for raw in states.split('|').map(str::trim).filter(|r| !r.is_empty()) {
            let description = headers
                .iter()
                .enumerate()
                .skip(COLUMN_OFFSET)
                .find(|(column, header)| Some(*column) != unit_column && **header == raw)
                .and_then(|(column, _)| non_empty(text(column)));
            var.value_aliases.push(ValueAlias {
                raw_value: raw.to_string(),
                description,
            });
        }
        let numeric: Vec<f64> = var
            .value_aliases
            .iter()
            .filter_map(|a| a.raw_value.parse::<f64>().ok())
            .collect();
        var.maximum = numeric.iter().copied().fold(0.0, f64::max);
        var.default = numeric.first().copied().unwrap_or(0.0);
    }
    Ok(var)
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}
