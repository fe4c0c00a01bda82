use serde::{Deserialize, Serialize};

use super::registry::LocationEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueAlias {
    pub raw_value: String,
    pub description: Option<String>,
}

/// One storyline slot: its current value plus what the structure table says
/// about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorylineVariable {
    pub index: usize,
    pub value: f64,
    pub location_name: String,
    pub display_name: String,
    pub info: Option<String>,
    pub unit: Option<String>,
    pub default: f64,
    /// Zero means unbounded.
    pub maximum: f64,
    pub value_aliases: Vec<ValueAlias>,
    pub used: bool,
}

impl StorylineVariable {
    pub fn unused(index: usize) -> Self {
        Self {
            index,
            value: 0.0,
            location_name: String::new(),
            display_name: String::new(),
            info: None,
            unit: None,
            default: 0.0,
            maximum: 0.0,
            value_aliases: Vec::new(),
            used: false,
        }
    }

    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            format!("Var {}", self.index)
        } else {
            format!("Var {}: {}", self.index, self.display_name)
        }
    }

    pub fn accepts_any_value(&self) -> bool {
        self.value_aliases.is_empty()
    }

    pub fn alias_for_value(&self, value: f64) -> Option<&ValueAlias> {
        self.value_aliases
            .iter()
            .find(|a| a.raw_value.parse::<f64>().is_ok_and(|raw| raw == value))
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationGroup<'a> {
    pub location: &'a LocationEntry,
    pub variables: Vec<&'a StorylineVariable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_lookup_matches_numeric_raw_values() {
        let mut var = StorylineVariable::unused(3);
        var.value_aliases = vec![
            ValueAlias {
                raw_value: "0".to_string(),
                description: None,
            },
            ValueAlias {
                raw_value: "2".to_string(),
                description: Some("Talked".to_string()),
            },
        ];
        assert_eq!(
            var.alias_for_value(2.0).and_then(|a| a.description.as_deref()),
            Some("Talked")
        );
        assert!(var.alias_for_value(1.0).is_none());
        assert!(!var.accepts_any_value());
        assert_eq!(var.label(), "Var 3");
    }
}
