//! Where things are: star systems, jump destinations and local positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved star system on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLocation {
    pub name: String,
    pub sector: Option<String>,
    pub hex: Option<String>,
}

impl SystemLocation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: None,
            hex: None,
        }
    }

    pub fn at(name: impl Into<String>, sector: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: Some(sector.into()),
            hex: Some(hex.into()),
        }
    }
}

impl fmt::Display for SystemLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.sector, &self.hex) {
            (Some(sector), Some(hex)) => write!(f, "{} ({} {})", self.name, sector, hex),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Where a jump is headed, as entered by the navigator.
///
/// The name may carry decoration such as `Regina (Spinward Marches 1910)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpDestination {
    pub name: String,
    pub sector: Option<String>,
    pub hex: Option<String>,
}

impl JumpDestination {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sector: None,
            hex: None,
        }
    }

    pub fn with_coordinates(mut self, sector: impl Into<String>, hex: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self.hex = Some(hex.into());
        self
    }

    /// Sector and hex, when both were recorded.
    pub fn coordinates(&self) -> Option<(&str, &str)> {
        match (&self.sector, &self.hex) {
            (Some(sector), Some(hex)) if !sector.trim().is_empty() && !hex.trim().is_empty() => {
                Some((sector.trim(), hex.trim()))
            }
            _ => None,
        }
    }

    /// The system name with decorative suffixes removed.
    pub fn clean_name(&self) -> String {
        clean_system_name(&self.name)
    }
}

/// Strip decorative suffixes from a system name so it can be used as a key.
///
/// Handles a trailing parenthetical (`Regina (Spinward Marches 1910)`), a
/// dash-separated suffix (`Regina - Spinward Marches`) and a trailing four
/// digit hex code (`Regina 1910`). Input that is nothing but decoration is
/// returned trimmed.
pub fn clean_system_name(raw: &str) -> String {
    let raw = raw.trim();
    let mut name = raw;

    if let Some(open) = name.find('(') {
        name = name[..open].trim_end();
    }
    if let Some(dash) = name.find(" - ") {
        name = name[..dash].trim_end();
    }
    if let Some((head, tail)) = name.rsplit_once(' ') {
        if tail.len() == 4 && tail.bytes().all(|b| b.is_ascii_digit()) && !head.trim().is_empty() {
            name = head.trim_end();
        }
    }

    if name.is_empty() {
        return raw.to_string();
    }
    name.to_string()
}

/// A ship's position within the current system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "type", content = "name")]
pub enum LocalPosition {
    /// Berthed at a named facility
    Docked(String),
    /// At the emergence point after a jump
    ArrivalPoint,
    /// Somewhere in normal space
    #[default]
    InSpace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_name_strips_decorations() {
        assert_eq!(clean_system_name("Regina (Spinward Marches 1910)"), "Regina");
        assert_eq!(clean_system_name("Regina - Spinward Marches"), "Regina");
        assert_eq!(clean_system_name("  Efate 1705 "), "Efate");
        assert_eq!(clean_system_name("Glisten"), "Glisten");
        assert_eq!(clean_system_name("New Rome"), "New Rome");
    }

    #[test]
    fn clean_name_keeps_input_that_is_only_decoration() {
        assert_eq!(clean_system_name(" (Spinward Marches) "), "(Spinward Marches)");
        assert_eq!(clean_system_name("(Regina 1910)"), "(Regina 1910)");
        assert_eq!(clean_system_name(""), "");
    }

    #[test]
    fn coordinates_require_both_parts() {
        let named = JumpDestination::named("Regina");
        assert_eq!(named.coordinates(), None);

        let placed = JumpDestination::named("Regina (Spinward Marches)")
            .with_coordinates("Spinward Marches", "1910");
        assert_eq!(placed.coordinates(), Some(("Spinward Marches", "1910")));
        assert_eq!(placed.clean_name(), "Regina");
    }

    #[test]
    fn system_location_display_includes_coordinates() {
        let loc = SystemLocation::at("Regina", "Spinward Marches", "1910");
        assert_eq!(loc.to_string(), "Regina (Spinward Marches 1910)");
        assert_eq!(SystemLocation::new("Regina").to_string(), "Regina");
    }
}
