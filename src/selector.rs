//! The lot/plate selector control and the filter it encodes.

use crate::format::escape;
use crate::types::UnregisteredRecord;
use std::collections::BTreeSet;
use std::fmt;

const LOT_PREFIX: &str = "lot:";
const PLATE_PREFIX: &str = "plate:";

/// Selector value. Travels as a tagged string: `""`, `"lot:<name>"` or
/// `"plate:<value>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Lot(String),
    Plate(String),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::All
    }
}

impl Selection {
    /// Unrecognised tags select everything.
    pub fn parse(value: &str) -> Selection {
        if let Some(lot) = value.strip_prefix(LOT_PREFIX) {
            Selection::Lot(lot.to_string())
        } else if let Some(plate) = value.strip_prefix(PLATE_PREFIX) {
            Selection::Plate(plate.to_string())
        } else {
            Selection::All
        }
    }

    pub fn matches(&self, record: &UnregisteredRecord) -> bool {
        match self {
            Selection::All => true,
            Selection::Lot(lot) => record.lot_name == *lot,
            Selection::Plate(plate) => record.license_plate.to_uppercase() == plate.to_uppercase(),
        }
    }

    pub fn filter<'a>(&self, records: &'a [UnregisteredRecord]) -> Vec<&'a UnregisteredRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => Ok(()),
            Selection::Lot(lot) => write!(f, "{}{}", LOT_PREFIX, lot),
            Selection::Plate(plate) => write!(f, "{}{}", PLATE_PREFIX, plate),
        }
    }
}

/// Options are the sorted, distinct lot names of the latest snapshot.
#[derive(Debug, Default)]
pub struct Selector {
    lots: Vec<String>,
    selected: Selection,
}

impl Selector {
    /// Rebuilds the option list. A lot selection survives when the new options
    /// still contain it, otherwise it falls back to [`Selection::All`]. Plate
    /// selections are free-text searches rather than options and always survive.
    pub fn rebuild<'a, L>(&mut self, lots: L)
    where
        L: IntoIterator<Item = &'a str>,
    {
        let lots: BTreeSet<&str> = lots.into_iter().collect();
        self.lots = lots.into_iter().map(str::to_string).collect();
        if !self.offers(&self.selected) {
            self.selected = Selection::All;
        }
    }

    pub fn offers(&self, selection: &Selection) -> bool {
        match selection {
            Selection::All | Selection::Plate(_) => true,
            Selection::Lot(lot) => self.lots.iter().any(|l| l == lot),
        }
    }

    /// Returns false and keeps the previous value when `selection` is not offered.
    pub fn select(&mut self, selection: Selection) -> bool {
        if self.offers(&selection) {
            self.selected = selection;
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> &Selection {
        &self.selected
    }

    pub fn lots(&self) -> &[String] {
        &self.lots
    }

    pub fn markup(&self) -> String {
        let mut out = String::from(concat!(
            "<form method=\"post\" action=\"/select\" class=\"selector\">",
            "<select id=\"searchBox\" name=\"value\">"
        ));
        let all_selected = if self.selected == Selection::All {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "<option value=\"\"{}>— All Lots —</option>",
            all_selected
        ));
        for lot in &self.lots {
            let value = Selection::Lot(lot.clone());
            let selected = if self.selected == value {
                " selected"
            } else {
                ""
            };
            out.push_str(&format!(
                "<option value=\"{}\"{}>{}</option>",
                escape(&value.to_string()),
                selected,
                escape(lot)
            ));
        }
        if let Selection::Plate(_) = &self.selected {
            out.push_str(&format!(
                "<option value=\"{}\" selected>{}</option>",
                escape(&self.selected.to_string()),
                escape(&self.selected.to_string())
            ));
        }
        out.push_str("</select><button type=\"submit\">Apply</button></form>");
        out
    }
}
