//! One renderer per page kind, all driven through [`Page`].

mod cards;
mod lot_map;
mod overview;
mod unregistered;
mod violations;

pub use cards::CardsPage;
pub use lot_map::MapPage;
pub use overview::OverviewPage;
pub use unregistered::UnregisteredPage;
pub use violations::ViolationsPage;

use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::time::Duration;

/// Follow-up work a page asks the driver to run later on the same task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    ClearHighlight { key: String, generation: u64 },
    ScrollMapIntoView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    pub after: Duration,
    pub task: Deferred,
}

pub trait Page {
    type Record: DeserializeOwned + 'static;

    fn endpoint(&self) -> &'static str;

    /// Prefix for the banner when this page's fetch fails.
    fn failure_context(&self) -> &'static str;

    fn render(&mut self, snapshot: Vec<Self::Record>);

    /// Applies a tagged selector value (`""`, `"lot:<name>"`, `"plate:<value>"`).
    fn select(&mut self, _value: &str) -> Vec<Scheduled> {
        Vec::new()
    }

    fn jump_to_lot(&mut self, _key: &str) -> Vec<Scheduled> {
        Vec::new()
    }

    fn on_deferred(&mut self, _task: Deferred) {}

    fn title(&self) -> &'static str;

    fn markup(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Dashboard,
    Map,
    Overview,
    Unregistered,
    Violations,
}

impl FromStr for PageKind {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(PageKind::Dashboard),
            "map" => Ok(PageKind::Map),
            "overview" => Ok(PageKind::Overview),
            "unregistered" => Ok(PageKind::Unregistered),
            "violations" => Ok(PageKind::Violations),
            x => Err(format_err!("Unknown page kind {}", x)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_kinds() {
        assert_eq!("map".parse::<PageKind>().unwrap(), PageKind::Map);
        assert_eq!(
            "violations".parse::<PageKind>().unwrap(),
            PageKind::Violations
        );
        assert!("student".parse::<PageKind>().is_err());
    }
}
