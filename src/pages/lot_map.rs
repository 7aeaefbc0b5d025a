use super::cards::NO_LOTS;
use super::Page;
use crate::fetch::SUMMARY_ENDPOINT;
use crate::map::{MarkerLayer, SceneMap};
use crate::types::LotSummary;
use log::debug;

/// Campus map with one color-coded marker per lot.
pub struct MapPage {
    layer: MarkerLayer<SceneMap>,
}

impl Default for MapPage {
    fn default() -> Self {
        MapPage {
            layer: MarkerLayer::new(SceneMap::default()),
        }
    }
}

impl MapPage {
    pub fn layer(&self) -> &MarkerLayer<SceneMap> {
        &self.layer
    }
}

impl Page for MapPage {
    type Record = LotSummary;

    fn endpoint(&self) -> &'static str {
        SUMMARY_ENDPOINT
    }

    fn failure_context(&self) -> &'static str {
        "Failed to load map data"
    }

    fn render(&mut self, snapshot: Vec<LotSummary>) {
        let stats = self.layer.render(&snapshot);
        debug!(
            "Markers: {} placed, {} restyled, {} removed",
            stats.created, stats.updated, stats.removed
        );
    }

    fn title(&self) -> &'static str {
        "Lot Map"
    }

    fn markup(&self) -> String {
        let mut out = self.layer.surface().markup();
        if self.layer.is_empty() {
            out.push_str(&format!("<div class=\"placeholder\">{}</div>", NO_LOTS));
        }
        out
    }
}
