use super::cards::CardGrid;
use super::{Deferred, Page, Scheduled};
use crate::fetch::SUMMARY_ENDPOINT;
use crate::map::{MarkerLayer, SceneMap};
use crate::selector::{Selection, Selector};
use crate::types::LotSummary;
use log::{info, warn};
use std::time::Duration;

pub const HIGHLIGHT_FOR: Duration = Duration::from_millis(2000);
pub const SCROLL_AFTER: Duration = Duration::from_millis(300);

/// Cards, map and lot selector on one page, sharing lot names as keys.
pub struct OverviewPage {
    grid: CardGrid,
    layer: MarkerLayer<SceneMap>,
    selector: Selector,
}

impl Default for OverviewPage {
    fn default() -> Self {
        OverviewPage {
            grid: CardGrid::with_jump_controls(),
            layer: MarkerLayer::new(SceneMap::default()),
            selector: Selector::default(),
        }
    }
}

impl OverviewPage {
    pub fn grid(&self) -> &CardGrid {
        &self.grid
    }

    pub fn layer(&self) -> &MarkerLayer<SceneMap> {
        &self.layer
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl Page for OverviewPage {
    type Record = LotSummary;

    fn endpoint(&self) -> &'static str {
        SUMMARY_ENDPOINT
    }

    fn failure_context(&self) -> &'static str {
        "Failed to load lot data"
    }

    fn render(&mut self, snapshot: Vec<LotSummary>) {
        self.grid.render(&snapshot);
        self.layer.render(&snapshot);
        self.selector
            .rebuild(snapshot.iter().map(|lot| lot.lot_name.as_str()));
    }

    fn select(&mut self, value: &str) -> Vec<Scheduled> {
        match Selection::parse(value) {
            Selection::Lot(key) => self.jump_to_lot(&key),
            Selection::All => {
                self.selector.select(Selection::All);
                Vec::new()
            }
            Selection::Plate(plate) => {
                warn!("Overview has no plate search, ignoring {}", plate);
                Vec::new()
            }
        }
    }

    fn jump_to_lot(&mut self, key: &str) -> Vec<Scheduled> {
        if !self.selector.select(Selection::Lot(key.to_string())) {
            warn!("Cannot jump to unknown lot {}", key);
            return Vec::new();
        }
        info!("Jumping to lot {}", key);
        let mut follow_ups = Vec::new();
        if let Some(generation) = self.grid.highlight(key) {
            follow_ups.push(Scheduled {
                after: HIGHLIGHT_FOR,
                task: Deferred::ClearHighlight {
                    key: key.to_string(),
                    generation,
                },
            });
        }
        self.layer.focus(key);
        // Scrolling waits until the card highlight has been painted.
        follow_ups.push(Scheduled {
            after: SCROLL_AFTER,
            task: Deferred::ScrollMapIntoView,
        });
        follow_ups
    }

    fn on_deferred(&mut self, task: Deferred) {
        match task {
            Deferred::ClearHighlight { key, generation } => {
                self.grid.clear_highlight(&key, generation)
            }
            Deferred::ScrollMapIntoView => self.layer.scroll_into_view(),
        }
    }

    fn title(&self) -> &'static str {
        "Lot Overview"
    }

    fn markup(&self) -> String {
        format!(
            "<div class=\"controls\">{}</div>{}{}",
            self.selector.markup(),
            self.grid.markup(),
            self.layer.surface().markup()
        )
    }
}
