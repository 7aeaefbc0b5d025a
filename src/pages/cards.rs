use super::Page;
use crate::fetch::SUMMARY_ENDPOINT;
use crate::format::{self, escape};
use crate::reconcile::{reconcile, ElementId, IdAllocator, KeyedEntities, Materializer, ReconcileStats};
use crate::types::{AvailabilityColor, LotSummary};
use log::debug;

pub const NO_LOTS: &str = "No lot data available.";

#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub lot_name: String,
    pub color: AvailabilityColor,
    pub in_lot: u32,
    pub available: i64,
    pub capacity: u32,
    pub occupancy: f64,
    pub sessions: u32,
    pub violations: u32,
}

impl CardView {
    fn from_lot(lot: &LotSummary) -> Self {
        CardView {
            lot_name: lot.lot_name.clone(),
            color: lot.availability_color,
            in_lot: lot.in_lot_now,
            available: lot.available_now,
            capacity: lot.capacity,
            occupancy: format::clamp_occupancy(lot.occupancy_percent),
            sessions: lot.total_sessions,
            violations: lot.violations_count,
        }
    }

    /// Bar width in percent, always within [0, 100].
    pub fn bar_width(&self) -> f64 {
        self.occupancy
    }
}

#[derive(Debug)]
pub struct Card {
    pub id: ElementId,
    pub view: CardView,
    pub highlighted: bool,
    highlight_generation: u64,
}

struct CardBuilder<'a> {
    ids: &'a mut IdAllocator,
}

impl<'a> Materializer<LotSummary> for CardBuilder<'a> {
    type Entity = Card;

    fn create(&mut self, _key: &str, lot: &LotSummary) -> Card {
        Card {
            id: self.ids.allocate(),
            view: CardView::from_lot(lot),
            highlighted: false,
            highlight_generation: 0,
        }
    }

    fn update(&mut self, card: &mut Card, lot: &LotSummary) {
        card.view = CardView::from_lot(lot);
    }

    fn remove(&mut self, _key: &str, _card: Card) {}
}

/// Lot cards keyed by lot name.
#[derive(Debug, Default)]
pub struct CardGrid {
    ids: IdAllocator,
    cards: KeyedEntities<Card>,
    generation: u64,
    jump_controls: bool,
}

impl CardGrid {
    /// A grid whose cards each post their lot name to `/jump`.
    pub fn with_jump_controls() -> Self {
        CardGrid {
            jump_controls: true,
            ..CardGrid::default()
        }
    }

    pub fn render(&mut self, lots: &[LotSummary]) -> ReconcileStats {
        let previous = std::mem::take(&mut self.cards);
        let (cards, stats) = reconcile(previous, lots, &mut CardBuilder { ids: &mut self.ids });
        self.cards = cards;
        debug!(
            "Cards: {} created, {} updated, {} removed",
            stats.created, stats.updated, stats.removed
        );
        stats
    }

    pub fn card(&self, key: &str) -> Option<&Card> {
        self.cards.get(key)
    }

    /// Highlights one card and clears any other. Returns the generation a
    /// later [`CardGrid::clear_highlight`] must present.
    pub fn highlight(&mut self, key: &str) -> Option<u64> {
        if self.cards.get(key).is_none() {
            return None;
        }
        for card in self.cards.values_mut() {
            card.highlighted = false;
        }
        self.generation += 1;
        let generation = self.generation;
        let card = self.cards.get_mut(key)?;
        card.highlighted = true;
        card.highlight_generation = generation;
        Some(generation)
    }

    /// No-op when the card was highlighted again after `generation` was issued.
    pub fn clear_highlight(&mut self, key: &str, generation: u64) {
        if let Some(card) = self.cards.get_mut(key) {
            if card.highlight_generation == generation {
                card.highlighted = false;
            }
        }
    }

    pub fn markup(&self) -> String {
        let mut out = String::from("<div id=\"lotGrid\" class=\"grid\">");
        if self.cards.is_empty() {
            out.push_str(&format!("<div class=\"placeholder\">{}</div>", NO_LOTS));
        }
        for (_, card) in self.cards.iter() {
            out.push_str(&card_markup(card, self.jump_controls));
        }
        out.push_str("</div>");
        out
    }
}

fn card_markup(card: &Card, jump_control: bool) -> String {
    let v = &card.view;
    let highlight = if card.highlighted { " highlight" } else { "" };
    let jump = if jump_control {
        format!(
            concat!(
                "<form method=\"post\" action=\"/jump\" class=\"card-jump\">",
                "<input type=\"hidden\" name=\"lot\" value=\"{}\">",
                "<button type=\"submit\">Show on map</button></form>"
            ),
            escape(&v.lot_name)
        )
    } else {
        String::new()
    };
    format!(
        concat!(
            "<div class=\"card{}\" data-id=\"{}\" data-lot=\"{}\">",
            "<div class=\"card-head\"><h2>{}</h2><span class=\"badge {}\">{}</span></div>",
            "<div class=\"numbers\">",
            "<div><div class=\"num in-lot\">{}</div><div class=\"label\">In Lot</div></div>",
            "<div><div class=\"num available\">{}</div><div class=\"label\">Available</div></div>",
            "<div><div class=\"num\">{}</div><div class=\"label\">Capacity</div></div>",
            "</div>",
            "<div class=\"occupancy\"><span>Occupancy</span><span>{}</span>",
            "<div class=\"bar-track\"><div class=\"bar {}\" style=\"width: {}%\"></div></div></div>",
            "<div class=\"card-foot\"><span>Sessions: <strong>{}</strong></span>",
            "<span>Violations: <strong>{}</strong></span></div>",
            "{}</div>"
        ),
        highlight,
        card.id,
        escape(&v.lot_name),
        escape(&v.lot_name),
        format::badge_class(v.color),
        v.color.name().to_uppercase(),
        v.in_lot,
        v.available,
        v.capacity,
        format::occupancy_label(v.occupancy),
        format::bar_class(v.color),
        v.bar_width(),
        v.sessions,
        v.violations,
        jump,
    )
}

/// Card grid over `/api/summary`.
#[derive(Debug, Default)]
pub struct CardsPage {
    grid: CardGrid,
}

impl CardsPage {
    pub fn grid(&self) -> &CardGrid {
        &self.grid
    }
}

impl Page for CardsPage {
    type Record = LotSummary;

    fn endpoint(&self) -> &'static str {
        SUMMARY_ENDPOINT
    }

    fn failure_context(&self) -> &'static str {
        "Failed to load lot data"
    }

    fn render(&mut self, snapshot: Vec<LotSummary>) {
        self.grid.render(&snapshot);
    }

    fn title(&self) -> &'static str {
        "Lot Dashboard"
    }

    fn markup(&self) -> String {
        self.grid.markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::tests::lot;

    #[test]
    fn cards_survive_value_changes() {
        let mut page = CardsPage::default();
        page.render(vec![lot("Busch", 40, "green"), lot("College Ave", 3, "red")]);
        let id = page.grid().card("Busch").unwrap().id;
        page.render(vec![lot("Busch", 10, "yellow"), lot("College Ave", 2, "red")]);
        let card = page.grid().card("Busch").unwrap();
        assert_eq!(card.id, id);
        assert_eq!(card.view.available, 10);
        assert_eq!(card.view.color, AvailabilityColor::Yellow);
    }

    #[test]
    fn missing_lot_is_omitted() {
        let mut page = CardsPage::default();
        page.render(vec![lot("A", 1, "green"), lot("B", 1, "green")]);
        page.render(vec![lot("B", 1, "green")]);
        assert!(page.grid().card("A").is_none());
        assert!(!page.markup().contains("data-lot=\"A\""));
    }

    #[test]
    fn occupancy_bar_is_clamped() {
        let mut low = lot("Low", 0, "green");
        low.occupancy_percent = -5.0;
        let mut high = lot("High", 0, "red");
        high.occupancy_percent = 150.0;
        let mut page = CardsPage::default();
        page.render(vec![low, high]);
        assert_eq!(page.grid().card("Low").unwrap().view.bar_width(), 0.0);
        assert_eq!(page.grid().card("High").unwrap().view.bar_width(), 100.0);
        let html = page.markup();
        assert!(html.contains("style=\"width: 0%\""));
        assert!(html.contains("style=\"width: 100%\""));
    }

    #[test]
    fn unknown_color_renders_like_red() {
        let mut page = CardsPage::default();
        page.render(vec![lot("Purple", 1, "purple"), lot("Red", 1, "red")]);
        let html = page.markup();
        assert_eq!(html.matches("bg-red-500").count(), 2);
        assert_eq!(html.matches("bg-red-800 text-red-300").count(), 2);
    }

    #[test]
    fn empty_snapshot_shows_placeholder() {
        let mut page = CardsPage::default();
        page.render(vec![lot("A", 1, "green")]);
        page.render(Vec::new());
        let html = page.markup();
        assert!(html.contains(NO_LOTS));
        assert!(html.starts_with("<div id=\"lotGrid\""));
    }

    #[test]
    fn lot_names_are_escaped() {
        let mut page = CardsPage::default();
        page.render(vec![lot("<img src=x>", 1, "green")]);
        let html = page.markup();
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img src=x&gt;"));
    }

    #[test]
    fn only_jump_grids_post_to_jump() {
        let lots = [lot("Lot \"B\"", 1, "green")];
        let mut plain = CardGrid::default();
        plain.render(&lots);
        assert!(!plain.markup().contains("action=\"/jump\""));

        let mut grid = CardGrid::with_jump_controls();
        grid.render(&lots);
        let html = grid.markup();
        assert!(html.contains("<form method=\"post\" action=\"/jump\""));
        assert!(html.contains("name=\"lot\" value=\"Lot &quot;B&quot;\""));
    }

    #[test]
    fn highlight_survives_refresh_and_stale_clear() {
        let mut grid = CardGrid::default();
        grid.render(&[lot("A", 1, "green"), lot("B", 1, "green")]);
        let first = grid.highlight("A").unwrap();
        let second = grid.highlight("A").unwrap();
        grid.render(&[lot("A", 2, "green"), lot("B", 1, "green")]);
        assert!(grid.card("A").unwrap().highlighted);

        grid.clear_highlight("A", first);
        assert!(grid.card("A").unwrap().highlighted);
        grid.clear_highlight("A", second);
        assert!(!grid.card("A").unwrap().highlighted);
        assert_eq!(grid.highlight("missing"), None);
    }
}
