use super::{Page, Scheduled};
use crate::fetch::UNREGISTERED_ENDPOINT;
use crate::format::{self, escape};
use crate::selector::{Selection, Selector};
use crate::table::{Placeholder, RowTable, RowView};
use crate::types::UnregisteredRecord;
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct UnregisteredRow {
    pub plate: String,
    pub lot: String,
    pub time_in: String,
    pub time_out: crate::types::TimeOut,
}

impl RowView for UnregisteredRow {
    type Record = UnregisteredRecord;

    fn from_record(record: &UnregisteredRecord) -> Self {
        UnregisteredRow {
            plate: record.license_plate.clone(),
            lot: record.lot_name.clone(),
            time_in: record.time_in.clone(),
            time_out: record.time_out.clone(),
        }
    }

    fn cells(&self) -> String {
        format!(
            "<td><span class=\"plate\">{}</span></td><td>{}</td><td class=\"font-mono\">{}</td><td>{}</td>",
            escape(&format::plate_label(&self.plate)),
            escape(&self.lot),
            escape(&self.time_in),
            format::time_out_cell(&self.time_out)
        )
    }
}

/// Unregistered vehicles with a lot/plate lookup. The full snapshot is cached
/// so changing the filter never needs a fetch.
pub struct UnregisteredPage {
    all: Vec<UnregisteredRecord>,
    selector: Selector,
    table: RowTable<UnregisteredRow>,
}

impl Default for UnregisteredPage {
    fn default() -> Self {
        UnregisteredPage {
            all: Vec::new(),
            selector: Selector::default(),
            table: RowTable::new(
                "unregBody",
                5,
                true,
                Placeholder {
                    title: "No unregistered vehicles found",
                    detail: Some("All vehicles in lots have a registration on file."),
                },
            ),
        }
    }
}

impl UnregisteredPage {
    fn apply_filter(&mut self) {
        let visible: Vec<UnregisteredRecord> = self
            .selector
            .selected()
            .filter(&self.all)
            .into_iter()
            .cloned()
            .collect();
        let stats = self.table.render(&visible);
        debug!(
            "Unregistered rows: {} shown of {}, {} new",
            visible.len(),
            self.all.len(),
            stats.created
        );
    }

    pub fn table(&self) -> &RowTable<UnregisteredRow> {
        &self.table
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

impl Page for UnregisteredPage {
    type Record = UnregisteredRecord;

    fn endpoint(&self) -> &'static str {
        UNREGISTERED_ENDPOINT
    }

    fn failure_context(&self) -> &'static str {
        "Failed to load unregistered data"
    }

    fn render(&mut self, snapshot: Vec<UnregisteredRecord>) {
        self.all = snapshot;
        self.selector
            .rebuild(self.all.iter().map(|r| r.lot_name.as_str()));
        self.apply_filter();
    }

    fn select(&mut self, value: &str) -> Vec<Scheduled> {
        if self.selector.select(Selection::parse(value)) {
            self.apply_filter();
        } else {
            warn!("Ignoring selection {:?} not offered by the selector", value);
        }
        Vec::new()
    }

    fn title(&self) -> &'static str {
        "Unregistered Vehicles"
    }

    fn markup(&self) -> String {
        format!(
            concat!(
                "<div class=\"controls\">{}",
                "<form method=\"post\" action=\"/select\" class=\"plate-search\">",
                "<input type=\"text\" name=\"plate\" placeholder=\"Plate\">",
                "<button type=\"submit\">Find plate</button></form>",
                "<span id=\"totalCount\">{}</span></div>",
                "<table><thead><tr><th>#</th><th>Plate</th><th>Lot</th><th>Time In</th>",
                "<th>Time Out</th></tr></thead>{}</table>"
            ),
            self.selector.markup(),
            format::unregistered_count_label(self.all.len()),
            self.table.markup()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeOut;

    fn rec(plate: &str, lot: &str) -> UnregisteredRecord {
        UnregisteredRecord {
            license_plate: plate.to_string(),
            lot_name: lot.to_string(),
            time_in: "10/19/2026 08:15".to_string(),
            time_out: TimeOut::At("10/19/2026 09:40".to_string()),
        }
    }

    fn snapshot() -> Vec<UnregisteredRecord> {
        vec![
            rec("abc123", "Busch"),
            rec("XYZ999", "Livingston"),
            rec("ABC123", "College Ave"),
            rec("LMN456", "Busch"),
        ]
    }

    #[test]
    fn filter_reuses_cached_snapshot() {
        let mut page = UnregisteredPage::default();
        page.render(snapshot());
        assert_eq!(page.table().len(), 4);

        page.select("plate:ABC123");
        assert_eq!(page.table().len(), 2);

        page.select("lot:Busch");
        assert_eq!(page.table().len(), 2);
        assert!(page.table().row("LMN456|Busch").is_some());

        page.select("");
        assert_eq!(page.table().len(), 4);
        assert!(page.markup().contains("4 unregistered"));
    }

    #[test]
    fn refresh_keeps_selection_and_reapplies_it() {
        let mut page = UnregisteredPage::default();
        page.render(snapshot());
        page.select("lot:Busch");
        let row_id = page.table().row("LMN456|Busch").unwrap().id;

        let mut next = snapshot();
        next.push(rec("NEW001", "Busch"));
        page.render(next);
        assert_eq!(page.selector().selected(), &Selection::Lot("Busch".into()));
        assert_eq!(page.table().len(), 3);
        assert_eq!(page.table().row("LMN456|Busch").unwrap().id, row_id);
    }

    #[test]
    fn selection_resets_when_lot_disappears() {
        let mut page = UnregisteredPage::default();
        page.render(snapshot());
        page.select("lot:Livingston");
        page.render(vec![rec("abc123", "Busch")]);
        assert_eq!(page.selector().selected(), &Selection::All);
        assert_eq!(page.table().len(), 1);
    }

    #[test]
    fn rows_show_uppercased_escaped_plates_and_still_in_lot_badge() {
        let mut page = UnregisteredPage::default();
        let mut parked = rec("<b>x1", "Busch");
        parked.time_out = TimeOut::StillInLot;
        page.render(vec![parked]);
        let html = page.markup();
        assert!(html.contains("&lt;B&gt;X1"));
        assert!(html.contains("badge-still-in-lot"));
    }

    #[test]
    fn empty_result_shows_placeholder() {
        let mut page = UnregisteredPage::default();
        page.render(Vec::new());
        assert!(page.markup().contains("No unregistered vehicles found"));
        assert!(page.markup().contains("0 unregistered"));
    }

    #[test]
    fn markup_offers_lot_filter_and_plate_search() {
        let mut page = UnregisteredPage::default();
        page.render(vec![rec("abc123", "Busch")]);
        let html = page.markup();
        assert!(html.contains("<select id=\"searchBox\" name=\"value\">"));
        assert!(html.contains("<input type=\"text\" name=\"plate\""));
        assert_eq!(html.matches("action=\"/select\"").count(), 2);
    }
}
