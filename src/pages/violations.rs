use super::Page;
use crate::fetch::VIOLATIONS_ENDPOINT;
use crate::format::{self, escape};
use crate::table::{Placeholder, RowTable, RowView};
use crate::types::{ViolationReason, ViolationRecord, ViolationStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ViolationRow {
    pub plate: String,
    pub lot: String,
    pub minutes: u32,
    pub status: ViolationStatus,
    pub reason: ViolationReason,
}

impl RowView for ViolationRow {
    type Record = ViolationRecord;

    fn from_record(record: &ViolationRecord) -> Self {
        ViolationRow {
            plate: record.license_plate.clone(),
            lot: record.lot_name.clone(),
            minutes: record.duration_minutes,
            status: record.status.clone(),
            reason: record.reason.clone(),
        }
    }

    fn cells(&self) -> String {
        format!(
            concat!(
                "<td class=\"plate\">{}</td><td>{}</td><td>{} min</td>",
                "<td><span class=\"badge {}\">{}</span></td>",
                "<td><span class=\"badge {}\">{}</span></td>"
            ),
            escape(&self.plate),
            escape(&self.lot),
            self.minutes,
            format::status_badge_class(&self.status),
            escape(self.status.label()),
            format::reason_badge_class(&self.reason),
            escape(self.reason.label())
        )
    }
}

pub struct ViolationsPage {
    table: RowTable<ViolationRow>,
}

impl Default for ViolationsPage {
    fn default() -> Self {
        ViolationsPage {
            table: RowTable::new(
                "violationsBody",
                5,
                false,
                Placeholder {
                    title: "No violations found",
                    detail: Some("All active sessions are compliant."),
                },
            ),
        }
    }
}

impl ViolationsPage {
    pub fn table(&self) -> &RowTable<ViolationRow> {
        &self.table
    }
}

impl Page for ViolationsPage {
    type Record = ViolationRecord;

    fn endpoint(&self) -> &'static str {
        VIOLATIONS_ENDPOINT
    }

    fn failure_context(&self) -> &'static str {
        "Failed to load violations"
    }

    fn render(&mut self, snapshot: Vec<ViolationRecord>) {
        self.table.render(&snapshot);
    }

    fn title(&self) -> &'static str {
        "Violations"
    }

    fn markup(&self) -> String {
        format!(
            concat!(
                "<div class=\"controls\"><span id=\"violationCount\">{}</span></div>",
                "<table><thead><tr><th>Plate</th><th>Lot</th><th>Duration</th>",
                "<th>Status</th><th>Reason</th></tr></thead>{}</table>"
            ),
            format::violation_count_label(self.table.len()),
            self.table.markup()
        )
    }
}
