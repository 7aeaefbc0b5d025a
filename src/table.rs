//! Keyed table body shared by the record pages.

use crate::reconcile::{reconcile, ElementId, IdAllocator, KeyedEntities, Materializer, ReconcileStats};
use crate::format::row_class;
use crate::types::Keyed;
use std::marker::PhantomData;

/// Per-row view model bound to `<td>` cells.
pub trait RowView {
    type Record: Keyed;

    fn from_record(record: &Self::Record) -> Self;

    /// Cells after the optional row-number column, already escaped.
    fn cells(&self) -> String;
}

#[derive(Debug)]
pub struct Row<V> {
    pub id: ElementId,
    pub view: V,
}

/// Text shown in place of the rows when a snapshot is empty.
#[derive(Debug, Clone, Copy)]
pub struct Placeholder {
    pub title: &'static str,
    pub detail: Option<&'static str>,
}

struct RowBuilder<'a, V> {
    ids: &'a mut IdAllocator,
    view: PhantomData<V>,
}

impl<'a, V: RowView> Materializer<V::Record> for RowBuilder<'a, V> {
    type Entity = Row<V>;

    fn create(&mut self, _key: &str, record: &V::Record) -> Row<V> {
        Row {
            id: self.ids.allocate(),
            view: V::from_record(record),
        }
    }

    fn update(&mut self, row: &mut Row<V>, record: &V::Record) {
        row.view = V::from_record(record);
    }

    fn remove(&mut self, _key: &str, _row: Row<V>) {}
}

pub struct RowTable<V> {
    body_id: &'static str,
    columns: usize,
    numbered: bool,
    placeholder: Placeholder,
    ids: IdAllocator,
    rows: KeyedEntities<Row<V>>,
}

impl<V: RowView> RowTable<V> {
    pub fn new(body_id: &'static str, columns: usize, numbered: bool, placeholder: Placeholder) -> Self {
        RowTable {
            body_id,
            columns,
            numbered,
            placeholder,
            ids: IdAllocator::default(),
            rows: KeyedEntities::default(),
        }
    }

    pub fn render(&mut self, records: &[V::Record]) -> ReconcileStats {
        let previous = std::mem::take(&mut self.rows);
        let mut builder = RowBuilder {
            ids: &mut self.ids,
            view: PhantomData,
        };
        let (rows, stats) = reconcile(previous, records, &mut builder);
        self.rows = rows;
        stats
    }

    pub fn row(&self, key: &str) -> Option<&Row<V>> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn markup(&self) -> String {
        let mut out = format!("<tbody id=\"{}\">", self.body_id);
        if self.is_empty() {
            out.push_str(&format!(
                "<tr class=\"placeholder\"><td colspan=\"{}\"><div class=\"font-semibold\">{}</div>",
                self.columns, self.placeholder.title
            ));
            if let Some(detail) = self.placeholder.detail {
                out.push_str(&format!("<div class=\"text-sm\">{}</div>", detail));
            }
            out.push_str("</td></tr>");
        }
        for (index, (_, row)) in self.rows.iter().enumerate() {
            out.push_str(&format!(
                "<tr class=\"{}\" data-id=\"{}\">",
                row_class(index),
                row.id
            ));
            if self.numbered {
                out.push_str(&format!("<td class=\"idx\">{}</td>", index + 1));
            }
            out.push_str(&row.view.cells());
            out.push_str("</tr>");
        }
        out.push_str("</tbody>");
        out
    }
}
