//! Lot markers on a map widget.
//!
//! The widget itself sits behind [`MapSurface`]. [`MarkerLayer`] keeps one
//! marker per lot name and restyles it in place every cycle, so the viewport
//! and any open popup survive a refresh.

use crate::format::{self, escape};
use crate::reconcile::{reconcile, KeyedEntities, Materializer, ReconcileStats};
use crate::types::LotSummary;
use std::collections::BTreeMap;

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.5028,
    lng: -74.4490,
};
pub const DEFAULT_ZOOM: u8 = 14;
pub const FOCUS_ZOOM: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub fill_color: &'static str,
    pub radius: u32,
    pub fill_opacity: f64,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    pub label: &'static str,
    pub value: String,
    pub color: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<PopupRow>,
}

impl Popup {
    pub fn to_html(&self) -> String {
        let rows: String = self
            .rows
            .iter()
            .map(|row| {
                let style = match row.color {
                    Some(color) => format!(" style=\"color:{}\"", color),
                    None => String::new(),
                };
                format!(
                    "<tr><td>{}</td><td class=\"num\"{}>{}</td></tr>",
                    row.label,
                    style,
                    escape(&row.value)
                )
            })
            .collect();
        format!(
            "<div class=\"popup\"><div class=\"popup-title\">{}</div><table>{}</table></div>",
            escape(&self.title),
            rows
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerContent {
    pub style: MarkerStyle,
    pub popup: Popup,
    pub tooltip: String,
}

impl MarkerContent {
    pub fn for_lot(lot: &LotSummary) -> Self {
        let color = format::marker_color(lot.availability_color);
        MarkerContent {
            style: MarkerStyle {
                color,
                fill_color: color,
                radius: 14,
                fill_opacity: 0.85,
                weight: 2,
            },
            popup: Popup {
                title: lot.lot_name.clone(),
                rows: vec![
                    PopupRow {
                        label: "Capacity",
                        value: lot.capacity.to_string(),
                        color: None,
                    },
                    PopupRow {
                        label: "In Lot Now",
                        value: lot.in_lot_now.to_string(),
                        color: None,
                    },
                    PopupRow {
                        label: "Available",
                        value: lot.available_now.to_string(),
                        color: Some(color),
                    },
                    PopupRow {
                        label: "Occupancy",
                        value: format!("{:.1}%", lot.occupancy_percent),
                        color: None,
                    },
                ],
            },
            tooltip: format::tooltip(&lot.lot_name, lot.available_now),
        }
    }
}

/// Capabilities the page needs from a mapping widget.
pub trait MapSurface {
    type Marker;

    fn place_marker(&mut self, at: LatLng, content: &MarkerContent) -> Self::Marker;

    fn update_marker(&mut self, marker: &Self::Marker, content: &MarkerContent);

    fn remove_marker(&mut self, marker: Self::Marker);

    fn pan_and_zoom(&mut self, at: LatLng, zoom: u8);

    fn open_popup(&mut self, marker: &Self::Marker);

    /// Bring the map element into the visible part of the page.
    fn scroll_into_view(&mut self);
}

#[derive(Debug)]
pub struct LotMarker<H> {
    pub handle: H,
    pub at: LatLng,
}

struct Placer<'a, S> {
    surface: &'a mut S,
}

impl<'a, S: MapSurface> Materializer<LotSummary> for Placer<'a, S> {
    type Entity = LotMarker<S::Marker>;

    fn create(&mut self, _key: &str, lot: &LotSummary) -> Self::Entity {
        let at = LatLng {
            lat: lot.latitude,
            lng: lot.longitude,
        };
        LotMarker {
            handle: self.surface.place_marker(at, &MarkerContent::for_lot(lot)),
            at,
        }
    }

    fn update(&mut self, marker: &mut Self::Entity, lot: &LotSummary) {
        self.surface
            .update_marker(&marker.handle, &MarkerContent::for_lot(lot));
    }

    fn remove(&mut self, _key: &str, marker: Self::Entity) {
        self.surface.remove_marker(marker.handle);
    }
}

/// Owns the surface and the lot-name → marker registry.
pub struct MarkerLayer<S: MapSurface> {
    surface: S,
    markers: KeyedEntities<LotMarker<S::Marker>>,
}

impl<S: MapSurface> MarkerLayer<S> {
    pub fn new(mut surface: S) -> Self {
        surface.pan_and_zoom(DEFAULT_CENTER, DEFAULT_ZOOM);
        MarkerLayer {
            surface,
            markers: KeyedEntities::default(),
        }
    }

    pub fn render(&mut self, lots: &[LotSummary]) -> ReconcileStats {
        let previous = std::mem::take(&mut self.markers);
        let mut placer = Placer {
            surface: &mut self.surface,
        };
        let (markers, stats) = reconcile(previous, lots, &mut placer);
        self.markers = markers;
        stats
    }

    /// Recenters on the lot and opens its popup. Returns false for unknown keys.
    pub fn focus(&mut self, key: &str) -> bool {
        match self.markers.get(key) {
            Some(marker) => {
                self.surface.pan_and_zoom(marker.at, FOCUS_ZOOM);
                self.surface.open_popup(&marker.handle);
                true
            }
            None => false,
        }
    }

    pub fn scroll_into_view(&mut self) {
        self.surface.scroll_into_view();
    }

    pub fn marker(&self, key: &str) -> Option<&LotMarker<S::Marker>> {
        self.markers.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct SceneMarker {
    pub at: LatLng,
    pub content: MarkerContent,
}

/// Operation counts, mostly of interest to tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SceneOps {
    pub placed: usize,
    pub updated: usize,
    pub removed: usize,
    pub scrolls: usize,
}

/// In-process map scene. Renders to markup for the mirror page.
#[derive(Debug)]
pub struct SceneMap {
    next_id: u64,
    markers: BTreeMap<MarkerId, SceneMarker>,
    center: LatLng,
    zoom: u8,
    open_popup: Option<MarkerId>,
    ops: SceneOps,
}

impl Default for SceneMap {
    fn default() -> Self {
        SceneMap {
            next_id: 0,
            markers: BTreeMap::new(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            open_popup: None,
            ops: SceneOps::default(),
        }
    }
}

impl SceneMap {
    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn open_popup_id(&self) -> Option<MarkerId> {
        self.open_popup
    }

    pub fn marker(&self, id: MarkerId) -> Option<&SceneMarker> {
        self.markers.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn ops(&self) -> SceneOps {
        self.ops
    }

    pub fn markup(&self) -> String {
        let mut out = format!(
            "<div id=\"mapContainer\" data-lat=\"{:.4}\" data-lng=\"{:.4}\" data-zoom=\"{}\"><ul class=\"markers\">",
            self.center.lat, self.center.lng, self.zoom
        );
        for (id, marker) in &self.markers {
            out.push_str(&format!(
                "<li class=\"marker\" data-lat=\"{:.4}\" data-lng=\"{:.4}\" style=\"color:{}\" title=\"{}\">",
                marker.at.lat,
                marker.at.lng,
                marker.content.style.color,
                escape(&marker.content.tooltip)
            ));
            if self.open_popup == Some(*id) {
                out.push_str(&marker.content.popup.to_html());
            }
            out.push_str("</li>");
        }
        out.push_str("</ul></div>");
        out
    }
}

impl MapSurface for SceneMap {
    type Marker = MarkerId;

    fn place_marker(&mut self, at: LatLng, content: &MarkerContent) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.markers.insert(
            id,
            SceneMarker {
                at,
                content: content.clone(),
            },
        );
        self.ops.placed += 1;
        id
    }

    fn update_marker(&mut self, marker: &MarkerId, content: &MarkerContent) {
        if let Some(m) = self.markers.get_mut(marker) {
            m.content = content.clone();
            self.ops.updated += 1;
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        if self.markers.remove(&marker).is_some() {
            self.ops.removed += 1;
        }
        if self.open_popup == Some(marker) {
            self.open_popup = None;
        }
    }

    fn pan_and_zoom(&mut self, at: LatLng, zoom: u8) {
        self.center = at;
        self.zoom = zoom;
    }

    fn open_popup(&mut self, marker: &MarkerId) {
        if self.markers.contains_key(marker) {
            self.open_popup = Some(*marker);
        }
    }

    fn scroll_into_view(&mut self) {
        self.ops.scrolls += 1;
    }
}
