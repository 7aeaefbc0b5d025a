use crate::format::escape;
use chrono::{DateTime, Local, TimeZone};

/// Single global error line. Last writer wins.
#[derive(Debug, Default)]
pub struct ErrorBanner {
    message: Option<String>,
}

impl ErrorBanner {
    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    /// Banner text as displayed, or `None` while hidden.
    pub fn text(&self) -> Option<String> {
        self.message.as_ref().map(|m| format!("⚠ {}", m))
    }

    pub fn markup(&self) -> String {
        match self.text() {
            Some(text) => format!(
                "<div id=\"errorBanner\" class=\"banner\"><div>{}</div></div>",
                escape(&text)
            ),
            None => "<div id=\"errorBanner\" class=\"banner hidden\"></div>".to_string(),
        }
    }
}

pub const SLOT_HEADER: &str = "header";
pub const SLOT_FOOTER: &str = "footer";

/// Writes "Last updated" text into every registered display slot.
#[derive(Debug)]
pub struct TimestampStamper {
    slots: Vec<(&'static str, String)>,
    last: Option<DateTime<Local>>,
}

impl Default for TimestampStamper {
    fn default() -> Self {
        TimestampStamper::new(&[SLOT_HEADER, SLOT_FOOTER])
    }
}

impl TimestampStamper {
    pub fn new(slots: &[&'static str]) -> Self {
        TimestampStamper {
            slots: slots.iter().map(|s| (*s, String::new())).collect(),
            last: None,
        }
    }

    pub fn stamp(&mut self) {
        self.stamp_at(Local::now());
    }

    /// A clock that steps backwards leaves the displayed time where it was.
    pub fn stamp_at<Tz: TimeZone>(&mut self, at: DateTime<Tz>) {
        let at = at.with_timezone(&Local);
        if let Some(last) = self.last {
            if at < last {
                return;
            }
        }
        let text = format!("Last updated: {}", at.format("%b %-d, %Y, %I:%M:%S %p"));
        for (_, slot) in self.slots.iter_mut() {
            slot.clone_from(&text);
        }
        self.last = Some(at);
    }

    pub fn slot(&self, id: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|(name, _)| *name == id)
            .map(|(_, text)| text.as_str())
    }
}
