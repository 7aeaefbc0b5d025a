use serde::Deserialize;

/// Sentinel the backend writes into `timeOut` and `status` while a vehicle is parked.
pub const STILL_IN_LOT: &str = "Still In Lot";

/// Three-way occupancy classification. Anything the backend sends that is not
/// green or yellow is treated as red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AvailabilityColor {
    Green,
    Yellow,
    Red,
}

impl From<String> for AvailabilityColor {
    fn from(s: String) -> Self {
        match s.as_str() {
            "green" => AvailabilityColor::Green,
            "yellow" => AvailabilityColor::Yellow,
            _ => AvailabilityColor::Red,
        }
    }
}

impl AvailabilityColor {
    pub fn name(self) -> &'static str {
        match self {
            AvailabilityColor::Green => "green",
            AvailabilityColor::Yellow => "yellow",
            AvailabilityColor::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSummary {
    pub lot_name: String,
    pub capacity: u32,
    pub in_lot_now: u32,
    /// Capacity minus occupancy; negative when a lot is over capacity.
    pub available_now: i64,
    #[serde(default)]
    pub occupancy_percent: f64,
    pub availability_color: AvailabilityColor,
    #[serde(default)]
    pub total_sessions: u32,
    #[serde(default)]
    pub violations_count: u32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TimeOut {
    StillInLot,
    At(String),
}

impl From<String> for TimeOut {
    fn from(s: String) -> Self {
        if s == STILL_IN_LOT {
            TimeOut::StillInLot
        } else {
            TimeOut::At(s)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisteredRecord {
    pub license_plate: String,
    pub lot_name: String,
    pub time_in: String,
    pub time_out: TimeOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ViolationStatus {
    StillInLot,
    Other(String),
}

impl From<String> for ViolationStatus {
    fn from(s: String) -> Self {
        if s == STILL_IN_LOT {
            ViolationStatus::StillInLot
        } else {
            ViolationStatus::Other(s)
        }
    }
}

impl ViolationStatus {
    pub fn label(&self) -> &str {
        match self {
            ViolationStatus::StillInLot => STILL_IN_LOT,
            ViolationStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ViolationReason {
    Unregistered,
    Overstay,
    Other(String),
}

impl From<String> for ViolationReason {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Unregistered" => ViolationReason::Unregistered,
            "Overstay" => ViolationReason::Overstay,
            _ => ViolationReason::Other(s),
        }
    }
}

impl ViolationReason {
    pub fn label(&self) -> &str {
        match self {
            ViolationReason::Unregistered => "Unregistered",
            ViolationReason::Overstay => "Overstay",
            ViolationReason::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    pub license_plate: String,
    pub lot_name: String,
    pub duration_minutes: u32,
    pub status: ViolationStatus,
    pub reason: ViolationReason,
    #[serde(default)]
    pub time_in: Option<String>,
    #[serde(default)]
    pub time_out: Option<String>,
}

/// Body of `POST /api/reload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reload_timestamp: Option<String>,
}

/// Identity of a record across refresh cycles.
pub trait Keyed {
    fn key(&self) -> String;
}

impl Keyed for LotSummary {
    fn key(&self) -> String {
        self.lot_name.clone()
    }
}

impl Keyed for UnregisteredRecord {
    fn key(&self) -> String {
        format!("{}|{}", self.license_plate, self.lot_name)
    }
}

impl Keyed for ViolationRecord {
    fn key(&self) -> String {
        format!("{}|{}", self.license_plate, self.lot_name)
    }
}
