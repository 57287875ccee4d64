//! Usage history lookup for a single reel.

use chrono::FixedOffset;
use serde::Serialize;

use crate::error::AppError;
use crate::format;
use crate::models::{ReelUsageHistory, UsageEvent};

/// Trim a barcode entered by the user, rejecting blank input
pub fn validate_barcode(raw: &str) -> Result<String, AppError> {
    let barcode = raw.trim();
    if barcode.is_empty() {
        return Err(AppError::validation("Please enter a barcode ID."));
    }
    Ok(barcode.to_string())
}

/// One usage event flattened into the fields a table row and a sticker show
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintRecord {
    pub client: String,
    pub product_type: String,
    pub quantity: String,
    pub size: String,
    pub unit: String,
    pub box_count: String,
    pub weight_consumed: String,
    pub previous_weight: String,
    pub usage_type: String,
    pub date_in: String,
    pub date_out: String,
}

impl PrintRecord {
    pub fn from_event(event: &UsageEvent, offset: &FixedOffset) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        PrintRecord {
            client: text(&event.client_name),
            product_type: text(&event.product_type),
            quantity: text(&event.quantity),
            size: text(&event.size),
            unit: text(&event.unit),
            box_count: text(&event.box_count),
            weight_consumed: format::weight(event.weight_consumed),
            previous_weight: format::weight(event.previous_weight),
            usage_type: text(&event.usage_type),
            date_in: format::long_date_time(event.corrugation_in.as_deref(), offset),
            date_out: format::date_out(event.corrugation_out.as_deref(), offset),
        }
    }
}

/// Print-ready records, one per usage event, in backend order
pub fn print_records(history: &ReelUsageHistory, offset: &FixedOffset) -> Vec<PrintRecord> {
    history
        .usages
        .iter()
        .map(|event| PrintRecord::from_event(event, offset))
        .collect()
}

/// Lifecycle of a barcode lookup
#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Loading { barcode: String },
    Loaded { barcode: String, history: ReelUsageHistory },
    Failed { barcode: String, message: String },
}

impl LookupState {
    /// Printing needs loaded history with at least one usage
    pub fn can_print(&self) -> bool {
        matches!(self, LookupState::Loaded { history, .. } if !history.usages.is_empty())
    }
}

/// Handle for one issued lookup; only the newest ticket may commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    barcode: String,
}

impl Ticket {
    pub fn barcode(&self) -> &str {
        &self.barcode
    }
}

/// Barcode lookup state machine with a request-generation counter
///
/// Every [`begin`](HistoryLookup::begin) supersedes earlier lookups. A result
/// arriving for a superseded ticket is discarded, so the last issued request
/// wins regardless of the order responses arrive in.
#[derive(Debug, Clone)]
pub struct HistoryLookup {
    generation: u64,
    state: LookupState,
}

impl Default for HistoryLookup {
    fn default() -> Self {
        HistoryLookup {
            generation: 0,
            state: LookupState::Idle,
        }
    }
}

impl HistoryLookup {
    pub fn state(&self) -> &LookupState {
        &self.state
    }

    /// Validate `raw` and move to `Loading`; blank input leaves the state untouched
    pub fn begin(&mut self, raw: &str) -> Result<Ticket, AppError> {
        let barcode = validate_barcode(raw)?;
        self.generation += 1;
        self.state = LookupState::Loading {
            barcode: barcode.clone(),
        };
        Ok(Ticket {
            generation: self.generation,
            barcode,
        })
    }

    /// Apply the outcome of `ticket`'s request; returns false if it was stale
    pub fn commit(&mut self, ticket: &Ticket, result: Result<ReelUsageHistory, AppError>) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "dropping stale usage history for {} (generation {} < {})",
                ticket.barcode,
                ticket.generation,
                self.generation
            );
            return false;
        }
        let barcode = ticket.barcode.clone();
        self.state = match result {
            Ok(history) => LookupState::Loaded { barcode, history },
            Err(e) => LookupState::Failed {
                barcode,
                message: e.to_string(),
            },
        };
        true
    }
}
