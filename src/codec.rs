// 📦 Persistence Codec - Expense sequence <-> single JSON payload
//
// Payload shape (one JSON array, insertion order preserved):
//   [{"id": "<uuid>", "name": "Coffee", "type": "Personal",
//     "amount": 4.5, "date": "2025-06-25T08:00:00Z"}, ...]
//
// Older payloads written by the iOS app store `date` as seconds since
// 2001-01-01T00:00:00Z and ids in uppercase; both decode here.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ExpenseCategory, ExpenseItem};

/// 2001-01-01T00:00:00Z as a Unix timestamp
const REFERENCE_DATE_UNIX: i64 = 978_307_200;

// ============================================================================
// WIRE RECORDS
// ============================================================================

#[derive(Serialize)]
struct StoredItemRef<'a> {
    id: Uuid,
    name: &'a str,
    #[serde(rename = "type")]
    category: ExpenseCategory,
    amount: f64,
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredItem {
    id: Uuid,
    name: String,
    #[serde(rename = "type")]
    category: ExpenseCategory,
    amount: f64,
    date: StoredDate,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDate {
    Timestamp(DateTime<Utc>),
    ReferenceSeconds(f64),
}

impl StoredDate {
    fn into_datetime(self) -> Result<DateTime<Utc>> {
        match self {
            StoredDate::Timestamp(date) => Ok(date),
            StoredDate::ReferenceSeconds(secs) => {
                anyhow::ensure!(secs.is_finite(), "Non-finite reference date: {}", secs);

                let whole = secs.floor();
                let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
                let unix = REFERENCE_DATE_UNIX
                    .checked_add(whole as i64)
                    .with_context(|| format!("Reference date out of range: {}", secs))?;

                Utc.timestamp_opt(unix, nanos)
                    .single()
                    .with_context(|| format!("Reference date out of range: {}", secs))
            }
        }
    }
}

impl StoredItem {
    fn into_item(self) -> Result<ExpenseItem> {
        let date = self
            .date
            .into_datetime()
            .with_context(|| format!("Invalid date for expense {}", self.id))?;

        Ok(ExpenseItem::from_parts(self.id, self.name, self.category, self.amount, date))
    }
}

// ============================================================================
// ENCODE / DECODE
// ============================================================================

/// Encode the whole sequence into one payload string
pub fn encode(items: &[ExpenseItem]) -> Result<String> {
    let records: Vec<StoredItemRef<'_>> = items
        .iter()
        .map(|item| StoredItemRef {
            id: item.id(),
            name: item.name(),
            category: item.category(),
            amount: item.amount(),
            date: item.date(),
        })
        .collect();

    serde_json::to_string(&records).context("Failed to encode expenses")
}

/// Decode a payload, reporting why it could not be read.
///
/// All-or-nothing: one malformed element rejects the whole payload.
pub fn try_decode(payload: &str) -> Result<Vec<ExpenseItem>> {
    let records: Vec<StoredItem> =
        serde_json::from_str(payload).context("Failed to parse expenses payload")?;

    records.into_iter().map(StoredItem::into_item).collect()
}

/// Decode a possibly absent payload; anything unreadable is "no data"
pub fn decode(payload: Option<&str>) -> Vec<ExpenseItem> {
    payload
        .and_then(|payload| try_decode(payload).ok())
        .unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================
