//! Aging report: bucket outstanding balances by days since document date

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-since-document-date band used to classify outstanding balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    /// 0-30 days (also covers future-dated documents)
    Current,
    /// 31-60 days
    ThirtyToSixty,
    /// More than 60 days
    OverSixty,
}

/// Bucket for an elapsed-day count
pub fn bucket_for_days(days_elapsed: i64) -> AgingBucket {
    if days_elapsed <= 30 {
        AgingBucket::Current
    } else if days_elapsed <= 60 {
        AgingBucket::ThirtyToSixty
    } else {
        AgingBucket::OverSixty
    }
}

/// One outstanding document fed into the report. The outstanding amount
/// is the exact unpaid remainder: total_amount minus active allocations.
#[derive(Debug, Clone)]
pub struct AgingInput {
    pub counterparty_id: Uuid,
    pub document_date: NaiveDate,
    pub outstanding: Decimal,
}

/// Per-counterparty aging line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartyAging {
    pub counterparty_id: Uuid,
    pub bucket_0_30: Decimal,
    pub bucket_31_60: Decimal,
    pub bucket_over_60: Decimal,
    pub total_outstanding: Decimal,
    pub document_count: i64,
}

/// Global totals across all counterparties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgingTotals {
    pub bucket_0_30: Decimal,
    pub bucket_31_60: Decimal,
    pub bucket_over_60: Decimal,
    pub total_outstanding: Decimal,
}

/// The full aging report as of a given date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    pub rows: Vec<CounterpartyAging>,
    pub totals: AgingTotals,
}

/// Build the aging report over a snapshot of outstanding documents.
/// Pure function: documents with nothing outstanding contribute nothing,
/// every other document lands in exactly one bucket, and rows come out
/// in counterparty order.
pub fn build_aging(inputs: &[AgingInput], as_of: NaiveDate) -> AgingReport {
    let mut by_counterparty: BTreeMap<Uuid, CounterpartyAging> = BTreeMap::new();
    let mut totals = AgingTotals::default();

    for input in inputs {
        if input.outstanding <= Decimal::ZERO {
            continue;
        }

        let days_elapsed = (as_of - input.document_date).num_days();
        let bucket = bucket_for_days(days_elapsed);

        let row = by_counterparty
            .entry(input.counterparty_id)
            .or_insert_with(|| CounterpartyAging {
                counterparty_id: input.counterparty_id,
                bucket_0_30: Decimal::ZERO,
                bucket_31_60: Decimal::ZERO,
                bucket_over_60: Decimal::ZERO,
                total_outstanding: Decimal::ZERO,
                document_count: 0,
            });

        match bucket {
            AgingBucket::Current => {
                row.bucket_0_30 += input.outstanding;
                totals.bucket_0_30 += input.outstanding;
            }
            AgingBucket::ThirtyToSixty => {
                row.bucket_31_60 += input.outstanding;
                totals.bucket_31_60 += input.outstanding;
            }
            AgingBucket::OverSixty => {
                row.bucket_over_60 += input.outstanding;
                totals.bucket_over_60 += input.outstanding;
            }
        }
        row.total_outstanding += input.outstanding;
        row.document_count += 1;
        totals.total_outstanding += input.outstanding;
    }

    AgingReport {
        as_of,
        rows: by_counterparty.into_values().collect(),
        totals,
    }
}
