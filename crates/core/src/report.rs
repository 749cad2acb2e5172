//! Display-side aggregates computed from fetched resources.
//!
//! Everything here is derived state: non-authoritative values recomputed
//! from the last fetch for display or estimation. The backend's response
//! to a mutating call always supersedes anything computed here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    client::ApiClient,
    error::ApiResult,
    models::{StorageEntry, Transaction},
};

/// Ledger entries kept for the dashboard activity feed.
const RECENT_LIMIT: usize = 8;

/// Aggregate numbers for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    /// Total cards known to the backend.
    pub total_cards: usize,
    /// Cards that are assigned and not blocked.
    pub active_cards: usize,
    /// Storage entries not yet checked out.
    pub active_storages: usize,
    /// Sum of per-account balances. Decimal arithmetic, presentational only.
    pub total_balance: Decimal,
    /// Most recent ledger entries, newest first.
    pub recent_transactions: Vec<Transaction>,
}

/// Fetch everything the dashboard needs concurrently and aggregate.
///
/// The four fetches fan out in parallel and the whole aggregate fails if
/// any one of them fails; rendering stale zeros would be worse than
/// showing the error.
pub async fn load_dashboard(client: &ApiClient) -> ApiResult<DashboardSummary> {
    let cards_api = client.cards();
    let accounts_api = client.accounts();
    let storages_api = client.storages();
    let transactions_api = client.transactions();
    let (cards, accounts, active, mut transactions) = tokio::try_join!(
        cards_api.list(),
        accounts_api.list(),
        storages_api.active(),
        transactions_api.list(),
    )?;

    transactions.sort_by(|a, b| b.created.cmp(&a.created));
    transactions.truncate(RECENT_LIMIT);

    let total_balance: Decimal = accounts.iter().map(|account| account.balance).sum();

    Ok(DashboardSummary {
        total_cards: cards.len(),
        active_cards: cards.iter().filter(|card| card.is_usable()).count(),
        active_storages: active.total_active,
        total_balance,
        recent_transactions: transactions,
    })
}

/// Elapsed storage duration in hours: `(check_out ?? now) - check_in`.
pub fn elapsed_hours(entry: &StorageEntry, now: DateTime<Utc>) -> Decimal {
    let end = entry.check_out.unwrap_or(now);
    let seconds = (end - entry.check_in).num_seconds().max(0);
    Decimal::from(seconds) / Decimal::from(3600)
}

/// Client-side cost preview: elapsed hours times the hourly rate, rounded
/// to two decimal places. The checkout response's `total_cost` is the
/// authoritative charge and must replace this once available.
pub fn estimate_cost(entry: &StorageEntry, now: DateTime<Utc>) -> Decimal {
    (elapsed_hours(entry, now) * entry.hourly_rate).round_dp(2)
}
