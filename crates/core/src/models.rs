//! Shared domain models.
//!
//! Everything here is an ephemeral, possibly stale copy of state that is
//! authoritative on the backend. Money fields are decimal strings on the
//! wire and [`Decimal`] in memory; they never pass through binary floats.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Canonical transaction direction.
///
/// The backend has been observed sending both `credit`/`debit` and the
/// single-letter `C`/`D` spellings; all four decode here, at the resource
/// boundary, and nowhere else. Serializes as `credit`/`debit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money into the account.
    Credit,
    /// Money out of the account.
    Debit,
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "credit" | "C" => Ok(Direction::Credit),
            "debit" | "D" => Ok(Direction::Debit),
            other => Err(de::Error::unknown_variant(other, &["credit", "debit", "C", "D"])),
        }
    }
}

/// Operator role on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    /// Facility staff with full access.
    Admin,
    /// Regular member.
    User,
}

/// Full user profile from the users or auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Phone number; the lookup key staff use at point of service.
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Role of this user.
    pub user_type: UserType,
    /// Creation timestamp, when the endpoint includes it.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last-update timestamp, when the endpoint includes it.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// `First Last` label for display.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Abbreviated user embedded in card and account responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Phone number.
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
}

/// Abbreviated card embedded in account responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInfo {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Name printed on the card.
    pub name_on_card: String,
    /// Whether the card is blocked.
    #[serde(default)]
    pub is_blocked: bool,
}

/// An NFC/RFID payment card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Name printed on the card.
    pub name_on_card: String,
    /// Blocked flag; authoritative on the backend.
    #[serde(default)]
    pub is_blocked: bool,
    /// Holder name, absent for unassigned cards.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Holder phone, absent for unassigned cards.
    #[serde(default)]
    pub user_phone: Option<String>,
    /// Account balance, when the list endpoint includes it.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub balance: Option<Decimal>,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl Card {
    /// Whether the card is linked to a user.
    pub fn is_assigned(&self) -> bool {
        self.user_phone.is_some()
    }

    /// An unassigned card is implicitly blocked regardless of its flag.
    pub fn is_usable(&self) -> bool {
        self.is_assigned() && !self.is_blocked
    }
}

/// An immutable ledger entry belonging to an account.
///
/// Append-only from the client's perspective: nothing in this crate
/// updates or deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Owning account, when the endpoint includes it.
    #[serde(default)]
    pub account: Option<Uuid>,
    /// Credit or debit, decoded from any of the observed spellings.
    #[serde(rename = "transaction_type")]
    pub direction: Direction,
    /// Absolute amount moved.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Account balance after this entry, when the endpoint includes it.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub balance_after: Option<Decimal>,
    /// Creation timestamp.
    pub created: DateTime<Utc>,
}

impl Transaction {
    /// Amount with its sign applied: positive for credits, negative for debits.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

/// A balance-holding account behind a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Current balance. Authoritative only as of the fetch; any sums the
    /// client computes over these are presentational.
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    /// Owning user, when the endpoint includes it.
    #[serde(default)]
    pub user_info: Option<UserInfo>,
    /// Linked card, when the endpoint includes it.
    #[serde(default)]
    pub card_info: Option<CardInfo>,
    /// Ledger entries, on detail endpoints.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Storage history, on detail endpoints.
    #[serde(default)]
    pub storage_activities: Vec<StorageEntry>,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

/// A commodity checked into cold storage against an account.
///
/// The backend also sends an `is_active` flag; it is deliberately not
/// stored so that [`StorageEntry::is_active`] can never disagree with
/// `check_out`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Backend identifier.
    pub uuid: Uuid,
    /// Account the entry bills against.
    #[serde(default)]
    pub account_uuid: Option<Uuid>,
    /// Holder name, for list display.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Holder phone, for list display.
    #[serde(default)]
    pub user_phone: Option<String>,
    /// What is stored.
    pub commodity: String,
    /// Weight in kilograms, as a decimal string on the wire.
    #[serde(with = "rust_decimal::serde::str")]
    pub weight: Decimal,
    /// Check-in timestamp.
    pub check_in: DateTime<Utc>,
    /// Actual check-out timestamp; `None` while the entry is active.
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    /// Check-out estimate given at check-in.
    pub estimated_check_out: DateTime<Utc>,
    /// Billing rate per hour. Always stored hourly; use
    /// [`daily_rate`] for the per-day display figure.
    #[serde(with = "rust_decimal::serde::str")]
    pub hourly_rate: Decimal,
    /// Creation timestamp.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl StorageEntry {
    /// Active while no actual check-out has been recorded.
    pub fn is_active(&self) -> bool {
        self.check_out.is_none()
    }

    /// Per-day rate derived from the stored hourly rate.
    pub fn daily_rate(&self) -> Decimal {
        daily_rate(self.hourly_rate)
    }
}

/// Convert the canonical hourly rate to a daily one. The only place the
/// 24x conversion is allowed to appear.
pub fn daily_rate(hourly: Decimal) -> Decimal {
    hourly * Decimal::from(24)
}
