use serde::{Deserialize, Serialize};

use crate::date::{decode_date, decode_date_time};
use crate::envelope::Collection;
use crate::fields::{list, non_empty, text};
use crate::payments::Payment;

pub const NOT_AVAILABLE: &str = "N/A";

/// A loan as returned by either the expanded single-entity fetch or the search
/// index.
///
/// The same business fact can live in three places: the flattened search
/// fields, the last `StatusArchive` snapshot, and the expanded sub-records.
/// The accessor methods reconcile them; the raw fields are kept as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub display_id: String,
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub active: String,
    #[serde(default, deserialize_with = "text")]
    pub archived: String,
    #[serde(default, deserialize_with = "text")]
    pub created: String,

    #[serde(rename = "LoanSettings", default)]
    pub settings: Option<LoanSettings>,
    #[serde(rename = "LoanSetup", default)]
    pub setup: Option<LoanSetup>,
    #[serde(rename = "Customers", default)]
    pub expanded_customers: Option<Collection<LoanCustomer>>,
    #[serde(rename = "StatusArchive", default)]
    pub status_archive: Option<Collection<StatusSnapshot>>,
    #[serde(rename = "Payments", default)]
    pub payments: Option<Collection<Payment>>,

    // Flattened search-index fields.
    #[serde(default, deserialize_with = "text")]
    pub primary_customer_name: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_status_text: String,
    #[serde(default, deserialize_with = "text")]
    pub principal_balance: String,
    #[serde(default, deserialize_with = "text")]
    pub days_past_due: String,
    #[serde(default, deserialize_with = "text")]
    pub next_payment_amount: String,
    #[serde(default, deserialize_with = "text")]
    pub next_payment_date: String,
    #[serde(default, deserialize_with = "list")]
    pub customers: Vec<LoanCustomer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSettings {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_status_id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_sub_status_id: String,
    #[serde(default, deserialize_with = "text")]
    pub autopay_enabled: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSetup {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "text")]
    pub contract_date: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_type: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_class: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_amount: String,
    #[serde(default, deserialize_with = "text")]
    pub payment: String,
    #[serde(default, deserialize_with = "text")]
    pub first_payment_date: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_rate: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_term: String,
}

/// Customer summary embedded in a loan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanCustomer {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
}

impl LoanCustomer {
    /// First and last name joined by a space, skipping missing parts.
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// One historical status snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "text")]
    pub date: String,
    #[serde(default, deserialize_with = "text")]
    pub principal_balance: String,
    #[serde(default, deserialize_with = "text")]
    pub payoff: String,
    #[serde(default, deserialize_with = "text")]
    pub amount_due: String,
    #[serde(default, deserialize_with = "text")]
    pub days_past_due: String,
    #[serde(default, deserialize_with = "text")]
    pub next_payment_date: String,
    #[serde(default, deserialize_with = "text")]
    pub next_payment_amount: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_status_text: String,
}

pub(crate) fn join_name(first: &str, last: &str) -> String {
    match (first.trim(), last.trim()) {
        ("", "") => String::new(),
        (first, "") => first.to_string(),
        ("", last) => last.to_string(),
        (first, last) => format!("{first} {last}"),
    }
}

impl Loan {
    /// The most recent archive snapshot. The archive arrives oldest first and
    /// is never re-sorted here.
    pub fn latest_status(&self) -> Option<&StatusSnapshot> {
        self.status_archive
            .as_ref()
            .and_then(|archive| archive.results.last())
    }

    fn from_archive<'a>(&'a self, field: fn(&'a StatusSnapshot) -> &'a str) -> Option<&'a str> {
        self.latest_status().and_then(|status| non_empty(field(status)))
    }

    pub fn is_active(&self) -> bool {
        self.active == "1"
    }

    pub fn loan_status(&self) -> String {
        if let Some(status) = non_empty(&self.loan_status_text)
            .or_else(|| self.from_archive(|s| &s.loan_status_text))
        {
            return status.to_string();
        }
        self.settings
            .as_ref()
            .and_then(|settings| non_empty(&settings.loan_status_id))
            .map(|id| format!("Status ID: {id}"))
            .unwrap_or_default()
    }

    pub fn principal_balance(&self) -> String {
        non_empty(&self.principal_balance)
            .or_else(|| self.from_archive(|s| &s.principal_balance))
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    /// Only the archive carries a payoff figure.
    pub fn payoff_amount(&self) -> String {
        self.from_archive(|s| &s.payoff)
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    /// A flattened `"0"` is a real value and wins over the archive.
    pub fn days_past_due(&self) -> String {
        non_empty(&self.days_past_due)
            .or_else(|| self.from_archive(|s| &s.days_past_due))
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    pub fn next_payment_amount(&self) -> String {
        non_empty(&self.next_payment_amount)
            .or_else(|| self.from_archive(|s| &s.next_payment_amount))
            .or_else(|| self.setup.as_ref().and_then(|setup| non_empty(&setup.payment)))
            .map(str::to_string)
            .unwrap_or_default()
    }

    pub fn next_payment_date(&self) -> String {
        non_empty(&self.next_payment_date)
            .or_else(|| self.from_archive(|s| &s.next_payment_date))
            .or_else(|| {
                self.setup
                    .as_ref()
                    .and_then(|setup| non_empty(&setup.first_payment_date))
            })
            .map(decode_date)
            .unwrap_or_default()
    }

    pub fn primary_customer_name(&self) -> String {
        if let Some(name) = non_empty(&self.primary_customer_name) {
            return name.to_string();
        }
        let from_search = self.customers.first().map(LoanCustomer::full_name);
        let from_expansion = || {
            self.expanded_customers
                .as_ref()
                .and_then(|customers| customers.results.first())
                .map(LoanCustomer::full_name)
        };
        from_search
            .filter(|name| !name.is_empty())
            .or_else(from_expansion)
            .unwrap_or_default()
    }

    pub fn loan_amount(&self) -> String {
        self.setup
            .as_ref()
            .map(|setup| setup.loan_amount.clone())
            .unwrap_or_default()
    }

    pub fn contract_date(&self) -> String {
        self.setup
            .as_ref()
            .map(|setup| decode_date(&setup.contract_date))
            .unwrap_or_default()
    }

    pub fn created_date(&self) -> String {
        decode_date_time(&self.created)
    }

    /// Payments embedded by a `$expand=Payments` fetch.
    pub fn payment_history(&self) -> &[Payment] {
        self.payments
            .as_ref()
            .map(|payments| payments.results.as_slice())
            .unwrap_or_default()
    }
}
