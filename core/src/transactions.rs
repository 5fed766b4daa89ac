use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date::decode_date;
use crate::fields::{is_zero_amount, text};

/// One ledger entry of a loan.
///
/// A record describes either a payment being applied or a charge being
/// assessed. Both breakdowns are carried as received and never derived from
/// each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub tx_id: String,
    #[serde(default, deserialize_with = "text")]
    pub entity_type: String,
    #[serde(default, deserialize_with = "text")]
    pub entity_id: String,
    #[serde(default, deserialize_with = "text")]
    pub mod_id: String,
    #[serde(default, deserialize_with = "text")]
    pub date: String,
    #[serde(default, deserialize_with = "text")]
    pub period: String,
    #[serde(default, deserialize_with = "text")]
    pub period_start: String,
    #[serde(default, deserialize_with = "text")]
    pub period_end: String,
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "text")]
    pub kind: String,
    #[serde(default, deserialize_with = "text")]
    pub info_only: String,
    #[serde(default, deserialize_with = "text")]
    pub info_details: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_id: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_display_id: String,

    #[serde(default, deserialize_with = "text")]
    pub payment_amount: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_interest: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_principal: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_discount: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_fees: String,
    #[serde(default, deserialize_with = "text")]
    pub fees_paid_details: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_escrow: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_escrow_breakdown: String,

    #[serde(default, deserialize_with = "text")]
    pub charge_amount: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_interest: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_principal: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_discount: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_fees: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_escrow: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_escrow_breakdown: String,

    #[serde(default, deserialize_with = "text")]
    pub future: String,
    #[serde(default, deserialize_with = "text")]
    pub principal_only: String,
    #[serde(default, deserialize_with = "text")]
    pub advancement: String,
    #[serde(default, deserialize_with = "text")]
    pub payoff_fee: String,
    #[serde(default, deserialize_with = "text")]
    pub charge_off: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_type: String,
    #[serde(default, deserialize_with = "text")]
    pub adb_days: String,
    #[serde(default, deserialize_with = "text")]
    pub adb: String,
    #[serde(default, deserialize_with = "text")]
    pub principal_balance: String,
    #[serde(default, deserialize_with = "text")]
    pub display_order: String,
}

/// The principal/interest/fees/escrow split of one side of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakdown<'a> {
    pub principal: &'a str,
    pub interest: &'a str,
    pub fees: &'a str,
    pub escrow: &'a str,
}

impl<'a> Breakdown<'a> {
    pub fn is_present(self) -> bool {
        self.parts().iter().any(|(_, amount)| !is_zero_amount(amount))
    }

    /// Labelled components in display order.
    pub fn parts(self) -> [(&'static str, &'a str); 4] {
        [
            ("Principal", self.principal),
            ("Interest", self.interest),
            ("Fees", self.fees),
            ("Escrow", self.escrow),
        ]
    }

    pub fn non_zero_parts(self) -> impl Iterator<Item = (&'static str, &'a str)> {
        self.parts()
            .into_iter()
            .filter(|(_, amount)| !is_zero_amount(amount))
    }
}

impl Transaction {
    pub fn is_info_only(&self) -> bool {
        self.info_only == "1"
    }

    pub fn is_future(&self) -> bool {
        self.future == "1"
    }

    /// Single display amount: payment side first, then charge side.
    pub fn amount(&self) -> &str {
        if !is_zero_amount(&self.payment_amount) {
            &self.payment_amount
        } else if !is_zero_amount(&self.charge_amount) {
            &self.charge_amount
        } else {
            "0"
        }
    }

    pub fn status(&self) -> &'static str {
        if self.is_info_only() {
            "Info Only"
        } else if self.is_future() {
            "Future"
        } else {
            "Active"
        }
    }

    pub fn date(&self) -> String {
        decode_date(&self.date)
    }

    pub fn payment_breakdown(&self) -> Breakdown<'_> {
        Breakdown {
            principal: &self.payment_principal,
            interest: &self.payment_interest,
            fees: &self.payment_fees,
            escrow: &self.payment_escrow,
        }
    }

    pub fn charge_breakdown(&self) -> Breakdown<'_> {
        Breakdown {
            principal: &self.charge_principal,
            interest: &self.charge_interest,
            fees: &self.charge_fees,
            escrow: &self.charge_escrow,
        }
    }

    pub fn has_payment_breakdown(&self) -> bool {
        self.payment_breakdown().is_present()
    }

    pub fn has_charge_breakdown(&self) -> bool {
        self.charge_breakdown().is_present()
    }

    /// Decoded period bounds, or `None` for entries outside any period.
    pub fn period_range(&self) -> Option<(String, String)> {
        if self.period_start.is_empty() || self.period.is_empty() || self.period == "0" {
            return None;
        }
        Some((decode_date(&self.period_start), decode_date(&self.period_end)))
    }

    /// `infoDetails` rendered as sorted `key: value` pairs. Text that is not a JSON
    /// object is returned as received.
    pub fn info_summary(&self) -> String {
        if self.info_details.is_empty() {
            return String::new();
        }
        let Ok(Value::Object(details)) = serde_json::from_str::<Value>(&self.info_details) else {
            return self.info_details.clone();
        };
        let mut pairs: Vec<String> = details
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect();
        pairs.sort();
        pairs.join(", ")
    }
}
