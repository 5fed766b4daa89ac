use serde::{Deserialize, Serialize};

use crate::date::decode_date;
use crate::fields::text;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub loan_id: String,
    #[serde(default, deserialize_with = "text")]
    pub date: String,
    #[serde(default, deserialize_with = "text")]
    pub amount: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_type_id: String,
    #[serde(default, deserialize_with = "text")]
    pub payment_method_id: String,
    #[serde(default, deserialize_with = "text")]
    pub info: String,
    #[serde(default, deserialize_with = "text")]
    pub active: String,
}

impl Payment {
    pub fn is_active(&self) -> bool {
        self.active == "1"
    }

    pub fn status(&self) -> &'static str {
        if self.is_active() { "Active" } else { "Inactive" }
    }

    pub fn date(&self) -> String {
        decode_date(&self.date)
    }
}
