use serde::{Deserialize, Serialize};

use crate::date::decode_date_time;
use crate::fields::{integer, text};
use crate::loans::join_name;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, deserialize_with = "integer")]
    pub id: i64,
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub phone: String,
    #[serde(default, deserialize_with = "text")]
    pub created_at: String,
}

impl Customer {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn created_date(&self) -> String {
        decode_date_time(&self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_customer_record() {
        let customer: Customer = serde_json::from_value(json!({
            "id": 1204,
            "firstName": "Alice",
            "lastName": "Johnson",
            "email": "alice@example.com",
            "phone": null,
            "createdAt": "/Date(1427829732)/"
        }))
        .unwrap();

        assert_eq!(customer.id, 1204);
        assert_eq!(customer.full_name(), "Alice Johnson");
        assert_eq!(customer.phone, "");
        assert_eq!(customer.created_date(), "2015-03-31 19:22:12 UTC");
    }

    #[test]
    fn missing_last_name_is_not_padded() {
        let customer = Customer {
            first_name: "Cher".to_string(),
            ..Customer::default()
        };
        assert_eq!(customer.full_name(), "Cher");
    }
}
