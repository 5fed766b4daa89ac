//! Request bodies for the `Autopal.Search()` endpoints.

use serde_json::{Map, Value, json};

/// How a free-text term is matched for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct TextSearch {
    /// Fields covered by the wildcard `query_string` clause.
    pub wildcard_fields: &'static [&'static str],
    /// Fields that also get an exact `match` alternative.
    pub exact_fields: &'static [&'static str],
}

pub const LOAN_TEXT_SEARCH: TextSearch = TextSearch {
    wildcard_fields: &["displayId", "primaryCustomerName", "title"],
    exact_fields: &["displayId", "primaryCustomerName"],
};

pub const CUSTOMER_TEXT_SEARCH: TextSearch = TextSearch {
    wildcard_fields: &["firstName", "lastName", "email", "ssn", "companyName"],
    exact_fields: &["firstName", "lastName"],
};

pub const LOAN_STATUS_FIELD: &str = "loanStatusText";

pub fn loan_search_body(search_term: Option<&str>, status: Option<&str>, size: u64) -> Value {
    let filters: Vec<Value> = status
        .into_iter()
        .map(|status| match_clause(LOAN_STATUS_FIELD, status))
        .collect();
    search_body(&LOAN_TEXT_SEARCH, search_term, filters, size)
}

pub fn customer_search_body(search_term: Option<&str>, size: u64) -> Value {
    search_body(&CUSTOMER_TEXT_SEARCH, search_term, Vec::new(), size)
}

/// Disjunctive text clauses plus conjunctive filters, or `match_all` when
/// neither is given.
pub fn search_body(
    text: &TextSearch,
    search_term: Option<&str>,
    mut filters: Vec<Value>,
    size: u64,
) -> Value {
    let should: Vec<Value> = search_term
        .map(|term| text_clauses(text, term))
        .unwrap_or_default();

    if filters.is_empty() && should.is_empty() {
        return json!({
            "size": size,
            "query": { "match_all": {} }
        });
    }

    let mut bool_query = Map::new();
    if !filters.is_empty() {
        let must = if filters.len() == 1 {
            filters.remove(0)
        } else {
            Value::Array(filters)
        };
        bool_query.insert("must".to_string(), must);
    }
    if !should.is_empty() {
        bool_query.insert("should".to_string(), Value::Array(should));
        bool_query.insert("minimum_should_match".to_string(), json!(1));
    }

    json!({
        "size": size,
        "query": { "bool": bool_query }
    })
}

fn text_clauses(text: &TextSearch, term: &str) -> Vec<Value> {
    let mut clauses = vec![json!({
        "query_string": {
            "query": format!("*{term}*"),
            "fields": text.wildcard_fields,
            "default_operator": "and"
        }
    })];
    clauses.extend(
        text.exact_fields
            .iter()
            .map(|field| match_clause(field, term)),
    );
    clauses
}

fn match_clause(field: &str, value: &str) -> Value {
    let mut inner = Map::new();
    inner.insert(field.to_string(), Value::String(value.to_string()));
    json!({ "match": inner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_criteria_matches_everything() {
        let body = loan_search_body(None, None, 10);
        assert_eq!(body, json!({ "size": 10, "query": { "match_all": {} } }));
    }

    #[test]
    fn loan_term_builds_should_clauses() {
        let body = loan_search_body(Some("LN-1001"), None, 5);
        assert_eq!(
            body,
            json!({
                "size": 5,
                "query": {
                    "bool": {
                        "should": [
                            {
                                "query_string": {
                                    "query": "*LN-1001*",
                                    "fields": ["displayId", "primaryCustomerName", "title"],
                                    "default_operator": "and"
                                }
                            },
                            { "match": { "displayId": "LN-1001" } },
                            { "match": { "primaryCustomerName": "LN-1001" } }
                        ],
                        "minimum_should_match": 1
                    }
                }
            })
        );
    }

    #[test]
    fn single_status_filter_is_an_object() {
        let body = loan_search_body(None, Some("Active"), 10);
        assert_eq!(
            body["query"]["bool"]["must"],
            json!({ "match": { "loanStatusText": "Active" } })
        );
        assert!(body["query"]["bool"].get("should").is_none());
        assert!(body["query"]["bool"].get("minimum_should_match").is_none());
    }

    #[test]
    fn term_and_status_combine() {
        let body = loan_search_body(Some("Smith"), Some("Active"), 10);
        let bool_query = &body["query"]["bool"];
        assert!(bool_query["must"].is_object());
        assert_eq!(bool_query["should"].as_array().map(Vec::len), Some(3));
        assert_eq!(bool_query["minimum_should_match"], json!(1));
    }

    #[test]
    fn several_filters_become_an_array() {
        let filters = vec![
            match_clause("loanStatusText", "Active"),
            match_clause("title", "Auto"),
        ];
        let body = search_body(&LOAN_TEXT_SEARCH, None, filters, 10);
        assert_eq!(body["query"]["bool"]["must"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn customer_term_covers_identity_fields() {
        let body = customer_search_body(Some("alice"), 25);
        assert_eq!(body["size"], json!(25));
        let should = body["query"]["bool"]["should"].as_array().cloned().unwrap();
        assert_eq!(
            should[0]["query_string"]["fields"],
            json!(["firstName", "lastName", "email", "ssn", "companyName"])
        );
        assert_eq!(should[1], json!({ "match": { "firstName": "alice" } }));
        assert_eq!(should[2], json!({ "match": { "lastName": "alice" } }));
        assert!(body["query"]["bool"].get("must").is_none());
    }

    #[test]
    fn customer_without_term_matches_everything() {
        assert_eq!(
            customer_search_body(None, 10)["query"],
            json!({ "match_all": {} })
        );
    }
}
