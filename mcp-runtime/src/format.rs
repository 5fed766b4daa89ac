//! Plain-text rendering of tool results.

use std::fmt::Write as _;

use loanpro_core::loans::NOT_AVAILABLE;
use loanpro_core::transactions::Breakdown;
use loanpro_core::{Customer, Loan, Page, Payment, SearchResults, Transaction};

/// `$` prefix for amounts that are present; placeholders are left bare.
fn money(amount: &str) -> String {
    if amount.is_empty() || amount == NOT_AVAILABLE {
        amount.to_string()
    } else {
        format!("${amount}")
    }
}

pub fn loan_details(loan: &Loan) -> String {
    let next_amount = loan.next_payment_amount();
    let next_date = loan.next_payment_date();
    let next_payment = match (next_amount.is_empty(), next_date.is_empty()) {
        (true, true) => String::new(),
        (false, true) => money(&next_amount),
        (true, false) => format!("on {next_date}"),
        (false, false) => format!("{} on {next_date}", money(&next_amount)),
    };

    let mut out = String::from("Loan Details:\n");
    let _ = writeln!(out, "ID: {}", loan.id);
    let _ = writeln!(out, "Display ID: {}", loan.display_id);
    let _ = writeln!(out, "Title: {}", loan.title);
    let _ = writeln!(out, "Status: {}", loan.loan_status());
    let _ = writeln!(out, "Customer: {}", loan.primary_customer_name());
    let _ = writeln!(out, "Amount: {}", money(&loan.loan_amount()));
    let _ = writeln!(out, "Balance: {}", money(&loan.principal_balance()));
    let _ = writeln!(out, "Payoff: {}", money(&loan.payoff_amount()));
    let _ = writeln!(out, "Next Payment: {next_payment}");
    let _ = writeln!(out, "Days Past Due: {}", loan.days_past_due());
    let _ = writeln!(out, "Created: {}", loan.created_date());
    let _ = write!(out, "Contract Date: {}", loan.contract_date());
    out
}

pub fn loan_list(results: &SearchResults<Loan>) -> String {
    if results.results.is_empty() {
        return "No loans found.\n".to_string();
    }
    let mut out = String::from("Loans:\n");
    for loan in &results.results {
        let _ = writeln!(
            out,
            "- ID: {}, Display ID: {}, Customer: {}, Status: {}, Balance: {}",
            loan.id,
            loan.display_id,
            loan.primary_customer_name(),
            loan.loan_status(),
            money(&loan.principal_balance()),
        );
    }
    push_hits(&mut out, &results.summary.total_hits, results.results.len());
    out
}

pub fn customer_details(customer: &Customer) -> String {
    let mut out = String::from("Customer Details:\n");
    let _ = writeln!(out, "ID: {}", customer.id);
    let _ = writeln!(out, "Name: {}", customer.full_name());
    let _ = writeln!(out, "Email: {}", customer.email);
    let _ = writeln!(out, "Phone: {}", customer.phone);
    let _ = write!(out, "Created: {}", customer.created_date());
    out
}

pub fn customer_list(results: &SearchResults<Customer>) -> String {
    if results.results.is_empty() {
        return "No customers found.\n".to_string();
    }
    let mut out = String::from("Customers:\n");
    for customer in &results.results {
        let _ = writeln!(
            out,
            "- ID: {}, Name: {}, Email: {}",
            customer.id,
            customer.full_name(),
            customer.email,
        );
    }
    push_hits(&mut out, &results.summary.total_hits, results.results.len());
    out
}

fn push_hits(out: &mut String, total_hits: &str, returned: usize) {
    if let Ok(total) = total_hits.trim().parse::<usize>() {
        if total > returned {
            let _ = writeln!(out, "Showing {returned} of {total} matches.");
        }
    }
}

pub fn payment_history(loan_id: &str, payments: &[Payment]) -> String {
    let mut out = format!("Payment History for Loan {loan_id}:\n");
    if payments.is_empty() {
        out.push_str("No payments found.\n");
        return out;
    }
    for payment in payments {
        let _ = writeln!(
            out,
            "- Date: {}, Amount: {}, ID: {}, Status: {}",
            payment.date(),
            money(&payment.amount),
            payment.id,
            payment.status(),
        );
    }
    out
}

pub fn transaction_history(
    loan_id: &str,
    page: &Page<Transaction>,
    limit: u64,
    offset: u64,
) -> String {
    let mut out = format!("Transaction History for Loan {loan_id}:\n");
    if page.items.is_empty() {
        out.push_str("No transactions found.\n");
        return out;
    }
    if limit > 0 {
        let first = offset.saturating_add(1);
        let last = offset.saturating_add(page.items.len() as u64);
        let _ = writeln!(out, "Showing {first}-{last} of {}", page.total);
    }
    for txn in &page.items {
        push_transaction(&mut out, txn);
    }
    if page.has_more {
        let next = offset.saturating_add(page.items.len() as u64);
        let _ = writeln!(
            out,
            "More transactions available. Use offset={next} to fetch the next page."
        );
    }
    out
}

fn push_transaction(out: &mut String, txn: &Transaction) {
    let _ = writeln!(
        out,
        "- Date: {}, Type: {}, Amount: ${}, ID: {}, Status: {}",
        txn.date(),
        txn.kind,
        txn.amount(),
        txn.id,
        txn.status(),
    );
    if !txn.title.is_empty() {
        let _ = writeln!(out, "  Title: {}", txn.title);
    }
    if let Some((start, end)) = txn.period_range() {
        let _ = writeln!(out, "  Period {}: {start} to {end}", txn.period);
    }
    if txn.has_payment_breakdown() {
        push_breakdown(out, "Applied", txn.payment_breakdown());
    }
    if txn.has_charge_breakdown() {
        push_breakdown(out, "Charged", txn.charge_breakdown());
    }
    let info = txn.info_summary();
    if !info.is_empty() {
        let _ = writeln!(out, "  Info: {info}");
    }
}

fn push_breakdown(out: &mut String, label: &str, breakdown: Breakdown<'_>) {
    out.push_str("  ");
    out.push_str(label);
    out.push(':');
    for (part, amount) in breakdown.non_zero_parts() {
        let _ = write!(out, " {part}: ${amount}");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanpro_core::envelope::{decode_payload, resolve_page};
    use serde_json::json;

    const TRANSACTIONS_FIXTURE: &str = include_str!("../../core/tests/fixtures/transactions.json");

    #[test]
    fn loan_details_reconciles_every_field() {
        let loan: Loan = serde_json::from_value(json!({
            "id": 630,
            "displayId": "LN-630",
            "title": "Auto Loan",
            "created": "/Date(1427829732)/",
            "LoanSettings": { "loanStatusId": 2 },
            "LoanSetup": {
                "loanAmount": "75000.00",
                "contractDate": "/Date(1427829732)/",
                "payment": "1500.00",
                "firstPaymentDate": "/Date(1430421732)/"
            },
            "Customers": { "results": [{ "firstName": "Alice", "lastName": "Johnson" }] },
            "StatusArchive": { "results": [{
                "principalBalance": "74000.00",
                "payoff": "74210.55",
                "daysPastDue": "0",
                "loanStatusText": "Active"
            }] }
        }))
        .unwrap();

        assert_eq!(
            loan_details(&loan),
            "Loan Details:\n\
             ID: 630\n\
             Display ID: LN-630\n\
             Title: Auto Loan\n\
             Status: Active\n\
             Customer: Alice Johnson\n\
             Amount: $75000.00\n\
             Balance: $74000.00\n\
             Payoff: $74210.55\n\
             Next Payment: $1500.00 on 2015-04-30\n\
             Days Past Due: 0\n\
             Created: 2015-03-31 19:22:12 UTC\n\
             Contract Date: 2015-03-31"
        );
    }

    #[test]
    fn loan_details_leaves_placeholders_bare() {
        let text = loan_details(&Loan::default());
        assert!(text.contains("Balance: N/A\n"));
        assert!(text.contains("Payoff: N/A\n"));
        assert!(text.contains("Days Past Due: N/A\n"));
        assert!(text.contains("Next Payment: \n"));
    }

    #[test]
    fn loan_list_uses_search_fields() {
        let results: SearchResults<Loan> = serde_json::from_value(json!({
            "results": [{
                "id": 1,
                "displayId": "LN-1",
                "primaryCustomerName": "Jane Smith",
                "loanStatusText": "Active",
                "principalBalance": "23000.00"
            }],
            "summary": { "totalHits": 40 }
        }))
        .unwrap();

        assert_eq!(
            loan_list(&results),
            "Loans:\n\
             - ID: 1, Display ID: LN-1, Customer: Jane Smith, Status: Active, Balance: $23000.00\n\
             Showing 1 of 40 matches.\n"
        );
    }

    #[test]
    fn empty_searches_say_so() {
        let loans: SearchResults<Loan> = serde_json::from_value(json!({ "results": [] })).unwrap();
        assert_eq!(loan_list(&loans), "No loans found.\n");
        let customers: SearchResults<Customer> =
            serde_json::from_value(json!({ "results": null })).unwrap();
        assert_eq!(customer_list(&customers), "No customers found.\n");
    }

    #[test]
    fn customer_details_block() {
        let customer: Customer = serde_json::from_value(json!({
            "id": 17,
            "firstName": "Bob",
            "lastName": "Wilson",
            "email": "bob@example.com",
            "phone": "5551234567",
            "createdAt": "/Date(0)/"
        }))
        .unwrap();
        assert_eq!(
            customer_details(&customer),
            "Customer Details:\nID: 17\nName: Bob Wilson\nEmail: bob@example.com\nPhone: 5551234567\nCreated: 1970-01-01 00:00:00 UTC"
        );

        let results = SearchResults {
            results: vec![customer],
            summary: Default::default(),
        };
        assert_eq!(
            customer_list(&results),
            "Customers:\n- ID: 17, Name: Bob Wilson, Email: bob@example.com\n"
        );
    }

    #[test]
    fn payment_history_lists_status() {
        let payments: Vec<Payment> = serde_json::from_value(json!([
            { "id": 2436, "date": "/Date(1764892800)/", "amount": "75111.98", "active": 1 },
            { "id": 2437, "date": "/Date(1764892800)/", "amount": "10.00", "active": 0 }
        ]))
        .unwrap();
        assert_eq!(
            payment_history("630", &payments),
            "Payment History for Loan 630:\n\
             - Date: 2025-12-05, Amount: $75111.98, ID: 2436, Status: Active\n\
             - Date: 2025-12-05, Amount: $10.00, ID: 2437, Status: Inactive\n"
        );
        assert_eq!(
            payment_history("630", &[]),
            "Payment History for Loan 630:\nNo payments found.\n"
        );
    }

    #[test]
    fn transaction_history_renders_fixture() {
        let payload = decode_payload(TRANSACTIONS_FIXTURE.as_bytes()).unwrap();
        let page: Page<Transaction> = resolve_page(payload, 0, 0);
        let text = transaction_history("630", &page, 0, 0);

        assert!(text.starts_with("Transaction History for Loan 630:\n- Date: 2025-12-01, Type: origination"));
        assert!(!text.contains("Showing"));
        assert!(text.contains(
            "- Date: 2025-12-05, Type: payment, Amount: $75111.98, ID: 247770, Status: Active\n  Title: Payment: Payoff - 2025/12/05 Other\n  Applied: Principal: $75000 Interest: $111.98\n"
        ));
        assert!(text.contains("Type: scheduledPayment, Amount: $86.69, ID: 247539, Status: Future"));
        assert!(text.contains("  Charged: Interest: $86.69\n"));
        assert!(text.contains("  Period 12: 2026-12-01 to 2026-12-31\n"));
        assert!(text.contains("  Charged: Fees: $1000\n"));
        assert!(text.contains("  Info: rate: 21.5000000, type: loan.interest.rate.change.type.fixed\n"));
        assert!(!text.contains("More transactions available"));
    }

    #[test]
    fn transaction_history_reports_paging() {
        let page = Page {
            items: vec![Transaction {
                id: "9".to_string(),
                ..Transaction::default()
            }],
            total: 3,
            has_more: true,
        };
        let text = transaction_history("630", &page, 1, 1);
        assert!(text.contains("Showing 2-2 of 3\n"));
        assert!(text.contains("Use offset=2 to fetch the next page."));

        let empty: Page<Transaction> = Page::empty();
        assert_eq!(
            transaction_history("630", &empty, 10, 0),
            "Transaction History for Loan 630:\nNo transactions found.\n"
        );
    }
    #[test]
    fn transaction_paging_saturates_at_max_offset() {
        let page = Page {
            items: vec![Transaction {
                id: "1".to_string(),
                ..Transaction::default()
            }],
            total: 5,
            has_more: true,
        };
        let text = transaction_history("630", &page, 1, u64::MAX);
        assert!(text.contains(&format!("Showing {max}-{max} of 5", max = u64::MAX)));
        assert!(text.contains(&format!("Use offset={}", u64::MAX)));
    }
}
