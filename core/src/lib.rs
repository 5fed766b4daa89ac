//! LoanPro data layer: entity models, field reconciliation, the vendor date
//! codec and the response shape resolver. Pure functions only; no I/O.

pub mod customers;
pub mod date;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod loans;
pub mod payments;
pub mod transactions;

pub use customers::Customer;
pub use envelope::{Page, SearchResults};
pub use error::DecodeError;
pub use loans::Loan;
pub use payments::Payment;
pub use transactions::Transaction;
