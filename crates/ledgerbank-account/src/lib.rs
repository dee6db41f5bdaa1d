//! Ledgerbank — bank-account bounded context.
//!
//! The command side validates intent against the `BankAccount` aggregate and
//! appends the resulting events; the query side consumes those events from
//! the bus into an account read model.

pub mod application;
pub mod domain;
