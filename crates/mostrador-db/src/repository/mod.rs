//! # Repository Module
//!
//! Database repository implementations for Mostrador.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.sales().create_sale(&request)                              │
//! │       ▼                                                                 │
//! │  SaleRepository ───────────┐  one transaction, shared connection       │
//! │       │                    │                                            │
//! │       ├── product::decrement_stock_in                                  │
//! │       ├── payment::process_payment_in                                  │
//! │       │        ├── credit_account::{check_credit_in, open_account_in} │
//! │       │        └── cash_movement::insert_movement_in                   │
//! │       └── client::insert_client_in (shipments)                         │
//! │                                                                         │
//! │  Each repository exposes pool-level methods for handlers and           │
//! │  `*_in(conn, ..)` helpers that run on a caller's transaction, so a     │
//! │  multi-table write never touches the pool mid-transaction.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`](sale::SaleRepository) - Sale ledger
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment processing and status transitions
//! - [`CashSessionRepository`](cash_session::CashSessionRepository) - Drawer sessions
//! - [`CashMovementRepository`](cash_movement::CashMovementRepository) - Drawer ledger
//! - [`CreditAccountRepository`](credit_account::CreditAccountRepository) - Store credit
//! - [`ProductRepository`](product::ProductRepository), [`ClientRepository`](client::ClientRepository) - Collaborator accessors

pub mod cash_movement;
pub mod cash_session;
pub mod client;
pub mod credit_account;
pub mod payment;
pub mod product;
pub mod sale;
