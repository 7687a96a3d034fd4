//! # Route Handlers
//!
//! ```text
//! routes/
//! ├── health.rs           GET  /health
//! ├── sales.rs            POST /sales, GET /sales, GET /sales/{id}
//! ├── cash_sessions.rs    open/close, movements, detail, current/last
//! ├── payments.rs         GET /payments?sale_id=, PUT /payments/{id}/status
//! └── credit_accounts.rs  list/detail, repayments, status, overdue sweep
//! ```
//!
//! Each module exposes `router()` with absolute paths; `build_router`
//! merges them and attaches the shared state.

pub mod cash_sessions;
pub mod credit_accounts;
pub mod health;
pub mod payments;
pub mod sales;
