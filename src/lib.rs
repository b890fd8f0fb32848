//! `FinSight` - An event-sourced personal finance ledger with a Discord front end
//!
//! Every money movement is appended to an immutable per-user event log. Budget
//! spend, savings balances and the dashboard are derived from that log, and the
//! derived tables are kept consistent with it under concurrent writes.

#![deny(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// `missing_docs` stays a warning: poise command macros generate undocumented items
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Money paths must not panic or compare floats loosely
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::exit,

    clippy::clone_on_ref_ptr,
    clippy::inefficient_to_string,
    clippy::large_types_passed_by_value,
    clippy::needless_pass_by_value,
    clippy::unnecessary_wraps,
    clippy::cognitive_complexity,
    clippy::large_enum_variant,
    clippy::match_same_arms,
    clippy::too_many_lines,
    clippy::enum_glob_use,
    clippy::inconsistent_struct_constructor,
    clippy::must_use_candidate,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    future_incompatible,
    rust_2018_idioms,
)]
// Error sections are written where the failure modes are not obvious from the types
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
)]

/// Discord bot interface - commands, handlers, and bot context
pub mod bot;
/// Configuration management for database and application settings
pub mod config;
/// Core business logic - framework-agnostic ledger, projection, and reporting operations
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;
