//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Budget category commands
pub mod budget;

/// Dashboard command
pub mod dashboard;

/// General utility commands
pub mod general;

/// Registration and profile commands
pub mod profile;

/// Savings goal commands
pub mod savings;

/// Subscription commands
pub mod subscription;

/// Transaction commands
pub mod transaction;

// Export commands
pub use budget::*;
pub use dashboard::*;
pub use general::*;
pub use profile::*;
pub use savings::*;
pub use subscription::*;
pub use transaction::*;
