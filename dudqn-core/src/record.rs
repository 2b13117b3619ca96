//! Records returned by learning steps.
//!
//! # Basic Usage
//!
//! ```rust
//! use dudqn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss", 0.25);
//! record.insert("epsilon", RecordValue::Scalar(0.9));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
//! ```
mod base;

pub use base::{Record, RecordValue};
