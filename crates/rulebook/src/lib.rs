//! Harvest size rules.
//!
//! Which size codes a stem-count record may carry depends on the variety and,
//! for some varieties, on the block it was cut in. This crate owns that table
//! ([`SizeRulebook`]) plus the per-block variety list printed on field forms
//! ([`VarietyCatalog`]). Everything here is pure: no I/O, no errors for
//! unknown input, just lookups.
//!
//! ```
//! use rulebook::{SizeRulebook, VarietyCatalog};
//!
//! let rules = SizeRulebook::standard();
//! let form = VarietyCatalog::standard().form_options(&rules, "4", true);
//! assert_eq!(form.default_variety, Some("freedom"));
//! assert_eq!(form.varieties[0].sizes.len(), 3);
//! ```
mod catalog;
mod rules;
mod size;

pub use crate::catalog::{FormOptions, VarietyCatalog, VarietyChoice, VarietyOption};
pub use crate::rules::{SizeRule, SizeRulebook, STANDARD_RULES};
pub use crate::size::{SizeCode, UnknownSizeCode};
