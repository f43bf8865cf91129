mod source;

pub mod entry_getters;

pub use source::{bootstrap, AutoCandidates, LinkedSource};

#[cfg(feature = "macros")]
pub use wirebox_auto_macros::Component;
