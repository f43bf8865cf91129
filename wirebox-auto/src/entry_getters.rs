use wirebox::Candidate;

pub use linkme::{self, distributed_slice};

#[distributed_slice]
pub static __CANDIDATES: [fn() -> Candidate];
