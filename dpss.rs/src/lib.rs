//! Discrete prolate spheroidal sequences (Slepian tapers).
//!
//! [`TaperSet::generate`] computes the `K` most band-concentrated tapers of length `N`
//! for a time-bandwidth product `NW`, together with their concentration ratios.
//! [`TaperCache`] memoizes taper sets by their exact parameter tuple.

mod error;
pub use error::*;

pub mod tridiagonal;

mod concentration;
pub use concentration::*;

mod taper_set;
pub use taper_set::*;

mod cache;
pub use cache::*;
