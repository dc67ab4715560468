//! Safe SQL builder: static identifiers, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
