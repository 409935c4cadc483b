pub mod ease;
pub mod geo;
pub mod handles;
pub mod ids;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use ease::*;
pub use geo::*;
pub use handles::*;
pub use ids::*;
pub use time::*;
