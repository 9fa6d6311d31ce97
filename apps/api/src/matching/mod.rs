// Occupation → school matching.
// `directory` is the data seam (remote API in production, fakes in tests),
// `matcher` is the fetch/join/rank pipeline, `handlers` exposes it over HTTP.

pub mod directory;
pub mod handlers;
pub mod matcher;

pub use directory::SchoolDirectory;
pub use matcher::{match_schools, MatchOutcome, MatchSettings};
