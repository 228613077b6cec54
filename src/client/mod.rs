pub mod station;

pub use station::{StationClient, SubmitOutcome};
