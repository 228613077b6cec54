pub mod analytics;
pub mod cache;
pub mod checkin;
pub mod minting;

pub use analytics::Analytics;
pub use cache::CacheService;
pub use checkin::{CheckInContext, CheckInResult, CheckInService, IssuedQr};
pub use minting::MintService;
