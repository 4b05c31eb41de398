pub mod logo_asset;
pub mod schedule;

pub use logo_asset::LogoAssetFormat;
pub use schedule::{ProgramEntry, ScheduleDocument};
