mod air_quality;
mod fires;
mod forecasts;
mod geocoding;
mod history;

pub use air_quality::*;
pub use fires::*;
pub use forecasts::*;
pub use geocoding::*;
pub use history::*;
