mod download_air_quality;

pub use download_air_quality::*;
