mod download_fires;

pub use download_fires::*;
