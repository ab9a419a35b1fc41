mod download_archive;

pub use download_archive::*;
