mod api;
mod commands;
pub mod display;
mod domains;
mod error;
mod events;
mod fetcher;
mod report;
mod series;
mod utils;
mod weather_codes;

pub use api::*;
pub use commands::*;
pub use domains::*;
pub use error::*;
pub use events::*;
pub use fetcher::*;
pub use report::*;
pub use series::*;
pub use utils::*;
pub use weather_codes::*;
