mod search_cities;

pub use search_cities::*;
