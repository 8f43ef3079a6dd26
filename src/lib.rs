pub mod basket;
pub mod config;
pub mod logging;
pub mod prices;
pub mod rounding_utils;
pub mod server;
