pub mod board;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod index;
pub mod scan;
pub mod ui;
