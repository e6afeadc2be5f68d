pub mod cli;
pub mod data;
pub mod detail;
pub mod error;
pub mod filter;
pub mod float;
pub mod hint;
pub mod loader;
pub mod loading;
pub mod logging;
pub mod parse;
pub mod relay;
pub mod source;
pub mod state;
pub mod terminal_check;
pub mod theme;
pub mod transform;
pub mod view;
