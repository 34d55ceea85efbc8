pub mod bacteria;
pub mod config;
pub mod grid;
pub mod inhibitor;
pub mod virus;
pub mod world;
