pub mod color;
pub mod filter;
pub mod state;
pub mod ui;
pub mod view;
