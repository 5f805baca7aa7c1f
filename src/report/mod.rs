//! Report module - page models, terminal rendering and exports

pub mod export;
pub mod pages;
pub mod render;
pub mod summary;

pub use export::*;
pub use pages::{compute_page, DashboardPages, PageKind, PageView};
pub use render::{print_page, render_page};
pub use summary::*;
