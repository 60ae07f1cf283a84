// GUI module organization and public exports

// Window state and rendering
mod app;
// Reusable UI pieces (count rows, centered lines)
mod components;
// Counting pass and toolkit-independent render model
pub mod refresher;

// Export AppState for use in main.rs
pub use app::AppState;
// Export all component functions
pub use components::*;
