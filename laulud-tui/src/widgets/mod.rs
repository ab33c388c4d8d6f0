//! Reusable widget components.

pub mod chips;
pub mod detail;
pub mod status;

pub use chips::TagChips;
pub use detail::DetailPanel;
pub use status::QueryPlaceholder;
