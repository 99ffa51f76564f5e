//! Reusable UI components

mod resource_bar;
mod status_badge;
mod timeline;

pub use resource_bar::ResourceBar;
pub use status_badge::LatchBadge;
pub use timeline::Timeline;
