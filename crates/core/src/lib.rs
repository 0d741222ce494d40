pub mod content_lock;
pub mod model;
pub mod readiness;
pub mod time;

pub use time::Clock;
