//! Application services: quota, caching, orchestration and upstream ports.

pub mod background;
pub mod channel_stats;
pub mod clock;
pub mod error;
pub mod quota;
pub mod repos;
pub mod roast;
pub mod signup;
pub mod stale_cache;
pub mod upstream;
pub mod verification;
