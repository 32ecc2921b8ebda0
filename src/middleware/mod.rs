pub mod auth;
pub mod rate_limit;

pub use auth::AuthUser;
pub use rate_limit::{keyed_limiter, write_rate_limit_middleware, KeyedLimiter};
