// Re-export all model types from submodules
mod common;
mod interests;
mod lookups;
mod profiles;
mod search;

// Items from common are imported directly where needed
pub use interests::*;
pub use lookups::*;
pub use profiles::*;
pub use search::*;
