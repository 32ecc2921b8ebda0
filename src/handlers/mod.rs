pub mod cards;
pub mod interests;
pub mod lookups;
pub mod profiles;
pub mod search;
