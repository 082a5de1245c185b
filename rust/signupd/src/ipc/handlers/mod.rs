pub mod core;
pub mod date_range;
pub mod filters;
pub mod signups;
