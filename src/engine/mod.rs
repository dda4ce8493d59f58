pub mod admin;
pub mod directory;
pub mod filters;
pub mod pricing;
pub mod scheduling;
pub mod statistics;
pub mod wizard;
