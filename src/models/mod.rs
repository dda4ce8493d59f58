pub mod booking;
pub mod location;
pub mod order;
pub mod profile;
pub mod time_slot;
