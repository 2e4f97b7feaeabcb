pub mod registrations;
pub mod removal_items;
pub mod teams;
