pub mod agent;
pub mod concierge;
pub mod dispatcher;
pub mod errors;
pub mod models;
pub mod notify;
pub mod persona;
pub mod providers;
pub mod registry;
