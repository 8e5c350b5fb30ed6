pub mod availability;
pub mod booking;
pub mod dispatcher;
pub mod lifecycle;
pub mod memory_store;
pub mod reminders;
pub mod store;
pub mod supabase_store;
