pub mod add;
pub mod delete;
pub mod list;
pub mod mark_posted;
pub mod pending;
pub mod set_priority;
pub mod show;
