pub mod caller;
pub mod creation;
