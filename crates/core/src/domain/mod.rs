pub mod conversation;
pub mod job;
pub mod quote;
