pub mod catalog;
pub mod chat;
pub mod color;
pub mod events;
pub mod interpret;
pub mod plan;
pub mod vocab;
