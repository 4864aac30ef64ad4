pub mod chat;
pub mod wine;
