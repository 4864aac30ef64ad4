pub mod consumer;
pub mod decoder;
pub mod frames;
pub mod handlers;
