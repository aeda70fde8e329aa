pub mod demo;
pub mod message;
pub mod wallet;
