//! Vitta: a conversational intake assistant that matches users to
//! micro-insurance products.

pub mod api;
pub mod channels;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
pub mod recommend;
