//! Client core for an interior-design image generator
//!
//! Takes a room photo and a furniture list, builds the generation prompt,
//! submits it to the rendering backend through an ordered chain of fallback
//! strategies, and normalizes whatever shape of response comes back.

pub mod backend;
pub mod error;
pub mod image;
pub mod models;
pub mod objects;
pub mod orchestrator;
pub mod prompts;
pub mod rate;
pub mod response;
pub mod session;
pub mod strategy;

pub use error::{Error, Result};
