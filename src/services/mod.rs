pub mod emotional;
pub mod engine;
pub mod providers;
pub mod refinement;
pub mod search;
pub mod surprise;
pub mod synthesis;

pub use engine::SessionEngine;
