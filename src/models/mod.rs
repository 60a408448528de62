pub mod job;
pub mod relevance;
