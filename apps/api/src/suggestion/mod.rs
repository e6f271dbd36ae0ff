pub mod aggregator;
pub mod categorize;
pub mod deadline;
pub mod dispatcher;
pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod ingest;
pub mod priority;
pub mod prompts;
pub mod tables;
