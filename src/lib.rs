pub mod api;
pub mod config;
pub mod content;
pub mod instance;
pub mod job;
pub mod mime;
pub mod observability;
pub mod operations;
pub mod serializer;
pub mod storage;
