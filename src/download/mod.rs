// Download module: transport, checksums, archives and the parallel orchestrator

pub mod extract;
pub mod hash;
pub mod http;
pub mod orchestrator;

pub use orchestrator::DownloadOrchestrator;
