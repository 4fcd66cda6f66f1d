pub mod auth;
pub mod catalog_client;
pub mod engagement;
pub mod ingestion;
pub mod ingestion_queue;
pub mod movies;

pub use catalog_client::{CatalogClient, TmdbClient};
pub use ingestion::{IngestOutcome, IngestionJob, IngestionService};
pub use ingestion_queue::{IngestionQueue, IngestionWorkerHandle};
