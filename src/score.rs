pub mod aggregate;
pub mod document;
pub mod partition;
pub mod ranking;
pub mod service;

pub use aggregate::ResultsAggregator;
pub use document::ResultsDocumentBuilder;
pub use partition::{OfficialCategories, partition_official, partition_snapshot};
pub use ranking::{live_station_ranking, rank_category, status_priority, winning_time};
pub use service::ResultsService;
