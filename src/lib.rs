pub mod args;
pub mod error;
pub mod model;
pub mod score;
pub mod storage;
pub mod controller {
    pub mod export;
    pub mod live;
    pub mod punch;
    pub mod results;
    pub mod routes;
    pub mod simulate;
}
pub mod view {
    pub mod results;
}

pub use error::{Result, ResultsError};
pub use score::ResultsService;
