mod service;
mod snapshot;

pub use service::TradingGraph;
pub use snapshot::{EdgeWeight, FastHashMap, FastHasher, GraphSnapshot};
