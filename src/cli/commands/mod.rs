//! CLI command implementations.

mod ask;
mod graph_stats;
mod index;
mod init;
mod search;
mod serve;

pub use ask::run_ask;
pub use graph_stats::run_graph_stats;
pub use index::run_index;
pub use init::run_init;
pub use search::run_search;
pub use serve::run_serve;
