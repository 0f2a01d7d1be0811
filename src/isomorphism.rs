mod search;
mod ullmann;

pub use search::{Location, Search, SearchOptions};
pub use ullmann::find_subgraph_isomorphisms;
