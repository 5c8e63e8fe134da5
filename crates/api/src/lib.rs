pub mod error;
pub mod models;
pub mod resolve;
pub mod search;
pub mod view;

// Re-export commonly used types
pub use error::{ApiError, ApiResult, SearchError};
pub use models::*;
pub use resolve::{PositionContext, ResolveResult, TargetResolver};
pub use search::{
    SearchHandler, SearchRequest, SearchSummary, TargetHandler, UsageSearchEngine, UsageSink,
};
pub use view::{FilterRule, UsageFilterRules, UsageView};
