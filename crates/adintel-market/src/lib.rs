pub mod analysis;
pub mod category;
pub mod competition;
pub mod deep_search;
pub mod error;
pub mod expansion;
pub mod orchestrator;
pub mod scan;

pub use analysis::{AnalysisService, HeuristicAnalysis};
pub use category::{categorize_records, classify_text, dominant_category, filter_to_category};
pub use competition::{classify_competition, qualifying_brands};
pub use deep_search::{query_variants, DeepBrandSearcher, DeepSearchOutcome};
pub use error::{AnalysisError, MarketError};
pub use expansion::{is_sparse, merge_keyword_batches, KeywordBatch};
pub use orchestrator::{MarketOptions, MarketOrchestrator};
pub use scan::{scan_keyword, ScanResult};
