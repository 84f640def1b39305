pub mod ads;
pub mod advertiser;
pub mod app_config;
pub mod clock;
pub mod config;
pub mod dates;
pub mod market;
pub mod selection;
pub mod tuning;

use thiserror::Error;

pub use ads::{AdRecord, AdType, Platform, ProductCategory};
pub use advertiser::{AdvertiserEntry, PageNetwork};
pub use app_config::{AppConfig, Environment};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use dates::parse_launch_date;
pub use market::{
    AnalysisResult, BrandDensity, BrandReport, CompetitionLevel, KeywordContribution,
    MarketDiagnostics, MarketResult, VariantContribution,
};
pub use selection::{
    Classification, ClassifiedAd, Priority, SelectionResult, SelectionStats, SkipReason,
};
pub use tuning::{
    load_tuning, load_tuning_or_default, ActiveStatus, AdCategoryFilter, CrawlerSettings,
    MarketSettings, MediaTypeFilter, SearchFilters, SelectionThresholds, Tuning,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tuning file {path}: {source}")]
    TuningFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tuning file: {0}")]
    TuningFileParse(#[from] serde_yaml::Error),

    #[error("tuning validation failed: {0}")]
    Validation(String),
}
