pub mod cache;
pub mod calculator;
pub mod config;
pub mod error;
pub mod recommend;
pub mod resolver;
pub mod service;
pub mod store;
pub mod types;
pub mod usage;
pub mod utils;
pub mod validation;
pub mod versioning;

// ---- Top-level re-exports for ergonomic usage ----

// Service + engine components
pub use cache::{CacheStats, ResolutionCache};
pub use calculator::compute_fee;
pub use config::EngineConfig;
pub use error::{FeeError, Result, StoreError};
pub use resolver::ConfigResolver;
pub use service::FeeService;
pub use usage::{UsageEvent, UsageRecorder};
pub use versioning::VersionManager;

// Storage
pub use store::{
    ConfigPatch, ConfigStore, CoveringQuery, DynConfigStore, FieldMatch, MemoryConfigStore,
    RecordFilter, StoreResult,
};

// Core enums
pub use types::{AppliedFeeType, ConfigStatus, Currency, FeeType, Scope, TierType};

// Configuration records
pub use types::{ConfigGroup, ConfigOverrides, FeeConfiguration, FeeTier, NewFeeConfig, UsageStats};

// Calculation
pub use types::{
    AppliedLimits, BulkFeeResult, BulkTransaction, CalculationDetail, ConfigUsed, FeeBreakdown,
    FeeCalculation, FeeOutcome, FeeRequest,
};

// Listing + pagination
pub use types::{ListQuery, PageResult, SortField, SortOrder};

// Analytics + simulation
pub use types::{
    AnalyticsQuery, FeeComparison, ScopeAnalytics, SimulationPoint, SimulationReport,
    SimulationRequest, StatusBreakdown,
};

// Recommendations
pub use types::{
    AmountPercentiles, FeeRecommendation, RecommendationReport, RecommendationRequest,
    TransactionAnalysis,
};
