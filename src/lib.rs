pub mod config;
pub mod db;
pub mod error;
pub mod load;
pub mod profile;
pub mod structs;
pub mod transform;

// Re-export public API
pub use config::DatabaseConfig;
pub use error::{PipelineError, Result};
pub use load::{read_csv, write_csv};
pub use structs::{Column, ColumnKind, RequiredColumn, SimpleLogger, Table, Value};
pub use transform::{
    AGE_GROUP_LABELS, FREQUENCY_MAPPING, ImputeSummary, Redundancy, Statistic, drop_if_redundant,
    impute_by_group, map_codes, normalize_names, quantile_bucket,
};
