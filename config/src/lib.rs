pub use config::{CacheConfig, Config, QueryConfig};
pub use load::{load, ConfigError, ConfigResult, ConfigType};

mod config;
mod load;
