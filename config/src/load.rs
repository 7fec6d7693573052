use std::borrow::Cow;
use std::path::Path;

use misc::*;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parsing(#[from] ron::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub enum ConfigType<'a> {
    String(&'a str),
    File(&'a Path),
}

/// Parses the config once, there is no reloading
pub fn load(cfg: ConfigType) -> ConfigResult<Config> {
    let config = cfg.load()?;
    debug!("loaded config"; "source" => %cfg);
    Ok(config)
}

impl<'a> ConfigType<'a> {
    fn load(&self) -> ConfigResult<Config> {
        let bytes = match self {
            ConfigType::String(s) => Cow::Borrowed(*s),
            ConfigType::File(path) => {
                let contents = std::fs::read_to_string(*path).map_err(ConfigError::Io)?;
                Cow::Owned(contents)
            }
        };

        ron::de::from_str(&bytes).map_err(ConfigError::Parsing)
    }
}

impl Display for ConfigType<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConfigType::String(_) => write!(f, "<string>"),
            ConfigType::File(path) => write!(f, "{}", path.display()),
        }
    }
}
