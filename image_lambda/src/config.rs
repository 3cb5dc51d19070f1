use std::str::FromStr;

use anyhow::Context;

use crate::labels::DEFAULT_MIN_LABELS;
use crate::thumbnail::Bounds;

/// The configuration parameters for the lambda functions.
///
/// Every value is pulled from environment variables set on the function.
#[derive(Debug, Clone)]
pub struct Config {
    /// The table holding one metadata record per upload. Only the metadata and
    /// label functions need it.
    pub table_name: Option<String>,

    /// Largest thumbnail the thumbnail function will write.
    pub thumbnail_bounds: Bounds,

    /// Fewest labels worth merging into a record.
    pub min_label_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            table_name: None,
            thumbnail_bounds: Bounds::default(),
            min_label_count: DEFAULT_MIN_LABELS,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        let table_name = std::env::var("TABLE_NAME").ok().filter(|t| !t.is_empty());
        let max_width = env_or("THUMBNAIL_MAX_WIDTH", defaults.thumbnail_bounds.max_width())?;
        let max_height = env_or("THUMBNAIL_MAX_HEIGHT", defaults.thumbnail_bounds.max_height())?;
        let thumbnail_bounds =
            Bounds::new(max_width, max_height).context("invalid thumbnail bounds")?;
        let min_label_count = env_or("MIN_LABEL_COUNT", defaults.min_label_count)?;

        Ok(Config {
            table_name,
            thumbnail_bounds,
            min_label_count,
        })
    }

    pub fn table_name(&self) -> anyhow::Result<&str> {
        self.table_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("TABLE_NAME must be provided"))
    }
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{name} could not be parsed from '{raw}'")),
        Err(_) => Ok(default),
    }
}
