use thiserror::Error;
use url::Url;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("listing.max_limit must be at least 1")]
    ZeroMaxLimit,
    #[error(
        "listing.default_limit ({default_limit}) exceeds listing.max_limit ({max_limit})"
    )]
    DefaultAboveMax {
        default_limit: usize,
        max_limit: usize,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported database scheme '{scheme}', expected postgres")]
    UnsupportedDatabaseScheme { scheme: String },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let listing = &config.listing;
    if listing.max_limit == 0 {
        return Err(ConfigGuardRailError::ZeroMaxLimit);
    }
    if listing.default_limit > listing.max_limit {
        return Err(ConfigGuardRailError::DefaultAboveMax {
            default_limit: listing.default_limit,
            max_limit: listing.max_limit,
        });
    }

    match config.database.url.as_deref() {
        Some(raw) => {
            let parsed = Url::parse(raw).map_err(|source| {
                ConfigGuardRailError::InvalidDatabaseUrl { source }
            })?;
            if !matches!(parsed.scheme(), "postgres" | "postgresql") {
                return Err(ConfigGuardRailError::UnsupportedDatabaseScheme {
                    scheme: parsed.scheme().to_string(),
                });
            }
        }
        None => warnings.push_with_hint(
            "No database configured; images are kept in memory and lost on restart",
            "Set DATABASE_URL or [database].url to persist the registry",
        ),
    }

    Ok(warnings)
}
