use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dog_catalog::{CatalogClient, CatalogMockMode, Session};
use tracing::debug;

use crate::config::Config;

/// Record all catalog traffic to the given file.
pub const DOGS_CATALOG_MOCK_RECORD_VAR: &str = "_DOGS_CATALOG_MOCK_RECORD";
/// Answer catalog requests from a file written with [DOGS_CATALOG_MOCK_RECORD_VAR].
pub const DOGS_CATALOG_MOCK_REPLAY_VAR: &str = "_DOGS_CATALOG_MOCK_REPLAY";

/// Initialize the catalog client
///
/// - Replay recorded traffic if `_DOGS_CATALOG_MOCK_REPLAY` is set to a recording
/// - Record the traffic to the real service if `_DOGS_CATALOG_MOCK_RECORD` is set
/// - Talk to the configured service otherwise
pub fn init_catalog_client(config: &Config) -> Result<CatalogClient> {
    let mut client_config = config.catalog_client_config();
    client_config.mock_mode = mock_mode(
        std::env::var(DOGS_CATALOG_MOCK_REPLAY_VAR).ok(),
        std::env::var(DOGS_CATALOG_MOCK_RECORD_VAR).ok(),
    )?;

    debug!(
        catalog_url = %client_config.catalog_url,
        mock_mode = ?client_config.mock_mode,
        "using catalog client"
    );
    CatalogClient::new(client_config).context("Could not create catalog client")
}

fn mock_mode(replay: Option<String>, record: Option<String>) -> Result<CatalogMockMode> {
    match (replay, record) {
        (Some(_), Some(_)) => bail!(
            "'{DOGS_CATALOG_MOCK_REPLAY_VAR}' and '{DOGS_CATALOG_MOCK_RECORD_VAR}' can't be used together"
        ),
        (Some(path), None) => {
            let path = PathBuf::from(path);
            if !path.exists() {
                bail!("path to mock data file doesn't exist: {}", path.display());
            }
            Ok(CatalogMockMode::Replay(path))
        },
        (None, Some(path)) => Ok(CatalogMockMode::Record(PathBuf::from(path))),
        (None, None) => Ok(CatalogMockMode::None),
    }
}

/// The session stored in the config, anonymous if there is none.
pub fn session_from_config(config: &Config) -> Session {
    match &config.session_cookie {
        Some(cookie) => Session::new(cookie.as_str()),
        None => Session::anonymous(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_mock_by_default() {
        assert_eq!(mock_mode(None, None).unwrap(), CatalogMockMode::None);
    }

    #[test]
    fn record_mode() {
        assert_eq!(
            mock_mode(None, Some("/tmp/catalog.json".to_string())).unwrap(),
            CatalogMockMode::Record(PathBuf::from("/tmp/catalog.json"))
        );
    }

    #[test]
    fn replay_requires_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert_eq!(
            mock_mode(Some(path.clone()), None).unwrap(),
            CatalogMockMode::Replay(PathBuf::from(path))
        );

        assert!(mock_mode(Some("/does/not/exist.json".to_string()), None).is_err());
    }

    #[test]
    fn replay_and_record_conflict() {
        assert!(mock_mode(Some("a".to_string()), Some("b".to_string())).is_err());
    }

    #[test]
    fn session_from_config_cookie() {
        let config = Config {
            session_cookie: Some("fetch-access-token=abc".to_string()),
            ..Default::default()
        };
        assert_eq!(
            session_from_config(&config).cookie(),
            Some("fetch-access-token=abc")
        );
        assert!(session_from_config(&Config::default()).is_anonymous());
    }
}
