use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use dog_catalog::{CatalogClientConfig, CatalogEndpoints};
use serde::{Deserialize, Serialize};
use tempfile::PersistError;
use thiserror::Error;
use toml_edit::{DocumentMut, Item};
use tracing::{debug, trace};
use xdg::BaseDirectories;

/// Name of the dogs config directory
const DOGS_DIR_NAME: &str = "dogs";
const DOGS_CONFIG_DIR_VAR: &str = "DOGS_CONFIG_DIR";
const DOGS_ENV_PREFIX: &str = "DOGS_";
pub const DOGS_CONFIG_FILE: &str = "dogs.toml";

pub const DEFAULT_CATALOG_URL: &str = "https://frontend-take-home-service.fetch.com";

/// Configuration of the `dogs` command line
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Directory the user config file lives in (default:
    /// `$XDG_CONFIG_HOME/dogs`)
    #[serde(default)]
    pub config_dir: PathBuf,

    /// The URL of the catalog service to use
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: Option<String>,

    /// `Cookie` header value obtained by `dogs login`
    pub session_cookie: Option<String>,

    /// How many dogs `dogs search` shows per page by default
    pub page_size: Option<u32>,

    /// `User-Agent` sent to the catalog service
    pub user_agent: Option<String>,

    /// Headers sent with every catalog request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,

    /// Paths of the catalog operations, relative to `catalog_url`
    #[serde(default)]
    pub endpoints: CatalogEndpoints,
}

/// Error returned by [`Config::write_to()`]
#[derive(Debug, Error)]
pub enum ReadWriteError {
    #[error("Invalid config key: '{0}'")]
    InvalidKey(String),
    #[error(transparent)]
    TomlEdit(#[from] toml_edit::TomlError),
    #[error(transparent)]
    TomlSer(#[from] toml_edit::ser::Error),
    #[error(transparent)]
    TomlDe(#[from] toml_edit::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Could not read config file: {0}")]
    ReadConfig(std::io::Error),
    #[error("Could not write config file: {0}")]
    WriteConfig(std::io::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl Config {
    /// Creates a [Config] from the environment and config files
    ///
    /// Sources in increasing priority:
    /// defaults, `/etc/dogs/dogs.toml`, `dogs.toml` in the XDG config dirs,
    /// `$DOGS_CONFIG_DIR/dogs.toml`, `DOGS_*` environment variables.
    pub fn parse() -> Result<Config> {
        let config_dir = config_dir()?;
        let env_vars = env::vars()
            .filter(|(k, _)| k != DOGS_CONFIG_DIR_VAR)
            .filter_map(|(k, v)| k.strip_prefix(DOGS_ENV_PREFIX).map(|k| (k.to_owned(), v)))
            .collect::<HashMap<_, _>>();

        let raw_config = read_raw_config(&config_dir, &[PathBuf::from("/etc")], env_vars)?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(config)
    }

    /// Path of the user config file, the one `dogs login` writes to.
    pub fn user_config_file(&self) -> PathBuf {
        self.config_dir.join(DOGS_CONFIG_FILE)
    }

    /// The catalog client configuration described by this config
    pub fn catalog_client_config(&self) -> CatalogClientConfig {
        let catalog_url = self.catalog_url.as_deref().unwrap_or(DEFAULT_CATALOG_URL);
        let mut client_config = CatalogClientConfig::new(catalog_url);

        client_config.endpoints = self.endpoints.clone();
        client_config.extra_headers = self.extra_headers.clone();
        client_config.user_agent = self.user_agent.clone();
        if let Some(secs) = self.connect_timeout_secs {
            client_config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout_secs {
            client_config.timeout = Duration::from_secs(secs);
        }
        client_config
    }

    /// Set a top level key in the toml representation of a partial config
    ///
    /// Formatting and comments of `config_file` are preserved.
    /// The new value is validated against [Config].
    pub fn write_to<V: Serialize>(
        config_file: Option<String>,
        key: &str,
        value: V,
    ) -> Result<String, ReadWriteError> {
        let mut document = match config_file {
            Some(content) => content.parse::<DocumentMut>()?,
            None => DocumentMut::new(),
        };
        let value = value.serialize(toml_edit::ser::ValueSerializer::default())?;

        trace!("try parsing a config holding only '{key}'");
        let mut validation_document = DocumentMut::new();
        validation_document
            .as_table_mut()
            .insert(key, Item::Value(value.clone()));
        let validation_config: Config = toml_edit::de::from_document(validation_document)?;
        // unknown keys deserialize fine but are lost on the way back
        if !toml_edit::ser::to_document(&validation_config)?
            .as_table()
            .contains_key(key)
        {
            return Err(ReadWriteError::InvalidKey(key.to_string()));
        }

        trace!("write value for key '{key}'");
        document.as_table_mut().insert(key, Item::Value(value));
        Ok(document.to_string())
    }

    /// [Config::write_to] the file at `config_file_path`, atomically
    pub fn write_to_in<V: Serialize>(
        config_file_path: impl AsRef<Path>,
        temp_dir: impl AsRef<Path>,
        key: &str,
        value: V,
    ) -> Result<(), ReadWriteError> {
        let config_file_contents = match fs::read_to_string(&config_file_path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No existing user config file found in {:?}, creating it now",
                    config_file_path.as_ref()
                );
                Ok(None)
            },
            Err(e) => Err(e),
        }
        .map_err(ReadWriteError::ReadConfig)?;

        let config_file_contents = Self::write_to(config_file_contents, key, value)?;

        let tempfile = tempfile::Builder::new().tempfile_in(temp_dir)?;
        fs::write(&tempfile, config_file_contents).map_err(ReadWriteError::WriteConfig)?;
        tempfile.persist(config_file_path)?;

        Ok(())
    }

    /// Store `cookie` as the session in the user config file
    pub fn write_session_cookie(&self, cookie: &str) -> Result<()> {
        fs::create_dir_all(&self.config_dir).context(format!(
            "Could not create config directory: {:?}",
            self.config_dir
        ))?;
        Self::write_to_in(
            self.user_config_file(),
            &self.config_dir,
            "session_cookie",
            cookie,
        )
        .context("Could not store session")?;
        Ok(())
    }
}

/// `$DOGS_CONFIG_DIR` or the XDG config dir
fn config_dir() -> Result<PathBuf> {
    match env::var(DOGS_CONFIG_DIR_VAR) {
        Ok(v) => {
            debug!("`${DOGS_CONFIG_DIR_VAR}` set: {v}");
            Ok(v.into())
        },
        Err(_) => {
            let config_dir = BaseDirectories::with_prefix(DOGS_DIR_NAME)
                .get_config_home()
                .context("Could not determine config directory, is $HOME set?")?;
            debug!("`${DOGS_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
            Ok(config_dir)
        },
    }
}

/// Layer all config sources on top of each other
///
/// `system_dirs` are searched for `dogs/dogs.toml`,
/// `env_vars` are `DOGS_*` variables with the prefix removed.
/// Nested keys are separated by `__`, e.g. `ENDPOINTS__SEARCH`.
fn read_raw_config(
    config_dir: &Path,
    system_dirs: &[PathBuf],
    env_vars: HashMap<String, String>,
) -> Result<HierarchicalConfig> {
    let config_dir_str = config_dir
        .to_str()
        .context(format!("Config directory is not valid unicode: {config_dir:?}"))?;

    let mut builder = HierarchicalConfig::builder()
        // Config dir is added to the config for completeness;
        // the config file cannot change the config dir.
        .set_override("config_dir", config_dir_str)?;

    for dir in system_dirs {
        builder = builder.add_source(
            config::File::from(dir.join(DOGS_DIR_NAME).join(DOGS_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );
    }

    // look for files in XDG_CONFIG_DIRS locations
    for file in BaseDirectories::with_prefix(DOGS_DIR_NAME).find_config_files(DOGS_CONFIG_FILE) {
        if file.parent() == Some(config_dir) {
            continue;
        }
        builder = builder.add_source(config::File::from(file).format(config::FileFormat::Toml));
    }

    // Add explicit DOGS_CONFIG_DIR file last
    builder = builder.add_source(
        config::File::from(config_dir.join(DOGS_CONFIG_FILE))
            .format(config::FileFormat::Toml)
            .required(false),
    );

    // override via env variables
    builder = builder.add_source(
        Environment::default()
            .separator("__")
            .source(Some(env_vars))
            .try_parsing(true),
    );

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    fn parse_in(config_dir: &Path, env_vars: &[(&str, &str)]) -> Config {
        let env_vars = env_vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        read_raw_config(config_dir, &[], env_vars)
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_without_files() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = parse_in(tempdir.path(), &[]);

        assert_eq!(config.config_dir, tempdir.path());
        assert_eq!(config.catalog_url, None);
        assert_eq!(config.endpoints, CatalogEndpoints::default());
        assert_eq!(
            config.catalog_client_config().catalog_url,
            DEFAULT_CATALOG_URL
        );
    }

    #[test]
    fn reads_user_file() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(tempdir.path().join(DOGS_CONFIG_FILE), indoc! {r#"
            catalog_url = "http://localhost:8080"
            page_size = 50
            timeout_secs = 5

            [extra_headers]
            x-team = "search"

            [endpoints]
            search = "/v2/dogs/search"
            "#})
        .unwrap();

        let config = parse_in(tempdir.path(), &[]);
        assert_eq!(config.page_size, Some(50));

        let client_config = config.catalog_client_config();
        assert_eq!(client_config.catalog_url, "http://localhost:8080");
        assert_eq!(client_config.timeout, Duration::from_secs(5));
        assert_eq!(
            client_config.connect_timeout,
            CatalogClientConfig::DEFAULT_CONNECT_TIMEOUT
        );
        assert_eq!(
            client_config.extra_headers.get("x-team").map(String::as_str),
            Some("search")
        );
        assert_eq!(client_config.endpoints.search, "/v2/dogs/search");
        assert_eq!(client_config.endpoints.breeds, "/dogs/breeds");
    }

    #[test]
    fn env_overrides_file() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(
            tempdir.path().join(DOGS_CONFIG_FILE),
            "page_size = 50\nsession_cookie = \"from-file=1\"\n",
        )
        .unwrap();

        let config = parse_in(tempdir.path(), &[
            ("PAGE_SIZE", "10"),
            ("SESSION_COOKIE", "from-env=1"),
            ("ENDPOINTS__HYDRATE", "/v2/dogs"),
        ]);
        assert_eq!(config.page_size, Some(10));
        assert_eq!(config.session_cookie.as_deref(), Some("from-env=1"));
        assert_eq!(config.endpoints.hydrate, "/v2/dogs");
    }

    #[test]
    fn system_file_is_lowest_priority() {
        let system = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        fs::create_dir_all(system.path().join(DOGS_DIR_NAME)).unwrap();
        fs::write(
            system.path().join(DOGS_DIR_NAME).join(DOGS_CONFIG_FILE),
            "catalog_url = \"http://system\"\npage_size = 30\n",
        )
        .unwrap();
        fs::write(user.path().join(DOGS_CONFIG_FILE), "page_size = 40\n").unwrap();

        let config: Config =
            read_raw_config(user.path(), &[system.path().to_path_buf()], HashMap::new())
                .unwrap()
                .try_deserialize()
                .unwrap();
        assert_eq!(config.catalog_url.as_deref(), Some("http://system"));
        assert_eq!(config.page_size, Some(40));
    }

    #[test]
    #[serial]
    fn parse_uses_config_dir_and_env() {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(tempdir.path().join(DOGS_CONFIG_FILE), "page_size = 40\n").unwrap();

        temp_env::with_vars(
            [
                (DOGS_CONFIG_DIR_VAR, Some(tempdir.path().to_str().unwrap())),
                ("DOGS_CATALOG_URL", Some("https://example.com")),
            ],
            || {
                let config = Config::parse().unwrap();
                assert_eq!(config.config_dir, tempdir.path());
                assert_eq!(config.page_size, Some(40));
                assert_eq!(config.catalog_url.as_deref(), Some("https://example.com"));
            },
        );
    }

    #[test]
    fn test_writing_value() {
        let config_content = Config::write_to(
            None,
            "session_cookie",
            "fetch-access-token=abc",
        )
        .unwrap();
        assert_eq!(config_content, indoc! {"
            session_cookie = \"fetch-access-token=abc\"
            "});
    }

    #[test]
    fn test_replacing_value_keeps_comment() {
        let config_before = indoc! {"
        # local catalog
        catalog_url = \"http://localhost:8080\"
        session_cookie = \"old=1\"
        "};

        let config_content = Config::write_to(
            Some(config_before.to_string()),
            "session_cookie",
            "new=1",
        )
        .unwrap();
        assert_eq!(config_content, indoc! {"
        # local catalog
        catalog_url = \"http://localhost:8080\"
        session_cookie = \"new=1\"
        "});
    }

    #[test]
    fn test_writing_invalid() {
        let config_content =
            Config::write_to(None, "does_not_exist", "true");
        assert!(matches!(config_content, Err(ReadWriteError::InvalidKey(_))));
    }

    #[test]
    fn test_writing_wrong_type() {
        let config_content =
            Config::write_to(None, "page_size", "many");
        assert!(matches!(config_content, Err(ReadWriteError::TomlDe(_))));
    }

    #[test]
    fn write_session_cookie_creates_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = Config {
            config_dir: tempdir.path().join("nested"),
            ..Default::default()
        };

        config.write_session_cookie("fetch-access-token=abc").unwrap();
        config.write_session_cookie("fetch-access-token=def").unwrap();

        let written = parse_in(&config.config_dir, &[]);
        assert_eq!(
            written.session_cookie.as_deref(),
            Some("fetch-access-token=def")
        );
    }
}
