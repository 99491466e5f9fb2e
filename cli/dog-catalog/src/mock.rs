//! Recording and replaying catalog traffic with httpmock.
//!
//! In [CatalogMockMode::Record] mode all requests are proxied to the real
//! catalog through a local mock server and the exchanges are written to a
//! file when the client is dropped.
//! In [CatalogMockMode::Replay] mode a local mock server answers from such a
//! file, so tests and demos can run without network access or credentials.

use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;

use httpmock::{MockServer, RecordingID};
use tracing::{debug, warn};

use crate::config::{CatalogClientConfig, CatalogMockMode};

/// Keeps a [MockServer] alive for as long as the [crate::CatalogClient]
/// that sends requests to it.
#[allow(dead_code)] // https://github.com/rust-lang/rust/issues/122833
pub(crate) enum MockGuard {
    Record(Recorder),
    Replay(MockServer),
}

impl MockGuard {
    pub(crate) fn new(config: &CatalogClientConfig) -> Option<Self> {
        match &config.mock_mode {
            CatalogMockMode::None => None,
            CatalogMockMode::Record(path) => {
                let server = MockServer::start();
                let recording = proxy_and_record(&server, &config.catalog_url);
                debug!(?path, server = server.base_url(), "recording catalog traffic");

                Some(MockGuard::Record(Recorder {
                    path: path.clone(),
                    server,
                    recording,
                }))
            },
            CatalogMockMode::Replay(path) => {
                let server = MockServer::start();
                server.playback(path);
                debug!(?path, server = server.base_url(), "replaying catalog traffic");

                Some(MockGuard::Replay(server))
            },
        }
    }

    pub(crate) fn url(&self) -> String {
        self.server().base_url()
    }

    fn server(&self) -> &MockServer {
        match self {
            MockGuard::Record(recorder) => &recorder.server,
            MockGuard::Replay(server) => server,
        }
    }
}

impl Debug for MockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self {
            MockGuard::Record(_) => "record",
            MockGuard::Replay(_) => "replay",
        };
        f.debug_struct("MockGuard")
            .field("mode", &mode)
            .field("url", &self.url())
            .finish()
    }
}

/// Forward every request to `upstream` and start recording the exchanges.
fn proxy_and_record(server: &MockServer, upstream: &str) -> RecordingID {
    server.forward_to(upstream, |rule| {
        rule.filter(|when| {
            when.any_request();
        });
    });
    server.record(|rule| {
        rule.filter(|when| {
            when.any_request();
        });
    })
}

/// A recording mock server that persists its recording on drop.
pub(crate) struct Recorder {
    path: PathBuf,
    server: MockServer,
    recording: RecordingID,
}

impl Drop for Recorder {
    fn drop(&mut self) {
        // httpmock appends a timestamp to the file name, rename to the
        // requested path after saving.
        // The name needs to be unique so parallel tests don't race.
        let name = format!(
            "httpmock_{}",
            self.path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("catalog")
        );
        let saved = match self.server.record_save(&self.recording, name) {
            Ok(saved) => saved,
            Err(err) => {
                warn!(?err, path = %self.path.display(), "could not save catalog recording");
                return;
            },
        };
        // httpmock saves below the working directory, which may be on
        // another filesystem than the requested path.
        let moved = fs::rename(&saved, &self.path)
            .or_else(|_| fs::copy(&saved, &self.path).and_then(|_| fs::remove_file(&saved)));
        if let Err(err) = moved {
            warn!(%err, src = %saved.display(), dest = %self.path.display(), "could not move catalog recording");
            return;
        }
        debug!(path = %self.path.display(), "saved catalog recording");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::types::{DogRecord, SearchPage, Session};
    use crate::{CatalogClient, ClientTrait};

    fn dog(id: &str) -> DogRecord {
        DogRecord {
            id: id.to_string(),
            img: format!("https://img.example.com/{id}.jpg"),
            name: format!("dog {id}"),
            age: 2,
            zip_code: "10001".to_string(),
            breed: "Beagle".to_string(),
        }
    }

    /// Breeds, one search page and its hydration against `client`.
    fn browse(
        runtime: &tokio::runtime::Runtime,
        client: &CatalogClient,
    ) -> (Vec<String>, SearchPage, Vec<DogRecord>) {
        let session = Session::new("fetch-access-token=abc");
        runtime.block_on(async {
            let breeds = client.breeds(&session).await.unwrap();
            let page = client
                .search("breeds=Beagle&size=2&sort=breed%3Aasc", &session)
                .await
                .unwrap();
            let dogs = client.hydrate(&page.result_ids, &session).await.unwrap();
            (breeds.into_inner(), page, dogs)
        })
    }

    // httpmock's blocking API can't be used inside an async runtime,
    // so the servers are driven from a plain test.
    #[test]
    fn replays_recorded_traffic() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let tempdir = tempfile::tempdir().unwrap();
        let recording = tempdir.path().join("catalog.yaml");

        let upstream = MockServer::start();
        let breeds_mock = upstream.mock(|when, then| {
            when.path("/dogs/breeds");
            then.status(200).json_body(json!(["Beagle", "Pug"]));
        });
        let search_mock = upstream.mock(|when, then| {
            when.path("/dogs/search").query_param("breeds", "Beagle");
            then.status(200).json_body(json!({
                "resultIds": ["b", "a"],
                "total": 3,
                "next": "/dogs/search?breeds=Beagle&from=2&size=2&sort=breed%3Aasc",
            }));
        });
        let hydrate_mock = upstream.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/dogs")
                .json_body(json!(["b", "a"]));
            then.status(200).json_body_obj(&vec![dog("a"), dog("b")]);
        });

        let mut config = CatalogClientConfig::new(upstream.base_url());
        config.mock_mode = CatalogMockMode::Record(recording.clone());
        let recorder = CatalogClient::new(config).unwrap();
        let recorded = browse(&runtime, &recorder);
        // saves the recording
        drop(recorder);

        breeds_mock.assert();
        search_mock.assert();
        hydrate_mock.assert();
        assert!(recording.exists());

        // nothing listens upstream, answers can only come from the recording
        let mut config = CatalogClientConfig::new("http://localhost:1");
        config.mock_mode = CatalogMockMode::Replay(recording);
        let replayer = CatalogClient::new(config).unwrap();
        let replayed = browse(&runtime, &replayer);

        assert_eq!(replayed, recorded);
        assert_eq!(replayed.0, vec!["Beagle".to_string(), "Pug".to_string()]);
        assert_eq!(
            replayed.1.next.as_deref(),
            Some("/search?breeds=Beagle&from=2&size=2&sort=breed%3Aasc")
        );
        assert_eq!(replayed.2, vec![dog("b"), dog("a")]);
    }

    #[test]
    fn no_guard_without_mock_mode() {
        let config = CatalogClientConfig::new("http://localhost:1");
        assert!(MockGuard::new(&config).is_none());
    }
}
