use anyhow::{Context, Result};
use bpaf::Bpaf;
use dog_search_sdk::models::query::encode_field_token;
use dog_search_sdk::providers::catalog::{BreedCatalog, ClientTrait};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::interruptible;
use crate::config::Config;
use crate::utils::init::session_from_config;

/// List the breeds of the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct Breeds {
    /// Display the breeds as a JSON array
    #[bpaf(long)]
    json: bool,

    /// Also show the form field name of each breed, as used by 'dogs filter'
    #[bpaf(long)]
    fields: bool,
}

impl Breeds {
    #[instrument(name = "breeds", skip_all, fields(json = self.json))]
    pub async fn handle(
        self,
        config: &Config,
        client: &impl ClientTrait,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let session = session_from_config(config);
        let catalog = interruptible(cancel, async {
            client
                .breeds(&session)
                .await
                .context("Could not load the breed catalog")
        })
        .await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        } else {
            print!("{}", render_breeds(&catalog, self.fields));
        }
        Ok(())
    }
}

fn render_breeds(catalog: &BreedCatalog, fields: bool) -> String {
    catalog
        .iter()
        .map(|breed| {
            if fields {
                format!("{breed}\t{}\n", encode_field_token(breed))
            } else {
                format!("{breed}\n")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use dog_search_sdk::providers::catalog::{
        CatalogClientError,
        DogRecord,
        SearchPage,
        Session,
    };
    use dog_test_utils::catalog;
    use pretty_assertions::assert_eq;

    use super::*;

    /// A catalog that cancels the token once asked for breeds
    /// and never answers.
    struct HangingClient {
        cancel: CancellationToken,
    }

    impl ClientTrait for HangingClient {
        async fn breeds(&self, _session: &Session) -> Result<BreedCatalog, CatalogClientError> {
            self.cancel.cancel();
            std::future::pending().await
        }

        async fn search(
            &self,
            _query: &str,
            _session: &Session,
        ) -> Result<SearchPage, CatalogClientError> {
            unreachable!("breeds does not search")
        }

        async fn hydrate(
            &self,
            _ids: &[String],
            _session: &Session,
        ) -> Result<Vec<DogRecord>, CatalogClientError> {
            unreachable!("breeds does not hydrate")
        }

        async fn login(&self, _name: &str, _email: &str) -> Result<Session, CatalogClientError> {
            unreachable!("breeds does not log in")
        }
    }

    #[tokio::test]
    async fn interrupt_stops_waiting_for_catalog() {
        let cancel = CancellationToken::new();
        let client = HangingClient {
            cancel: cancel.clone(),
        };

        let err = Breeds {
            json: false,
            fields: false,
        }
        .handle(&Config::default(), &client, &cancel)
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "user interrupted process");
    }

    #[test]
    fn renders_one_breed_per_line() {
        let catalog = catalog(&["Beagle", "Cairn Terrier"]);
        assert_eq!(render_breeds(&catalog, false), "Beagle\nCairn Terrier\n");
        assert_eq!(
            render_breeds(&catalog, true),
            "Beagle\tBeagle\nCairn Terrier\tCairn_Terrier\n"
        );
    }
}
