use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use dog_search_sdk::providers::catalog::ClientTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::interruptible;
use crate::config::Config;
use crate::utils::message;

/// Log in to the catalog service
#[derive(Debug, Bpaf, Clone)]
pub struct Login {
    /// Name to log in with
    #[bpaf(long, argument("NAME"))]
    name: String,

    /// Email address to log in with
    #[bpaf(long, argument("EMAIL"))]
    email: String,

    /// Print the session cookie instead of storing it in the config
    #[bpaf(long)]
    print: bool,
}

impl Login {
    #[instrument(name = "login", skip_all, fields(print = self.print))]
    pub async fn handle(
        self,
        config: &Config,
        client: &impl ClientTrait,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let session = interruptible(cancel, async {
            client
                .login(&self.name, &self.email)
                .await
                .context("Could not log in")
        })
        .await?;
        let Some(cookie) = session.cookie() else {
            bail!("The catalog service did not hand out a session");
        };

        if self.print {
            println!("{cookie}");
            return Ok(());
        }

        config.write_session_cookie(cookie)?;
        debug!(path = ?config.user_config_file(), "stored session");
        message::updated(format!(
            "Logged in as '{}', session stored in {}",
            self.name,
            config.user_config_file().display()
        ));
        Ok(())
    }
}
