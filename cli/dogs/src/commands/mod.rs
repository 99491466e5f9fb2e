mod breeds;
mod filter;
mod login;
mod search;

use std::future::Future;

use anyhow::{Result, anyhow};
use bpaf::Bpaf;
use indoc::indoc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::utils::init::init_catalog_client;

const DOGS_DESCRIPTION: &str = indoc! {"
    Search the catalog of adoptable dogs.

    Filter by breed, page through the results
    and build the links the search page would follow."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DOGS_DESCRIPTION))]
pub struct DogsCli(#[bpaf(external(dogs_args))] pub DogsArgs);

/// Main dogs args parser
///
/// To parse the dogs CLI, use [`DogsCli`] instead using [`dogs_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct DogsArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl DogsArgs {
    /// Run the selected command
    ///
    /// `cancel` aborts a running search.
    pub async fn handle(self, config: Config, cancel: CancellationToken) -> Result<()> {
        match self.command {
            Commands::Login(args) => {
                let client = init_catalog_client(&config)?;
                args.handle(&config, &client, &cancel).await
            },
            Commands::Breeds(args) => {
                let client = init_catalog_client(&config)?;
                args.handle(&config, &client, &cancel).await
            },
            Commands::Search(args) => {
                let client = init_catalog_client(&config)?;
                args.handle(&config, &client, &cancel).await
            },
            Commands::Filter(args) => args.handle(),
        }
    }
}

/// Wait for `work` unless `cancel` fires first.
///
/// Ctrl-C only cancels the token, commands that talk to the catalog
/// have to stop waiting on their own.
pub(crate) async fn interruptible<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(anyhow!("user interrupted process")),
        result = work => result,
    }
}

#[derive(Bpaf, Clone, Debug)]
enum Commands {
    /// Log in to the catalog service and store the session
    #[bpaf(command)]
    Login(#[bpaf(external(login::login))] login::Login),

    /// List the breeds known to the catalog
    #[bpaf(command)]
    Breeds(#[bpaf(external(breeds::breeds))] breeds::Breeds),

    /// Search for dogs
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Show where a submission of the breed filter form leads
    #[bpaf(command)]
    Filter(#[bpaf(external(filter::filter))] filter::Filter),
}
