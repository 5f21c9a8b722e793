#[derive(clap::Parser, Debug)]
#[clap(name = "mangavault", about = "Manga browsing and caching service")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the API server
    Serve {
        /// Bind address, e.g. 0.0.0.0:5000 (overrides BIND_ADDRESS)
        #[clap(long)]
        bind: Option<String>,
    },
    /// Print the effective configuration and exit
    Config,
}
