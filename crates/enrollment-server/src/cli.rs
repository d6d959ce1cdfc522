//! Enrollment server command-line interface
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use clap::Parser;
use enrollment_server::config::Config;
use log::{error, info};
use std::{path, process};

#[derive(Debug, Parser)]
#[command(rename_all = "kebab")]
struct Opt {
    /// Path to the JSON configuration file
    config_path: path::PathBuf,

    /// Address to serve on, overriding the configuration file
    #[arg(long)]
    listen: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

/// Entry point
fn main() {
    // parse args
    let opt = Opt::parse();

    // setup logger
    let default_filter = if opt.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // load configuration
    info!("Loading configuration {:?}", opt.config_path);
    let mut config = match Config::from_file(&opt.config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };
    if let Some(listen) = opt.listen {
        config.listen_address = listen;
    }

    let sys = actix_rt::System::new();

    let server = match enrollment_server::server::server(&config) {
        Ok(server) => server,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    info!("Enrollment server running on {}", config.listen_address);
    if let Err(err) = sys.block_on(server) {
        error!("{}", err);
        process::exit(1);
    }

    info!("done");
}
