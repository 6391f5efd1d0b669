#[macro_use] extern crate anyhow;
#[macro_use] extern crate log;
extern crate pretty_env_logger;

pub mod error;
pub mod ygopro;
pub mod printer;

use clap::Parser;

use crate::printer::get_configuration;

/// Print the cards of a ydk deck as a pdf sheet.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Arguments {
    /// Deck file name under the deck directory, without `.ydk`.
    deck: String,
    /// Language of the card database and artwork.
    #[arg(short, long)]
    lang: Option<String>,
    /// Configuration directory, overrides `YDK_PRINTER_CONFIG_PATH`.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    init_logger();
    let arguments = Arguments::parse();
    printer::config::init(arguments.config.as_deref()).expect("Failed to load ydk-printer configuration.");
    match printer::run(get_configuration(), &arguments.deck, arguments.lang.as_deref()).await {
        Ok(summary) => summary.report(),
        Err(err) => {
            error!("Failed to print deck {}: {:?}", arguments.deck, err);
            std::process::exit(1);
        }
    }
}

fn init_logger() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
}
