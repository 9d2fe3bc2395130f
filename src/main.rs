use clap::Parser;
use phylodraw::app::{AppConfig, PhyloDraw};

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();

    let config = AppConfig::parse();
    if let Err(err) = PhyloDraw::run(&config) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
