mod cli;
mod config;
mod engine;
mod logging;
mod poll;
mod replay;
mod ring;
mod sample;
mod source;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
