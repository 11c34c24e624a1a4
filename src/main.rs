use anyhow::Result;

fn main() -> Result<()> {
    // UCI talks on stdout; diagnostics go to stderr so the protocol
    // stream stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    vesper::uci::run()?;
    Ok(())
}
