use std::io::Read;
use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use prost::Message;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout carries the response
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("failed to read the code generator request from stdin")?;

    let response = protoc_gen_rust_http::run(&input);

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&response.encode_to_vec())
        .context("failed to write the code generator response to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}
