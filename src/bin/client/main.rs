use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use socket_calculator::{client::Config, init_tracing};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Host of the server.
    host: Option<String>,

    /// Port of the server. Falls back to the default when it does not parse.
    #[arg(allow_hyphen_values = true)]
    port: Option<String>,

    /// A request to send once before the interactive prompt,
    /// e.g. `client localhost 5000 6 * 7`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    request: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing("warn");

    let args = Args::parse();
    let cfg = Config::from_args(args.host.as_deref(), args.port.as_deref());
    let (host, port) = (cfg.host.clone(), cfg.port);

    // Connect to the server
    let mut client = cfg
        .connect()
        .with_context(|| format!("failed to connect to {host}:{port}"))?;
    println!("Connected to server at {host}:{port}");

    let mut stdout = io::stdout();

    let request = args.request.join(" ");
    if !request.trim().is_empty() {
        let answer = client.exchange(&request, &mut stdout).context("client error")?;
        match answer {
            Some(answer) => println!("Answer = {answer}"),
            None => return Ok(()),
        }
    }

    client
        .run(io::stdin().lock(), &mut stdout)
        .context("client error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn negative_port_reaches_fallback() {
        let args = Args::try_parse_from(["client", "h", "-1"]).unwrap();
        assert_eq!(args.host.as_deref(), Some("h"));
        assert_eq!(args.port.as_deref(), Some("-1"));

        let cfg = Config::from_args(args.host.as_deref(), args.port.as_deref());
        assert_eq!(cfg.port, 5000);
    }

    #[test]
    fn trailing_words_form_initial_request() {
        let args = Args::try_parse_from(["client", "localhost", "6000", "-3", "*", "7"]).unwrap();
        assert_eq!(args.port.as_deref(), Some("6000"));
        assert_eq!(args.request.join(" "), "-3 * 7");

        let args = Args::try_parse_from(["client"]).unwrap();
        assert_eq!(args.host, None);
        assert_eq!(args.port, None);
        assert!(args.request.is_empty());
    }
}
