use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use socket_calculator::{init_tracing, threads, vanilla};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The type of server
    #[arg(short, long, value_enum, default_value_t = Kind::Threads)]
    kind: Kind,

    /// IP address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    ip: Ipv4Addr,

    /// Port to bind to
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[derive(Clone, Debug, ValueEnum)]
enum Kind {
    /// One client at a time
    Vanilla,

    /// One thread per client
    Threads,
}

fn main() -> Result<()> {
    init_tracing("info");

    let args = Args::parse();
    let addr = SocketAddrV4::new(args.ip, args.port);

    // Create our listener socket
    let listener = TcpListener::bind(addr).with_context(|| format!("failed to bind {addr}"))?;

    match args.kind {
        Kind::Vanilla => vanilla::run(listener),
        Kind::Threads => threads::run(listener),
    }

    Ok(())
}
