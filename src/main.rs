//! Command-line front end for the transport request builders.
//!
//! ```text
//! wire-transport build http://example.com/search -d q=rust
//! wire-transport build post://example.com/api --full -H "X-Trace: 1" --content '{}'
//! wire-transport send http://example.com/ --to 93.184.216.34:80
//! wire-transport limits
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use wire_transport::config::{load_config, TransportConfig};
use wire_transport::http::{
    build_message, make_full_request, make_full_request_from_parts, Message, RequestError, RequestFlags,
    RequestType,
};
use wire_transport::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "wire-transport")]
#[command(about = "Build and send HTTP/1.1 requests from transport messages", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the wire bytes of a request
    Build(RequestArgs),
    /// Send a request to a TCP peer and print the response
    Send {
        #[command(flatten)]
        request: RequestArgs,

        /// Peer address (host:port)
        #[arg(long)]
        to: String,

        /// Stop reading after this many idle seconds
        #[arg(long, default_value_t = 10)]
        idle_secs: u64,
    },
    /// Show the configured connection limits
    Limits,
}

#[derive(Args)]
struct RequestArgs {
    /// Message address, e.g. http://example.com/search
    addr: String,

    /// Message data: query for http, body for post, raw request for full
    #[arg(short, long, default_value = "")]
    data: String,

    /// Rewrite into a full request even without headers or content
    #[arg(long)]
    full: bool,

    /// Extra header line (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request content
    #[arg(long)]
    content: Option<String>,

    /// Content type for non-empty content
    #[arg(long)]
    content_type: Option<String>,

    /// Request method
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Use the absolute-form request target
    #[arg(long)]
    absolute_uri: bool,

    /// Query part joined with '&' (repeatable, replaces --data)
    #[arg(long = "part")]
    parts: Vec<String>,
}

impl RequestArgs {
    fn wants_full(&self) -> bool {
        self.full
            || self.absolute_uri
            || self.method.is_some()
            || self.content.is_some()
            || !self.headers.is_empty()
            || !self.parts.is_empty()
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Any,
    Get,
    Post,
    Put,
    Delete,
}

impl From<MethodArg> for RequestType {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Any => RequestType::Any,
            MethodArg::Get => RequestType::Get,
            MethodArg::Post => RequestType::Post,
            MethodArg::Put => RequestType::Put,
            MethodArg::Delete => RequestType::Delete,
        }
    }
}

/// Turn the arguments into the message that goes to the builders.
fn prepare(args: &RequestArgs, config: &TransportConfig) -> Result<Message, RequestError> {
    let msg = Message::new(args.addr.as_str(), args.data.as_str());
    if !args.wants_full() {
        return Ok(msg);
    }

    let headers: String = args.headers.iter().map(|h| format!("{}\r\n", h.trim_end())).collect();
    let mut opts = config.request.options().headers(&headers);
    if let Some(content) = &args.content {
        opts = opts.content(content.as_bytes());
    }
    if let Some(content_type) = &args.content_type {
        opts = opts.content_type(content_type);
    }
    if let Some(method) = args.method {
        opts = opts.request_type(method.into());
    }
    if args.absolute_uri {
        opts = opts.flags(opts.flags | RequestFlags::ABSOLUTE_URI);
    }

    if args.parts.is_empty() {
        make_full_request(&msg, &opts)
    } else {
        make_full_request_from_parts(&msg, args.parts.as_slice(), &opts)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::default(),
    };
    init_logging(&config.observability);

    tracing::debug!(
        soft_limit = config.limits.soft,
        hard_limit = config.limits.hard,
        absolute_uri = config.request.absolute_uri,
        "Configuration ready"
    );

    match cli.command {
        Commands::Build(args) => {
            let msg = prepare(&args, &config)?;
            let req = build_message(&msg)?;

            let mut stdout = std::io::stdout().lock();
            req.send_to(&mut stdout)?;
            stdout.flush()?;
        }
        Commands::Send { request, to, idle_secs } => {
            let msg = prepare(&request, &config)?;
            let req = build_message(&msg)?;

            let mut stream = TcpStream::connect(&to).await?;
            tracing::info!(
                peer = %to,
                bytes = req.len(),
                fragments = req.fragment_count(),
                "Sending request"
            );
            req.send_to_async(&mut stream).await?;
            stream.flush().await?;

            let mut stdout = tokio::io::stdout();
            let mut buf = [0u8; 8192];
            loop {
                match tokio::time::timeout(Duration::from_secs(idle_secs), stream.read(&mut buf)).await {
                    Ok(Ok(0)) => break,
                    Ok(Ok(n)) => stdout.write_all(&buf[..n]).await?,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => {
                        tracing::debug!(idle_secs, "Response idle timeout");
                        break;
                    }
                }
            }
            stdout.flush().await?;
        }
        Commands::Limits => {
            let limits = config.limits;
            println!("soft:  {}", limits.soft);
            println!("hard:  {}", limits.hard);
            println!("delta: {}", limits.delta());
            if limits.is_inverted() {
                eprintln!("warning: soft limit exceeds hard limit");
            }
        }
    }

    Ok(())
}
