//! resplink CLI Client
//!
//! Command-line interface for talking to a RESP2 server.

use clap::{Parser, Subcommand, ValueEnum};
use resplink::{Client, Config, Serializer, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// resplink CLI
#[derive(Parser, Debug)]
#[command(name = "resplink-cli")]
#[command(about = "CLI for RESP2 servers")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Unix socket path (overrides host and port)
    #[arg(short, long)]
    socket: Option<String>,

    /// Database index selected after connecting
    #[arg(short = 'n', long, default_value = "0")]
    db: i64,

    /// Password sent with AUTH after connecting
    #[arg(short = 'a', long)]
    password: Option<String>,

    /// Connect and read timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout: u64,

    /// Key prefix applied to key arguments
    #[arg(long)]
    prefix: Option<String>,

    /// Value serializer
    #[arg(long, value_enum, default_value = "none")]
    serializer: SerializerArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SerializerArg {
    None,
    Structured,
    Compact,
}

impl From<SerializerArg> for Serializer {
    fn from(arg: SerializerArg) -> Self {
        match arg {
            SerializerArg::None => Serializer::None,
            SerializerArg::Structured => Serializer::Structured,
            SerializerArg::Compact => Serializer::Compact,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete keys
    Del {
        /// The keys to delete
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Ping the server
    Ping,

    /// Server information, optionally one section
    Info {
        section: Option<String>,
    },

    /// Send any command as given and print the reply
    Exec {
        /// Keyword followed by arguments
        #[arg(required = true)]
        words: Vec<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resplink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .connect_timeout_ms(args.timeout)
        .read_timeout_ms(args.timeout)
        .serializer(args.serializer.into())
        .database(args.db);
    builder = match &args.socket {
        Some(path) => builder.unix_socket(path.as_str()),
        None => builder.host(args.host.as_str()).port(args.port),
    };
    if let Some(password) = &args.password {
        builder = builder.auth(password.as_bytes());
    }
    if let Some(prefix) = &args.prefix {
        builder = builder.prefix(prefix.as_bytes());
    }
    let config = builder.build();

    tracing::debug!("Connecting to {}", config.target());

    let mut client = match Client::open(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let result = match &args.command {
        Commands::Get { key } => client.get(key.as_bytes()),
        Commands::Set { key, value } => client.set(key.as_bytes(), value.as_str()),
        Commands::Del { keys } => client.del(keys),
        Commands::Ping => client.ping(),
        Commands::Info { section } => client.info(section.as_deref().map(str::as_bytes)),
        Commands::Exec { words } => client.execute(words),
    };

    match result {
        Ok(value) => {
            let mut out = String::new();
            render(&value, 0, &mut out);
            print!("{}", out);
            if let Some(err) = client.take_error() {
                eprintln!("(error) {}", err);
            }
        }
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }

    client.disconnect();
}

/// Render a value in the familiar numbered-list layout
fn render(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Nil => out.push_str("(nil)\n"),
        Value::Bool(true) => out.push_str("OK\n"),
        Value::Bool(false) => out.push_str("(false)\n"),
        Value::Int(i) => out.push_str(&format!("(integer) {}\n", i)),
        Value::Double(d) => out.push_str(&format!(
            "(double) {}\n",
            resplink::protocol::format_double(*d)
        )),
        Value::Bytes(b) => out.push_str(&format!("\"{}\"\n", String::from_utf8_lossy(b))),
        Value::Array(items) if items.is_empty() => out.push_str("(empty array)\n"),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(&" ".repeat(indent));
                }
                out.push_str(&format!("{}) ", i + 1));
                render(item, indent + 3, out);
            }
        }
        Value::Map(map) if map.is_empty() => out.push_str("(empty map)\n"),
        Value::Map(map) => {
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(&" ".repeat(indent));
                }
                out.push_str(&format!("{}# \"{}\" => ", i + 1, String::from_utf8_lossy(key)));
                render(item, indent + 3, out);
            }
        }
    }
}
