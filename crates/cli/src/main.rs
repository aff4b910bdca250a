use bridge::console::{Bridge, NormalizedResult, Output};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bconsole-bridge")]
#[command(about = "bconsole command bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: BRIDGE_CONFIG_PATH or ~/.bconsole-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the HTTP gateway exposing directors, console commands, and job tasks.
    Gateway {
        /// Config file path (default: BRIDGE_CONFIG_PATH or ~/.bconsole-bridge/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 9096)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run one allowlisted console command, e.g. `exec -- show pool=Default`.
    Exec {
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Director to address; validated against the console's director list.
        #[arg(long, short)]
        director: Option<String>,

        /// Acting user; selects the per-user console config when a template is configured.
        #[arg(long, short)]
        user: Option<String>,

        /// Print the `{ output, error }` envelope as JSON.
        #[arg(long)]
        json: bool,

        /// Command tokens; the first is the verb.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// List directors known to the console.
    Directors {
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Test a console setup before saving it: list its directors and run a command on the first.
    Probe {
        /// Console binary to test.
        #[arg(long, value_name = "PATH")]
        bin: String,

        /// Console config file to test.
        #[arg(long, value_name = "PATH")]
        cfg: String,

        /// Prefix with sudo.
        #[arg(long)]
        sudo: bool,

        #[arg(long)]
        json: bool,

        /// Command tokens (default: version).
        #[arg(trailing_var_arg = true)]
        tokens: Vec<String>,
    },

    /// List confirmed job names per director.
    Jobs {
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        #[arg(long, short)]
        user: Option<String>,

        /// Maximum job names per director (0 = no limit).
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Some(Commands::Version) => {
            println!("bconsole-bridge {}", env!("CARGO_PKG_VERSION"));
            Ok(true)
        }
        Some(Commands::Init { config }) => run_init(config).map(|_| true),
        Some(Commands::Gateway { config, port }) => run_gateway(config, port).await.map(|_| true),
        Some(Commands::Exec {
            config,
            director,
            user,
            json,
            tokens,
        }) => load_bridge(config).map(|console| {
            let result = console.command(director.as_deref(), tokens, user.as_deref());
            print_result(&result, json)
        }),
        Some(Commands::Directors { config, json }) => load_bridge(config).map(|console| {
            print_result(&console.list_directors().into_result(), json)
        }),
        Some(Commands::Probe {
            bin,
            cfg,
            sudo,
            json,
            tokens,
        }) => load_bridge(None).map(|console| {
            let tokens = if tokens.is_empty() {
                vec!["version".to_string()]
            } else {
                tokens
            };
            print_result(&console.probe(&bin, &cfg, sudo, tokens), json)
        }),
        Some(Commands::Jobs {
            config,
            user,
            limit,
        }) => load_bridge(config).map(|console| {
            print_result(&bridge::jobs::job_tasks(&console, user.as_deref(), limit), true)
        }),
        None => {
            println!("Run with --help for usage");
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(bridge::config::default_config_path);
    let dir = bridge::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = bridge::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    bridge::gateway::run_gateway(config, path).await
}

fn load_bridge(config_path: Option<std::path::PathBuf>) -> anyhow::Result<Bridge> {
    let (config, _) = bridge::config::load_config(config_path)?;
    Ok(Bridge::from_config(&config))
}

/// Print the result; returns true when the envelope carries no error.
fn print_result(result: &NormalizedResult, json: bool) -> bool {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(s) => println!("{}", s),
            Err(e) => log::error!("serializing result: {}", e),
        }
    } else {
        match &result.output {
            Output::Scalar(s) => println!("{}", s),
            Output::Lines(lines) => {
                for l in lines {
                    println!("{}", l);
                }
            }
            Output::Object(v) => println!("{}", v),
        }
        if !result.is_ok() {
            eprintln!("error {}", result.error.code());
        }
    }
    result.is_ok()
}
