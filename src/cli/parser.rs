/// Enum representing CLI commands
#[derive(Debug, PartialEq)]
pub enum Command {
    Serve { addr: String },
    Help,
    Unknown(String),
}

/// Address bound when `serve` is given no argument
pub const DEFAULT_ADDR: &str = "127.0.0.1:8788";

pub const USAGE: &[&str] = &[
    "Usage: devloop [serve [<host>:<port>] | help]",
    "",
    "Environment:",
    "  GITHUB_TOKEN      token used for GitHub API calls",
    "  ADMIN_USERNAME    admin login accepted by POST /api/auth",
    "  ADMIN_PASSWORD    admin password accepted by POST /api/auth",
    "  GITHUB_API_BASE   GitHub API root (default https://api.github.com)",
    "  RUST_LOG          log filter (default info)",
];

/// Parse command line arguments and return a Command
///
/// # Arguments
/// * `args` - Command line arguments (including program name)
///
/// # Returns
/// * `Command` - The parsed command
pub fn parse_args(args: &[String]) -> Command {
    match args.len() {
        0 | 1 => Command::Serve {
            addr: DEFAULT_ADDR.to_string(),
        },
        2 => match args[1].as_str() {
            "serve" => Command::Serve {
                addr: DEFAULT_ADDR.to_string(),
            },
            "help" | "--help" | "-h" => Command::Help,
            cmd => Command::Unknown(cmd.to_string()),
        },
        3 => match args[1].as_str() {
            "serve" if is_host_port(&args[2]) => Command::Serve {
                addr: args[2].clone(),
            },
            "serve" => Command::Unknown(format!(
                "Invalid address '{}'. Usage: devloop serve <host>:<port>",
                args[2]
            )),
            cmd => Command::Unknown(cmd.to_string()),
        },
        _ => Command::Unknown(args[1..].join(" ")),
    }
}

fn is_host_port(addr: &str) -> bool {
    addr.rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
}
