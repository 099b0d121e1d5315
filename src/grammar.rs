use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::ConfigTree;
use crate::resolve::ConnectArgs;

/// Explicit description of the command-line grammar, derived from the
/// configuration once at start-up. The clap `Command` is built from this
/// value rather than by mutating a parser while walking the config.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub default_hop: String,
    pub servers: Vec<ServerSpec>,
}

#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub name: String,
    pub help: String,
    pub tunnels: Vec<TunnelSpec>,
}

#[derive(Debug, Clone)]
pub struct TunnelSpec {
    pub name: String,
    pub help: String,
}

impl Grammar {
    /// Walk `servers` (and each server's `tunnels`) into choice descriptors,
    /// in document order. Server help falls back to the server's `ip`,
    /// tunnel help to the tunnel alias.
    pub fn from_config(conf: ConfigTree<'_>) -> Self {
        let default_hop = conf.str_or(&["ssh", "default-hop"], "");

        let servers = conf
            .items(&["servers"])
            .into_iter()
            .map(|(name, server)| {
                let ip = server.str_or(&["ip"], "");
                let help = server.str_or(&["help"], &ip);
                let tunnels = server
                    .items(&["tunnels"])
                    .into_iter()
                    .map(|(tname, tunnel)| {
                        let thelp = tunnel.str_or(&["help"], &tname);
                        TunnelSpec {
                            name: tname,
                            help: thelp,
                        }
                    })
                    .collect();
                ServerSpec {
                    name,
                    help,
                    tunnels,
                }
            })
            .collect();

        Self {
            default_hop,
            servers,
        }
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new("stm")
            .about("SSH tunnel manager: servers and port forwards behind short aliases")
            .disable_help_subcommand(true)
            .subcommand_value_name("SERVER")
            .subcommand_help_heading("Servers")
            .arg(
                Arg::new("show-version")
                    .short('v')
                    .long("version")
                    .action(ArgAction::SetTrue)
                    .help("display current version"),
            )
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .action(ArgAction::SetTrue)
                    .help("edit configuration file"),
            )
            .arg(
                Arg::new("set-editor")
                    .long("set-editor")
                    .value_name("nano|vim|gedit|...")
                    .help("set editor for config file"),
            )
            .arg(
                Arg::new("auto-conf")
                    .long("auto-conf-network-manager")
                    .action(ArgAction::SetTrue)
                    .help("auto configure NetworkManager dnsmasq with the .stm domain"),
            )
            .arg(
                Arg::new("completions")
                    .long("completions")
                    .value_name("SHELL")
                    .value_parser(clap::value_parser!(clap_complete::Shell))
                    .hide(true)
                    .help("print a completion script for SHELL"),
            );

        for server in &self.servers {
            cmd = cmd.subcommand(self.server_command(server));
        }
        cmd
    }

    fn server_command(&self, server: &ServerSpec) -> Command {
        let mut cmd = Command::new(server.name.clone())
            .about(server.help.clone())
            .subcommand_value_name("COMMAND")
            .subcommand_help_heading("Tunnels")
            .arg(self.hop_arg());

        for tunnel in &server.tunnels {
            cmd = cmd.subcommand(
                Command::new(tunnel.name.clone())
                    .about(tunnel.help.clone())
                    .arg(
                        Arg::new("port")
                            .short('p')
                            .long("port")
                            .value_name("PORT")
                            .help("override local port"),
                    )
                    .arg(self.hop_arg())
                    .arg(
                        Arg::new("hop-port")
                            .short('P')
                            .long("hop-port")
                            .value_name("PORT")
                            .help("use a custom port for hop server, default same as local port"),
                    ),
            );
        }
        cmd
    }

    /// `-H` with no value means "use the configured default hop".
    fn hop_arg(&self) -> Arg {
        Arg::new("hop")
            .short('H')
            .long("hop")
            .value_name("ALIAS")
            .num_args(0..=1)
            .default_missing_value(self.default_hop.clone())
            .help(format!("use a hop server, default {}", self.default_hop))
    }
}

/// What one parsed invocation asks the program to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Version,
    AutoConfNetworkManager,
    SetEditor(String),
    EditConfig,
    Completions(clap_complete::Shell),
    Connect(ConnectArgs),
    ShowHelp,
}

impl Action {
    /// Top-level flags take precedence over a server subcommand, in the
    /// order: version, auto-conf, set-editor, config edit, completions.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        if matches.get_flag("show-version") {
            return Action::Version;
        }
        if matches.get_flag("auto-conf") {
            return Action::AutoConfNetworkManager;
        }
        if let Some(editor) = matches.get_one::<String>("set-editor") {
            return Action::SetEditor(editor.clone());
        }
        if matches.get_flag("config") {
            return Action::EditConfig;
        }
        if let Some(shell) = matches.get_one::<clap_complete::Shell>("completions") {
            return Action::Completions(*shell);
        }

        let Some((server, server_matches)) = matches.subcommand() else {
            return Action::ShowHelp;
        };

        let mut args = ConnectArgs {
            server: server.to_string(),
            tunnel: None,
            port: None,
            hop: server_matches.get_one::<String>("hop").cloned(),
            hop_port: None,
        };

        if let Some((tunnel, tunnel_matches)) = server_matches.subcommand() {
            args.tunnel = Some(tunnel.to_string());
            args.port = tunnel_matches.get_one::<String>("port").cloned();
            if let Some(hop) = tunnel_matches.get_one::<String>("hop") {
                args.hop = Some(hop.clone());
            }
            args.hop_port = tunnel_matches.get_one::<String>("hop-port").cloned();
        }

        Action::Connect(args)
    }
}

pub fn print_completions(shell: clap_complete::Shell, cmd: &mut Command) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, &mut std::io::stdout());
}
