use anyhow::{bail, Result};

use crate::config::ConfigTree;

/// The four command shapes, keyed by their template entry under `ssh:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTemplate {
    Direct,
    Hop,
    Tunnel,
    HopTunnel,
}

impl CommandTemplate {
    pub fn config_key(self) -> &'static str {
        match self {
            CommandTemplate::Direct => "cmd",
            CommandTemplate::Hop => "hop-cmd",
            CommandTemplate::Tunnel => "tunnel-cmd",
            CommandTemplate::HopTunnel => "hop-tunnel-cmd",
        }
    }
}

/// One parsed connect invocation, straight off the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectArgs {
    pub server: String,
    pub tunnel: Option<String>,
    pub port: Option<String>,
    pub hop: Option<String>,
    pub hop_port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelPorts {
    pub local: String,
    pub remote: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopLeg {
    pub host: String,
    /// Hop-side port; only meaningful when a tunnel is selected. A bare
    /// hop is a plain jump and carries no ports.
    pub port: Option<String>,
}

/// Substitution variables for one run, consumed once by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInvocation {
    /// Selected server alias (the subcommand name), used for display.
    pub alias: String,
    pub remote: String,
    pub tunnel: Option<TunnelPorts>,
    pub hop: Option<HopLeg>,
}

impl ResolvedInvocation {
    pub fn template(&self) -> CommandTemplate {
        match (&self.tunnel, &self.hop) {
            (Some(_), Some(_)) => CommandTemplate::HopTunnel,
            (Some(_), None) => CommandTemplate::Tunnel,
            (None, Some(_)) => CommandTemplate::Hop,
            (None, None) => CommandTemplate::Direct,
        }
    }
}

/// Merge CLI overrides with configuration defaults.
///
/// Explicit beats configured: `-p` over the tunnel's `local`, `-P` over
/// the local port as the hop-side port. Unknown aliases and malformed
/// entries fail here, before any command string exists.
pub fn resolve(conf: ConfigTree<'_>, args: &ConnectArgs) -> Result<ResolvedInvocation> {
    if !conf.has(&["servers", args.server.as_str()]) {
        bail!("unknown server '{}'", args.server);
    }
    let server = conf.sub(&["servers", args.server.as_str()]);

    let remote = match server.get_str(&["ip"]) {
        Some(ip) if !ip.is_empty() => ip,
        _ => bail!("server '{}' has no ip configured", args.server),
    };

    let tunnel = match &args.tunnel {
        Some(name) => Some(resolve_tunnel(server, &args.server, name, args.port.as_deref())?),
        None => None,
    };

    let hop = match &args.hop {
        Some(alias) => {
            if alias.is_empty() {
                bail!("--hop given without a value and no ssh.default-hop configured");
            }
            // Hop-side port defaults to the (possibly overridden) local
            // port; without a tunnel there is nothing to forward.
            let port = tunnel
                .as_ref()
                .map(|t| args.hop_port.clone().unwrap_or_else(|| t.local.clone()));
            Some(HopLeg {
                host: alias.clone(),
                port,
            })
        }
        None => None,
    };

    Ok(ResolvedInvocation {
        alias: args.server.clone(),
        remote,
        tunnel,
        hop,
    })
}

fn resolve_tunnel(
    server: ConfigTree<'_>,
    server_alias: &str,
    name: &str,
    port_override: Option<&str>,
) -> Result<TunnelPorts> {
    if !server.has(&["tunnels", name]) {
        bail!("unknown tunnel '{name}' on server '{server_alias}'");
    }
    let entry = server.sub(&["tunnels", name]);

    let local = match port_override
        .map(str::to_string)
        .or_else(|| entry.get_str(&["local"]))
    {
        Some(p) if !p.is_empty() => p,
        _ => bail!("tunnel '{name}' on server '{server_alias}' has no local port"),
    };
    let remote = match entry.get_str(&["remote"]) {
        Some(p) if !p.is_empty() => p,
        _ => bail!("tunnel '{name}' on server '{server_alias}' has no remote port"),
    };

    Ok(TunnelPorts { local, remote })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    const DOC: &str = r#"
ssh:
  default-hop: bastion
servers:
  myhost:
    ip: 10.0.0.5
    tunnels:
      web:
        local: 8080
        remote: 80
      broken:
        remote: 443
  noip:
    help: misconfigured
"#;

    fn connect(args: &ConnectArgs) -> Result<ResolvedInvocation> {
        let doc = Config::parse(DOC).unwrap();
        resolve(doc.tree(), args)
    }

    fn base(server: &str) -> ConnectArgs {
        ConnectArgs {
            server: server.to_string(),
            ..ConnectArgs::default()
        }
    }

    #[test]
    fn bare_server_resolves_to_the_direct_template() {
        let inv = connect(&base("myhost")).unwrap();
        assert_eq!(inv.remote, "10.0.0.5");
        assert_eq!(inv.tunnel, None);
        assert_eq!(inv.hop, None);
        assert_eq!(inv.template(), CommandTemplate::Direct);
    }

    #[test]
    fn tunnel_reproduces_configured_ports_verbatim() {
        let mut args = base("myhost");
        args.tunnel = Some("web".to_string());

        let inv = connect(&args).unwrap();
        let tunnel = inv.tunnel.unwrap();
        assert_eq!(tunnel.local, "8080");
        assert_eq!(tunnel.remote, "80");
    }

    #[test]
    fn port_override_beats_the_configured_local_port() {
        let mut args = base("myhost");
        args.tunnel = Some("web".to_string());
        args.port = Some("9090".to_string());

        let inv = connect(&args).unwrap();
        assert_eq!(inv.tunnel.unwrap().local, "9090");
    }

    #[test]
    fn bare_hop_is_a_plain_jump_and_ignores_port_flags() {
        let mut args = base("myhost");
        args.hop = Some("bastion".to_string());
        args.hop_port = Some("2222".to_string());

        let inv = connect(&args).unwrap();
        assert_eq!(inv.template(), CommandTemplate::Hop);
        let hop = inv.hop.unwrap();
        assert_eq!(hop.host, "bastion");
        assert_eq!(hop.port, None);
    }

    #[test]
    fn hop_port_defaults_to_the_effective_local_port() {
        let mut args = base("myhost");
        args.tunnel = Some("web".to_string());
        args.hop = Some("bastion".to_string());

        let inv = connect(&args).unwrap();
        assert_eq!(inv.template(), CommandTemplate::HopTunnel);
        assert_eq!(inv.hop.unwrap().port.as_deref(), Some("8080"));

        // ...including after a -p override
        args.port = Some("9090".to_string());
        let inv = connect(&args).unwrap();
        assert_eq!(inv.hop.unwrap().port.as_deref(), Some("9090"));
    }

    #[test]
    fn hop_port_override_beats_the_local_port_fallback() {
        let mut args = base("myhost");
        args.tunnel = Some("web".to_string());
        args.hop = Some("bastion".to_string());
        args.hop_port = Some("2222".to_string());

        let inv = connect(&args).unwrap();
        assert_eq!(inv.hop.unwrap().port.as_deref(), Some("2222"));
    }

    #[test]
    fn unknown_server_fails_instead_of_rendering_garbage() {
        let err = connect(&base("nosuch")).unwrap_err();
        assert!(err.to_string().contains("unknown server 'nosuch'"));
    }

    #[test]
    fn unknown_tunnel_fails_with_both_aliases_named() {
        let mut args = base("myhost");
        args.tunnel = Some("nosuch".to_string());

        let err = connect(&args).unwrap_err();
        assert!(err
            .to_string()
            .contains("unknown tunnel 'nosuch' on server 'myhost'"));
    }

    #[test]
    fn missing_ip_is_a_resolution_error() {
        let err = connect(&base("noip")).unwrap_err();
        assert!(err.to_string().contains("has no ip configured"));
    }

    #[test]
    fn missing_local_port_errors_unless_overridden() {
        let mut args = base("myhost");
        args.tunnel = Some("broken".to_string());

        let err = connect(&args).unwrap_err();
        assert!(err.to_string().contains("has no local port"));

        args.port = Some("4430".to_string());
        let inv = connect(&args).unwrap();
        let tunnel = inv.tunnel.unwrap();
        assert_eq!(tunnel.local, "4430");
        assert_eq!(tunnel.remote, "443");
    }

    #[test]
    fn empty_hop_alias_is_rejected() {
        let mut args = base("myhost");
        args.hop = Some(String::new());

        let err = connect(&args).unwrap_err();
        assert!(err.to_string().contains("default-hop"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut args = base("myhost");
        args.tunnel = Some("web".to_string());
        args.hop = Some("bastion".to_string());

        assert_eq!(connect(&args).unwrap(), connect(&args).unwrap());
    }
}
