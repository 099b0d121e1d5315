use anyhow::{bail, Context as _, Result};
use std::collections::BTreeMap;

use crate::config::ConfigTree;
use crate::resolve::ResolvedInvocation;

/// Pseudo-domain served by the dnsmasq snippet; tunnel endpoints are
/// reachable as <server>.stm:<port> once it is installed.
const LOCAL_DOMAIN: &str = "stm";

/// A rendered invocation: the literal command line plus an optional
/// human-readable status line (tunnel cases only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub command: String,
    pub status: Option<String>,
}

/// Substitute the resolved variables into the template selected by the
/// invocation. Pure; execution belongs to the caller.
pub fn render(conf: ConfigTree<'_>, inv: &ResolvedInvocation) -> Result<Rendered> {
    let key = inv.template().config_key();
    let source = conf
        .get_str(&["ssh", key])
        .with_context(|| format!("missing command template ssh.{key} in configuration"))?;

    let vars = variables(inv);
    let command =
        substitute(&source, &vars).with_context(|| format!("in template ssh.{key}"))?;

    Ok(Rendered {
        command,
        status: status_line(inv),
    })
}

/// Every variable the invocation defines, whether or not the chosen
/// template uses it.
fn variables(inv: &ResolvedInvocation) -> BTreeMap<&'static str, String> {
    let mut vars = BTreeMap::new();
    vars.insert("remote", inv.remote.clone());
    if let Some(tunnel) = &inv.tunnel {
        vars.insert("lport", tunnel.local.clone());
        vars.insert("rport", tunnel.remote.clone());
    }
    if let Some(hop) = &inv.hop {
        vars.insert("hop", hop.host.clone());
        if let Some(port) = &hop.port {
            vars.insert("hport", port.clone());
        }
    }
    vars
}

/// Single left-to-right scan over `{name}` placeholders. No recursion,
/// no escaping; an unknown name or an unclosed brace is an error.
fn substitute(template: &str, vars: &BTreeMap<&'static str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let Some(end) = after.find('}') else {
            bail!("unclosed placeholder in template: {template}");
        };
        let token = &after[..end];
        match vars.get(token) {
            Some(value) => out.push_str(value),
            None => bail!("unknown placeholder {{{token}}} in template: {template}"),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn status_line(inv: &ResolvedInvocation) -> Option<String> {
    let tunnel = inv.tunnel.as_ref()?;
    let mut msg = format!(
        "# {}:{} forwarding on {}.{}:{}",
        inv.remote, tunnel.remote, inv.alias, LOCAL_DOMAIN, tunnel.local
    );
    if let Some(hop) = &inv.hop {
        if let Some(port) = &hop.port {
            msg.push_str(&format!(" (through {}:{})", hop.host, port));
        }
    }
    msg.push_str("...");
    Some(msg)
}
