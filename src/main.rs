use anyhow::{Context as _, Result};
use std::process::exit;

use stm::{config, context, exec, grammar, netconf, render, resolve, style};
use stm::{Action, Config, Grammar};

const APP_NAME: &str = "SSH Tunnel Manager";

fn main() {
    match run() {
        Ok(code) => exit(code),
        Err(e) => {
            style::err(&format!("{e:#}"));
            exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let paths = context::resolve_paths()?;
    let doc = Config::load_from_path(&paths.config_file)?;

    let grammar = Grammar::from_config(doc.tree());
    let mut cmd = grammar.to_command();
    let matches = cmd.clone().get_matches();

    match Action::from_matches(&matches) {
        Action::Version => {
            style::version(APP_NAME, env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Action::AutoConfNetworkManager => {
            netconf::auto_configure()?;
            Ok(0)
        }
        Action::SetEditor(editor) => {
            config::set_editor(&paths.config_file, &editor)?;
            Ok(0)
        }
        Action::EditConfig => {
            let editor = doc
                .tree()
                .get_str(&["editor"])
                .context("no editor configured (use --set-editor)")?;
            let config_file = paths.config_file.to_string_lossy();
            exec::spawn_detached(&editor, &[config_file.as_ref()])?;
            Ok(0)
        }
        Action::Completions(shell) => {
            grammar::print_completions(shell, &mut cmd);
            Ok(0)
        }
        Action::Connect(args) => {
            let invocation = resolve::resolve(doc.tree(), &args)?;
            let rendered = render::render(doc.tree(), &invocation)?;
            if let Some(line) = &rendered.status {
                style::status(line);
            }
            style::head("RUN", &rendered.command);
            exec::run(&rendered.command)
        }
        Action::ShowHelp => {
            cmd.print_help()?;
            Ok(0)
        }
    }
}
