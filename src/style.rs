//! Tagged `TAG > message` lines, the program's whole reporting surface.

use colored::Colorize;

pub fn err(msg: &str) {
    eprintln!("{}", format!("ERROR > {msg}").red());
}

pub fn ok(msg: &str) {
    println!("{}", format!("SUCCESS > {msg}").green());
}

pub fn head(tag: &str, msg: &str) {
    println!("{}", format!("{tag} > {msg}").magenta());
}

/// The forwarding status line printed just before a tunnel goes up.
pub fn status(msg: &str) {
    println!("{}", msg.yellow().bold());
}

pub fn version(app: &str, version: &str) {
    println!("{} {}", app.bold(), version);
}
