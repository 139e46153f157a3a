//! Icinga2 `CheckCommand` generation.
//!
//! Setting the `GENERATE_ICINGA_COMMAND` environment variable makes the
//! binary print an `object CheckCommand` definition derived from its own
//! CLI and exit, so deployments can template the icinga side from the
//! plugin itself.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum IcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
}

/// Prints the Icinga command configuration and exits 0 if
/// `GENERATE_ICINGA_COMMAND` is set; otherwise does nothing.
pub fn print_command_config_if_requested(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), IcingaCommandError> {
    if std::env::var("GENERATE_ICINGA_COMMAND").is_err() {
        return Ok(());
    }

    let exe = std::env::current_exe()?;
    let exe = exe
        .to_str()
        .ok_or(IcingaCommandError::InvalidExecutablePath)?;

    println!("{}", command_config(name, exe, cmd).trim());
    std::process::exit(0);
}

fn command_config(name: &str, exe: &str, cmd: &clap::Command) -> String {
    let args: Vec<&clap::Arg> = cmd
        .get_arguments()
        .filter(|arg| {
            let id = arg.get_id().as_str();
            id != "help" && id != "version"
        })
        .filter(|arg| arg.get_long().is_some())
        .collect();

    let mut out = format!("object CheckCommand \"{name}\" {{\n");
    out.push_str(&format!("  command = [ \"{exe}\" ]\n"));

    out.push_str("  arguments = {\n");
    for arg in &args {
        let long = arg.get_long().unwrap_or_default();
        let var = long.replace('-', "_");

        out.push_str(&format!("    \"--{long}\" = {{\n"));
        out.push_str(&format!("      value = \"${var}$\"\n"));
        if let Some(help) = arg.get_help() {
            out.push_str(&format!(
                "      description = \"{}\"\n",
                escape(&help.to_string())
            ));
        }
        out.push_str("    }\n");
    }
    out.push_str("  }\n");

    for arg in &args {
        let long = arg.get_long().unwrap_or_default();
        let var = long.replace('-', "_");
        if let Some(default) = arg.get_default_values().first().and_then(|v| v.to_str()) {
            out.push_str(&format!("  vars.{var} = \"{}\"\n", escape(default)));
        }
    }

    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('"', "\\\"").replace('$', "\\$")
}
