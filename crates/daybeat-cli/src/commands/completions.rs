//! Shell completion script generation.

use std::io;

pub fn run(
    shell: clap_complete::Shell,
    mut cmd: clap::Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
