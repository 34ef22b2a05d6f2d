//! Renders `tunnely` man pages into `$OUT_DIR/man` and shell completion
//! scripts into `$OUT_DIR/completions`, for packagers to pick up.

use std::io;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, ValueEnum};
use clap_complete::Shell;

// cli.rs only needs clap + clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
mod cli;

const BIN_NAME: &str = "tunnely";

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR not set by Cargo"))?;
    let mut cmd = cli::Cli::command();

    write_man_pages(&cmd, &out_dir.join("man"))?;
    write_completions(&mut cmd, &out_dir.join("completions"))
}

/// One page per visible command: `tunnely.1`, `tunnely-redeem.1`,
/// `tunnely-config-init.1`, ...
fn write_man_pages(root: &clap::Command, dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;

    let mut pending = vec![root.clone()];
    while let Some(cmd) = pending.pop() {
        let page = cmd.get_name().to_owned();
        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(|sub| sub.clone().name(format!("{page}-{}", sub.get_name()))),
        );

        let mut roff = Vec::new();
        clap_mangen::Man::new(cmd).render(&mut roff)?;
        std::fs::write(dir.join(format!("{page}.1")), roff)?;
    }
    Ok(())
}

fn write_completions(cmd: &mut clap::Command, dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for &shell in Shell::value_variants() {
        clap_complete::generate_to(shell, cmd, BIN_NAME, dir)?;
    }
    Ok(())
}
