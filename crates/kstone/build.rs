use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, ValueEnum};
use clap_complete::Shell;

#[path = "src/cli.rs"]
mod cli;

/// Renders `OUT_DIR/man/man1/*.1` and `OUT_DIR/completions/*` for
/// packaging. Pages are named after their command path, so
/// `kstone project ensure` lands in `kstone-project-ensure.1`.
fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or("OUT_DIR not set by Cargo")?);
    let mut cmd = cli::Cli::command();

    let man_dir = out_dir.join("man").join("man1");
    fs::create_dir_all(&man_dir)?;
    let mut pending = vec![(cmd.get_name().to_owned(), cmd.clone())];
    while let Some((page, command)) = pending.pop() {
        render_page(&page, &command, &man_dir)?;
        pending.extend(
            command
                .get_subcommands()
                .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
                .map(|sub| {
                    let page = format!("{page}-{}", sub.get_name());
                    (page.clone(), sub.clone().name(page))
                }),
        );
    }

    let completion_dir = out_dir.join("completions");
    fs::create_dir_all(&completion_dir)?;
    for shell in Shell::value_variants() {
        clap_complete::generate_to(*shell, &mut cmd, "kstone", &completion_dir)?;
    }
    Ok(())
}

fn render_page(page: &str, command: &clap::Command, dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(command.clone()).render(&mut buf)?;
    fs::write(dir.join(format!("{page}.1")), buf)?;
    Ok(())
}
