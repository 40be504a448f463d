#![allow(clippy::cargo_common_metadata)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use xshell::{cmd, Shell};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Fmt,
    Check,
    Clippy,
    Test {
        /// Skip the headless browser suite
        #[arg(long)]
        native_only: bool,
    },
    Doc,
    PreCommit,
}

const WASM_TARGET: &str = "wasm32-unknown-unknown";

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Command::Fmt => fmt(&sh)?,
        Command::Check => check(&sh)?,
        Command::Clippy => clippy(&sh)?,
        Command::Test { native_only } => test(&sh, native_only)?,
        Command::Doc => doc(&sh)?,
        Command::PreCommit => pre_commit(&sh)?,
    };

    Ok(())
}

fn fmt(sh: &Shell) -> Result<()> {
    Ok(cmd!(sh, "cargo +nightly fmt").run()?)
}

// the browser adapters only exist on wasm32, so both targets are checked
fn check(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo check --all-targets --all-features --workspace").run()?;
    Ok(cmd!(
        sh,
        "cargo check --all-features --package wasm-call --target {WASM_TARGET}"
    )
    .run()?)
}

fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --all-targets --all-features --workspace").run()?;
    Ok(cmd!(
        sh,
        "cargo clippy --all-features --package wasm-call --target {WASM_TARGET}"
    )
    .run()?)
}

fn test(sh: &Shell, native_only: bool) -> Result<()> {
    cmd!(sh, "cargo test --workspace").run()?;
    if native_only {
        return Ok(());
    }

    let _library = sh.push_dir(project_root::get_project_root()?.join("library/"));
    cmd!(sh, "wasm-pack test --headless --firefox").run()?;
    cmd!(sh, "wasm-pack test --headless --chrome").run()?;
    Ok(())
}

fn doc(sh: &Shell) -> Result<()> {
    Ok(cmd!(sh, "cargo doc --no-deps --all-features").run()?)
}

fn pre_commit(sh: &Shell) -> Result<()> {
    fmt(sh)?;
    check(sh)?;
    test(sh, false)?;
    doc(sh)
}
