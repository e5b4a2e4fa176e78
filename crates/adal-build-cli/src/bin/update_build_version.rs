use adal_build_core::version::{read_version_triple, PlistPatcher};
use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;

const USAGE: &str = "Command in Run Script not properly set. \
Usage: update-build-version version_file Info.plist [... Info.plist]";

#[derive(Parser)]
#[command(
    name = "update-build-version",
    about = "Copy the ADAL version from a header into Info.plist files",
    version
)]
struct Cli {
    /// Header defining ADAL_VER_HIGH, ADAL_VER_LOW and ADAL_VER_PATCH
    version_file: PathBuf,

    /// Info.plist files to update
    #[arg(required = true)]
    plists: Vec<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(_) => {
            println!("{USAGE}");
            std::process::exit(1);
        }
    };
    adal_build_cli::init_logging();

    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let version = read_version_triple(&cli.version_file)
        .with_context(|| format!("failed to read {}", cli.version_file.display()))?;
    let Some(version) = version else {
        println!("No version has been read.");
        return Ok(2);
    };

    // A plist that cannot be updated is reported but does not fail the build phase.
    let patcher = PlistPatcher::default();
    for plist in &cli.plists {
        println!("{}", plist.display());
        match patcher.try_patch(plist, &version) {
            Ok(()) => println!("Updated {} with v{version}", plist.display()),
            Err(e) => println!("{}", PlistPatcher::failure_message(plist, &e)),
        }
    }
    Ok(0)
}
