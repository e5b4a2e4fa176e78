use adal_build_core::clean::DerivedDataCleaner;
use adal_build_core::config::BuildConfig;
use adal_build_core::device::DeviceResolver;
use adal_build_core::executor::{resolve_ios_destination, Executors};
use adal_build_core::orchestrator::Orchestrator;
use adal_build_core::report::ConsoleReporter;
use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "adal-build",
    about = "Build and test every ADAL target in order, skipping targets whose dependencies failed",
    version
)]
struct Cli {
    /// Keep the project's DerivedData folders instead of removing them first
    #[arg(long)]
    no_clean: bool,
}

fn main() {
    // Exit codes are 0 (all targets succeeded) and 1 (anything else),
    // including usage errors.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
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
    let root = adal_build_cli::project_root();
    let config = BuildConfig::load(&root)
        .with_context(|| format!("failed to load build targets for {}", root.display()))?;

    let mut resolver = DeviceResolver::instruments();
    let destination = resolve_ios_destination(&config, &mut resolver);
    let executors = Executors::xcodebuild(&config, &root, destination);
    let cleaner = DerivedDataCleaner::for_user(&config.derived_data_prefix);

    let mut orchestrator = Orchestrator::new(executors, Box::new(cleaner));
    let mut reporter = ConsoleReporter::stdout();
    let report = orchestrator.run(&config.targets, !cli.no_clean, &mut reporter);
    Ok(report.exit_code())
}
