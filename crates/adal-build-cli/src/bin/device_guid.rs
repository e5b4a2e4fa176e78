use adal_build_core::device::DeviceResolver;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "device-guid",
    about = "Print the identifier of a simulator or of this Mac, as listed by instruments",
    version
)]
struct Cli {
    /// Device name prefix, e.g. "iPhone 6" (default: this Mac's host name)
    name: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    adal_build_cli::init_logging();

    let mut resolver = DeviceResolver::instruments();
    let result = match &cli.name {
        Some(name) => resolver.resolve(name),
        None => resolver.resolve_host(),
    };

    match result {
        Ok(Some(guid)) => println!("{guid}"),
        Ok(None) => {
            eprintln!(
                "error: no device matching '{}'",
                cli.name.as_deref().unwrap_or("this host")
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
