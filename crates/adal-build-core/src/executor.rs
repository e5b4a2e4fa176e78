//! `xcodebuild` invocation for iOS and Mac targets.
//!
//! Commands are built as argument lists, never shell strings. Build output is
//! piped into a formatter (`xcpretty` by default) when one is installed. The
//! exit code follows `set -o pipefail`: a failing `xcodebuild` is reported
//! even when the formatter itself exits cleanly.

use crate::config::BuildConfig;
use crate::device::{DeviceLister, DeviceResolver};
use crate::error::{BuildError, Result};
use crate::target::{Platform, Target};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

pub const XCODEBUILD: &str = "xcodebuild";

/// Runs one operation for one target and returns the command's exit code.
pub trait BuildExecutor {
    fn execute(&mut self, target: &Target, operation: &str) -> Result<i32>;
}

/// One executor per platform.
pub struct Executors {
    pub ios: Box<dyn BuildExecutor>,
    pub mac: Box<dyn BuildExecutor>,
}

impl Executors {
    pub fn for_platform(&mut self, platform: Platform) -> &mut dyn BuildExecutor {
        match platform {
            Platform::Ios => self.ios.as_mut(),
            Platform::Mac => self.mac.as_mut(),
        }
    }

    /// `xcodebuild` executors for both platforms, sharing `config`.
    pub fn xcodebuild(config: &BuildConfig, root: &Path, ios_destination: String) -> Self {
        let formatter = find_formatter(&config.formatter);
        Self {
            ios: Box::new(
                XcodebuildExecutor::new(Platform::Ios, &config.workspace, root)
                    .with_destination(ios_destination)
                    .with_formatter(formatter.clone()),
            ),
            mac: Box::new(
                XcodebuildExecutor::new(Platform::Mac, &config.workspace, root)
                    .with_formatter(formatter),
            ),
        }
    }
}

/// Return `name` if it is on `PATH`.
pub fn find_formatter(name: &str) -> Option<String> {
    match which::which(name) {
        Ok(_) => Some(name.to_string()),
        Err(_) => {
            tracing::warn!("{name} not found on PATH; showing raw xcodebuild output");
            None
        }
    }
}

/// Pick the simulator destination for iOS targets.
///
/// With `simulator.resolve` set, the device name is looked up through
/// `resolver` and passed by id; if it cannot be found the name is used.
pub fn resolve_ios_destination<L: DeviceLister>(
    config: &BuildConfig,
    resolver: &mut DeviceResolver<L>,
) -> String {
    if !config.simulator.resolve {
        return config.ios_destination();
    }
    match resolver.resolve(&config.simulator.device) {
        Ok(Some(guid)) => format!("platform=iOS Simulator,id={guid}"),
        Ok(None) => {
            tracing::warn!(device = %config.simulator.device, "no simulator found; using device name");
            config.ios_destination()
        }
        Err(e) => {
            tracing::warn!("device lookup failed: {e}");
            config.ios_destination()
        }
    }
}

// ---------------------------------------------------------------------------
// XcodebuildExecutor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct XcodebuildExecutor {
    platform: Platform,
    workspace: String,
    root: PathBuf,
    destination: Option<String>,
    formatter: Option<String>,
}

impl XcodebuildExecutor {
    pub fn new(platform: Platform, workspace: &str, root: &Path) -> Self {
        Self {
            platform,
            workspace: workspace.to_string(),
            root: root.to_path_buf(),
            destination: None,
            formatter: None,
        }
    }

    pub fn with_destination(mut self, destination: String) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_formatter(mut self, formatter: Option<String>) -> Self {
        self.formatter = formatter;
        self
    }

    /// The pipeline as it would be typed in a shell, for logging.
    pub fn command_line(&self, target: &Target, operation: &str) -> String {
        let mut line = XCODEBUILD.to_string();
        for arg in self.args(target, operation) {
            line.push(' ');
            if arg.contains(' ') || arg.ends_with('=') {
                line.push_str(&format!("'{arg}'"));
            } else {
                line.push_str(&arg);
            }
        }
        if let Some(formatter) = &self.formatter {
            line.push_str(" | ");
            line.push_str(formatter);
        }
        line
    }

    /// Arguments passed to `xcodebuild` for `operation` on `target`.
    pub fn args(&self, target: &Target, operation: &str) -> Vec<String> {
        let mut args = vec![
            operation.to_string(),
            "-workspace".to_string(),
            self.workspace.clone(),
            "-scheme".to_string(),
            target.scheme.clone(),
        ];

        match self.platform {
            Platform::Ios => {
                args.extend(
                    [
                        "-configuration",
                        "CodeCoverage",
                        "-sdk",
                        "iphonesimulator",
                        "CODE_SIGN_IDENTITY=",
                        "CODE_SIGNING_REQUIRED=NO",
                    ]
                    .map(String::from),
                );
                if let Some(dest) = &self.destination {
                    args.push("-destination".to_string());
                    args.push(dest.clone());
                }
            }
            Platform::Mac => {
                if let Some(arch) = &target.arch {
                    args.push("-destination".to_string());
                    args.push(format!("arch={arch}"));
                }
            }
        }

        args
    }
}

impl BuildExecutor for XcodebuildExecutor {
    fn execute(&mut self, target: &Target, operation: &str) -> Result<i32> {
        tracing::debug!("{}", self.command_line(target, operation));
        let args = self.args(target, operation);
        run_piped(XCODEBUILD, &args, self.formatter.as_deref(), &self.root)
    }
}

// ---------------------------------------------------------------------------
// Process plumbing
// ---------------------------------------------------------------------------

/// Run `program args... | formatter` and return the pipefail exit code.
pub fn run_piped(program: &str, args: &[String], formatter: Option<&str>, cwd: &Path) -> Result<i32> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(cwd);

    let Some(formatter) = formatter else {
        let status = cmd.status().map_err(|e| spawn_failed(program, e))?;
        return Ok(exit_code(status));
    };

    cmd.stdout(Stdio::piped());
    let mut producer = cmd.spawn().map_err(|e| spawn_failed(program, e))?;
    let stdout = producer
        .stdout
        .take()
        .ok_or_else(|| BuildError::Process(format!("{program} stdout not captured")))?;

    let consumer = Command::new(formatter)
        .stdin(Stdio::from(stdout))
        .current_dir(cwd)
        .spawn();
    let mut consumer = match consumer {
        Ok(child) => child,
        Err(e) => {
            let _ = producer.kill();
            let _ = producer.wait();
            return Err(spawn_failed(formatter, e));
        }
    };

    let producer_status = producer.wait()?;
    let consumer_status = consumer.wait()?;
    Ok(pipefail(exit_code(producer_status), exit_code(consumer_status)))
}

/// Combine the exit codes of a two-stage pipeline. The first stage's failure
/// takes precedence so the formatter cannot mask a failed build.
pub fn pipefail(producer: i32, consumer: i32) -> i32 {
    if producer != 0 {
        producer
    } else {
        consumer
    }
}

/// Exit code of a finished process; termination by signal counts as `1`.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

fn spawn_failed(program: &str, source: std::io::Error) -> BuildError {
    BuildError::SpawnFailed {
        program: program.to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        std::env::temp_dir()
    }

    #[test]
    fn ios_args_include_simulator_flags() {
        let exec = XcodebuildExecutor::new(Platform::Ios, "ADAL.xcworkspace", &root())
            .with_destination("platform=iOS Simulator,name=iPhone 6,OS=latest".into());
        let target = Target::new("iOS Framework", "ADAL", Platform::Ios, &["build", "test"]);
        assert_eq!(
            exec.args(&target, "test"),
            vec![
                "test",
                "-workspace",
                "ADAL.xcworkspace",
                "-scheme",
                "ADAL",
                "-configuration",
                "CodeCoverage",
                "-sdk",
                "iphonesimulator",
                "CODE_SIGN_IDENTITY=",
                "CODE_SIGNING_REQUIRED=NO",
                "-destination",
                "platform=iOS Simulator,name=iPhone 6,OS=latest",
            ]
        );
    }

    #[test]
    fn mac_args_keep_scheme_as_one_argument() {
        let exec = XcodebuildExecutor::new(Platform::Mac, "ADAL.xcworkspace", &root());
        let target = Target::new("Mac Framework", "ADAL Mac", Platform::Mac, &["build"]);
        assert_eq!(
            exec.args(&target, "build"),
            vec!["build", "-workspace", "ADAL.xcworkspace", "-scheme", "ADAL Mac"]
        );
    }

    #[test]
    fn mac_args_with_arch() {
        let exec = XcodebuildExecutor::new(Platform::Mac, "ADAL.xcworkspace", &root());
        let target =
            Target::new("Mac Framework 32-bit", "ADAL Mac", Platform::Mac, &["build"]).with_arch("i386");
        let args = exec.args(&target, "build");
        assert_eq!(&args[args.len() - 2..], &["-destination", "arch=i386"]);
    }

    #[test]
    fn command_line_quotes_spaced_arguments() {
        let exec = XcodebuildExecutor::new(Platform::Mac, "ADAL.xcworkspace", &root())
            .with_formatter(Some("xcpretty".into()));
        let target =
            Target::new("Mac Framework 32-bit", "ADAL Mac", Platform::Mac, &["build"]).with_arch("i386");
        assert_eq!(
            exec.command_line(&target, "test"),
            "xcodebuild test -workspace ADAL.xcworkspace -scheme 'ADAL Mac' -destination arch=i386 | xcpretty"
        );
    }

    #[test]
    fn pipefail_prefers_first_failure() {
        assert_eq!(pipefail(0, 0), 0);
        assert_eq!(pipefail(65, 0), 65);
        assert_eq!(pipefail(0, 1), 1);
        assert_eq!(pipefail(65, 1), 65);
    }

    #[cfg(unix)]
    #[test]
    fn run_piped_reports_producer_failure() {
        let code = run_piped("false", &[], Some("cat"), &root()).unwrap();
        assert_ne!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn run_piped_reports_formatter_failure() {
        let code = run_piped("true", &[], Some("false"), &root()).unwrap();
        assert_ne!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn run_piped_success() {
        let code = run_piped("echo", &["hello".to_string()], Some("cat"), &root()).unwrap();
        assert_eq!(code, 0);
        assert_eq!(run_piped("true", &[], None, &root()).unwrap(), 0);
    }

    #[test]
    fn run_piped_missing_program_is_spawn_error() {
        let err = run_piped("definitely-not-a-real-tool-xyz", &[], None, &root()).unwrap_err();
        assert!(matches!(err, BuildError::SpawnFailed { .. }));
    }

    struct StaticLister(&'static str);

    impl DeviceLister for StaticLister {
        fn list_devices(&mut self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn destination_uses_name_unless_resolving() {
        let mut config = BuildConfig::default();
        let mut resolver = DeviceResolver::new(StaticLister(
            "iPhone 6 (9.3) [11111111-2222-3333-4444-555555555555]\n",
        ));
        assert_eq!(
            resolve_ios_destination(&config, &mut resolver),
            "platform=iOS Simulator,name=iPhone 6,OS=latest"
        );

        config.simulator.resolve = true;
        assert_eq!(
            resolve_ios_destination(&config, &mut resolver),
            "platform=iOS Simulator,id=11111111-2222-3333-4444-555555555555"
        );
    }

    #[test]
    fn destination_falls_back_when_device_missing() {
        let mut config = BuildConfig::default();
        config.simulator.resolve = true;
        let mut resolver = DeviceResolver::new(StaticLister("iPad Air (9.3) [ABCDEF]\n"));
        assert_eq!(
            resolve_ios_destination(&config, &mut resolver),
            "platform=iOS Simulator,name=iPhone 6,OS=latest"
        );
    }
}
