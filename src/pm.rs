use std::borrow::Cow;
use std::process::{Command, Stdio};

use crate::distro::{self, Family};
use crate::error::InstallError;
use crate::registry::Tool;

/// Host-facing hooks for the installation check, swapped out in tests.
pub struct InstallContext<'a> {
    /// Whether an executable is reachable on PATH.
    pub is_installed: &'a dyn Fn(&str) -> bool,
    /// Run an argv; `capture` hides the child's output. Returns the exit code.
    pub run: &'a dyn Fn(&[String], bool) -> std::io::Result<i32>,
}

pub fn default_context() -> InstallContext<'static> {
    InstallContext {
        is_installed: &|exe: &str| which::which(exe).is_ok(),
        run: &|argv: &[String], capture: bool| -> std::io::Result<i32> {
            let (prog, args) = argv.split_first().ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"))?;
            let mut c = Command::new(prog);
            c.args(args);
            if capture {
                c.stdout(Stdio::piped()).stderr(Stdio::piped());
                let out = c.output()?;
                log::debug!("{} stderr: {}", prog, String::from_utf8_lossy(&out.stderr).trim());
                Ok(out.status.code().unwrap_or(-1))
            } else {
                Ok(c.status()?.code().unwrap_or(-1))
            }
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub host: Option<Family>,
    pub sudo: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Present,
    Installed,
    Failed,
    /// Missing and left alone (non-Debian host or dry run)
    Skipped,
}

pub fn update_argv(sudo: bool) -> Vec<String> {
    apt_argv(sudo, &["update"])
}

pub fn install_argv(sudo: bool, package: &str) -> Vec<String> {
    apt_argv(sudo, &["install", "-y", package])
}

fn apt_argv(sudo: bool, rest: &[&str]) -> Vec<String> {
    let mut v = Vec::new();
    if sudo { v.push("sudo".to_string()); }
    v.push("apt-get".to_string());
    v.extend(rest.iter().map(|s| s.to_string()));
    v
}

pub fn display_argv(argv: &[String]) -> String {
    argv.iter().map(|a| shell_escape::escape(Cow::from(a.as_str())).into_owned()).collect::<Vec<_>>().join(" ")
}

fn non_debian_warning(host: Option<Family>) -> String {
    let found = host.map(|f| format!(" (found {})", f.as_str())).unwrap_or_default();
    format!("Warning: no Debian-based system detected{}. Packages will not be installed.", found)
}

fn not_installed_message(tool: &Tool) -> String {
    format!("Tool '{}' is not installed.", tool.name)
}

/// One-line tally of a check, e.g. `present=6 installed=1 failed=1 skipped=0`.
pub fn summarize(report: &[(&Tool, Outcome)]) -> String {
    let count = |o: Outcome| report.iter().filter(|(_, r)| *r == o).count();
    format!(
        "present={} installed={} failed={} skipped={}",
        count(Outcome::Present), count(Outcome::Installed), count(Outcome::Failed), count(Outcome::Skipped)
    )
}

/// Make sure every tool's executable is present, installing missing
/// packages with apt-get on Debian-like hosts.
pub fn check_and_install<'t>(tools: &'t [Tool], opts: Options, ctx: &InstallContext<'_>) -> Vec<(&'t Tool, Outcome)> {
    let debian_like = distro::is_debian_like(opts.host);
    if !debian_like {
        eprintln!("{}", non_debian_warning(opts.host));
    }
    let mut updated = false;
    let mut report = Vec::with_capacity(tools.len());
    for tool in tools {
        if (ctx.is_installed)(tool.name) {
            report.push((tool, Outcome::Present));
            continue;
        }
        println!("{}", not_installed_message(tool));
        if !debian_like {
            report.push((tool, Outcome::Skipped));
            continue;
        }
        if opts.dry_run {
            if !updated {
                println!("--dry-run: would run: {}", display_argv(&update_argv(opts.sudo)));
                updated = true;
            }
            println!("--dry-run: would run: {}", display_argv(&install_argv(opts.sudo, tool.package)));
            report.push((tool, Outcome::Skipped));
            continue;
        }
        let outcome = match install_one(tool, opts.sudo, &mut updated, ctx) {
            Ok(()) => Outcome::Installed,
            Err(e) => {
                eprintln!("{}", e);
                Outcome::Failed
            }
        };
        report.push((tool, outcome));
    }
    report
}

fn install_one(tool: &Tool, sudo: bool, updated: &mut bool, ctx: &InstallContext<'_>) -> Result<(), InstallError> {
    if !*updated {
        let argv = update_argv(sudo);
        println!("Running '{}'...", display_argv(&argv));
        log::debug!("refresh cmd: {:?}", argv);
        match (ctx.run)(&argv, true)? {
            0 => *updated = true,
            code => return Err(InstallError::Update { code }),
        }
    }
    println!("Installing package '{}'...", tool.package);
    let argv = install_argv(sudo, tool.package);
    log::debug!("install cmd: {:?}", argv);
    match (ctx.run)(&argv, false)? {
        0 => Ok(()),
        code => Err(InstallError::Install { package: tool.package.to_string(), code }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use std::cell::RefCell;

    fn opts(host: Option<Family>) -> Options {
        Options { host, sudo: true, dry_run: false }
    }

    #[test]
    fn user_messages() {
        assert_eq!(not_installed_message(registry::resolve("bulk_extractor").unwrap()), "Tool 'bulk_extractor' is not installed.");
        assert_eq!(non_debian_warning(None), "Warning: no Debian-based system detected. Packages will not be installed.");
        assert_eq!(
            non_debian_warning(Some(Family::Fedora)),
            "Warning: no Debian-based system detected (found fedora). Packages will not be installed."
        );
    }

    #[test]
    fn summary_counts_outcomes() {
        let tools = registry::all();
        let report = vec![
            (&tools[0], Outcome::Present),
            (&tools[1], Outcome::Installed),
            (&tools[2], Outcome::Failed),
            (&tools[3], Outcome::Present),
        ];
        assert_eq!(summarize(&report), "present=2 installed=1 failed=1 skipped=0");
    }

    #[test]
    fn argv_shapes() {
        assert_eq!(update_argv(true), ["sudo", "apt-get", "update"]);
        assert_eq!(install_argv(false, "xxd"), ["apt-get", "install", "-y", "xxd"]);
        assert_eq!(display_argv(&install_argv(true, "poppler-utils")), "sudo apt-get install -y poppler-utils");
    }

    #[test]
    fn nothing_runs_when_everything_is_present() {
        let calls = RefCell::new(Vec::<Vec<String>>::new());
        let run = |argv: &[String], _: bool| -> std::io::Result<i32> { calls.borrow_mut().push(argv.to_vec()); Ok(0) };
        let ctx = InstallContext { is_installed: &|_: &str| true, run: &run };
        let report = check_and_install(registry::all(), opts(Some(Family::Debian)), &ctx);
        assert!(report.iter().all(|(_, o)| *o == Outcome::Present));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn update_runs_once_before_installs() {
        let calls = RefCell::new(Vec::<(Vec<String>, bool)>::new());
        let run = |argv: &[String], capture: bool| -> std::io::Result<i32> { calls.borrow_mut().push((argv.to_vec(), capture)); Ok(0) };
        let present = |exe: &str| exe != "xxd" && exe != "binwalk";
        let ctx = InstallContext { is_installed: &present, run: &run };
        let report = check_and_install(registry::all(), opts(Some(Family::Debian)), &ctx);

        let calls = calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (update_argv(true), true));
        assert_eq!(calls[1], (install_argv(true, "xxd"), false));
        assert_eq!(calls[2], (install_argv(true, "binwalk"), false));
        let installed: Vec<&str> = report.iter().filter(|(_, o)| *o == Outcome::Installed).map(|(t, _)| t.name).collect();
        assert_eq!(installed, ["xxd", "binwalk"]);
    }

    #[test]
    fn failed_install_does_not_stop_the_check() {
        let calls = RefCell::new(0usize);
        let run = |argv: &[String], _: bool| -> std::io::Result<i32> {
            *calls.borrow_mut() += 1;
            Ok(if argv.iter().any(|a| a == "file") { 100 } else { 0 })
        };
        let present = |exe: &str| exe != "file" && exe != "strings";
        let ctx = InstallContext { is_installed: &present, run: &run };
        let report = check_and_install(registry::all(), opts(Some(Family::Debian)), &ctx);
        assert_eq!(report[1], (&registry::all()[1], Outcome::Failed));
        assert_eq!(report[2], (&registry::all()[2], Outcome::Installed));
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn failed_update_is_retried_for_next_package() {
        let updates = RefCell::new(0usize);
        let run = |argv: &[String], _: bool| -> std::io::Result<i32> {
            if argv.iter().any(|a| a == "update") {
                *updates.borrow_mut() += 1;
                return Ok(if *updates.borrow() == 1 { 1 } else { 0 });
            }
            Ok(0)
        };
        let present = |exe: &str| exe != "exiftool" && exe != "identify";
        let ctx = InstallContext { is_installed: &present, run: &run };
        let report = check_and_install(registry::all(), opts(Some(Family::Debian)), &ctx);
        assert_eq!(report[0].1, Outcome::Failed);
        assert_eq!(report[7].1, Outcome::Installed);
        assert_eq!(*updates.borrow(), 2);
    }

    #[test]
    fn spawn_failure_is_reported_as_failure() {
        let run = |_: &[String], _: bool| -> std::io::Result<i32> { Err(std::io::Error::new(std::io::ErrorKind::NotFound, "sudo")) };
        let ctx = InstallContext { is_installed: &|exe: &str| exe != "pdfinfo", run: &run };
        let report = check_and_install(registry::all(), opts(Some(Family::Debian)), &ctx);
        assert_eq!(report[6].1, Outcome::Failed);
    }

    #[test]
    fn non_debian_hosts_install_nothing() {
        let calls = RefCell::new(0usize);
        let run = |_: &[String], _: bool| -> std::io::Result<i32> { *calls.borrow_mut() += 1; Ok(0) };
        let ctx = InstallContext { is_installed: &|_: &str| false, run: &run };
        for host in [None, Some(Family::Fedora), Some(Family::Arch)] {
            let report = check_and_install(registry::all(), opts(host), &ctx);
            assert!(report.iter().all(|(_, o)| *o == Outcome::Skipped));
        }
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn dry_run_runs_nothing() {
        let run = |_: &[String], _: bool| -> std::io::Result<i32> { panic!("dry run must not execute") };
        let ctx = InstallContext { is_installed: &|_: &str| false, run: &run };
        let o = Options { host: Some(Family::Debian), sudo: false, dry_run: true };
        let report = check_and_install(registry::all(), o, &ctx);
        assert_eq!(report.len(), registry::all().len());
        assert!(report.iter().all(|(_, o)| *o == Outcome::Skipped));
    }
}
