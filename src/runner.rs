use std::borrow::Cow;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Output};
use std::time::Instant;

use anyhow::{Context, Result};

/// Run `program` with `args`, relay its output and optionally save its
/// standard output to `output`. Returns the exit code to propagate.
pub fn run_tool(program: &str, args: &[String], output: Option<&Path>) -> Result<i32> {
    let _ = writeln!(io::stdout(), "Running: {}", command_line(program, args));
    let started = Instant::now();
    let out = match Command::new(program).args(args).output() {
        Ok(out) => out,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            eprintln!("The tool is not installed or is not on PATH.");
            return Ok(1);
        }
        Err(e) => {
            eprintln!("Could not run the tool: {}.", e);
            return Ok(1);
        }
    };
    log::debug!("{} finished in {} with {}", program, humantime::format_duration(started.elapsed()), out.status);

    finish(&out, output, &mut io::stdout().lock(), &mut io::stderr().lock())
}

/// Save, relay and report a finished run. Write failures on our own
/// streams (a closed pipe) never change the returned code.
fn finish(out: &Output, output: Option<&Path>, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<i32> {
    let saved = output.map(|path| (path, save_output(path, &out.stdout)));

    if let Err(e) = relay(out, stdout, stderr) {
        log::warn!("could not relay tool output: {}", e);
    }

    match saved {
        Some((path, Ok(()))) => { let _ = writeln!(stdout, "Output saved to: {}", path.display()); }
        Some((_, Err(e))) => { let _ = writeln!(stderr, "Could not save output to file: {:#}.", e); }
        None => {}
    }

    let code = exit_code(out.status);
    if code != 0 {
        let _ = writeln!(stdout, "The tool returned exit code {}.", code);
    }
    Ok(code)
}

pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|a| shell_escape::escape(Cow::from(a)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn relay(out: &Output, stdout: &mut dyn Write, stderr: &mut dyn Write) -> io::Result<()> {
    if !out.stdout.is_empty() {
        stdout.write_all(&out.stdout)?;
        if !out.stdout.ends_with(b"\n") { stdout.write_all(b"\n")?; }
        stdout.flush()?;
    }
    if !out.stderr.is_empty() {
        writeln!(stderr, "[stderr]")?;
        stderr.write_all(&out.stderr)?;
        if !out.stderr.ends_with(b"\n") { stderr.write_all(b"\n")?; }
    }
    Ok(())
}

fn save_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() { return code; }
    #[cfg(unix)] {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() { return 128 + sig; }
    }
    1
}
