//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use shellcache_core::Method;

pub const USAGE: &str = "\
Usage: shellcache <command> [options]

Commands:
  install [--force]                    Cache the app shell and activate the worker
  fetch <path-or-url> [options]        Resolve one request through the worker
      --method <METHOD>                  Request method (default GET)
      --output <FILE>                    Write the body to FILE instead of stdout
  status                               Show cache generations and entries
  help                                 Show this message

Configuration: ~/.config/shellcache/config.json
Environment:   SHELLCACHE_ORIGIN, SHELLCACHE_CACHE_DIR, RUST_LOG";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Install { force: bool },
    Fetch(FetchArgs),
    Status,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FetchArgs {
    pub target: String,
    pub method: Method,
    pub output: Option<PathBuf>,
}

pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "install" => {
            let mut force = false;
            for arg in args {
                match arg.as_str() {
                    "--force" | "-f" => force = true,
                    other => bail!("Unexpected argument for install: {}", other),
                }
            }
            Ok(Command::Install { force })
        }
        "fetch" => {
            let mut target = None;
            let mut method = Method::GET;
            let mut output = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--method" | "-X" => {
                        let value = args.next().ok_or_else(|| anyhow!("--method needs a value"))?;
                        method = Method::from_bytes(value.to_ascii_uppercase().as_bytes())
                            .map_err(|_| anyhow!("Invalid method: {}", value))?;
                    }
                    "--output" | "-o" => {
                        let value = args.next().ok_or_else(|| anyhow!("--output needs a value"))?;
                        output = Some(PathBuf::from(value));
                    }
                    flag if flag.starts_with('-') && flag.len() > 1 => {
                        bail!("Unknown option for fetch: {}", flag)
                    }
                    _ if target.is_some() => bail!("fetch takes a single target"),
                    _ => target = Some(arg),
                }
            }
            let target = target.ok_or_else(|| anyhow!("fetch needs a path or URL"))?;
            Ok(Command::Fetch(FetchArgs {
                target,
                method,
                output,
            }))
        }
        "status" => match args.next() {
            Some(extra) => bail!("Unexpected argument for status: {}", extra),
            None => Ok(Command::Status),
        },
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("Unknown command: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(args: &[&str]) -> Result<Command> {
        parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(parse_str(&[]).unwrap(), Command::Help);
        assert_eq!(parse_str(&["--help"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_install() {
        assert_eq!(parse_str(&["install"]).unwrap(), Command::Install { force: false });
        assert_eq!(
            parse_str(&["install", "--force"]).unwrap(),
            Command::Install { force: true }
        );
        assert!(parse_str(&["install", "now"]).is_err());
    }

    #[test]
    fn test_fetch_defaults_to_get() {
        let command = parse_str(&["fetch", "/student_login"]).unwrap();
        assert_eq!(
            command,
            Command::Fetch(FetchArgs {
                target: "/student_login".to_string(),
                method: Method::GET,
                output: None,
            })
        );
    }

    #[test]
    fn test_fetch_with_options() {
        let command =
            parse_str(&["fetch", "-X", "post", "/student_register", "--output", "out.html"]).unwrap();
        assert_eq!(
            command,
            Command::Fetch(FetchArgs {
                target: "/student_register".to_string(),
                method: Method::POST,
                output: Some(PathBuf::from("out.html")),
            })
        );
    }

    #[test]
    fn test_fetch_errors() {
        assert!(parse_str(&["fetch"]).is_err());
        assert!(parse_str(&["fetch", "/", "/other"]).is_err());
        assert!(parse_str(&["fetch", "/", "--method"]).is_err());
        assert!(parse_str(&["fetch", "/", "--verbose"]).is_err());
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_str(&["serve"]).is_err());
        assert!(parse_str(&["status", "extra"]).is_err());
    }
}
