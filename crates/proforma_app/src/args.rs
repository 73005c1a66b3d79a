use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use proforma_core::Filters;
use proforma_docs::ExportFormat;

pub const USAGE: &str = "\
usage: proforma <preview|xlsx|docx|pdf|all> (--session ID | --roster FILE) [options]

options:
  --session ID       load the roster for a session from the backend
  --roster FILE      load the roster from a JSON file instead
  --name TEXT        filter by name (case-insensitive substring)
  --urn TEXT         filter by university registration number
  --activity TEXT    filter by sport
  --select KEYS      comma-separated registration numbers (or #N row numbers);
                     default is every visible row
  --out DIR          output directory (default from config)
  --config FILE      config file (default ~/.proforma/config.json)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Preview,
    Export(Vec<ExportFormat>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterSource {
    Session(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub source: RosterSource,
    pub filters: Filters,
    pub select: Option<Vec<String>>,
    pub out: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let command = match args.next().as_deref() {
            Some("preview") => Command::Preview,
            Some("all") => Command::Export(ExportFormat::ALL.to_vec()),
            Some(other) => {
                let format = other
                    .parse::<ExportFormat>()
                    .map_err(anyhow::Error::msg)
                    .context("expected preview, xlsx, docx, pdf or all")?;
                Command::Export(vec![format])
            }
            None => bail!("missing command"),
        };

        let mut session = None;
        let mut roster = None;
        let mut filters = Filters::default();
        let mut select = None;
        let mut out = None;
        let mut config = None;

        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .with_context(|| format!("{flag} requires a value"))
            };
            match flag.as_str() {
                "--session" => session = Some(value()?),
                "--roster" => roster = Some(PathBuf::from(value()?)),
                "--name" => filters.name = value()?,
                "--urn" => filters.reg_no = value()?,
                "--activity" => filters.activity = value()?,
                "--select" => {
                    let keys: Vec<String> = value()?
                        .split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from)
                        .collect();
                    select = Some(keys);
                }
                "--out" => out = Some(PathBuf::from(value()?)),
                "--config" => config = Some(PathBuf::from(value()?)),
                other => bail!("unknown option: {other}"),
            }
        }

        let source = match (session, roster) {
            (Some(id), None) => RosterSource::Session(id),
            (None, Some(path)) => RosterSource::File(path),
            (Some(_), Some(_)) => bail!("use either --session or --roster, not both"),
            (None, None) => bail!("one of --session or --roster is required"),
        };

        Ok(Self {
            command,
            source,
            filters,
            select,
            out,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let args = CliArgs::parse([
            "pdf",
            "--session",
            "42",
            "--activity",
            "Badminton",
            "--select",
            "U1, U2,,#3",
            "--out",
            "/tmp/x",
        ])
        .unwrap();
        assert_eq!(args.command, Command::Export(vec![ExportFormat::Pdf]));
        assert_eq!(args.source, RosterSource::Session("42".into()));
        assert_eq!(args.filters.activity, "Badminton");
        assert_eq!(
            args.select,
            Some(vec!["U1".to_string(), "U2".to_string(), "#3".to_string()])
        );
        assert_eq!(args.out, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn all_expands_to_three_formats() {
        let args = CliArgs::parse(["all", "--roster", "r.json"]).unwrap();
        assert_eq!(args.command, Command::Export(ExportFormat::ALL.to_vec()));
        assert_eq!(args.source, RosterSource::File("r.json".into()));
        assert!(args.select.is_none());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CliArgs::parse(Vec::<String>::new()).is_err());
        assert!(CliArgs::parse(["csv", "--session", "1"]).is_err());
        assert!(CliArgs::parse(["xlsx"]).is_err());
        assert!(CliArgs::parse(["xlsx", "--session"]).is_err());
        assert!(CliArgs::parse(["xlsx", "--session", "1", "--roster", "f"]).is_err());
        assert!(CliArgs::parse(["xlsx", "--session", "1", "--bogus", "f"]).is_err());
    }
}
