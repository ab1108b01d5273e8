use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use dialoguer::Confirm;
use env_logger::{fmt::Formatter as LogFormatter, Builder as LogBuilder};
use log::{Level as LogLevel, LevelFilter as LogLevelFilter, Record as LogRecord};
use once_cell::sync::Lazy;
use std::{
    env,
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    ops::Deref,
    path::Path,
    str::FromStr,
};

pub fn init_env_logger(verbose: bool) {
    let format = |formatter: &mut LogFormatter, record: &LogRecord<'_>| {
        let level = match record.level() {
            LogLevel::Debug => LOG_PREFIX_DEBUG.deref(),
            LogLevel::Info => LOG_PREFIX_INFO.deref(),
            LogLevel::Warn => LOG_PREFIX_WARN.deref(),
            LogLevel::Error => LOG_PREFIX_ERROR.deref(),
            LogLevel::Trace => LOG_PREFIX_TRACE.deref(),
        };
        writeln!(formatter, "{} {}", level, record.args())
    };

    let mut builder = LogBuilder::new();
    builder
        .format(format)
        .filter(
            None,
            if verbose {
                LogLevelFilter::Debug
            } else {
                LogLevelFilter::Info
            },
        )
        // Connection pool chatter drowns out our own debug output.
        .filter(Some("reqwest"), LogLevelFilter::Info)
        .filter(Some("rustls"), LogLevelFilter::Warn);

    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.init();
}

pub fn read_from_stdin(message: &str, default: Option<&str>) -> Result<String> {
    let mut input = String::new();
    write!(
        io::stderr(),
        "{} {}{}: ",
        LOG_PREFIX_INPUT.deref(),
        message,
        if let Some(value) = default {
            format!(" [{value}]")
        } else {
            "".into()
        },
    )
    .and_then(|_| io::stderr().flush())
    .and_then(|_| io::stdin().read_line(&mut input))
    .context("Failed to read from stdin.")?;
    input = input.trim().into();
    Ok(match (input.is_empty(), default) {
        (true, Some(default)) => default.into(),
        _ => input,
    })
}

pub fn read_token_from_stdin() -> Result<Option<String>> {
    let mut input = String::new();
    write!(
        io::stderr(),
        "{} Enter API token [none]: ",
        LOG_PREFIX_INPUT.deref()
    )
    .and_then(|_| io::stderr().flush())
    .and_then(|_| io::stdin().read_line(&mut input))
    .context("Failed to read API token from stdin.")?;
    input = input.trim().into();
    Ok(if !input.is_empty() { Some(input) } else { None })
}

/// Ask for confirmation on the terminal, `false` if the user declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation from the terminal.")
}

/// Read a hand-off file with one id (or name) per line, ignoring blank lines.
pub fn read_lines<T>(path: impl AsRef<Path>) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Could not open file `{}`", path.display()))?;
    read_lines_from(BufReader::new(file))
        .with_context(|| format!("Could not read lines from `{}`", path.display()))
}

pub fn read_lines_from<T>(reader: impl BufRead) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        values.push(
            line.parse()
                .with_context(|| format!("Bad value `{line}` on line {}", index + 1))?,
        );
    }
    Ok(values)
}

/// Write one value per line, the format [`read_lines`] accepts.
pub fn write_lines<T: Display>(
    path: impl AsRef<Path>,
    values: impl IntoIterator<Item = T>,
) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Could not create file `{}`", path.display()))?;
    let mut writer = BufWriter::new(file);
    for value in values {
        writeln!(writer, "{value}")
            .with_context(|| format!("Could not write to `{}`", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Could not write to `{}`", path.display()))
}

pub static LOG_PREFIX_DEBUG: Lazy<ColoredString> = Lazy::new(|| "D".normal());
pub static LOG_PREFIX_INFO: Lazy<ColoredString> = Lazy::new(|| "I".green());
pub static LOG_PREFIX_WARN: Lazy<ColoredString> = Lazy::new(|| "W".yellow().bold());
pub static LOG_PREFIX_ERROR: Lazy<ColoredString> = Lazy::new(|| "E".red().bold());
pub static LOG_PREFIX_TRACE: Lazy<ColoredString> = Lazy::new(|| "T".normal());
pub static LOG_PREFIX_INPUT: Lazy<ColoredString> = Lazy::new(|| "*".blue().bold());

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sbg_client::TaskId;
    use std::io::Cursor;

    #[test]
    fn test_read_lines_skips_blank_lines() {
        let ids: Vec<TaskId> =
            read_lines_from(Cursor::new("t1\n\n  t2  \n\r\nt3")).unwrap();
        assert_eq!(
            ids,
            vec![
                TaskId("t1".to_owned()),
                TaskId("t2".to_owned()),
                TaskId("t3".to_owned())
            ]
        );
    }

    #[test]
    fn test_write_then_read_lines() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("new_task_ids.txt");
        write_lines(&path, ["t1", "t2"]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "t1\nt2\n");
        let ids: Vec<String> = read_lines(&path).unwrap();
        assert_eq!(ids, vec!["t1", "t2"]);
    }
}
