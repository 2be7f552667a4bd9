//! locio - dump or inspect a byte range of any supported location
//!
//! Reads from files or http(s) URLs, decoding gzip and bzip2 transparently.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use locio::{DataHandle, Envelope, FileMode, HandleFactory, HandleRegistry, IoConfig, Location};
use std::io::{self, Write};
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging, controlled by RUST_LOG
    env_logger::init();

    let matches = Command::new("locio")
        .version(locio::VERSION)
        .about("Seekable access to files, URLs and compressed resources")
        .long_about(
            "locio writes a byte range of a location to stdout. Compressed content is \
             decoded on the fly; seeking inside it is emulated by decoding forward.",
        )
        .arg(
            Arg::new("location")
                .help("File path or http(s) URL")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("decode")
                .long("decode")
                .short('d')
                .help("Compression envelope to decode")
                .value_parser(["auto", "none", "gzip", "bzip2"])
                .default_value("auto"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .short('o')
                .help("First byte to output")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("length")
                .long("length")
                .short('n')
                .help("Number of bytes to output (default: to the end)")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .help("Print location and handle details instead of content")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("writable")
                .long("writable")
                .help("Open local files read-write (created if missing)")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let target = matches
        .get_one::<String>("location")
        .context("location argument is required")?;
    let decode = matches
        .get_one::<String>("decode")
        .map(String::as_str)
        .unwrap_or("auto");
    let offset = matches.get_one::<u64>("offset").copied().unwrap_or(0);
    let length = matches.get_one::<u64>("length").copied();

    let file_mode = if matches.get_flag("writable") {
        FileMode::ReadWrite
    } else {
        FileMode::Read
    };
    let config = load_config()?.with_file_mode(file_mode);
    let registry = Arc::new(HandleRegistry::with_defaults(config)?);

    let raw = parse_location(target)?;
    let envelope = match decode {
        "none" => Envelope::None,
        "gzip" => Envelope::Gzip,
        "bzip2" => Envelope::Bzip2,
        _ => Envelope::detect(Arc::clone(&registry) as Arc<dyn HandleFactory>, &raw)?,
    };
    let location = envelope.wrap(raw);

    let mut handle = registry
        .create(Arc::clone(&location))
        .with_context(|| format!("Cannot open {}", target))?;

    let result = if matches.get_flag("info") {
        print_info(handle.as_mut(), envelope)
    } else {
        copy_range(handle.as_mut(), offset, length)
    };
    handle.close()?;
    result
}

#[cfg(feature = "config")]
fn load_config() -> Result<IoConfig> {
    Ok(IoConfig::load_default()?)
}

#[cfg(not(feature = "config"))]
fn load_config() -> Result<IoConfig> {
    Ok(IoConfig::default())
}

fn parse_location(target: &str) -> Result<Arc<dyn Location>> {
    if target.starts_with("http://") || target.starts_with("https://") {
        #[cfg(feature = "http")]
        {
            return Ok(Arc::new(locio::location::UrlLocation::parse(target)?));
        }
        #[cfg(not(feature = "http"))]
        anyhow::bail!("http support is not compiled in: {}", target);
    }
    Ok(Arc::new(locio::location::FileLocation::new(target)))
}

fn print_info(handle: &mut dyn DataHandle, envelope: Envelope) -> Result<()> {
    let location = Arc::clone(handle.location());
    let length = match handle.length()? {
        Some(length) => length.to_string(),
        None => "unknown".to_string(),
    };
    let resettable = handle.as_resettable().is_some();

    let mut out = io::stdout().lock();
    writeln!(out, "name:       {}", location.name())?;
    match location.uri() {
        Some(uri) => writeln!(out, "uri:        {}", uri)?,
        None => writeln!(out, "uri:        -")?,
    }
    writeln!(out, "envelope:   {}", envelope.name())?;
    writeln!(out, "length:     {}", length)?;
    writeln!(out, "readable:   {}", handle.is_readable())?;
    writeln!(out, "writable:   {}", handle.is_writable())?;
    writeln!(out, "resettable: {}", resettable)?;
    Ok(())
}

fn copy_range(handle: &mut dyn DataHandle, offset: u64, length: Option<u64>) -> Result<()> {
    handle
        .seek(offset)
        .with_context(|| format!("Cannot seek to {}", offset))?;

    let mut out = io::stdout().lock();
    let mut chunk = vec![0u8; 64 * 1024];
    let mut remaining = length.unwrap_or(u64::MAX);
    while remaining > 0 {
        let want = remaining.min(chunk.len() as u64) as usize;
        let n = handle.read(&mut chunk[..want])?;
        if n == 0 {
            break;
        }
        out.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!locio::VERSION.is_empty());
    }

    #[test]
    fn test_parse_location_kinds() {
        let file = parse_location("/var/log/app.log").unwrap();
        assert_eq!(file.name(), "app.log");

        #[cfg(feature = "http")]
        {
            let url = parse_location("https://example.com/app.log").unwrap();
            assert_eq!(url.uri().unwrap().as_str(), "https://example.com/app.log");
        }
    }
}
