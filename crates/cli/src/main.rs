//! `codecctl` entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. **Loads configuration** from an optional TOML file (see [`config`]).
//! 2. **Wires logging** with `tracing-subscriber`. `RUST_LOG` overrides the
//!    configured filter; `--json` switches to JSON lines on stderr.
//! 3. **Builds the SOS repository** from the codecs the `sos` crate discovers.
//! 4. **Runs one command** against it and prints the result on stdout.
//!
//! # Usage
//!
//! ```bash
//! codecctl keys --decoders
//! codecctl resolve --service SOS --version 2.0.0 \
//!     --operation DeleteObservation --media-type text/xml
//! codecctl decode request.xml
//! codecctl roundtrip request.xml
//! codecctl conformance --service SOS --version 2.0.0
//! ```

mod config;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use coding::{
    decoder_key_for, Codec, EncodingContext, Key, MarkupParser, MarkupWriter, MediaType,
    OperationKey, OperationName, Resolution, ServiceName, ServiceVersion,
};
use markup::XmlParser;
use sos::{vocabulary, SosObject, SosRepository};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "codecctl")]
#[command(about = "Inspect the codec registry and run documents through it")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "codecctl.toml")]
    config: PathBuf,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every registered key
    Keys {
        /// List decoder keys instead of encoder keys
        #[arg(long)]
        decoders: bool,
    },

    /// Show which codec an operation key resolves to
    Resolve {
        #[arg(long)]
        service: String,

        #[arg(long)]
        operation: String,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        media_type: Option<String>,

        /// Resolve against the decoder registry
        #[arg(long)]
        decoders: bool,
    },

    /// Decode an XML document and print the result as JSON
    Decode { file: PathBuf },

    /// Decode an XML document, encode it again and print the XML
    Roundtrip { file: PathBuf },

    /// List the conformance classes reported for a service version
    Conformance {
        #[arg(long)]
        service: String,

        #[arg(long)]
        version: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = CliConfig::load(&args.config)?;
    init_logging(&config.logging, args.json)?;
    debug!(config = %args.config.display(), ?config, "configuration loaded");

    let repository =
        sos::repository(config.registry).context("failed to build the codec registry")?;
    info!(
        encoders = repository.encoders().len(),
        decoders = repository.decoders().len(),
        "codec registry ready"
    );

    let parser = XmlParser::new().with_max_depth(config.markup.max_depth);

    match args.command {
        Command::Keys { decoders } => cmd_keys(&repository, decoders),
        Command::Resolve {
            service,
            operation,
            version,
            media_type,
            decoders,
        } => {
            let query = operation_query(&service, &operation, version, media_type)?;
            cmd_resolve(&repository, &query, decoders)
        }
        Command::Decode { file } => cmd_decode(&repository, &parser, &file),
        Command::Roundtrip { file } => cmd_roundtrip(&repository, &parser, &file),
        Command::Conformance { service, version } => {
            cmd_conformance(&repository, &service, &version)
        }
    }
}

fn init_logging(logging: &LoggingConfig, json: bool) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.filter)
            .with_context(|| format!("invalid log filter '{}'", logging.filter))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if json || logging.format == LogFormat::Json {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };
    installed.map_err(|err| anyhow!("failed to install the log subscriber: {err}"))
}

fn operation_query(
    service: &str,
    operation: &str,
    version: Option<String>,
    media_type: Option<String>,
) -> anyhow::Result<Key> {
    let service = ServiceName::new(service).context("--service must not be empty")?;
    let operation = OperationName::new(operation).context("--operation must not be empty")?;
    let version = version
        .map(|v| ServiceVersion::new(v).context("--version must not be empty"))
        .transpose()?;
    let key = OperationKey::new(service, version, operation);
    let key = match media_type {
        Some(mt) => {
            key.with_media_type(MediaType::new(mt).context("--media-type must not be empty")?)
        }
        None => key,
    };
    Ok(key.into())
}

fn cmd_keys(repository: &SosRepository, decoders: bool) -> anyhow::Result<()> {
    let keys = if decoders {
        repository.decoders().all_keys()
    } else {
        repository.encoders().all_keys()
    };
    for key in keys {
        println!("{key}");
    }
    Ok(())
}

fn cmd_resolve(repository: &SosRepository, query: &Key, decoders: bool) -> anyhow::Result<()> {
    let report = if decoders {
        resolution_report(&repository.decoders().explain(query, &[])?)
    } else {
        resolution_report(&repository.encoders().explain(query, &[])?)
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn resolution_report<C: ?Sized + Codec>(resolution: &Resolution<C>) -> serde_json::Value {
    serde_json::json!({
        "codec": resolution.codec.name(),
        "query_position": resolution.query_position,
        "matched_key": resolution.matched_key.to_string(),
        "kind": resolution.kind,
    })
}

fn decode_file(
    repository: &SosRepository,
    parser: &XmlParser,
    file: &Path,
) -> anyhow::Result<SosObject> {
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let tree = parser
        .parse(&bytes)
        .with_context(|| format!("{} is not well-formed XML", file.display()))?;
    let key = decoder_key_for(&tree)
        .with_context(|| format!("root element {} cannot key a decoder", tree.name()))?;
    debug!(%key, "decoding document");
    repository
        .decode(&key, &[], &tree)
        .with_context(|| format!("failed to decode {}", file.display()))
}

fn cmd_decode(repository: &SosRepository, parser: &XmlParser, file: &Path) -> anyhow::Result<()> {
    let object = decode_file(repository, parser, file)?;
    println!("{}", serde_json::to_string_pretty(&object)?);
    Ok(())
}

fn cmd_roundtrip(
    repository: &SosRepository,
    parser: &XmlParser,
    file: &Path,
) -> anyhow::Result<()> {
    let object = decode_file(repository, parser, file)?;
    let (query, alternatives) = object.encoder_queries();
    let tree = repository
        .encode(&query, &alternatives, &object, &EncodingContext::new())
        .context("failed to encode the decoded document")?;
    let bytes = vocabulary::writer().write(&tree)?;
    println!("{}", String::from_utf8(bytes).context("writer produced invalid UTF-8")?);
    Ok(())
}

fn cmd_conformance(repository: &SosRepository, service: &str, version: &str) -> anyhow::Result<()> {
    let service = ServiceName::new(service).context("--service must not be empty")?;
    let version = ServiceVersion::new(version).context("--version must not be empty")?;
    for class in repository.conformance_classes(&service, &version) {
        println!("{class}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_query_carries_every_part() {
        let key = operation_query(
            "SOS",
            "DeleteObservation",
            Some("2.0.0".into()),
            Some("text/xml".into()),
        )
        .expect("valid");
        let expected: Key = OperationKey::new(
            vocabulary::SOS,
            vocabulary::SOS_2_0_0,
            vocabulary::DELETE_OBSERVATION,
        )
        .with_media_type(MediaType::TEXT_XML)
        .into();
        assert_eq!(key, expected);
    }

    #[test]
    fn test_empty_service_is_rejected() {
        assert!(operation_query("", "DeleteObservation", None, None).is_err());
    }

    #[test]
    fn test_resolution_report_names_the_codec() {
        let repository = sos::repository(coding::RegistryConfig::default()).expect("no conflicts");
        let query = operation_query(
            "SOS",
            "GetDataAvailability",
            Some("2.0.0".into()),
            Some("application/xml".into()),
        )
        .expect("valid");
        let resolution = repository.encoders().explain(&query, &[]).expect("resolves");
        let report = resolution_report(&resolution);
        assert_eq!(report["codec"], "get-data-availability-encoder");
        assert_eq!(report["kind"]["kind"], "similar");
        assert_eq!(report["kind"]["distance"], 1);
    }

    #[test]
    fn test_args_accept_global_flags_after_the_command() {
        let args =
            Args::try_parse_from(["codecctl", "keys", "--decoders", "--json"]).expect("valid");
        assert!(args.json);
        assert!(matches!(args.command, Command::Keys { decoders: true }));
    }
}
