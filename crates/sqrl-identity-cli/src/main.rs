mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sqrl_identity_config::Config;
use sqrl_identity_engine::{
    BuiltinSchemaSource, Direction, DirectorySchemaSource, IdentityCodec, LayeredSchemaSource,
    MemorySchemaSource, SchemaSource, Transport,
};
use std::io::stdout;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqrl-identity",
    version,
    about = "Inspect and edit SQRL identity files"
)]
struct Cli {
    /// Directory of `<block type>.json` schemas, consulted before the bundled ones
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    /// Schema used for block types that have none
    #[arg(long, global = true)]
    unknown_schema: Option<PathBuf>,

    /// Config file to read instead of ~/.config/sqrl-identity/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the blocks and items of an identity
    Dump {
        file: PathBuf,
    },

    /// Rewrite an identity in binary or base64 transport
    Convert(ConvertArgs),

    /// Remove a block
    DeleteBlock {
        #[command(flatten)]
        target: EditTarget,
        /// Block position, as shown by `dump`
        block: usize,
    },

    /// Swap a block with its neighbour
    MoveBlock {
        #[command(flatten)]
        target: EditTarget,
        block: usize,
        #[arg(value_enum)]
        direction: MoveDirection,
    },

    /// Remove an item from a block
    DeleteItem {
        #[command(flatten)]
        target: EditTarget,
        block: usize,
        /// Item position within the block, as shown by `dump`
        item: usize,
    },

    /// Change an item's value: decimal for integers, hex for byte sequences
    Set {
        #[command(flatten)]
        target: EditTarget,
        block: usize,
        item: usize,
        value: String,
    },

    /// Add a zero-valued block of a registered type
    AddBlock {
        #[command(flatten)]
        target: EditTarget,
        block_type: u16,
        /// Insert after this block position instead of appending
        #[arg(long)]
        after: Option<usize>,
    },

    /// List the block types that have a schema
    Types,
}

#[derive(clap::Args)]
struct ConvertArgs {
    input: PathBuf,
    output: PathBuf,

    /// Write base64 transport (`SQRLDATA`)
    #[arg(long, conflicts_with = "binary")]
    base64: bool,

    /// Write binary transport (`sqrldata`)
    #[arg(long)]
    binary: bool,
}

#[derive(clap::Args)]
struct EditTarget {
    /// Identity file to edit
    file: PathBuf,

    /// Write the result here instead of back to the input file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for Direction {
    fn from(direction: MoveDirection) -> Self {
        match direction {
            MoveDirection::Up => Direction::Up,
            MoveDirection::Down => Direction::Down,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file {} not found", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };

    let schema_dir = cli.schema_dir.or(config.schema_dir);
    let unknown_schema = cli.unknown_schema.or(config.unknown_schema);
    let codec = IdentityCodec::new(schema_source(schema_dir, unknown_schema)?)?;

    match cli.command {
        Command::Dump { file } => commands::dump(&codec, &file, &mut stdout()),
        Command::Convert(args) => {
            let transport = if args.base64 || (!args.binary && config.save_base64) {
                Transport::Base64
            } else {
                Transport::Binary
            };
            commands::convert(&codec, &args.input, &args.output, transport)
        }
        Command::DeleteBlock { target, block } => {
            commands::edit(&codec, &target.file, target.output.as_deref(), |doc| {
                commands::delete_block(doc, block)
            })
        }
        Command::MoveBlock {
            target,
            block,
            direction,
        } => commands::edit(&codec, &target.file, target.output.as_deref(), |doc| {
            commands::move_block(doc, block, direction.into())
        }),
        Command::DeleteItem {
            target,
            block,
            item,
        } => commands::edit(&codec, &target.file, target.output.as_deref(), |doc| {
            commands::delete_item(doc, block, item)
        }),
        Command::Set {
            target,
            block,
            item,
            value,
        } => commands::edit(&codec, &target.file, target.output.as_deref(), |doc| {
            commands::set_value(doc, block, item, &value)
        }),
        Command::AddBlock {
            target,
            block_type,
            after,
        } => commands::edit(&codec, &target.file, target.output.as_deref(), |doc| {
            commands::add_block(codec.resolver(), doc, block_type, after)
        }),
        Command::Types => commands::types(codec.resolver(), &mut stdout()),
    }
}

/// Bundled schemas, optionally overridden by a schema directory and a
/// replacement unknown-block schema
fn schema_source(
    schema_dir: Option<PathBuf>,
    unknown_schema: Option<PathBuf>,
) -> Result<Box<dyn SchemaSource>> {
    let source: Box<dyn SchemaSource> = match (schema_dir, unknown_schema) {
        (Some(dir), unknown) => {
            log::debug!("Using block schemas from {}", dir.display());
            let mut directory = DirectorySchemaSource::new(dir);
            if let Some(unknown) = unknown {
                directory = directory.with_fallback_file(unknown);
            }
            Box::new(LayeredSchemaSource::new(directory, BuiltinSchemaSource))
        }
        (None, Some(unknown)) => {
            let json = std::fs::read(&unknown)
                .with_context(|| format!("Cannot read schema {}", unknown.display()))?;
            let memory = MemorySchemaSource::new().with_fallback(json);
            Box::new(LayeredSchemaSource::new(memory, BuiltinSchemaSource))
        }
        (None, None) => Box::new(BuiltinSchemaSource),
    };
    Ok(source)
}
