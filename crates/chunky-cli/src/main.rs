use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chunky::{Chunk, ChunkBody, Chunky};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "chunky", about = "Inspect and dump Relic Chunky container files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the container header and chunk counts.
    Info {
        /// Path to a chunky file (.whm, .rsh, .fda, ...).
        file: PathBuf,
    },
    /// Print the chunk tree.
    Tree {
        /// Path to a chunky file.
        file: PathBuf,
        /// Print dotted fourcc paths instead of an indented tree.
        #[arg(long)]
        paths: bool,
    },
    /// Extract every data chunk's payload into a directory tree.
    Dump {
        /// Path to a chunky file.
        file: PathBuf,
        /// Output directory (defaults to the input path minus its extension).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write a JSON .meta sidecar per chunk.
        #[arg(long)]
        meta: bool,
    },
}

fn cmd_info(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    // Lazy parse: headers only, payloads stay on disk.
    let (chunky, handle) = Chunky::read_lazy(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut folders = 0usize;
    let mut data = 0usize;
    let mut payload_bytes = 0u64;
    for (_, chunk) in chunky.walk() {
        match &chunk.body {
            ChunkBody::Folder(_) => folders += 1,
            ChunkBody::Data(payload) => {
                data += 1;
                payload_bytes += payload.len() as u64;
            }
        }
    }
    handle.close();

    println!("File:     {}", path.display());
    println!("Version:  {}", chunky.version);
    println!("Platform: {}", chunky.platform);
    println!("Folders:  {folders}");
    println!("Data:     {data} ({payload_bytes} payload bytes)");
    Ok(())
}

fn cmd_tree(path: &Path, paths: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let (chunky, handle) = Chunky::read_lazy(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;

    for (cc_path, chunk) in chunky.walk() {
        let size = match &chunk.body {
            ChunkBody::Folder(children) => format!("{} children", children.len()),
            ChunkBody::Data(payload) => format!("{} bytes", payload.len()),
        };
        if paths {
            println!("{cc_path} [{}] {size}", chunk.kind());
        } else {
            let indent = "  ".repeat(cc_path.parts().len() - 1);
            println!("{indent}{} {} {:?} ({size})", chunk.kind(), chunk.code, chunk.name);
        }
    }
    handle.close();
    Ok(())
}

fn cmd_dump(path: &Path, out: Option<PathBuf>, meta: bool) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let chunky = Chunky::read(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let out = out.unwrap_or_else(|| path.with_extension(""));
    fs::create_dir_all(&out)
        .with_context(|| format!("failed to create output dir {}", out.display()))?;

    let written = dump_chunks(&chunky.chunks, &out, meta)?;
    eprintln!("[dump] wrote {written} files to {}", out.display());
    Ok(())
}

fn dump_chunks(chunks: &[Chunk], dir: &Path, meta: bool) -> Result<u64> {
    let mut written = 0u64;
    for (i, chunk) in chunks.iter().enumerate() {
        match &chunk.body {
            ChunkBody::Folder(children) => {
                let sub = dir.join(entry_name(chunk, i));
                fs::create_dir_all(&sub)?;
                if meta {
                    write_meta(chunk, &sub.join("folder.meta"))?;
                    written += 1;
                }
                written += dump_chunks(children, &sub, meta)?;
            }
            ChunkBody::Data(payload) => {
                let base = dir.join(entry_name(chunk, i));
                let bin = base.with_extension("bin");
                fs::write(&bin, payload.read()?)
                    .with_context(|| format!("failed to write {}", bin.display()))?;
                written += 1;
                if meta {
                    write_meta(chunk, &base.with_extension("meta"))?;
                    written += 1;
                }
            }
        }
    }
    Ok(written)
}

/// File/directory name for a chunk: `{code}-{name}-Chunk-{index}`, with
/// empty parts dropped and path separators inside names flattened.
fn entry_name(chunk: &Chunk, index: usize) -> String {
    let name = chunk.name.trim().replace(['\\', '/'], "_");
    let index = index.to_string();
    let parts = [
        chunk.code.as_str().trim(),
        name.as_str(),
        "Chunk",
        index.as_str(),
    ];
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Serialize)]
struct ChunkMeta<'a> {
    code: &'a str,
    name: &'a str,
    kind: String,
    size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
}

fn write_meta(chunk: &Chunk, path: &Path) -> Result<()> {
    let meta = ChunkMeta {
        code: chunk.code.as_str(),
        name: &chunk.name,
        kind: chunk.kind().to_string(),
        size: match &chunk.body {
            ChunkBody::Folder(_) => 0,
            ChunkBody::Data(payload) => payload.len(),
        },
        version: chunk.version,
    };
    let json = serde_json::to_string_pretty(&meta)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Info { file } => cmd_info(file),
        Command::Tree { file, paths } => cmd_tree(file, *paths),
        Command::Dump { file, out, meta } => cmd_dump(file, out.clone(), *meta),
    }
}
