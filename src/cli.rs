//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde_json::{Map, Value, json};

/// Search manga catalogues and download chapters through site adapters.
#[derive(Parser, Debug)]
#[command(name = "manga-pipeline")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to read instead of the default location
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Base URL of the adapter's JSON API
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Identifier the adapter registers under
    #[arg(long, global = true, default_value = "default")]
    pub adapter_id: String,

    /// Root directory for downloaded pages
    #[arg(short, long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Capacity of each pipeline queue (1-1000000)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=1_000_000))]
    pub queue_capacity: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the adapter's catalogue
    Search(SearchArgs),
    /// Download one or more chapters of a manga
    Download(DownloadArgs),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective configuration and where it came from
    Show,
}

/// Arguments for `search`.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct SearchArgs {
    /// Title substring to look for
    pub name: Option<String>,

    /// Author name
    #[arg(long)]
    pub author: Option<String>,

    /// Look up an adapter-specific identifier
    #[arg(long)]
    pub id: Option<String>,

    /// Genre every result must carry (repeatable)
    #[arg(long = "genre", value_name = "GENRE")]
    pub genre_include: Vec<String>,

    /// Genre no result may carry (repeatable)
    #[arg(long = "exclude-genre", value_name = "GENRE")]
    pub genre_exclude: Vec<String>,

    /// Ordering key: date, top, new or alpha
    #[arg(long)]
    pub sort: Option<String>,

    /// Ordering direction: asc or dsc
    #[arg(long)]
    pub order: Option<String>,

    /// Result language
    #[arg(long)]
    pub language: Option<String>,

    /// Accepted publication status: ongoing or completed (repeatable)
    #[arg(long = "status", value_name = "STATUS")]
    pub status: Vec<String>,
}

impl SearchArgs {
    /// Renders the arguments as the camelCase field map a search action
    /// is validated from. Unset options are left out so defaults apply.
    #[must_use]
    pub fn to_fields(&self) -> Value {
        let mut map = Map::new();
        insert_opt(&mut map, "name", self.name.as_deref());
        insert_opt(&mut map, "author", self.author.as_deref());
        insert_opt(&mut map, "id", self.id.as_deref());
        insert_list(&mut map, "genreInclude", &self.genre_include);
        insert_list(&mut map, "genreExclude", &self.genre_exclude);
        insert_opt(&mut map, "sort", self.sort.as_deref());
        insert_opt(&mut map, "sortOrder", self.order.as_deref());
        insert_opt(&mut map, "language", self.language.as_deref());
        insert_list(&mut map, "status", &self.status);
        Value::Object(map)
    }
}

/// Arguments for `download`.
#[derive(ClapArgs, Debug, Clone)]
pub struct DownloadArgs {
    /// Adapter-specific manga identifier
    pub id: String,

    /// Zero-based chapter index (repeatable)
    #[arg(short, long = "chapter", value_name = "INDEX", required = true)]
    pub chapters: Vec<u32>,

    /// Packaging format: pdf, cbz or none
    #[arg(long)]
    pub convert: Option<String>,

    /// Keep raw pages after conversion
    #[arg(long)]
    pub keep: bool,

    /// Adapter-specific image quality hint
    #[arg(long)]
    pub quality: Option<String>,
}

impl DownloadArgs {
    /// Renders one chapter's download as a camelCase field map.
    #[must_use]
    pub fn to_fields(&self, chapter: u32, download_dir: Option<&PathBuf>) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id));
        map.insert("chapter".to_string(), json!(chapter));
        if let Some(dir) = download_dir {
            map.insert("downloadDir".to_string(), json!(dir));
        }
        insert_opt(&mut map, "convert", self.convert.as_deref());
        if self.keep {
            map.insert("keepPostConversion".to_string(), Value::Bool(true));
        }
        insert_opt(&mut map, "quality", self.quality.as_deref());
        Value::Object(map)
    }
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn insert_list(map: &mut Map<String, Value>, key: &str, values: &[String]) {
    if !values.is_empty() {
        map.insert(key.to_string(), json!(values));
    }
}
