// ============================================================================
// 命令行定义（clap）
// 单次子命令与 shell 中的每一行共用同一套 Command
// ============================================================================

pub mod progress;
pub mod runner;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::services::packer::{ArchiveKind, Compression};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the session database. Defaults to ~/.zip-creator.
    #[arg(long, env = "ZIP_CREATOR_HOME", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// A single line typed into the interactive shell.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Show the entry list with indices.
    #[command(alias = "ls")]
    List,

    /// Show item count, total file size and undo/redo depth.
    Stats,

    /// Add one file to the list.
    AddFile {
        path: PathBuf,
        /// Existing folder display name to nest the file under.
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Add a folder and every file inside it.
    AddFolder {
        path: PathBuf,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Write a new file into the working directory and add it.
    CreateFile {
        name: String,
        /// File content. Prompted for when omitted.
        #[arg(short, long)]
        content: Option<String>,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Add a virtual folder that only exists inside the archive.
    #[command(alias = "mkdir")]
    CreateFolder {
        name: String,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Remove entries by index.
    #[command(alias = "rm", group = ArgGroup::new("kind").args(["files_only", "folders_only"]))]
    Remove {
        #[arg(required = true)]
        indices: Vec<usize>,
        /// Reject the batch unless every selected entry is a file.
        #[arg(long)]
        files_only: bool,
        /// Reject the batch unless every selected entry is a folder.
        #[arg(long)]
        folders_only: bool,
    },

    /// Rename an entry by display name (renames on disk for real files and folders).
    #[command(alias = "mv")]
    Rename { old_name: String, new_name: String },

    /// Point the entry at INDEX to another file, keeping its position.
    Replace { index: usize, path: PathBuf },

    /// Undo the last change to the list.
    Undo,

    /// Redo the last undone change.
    Redo,

    /// Start a new archive: clear the list and the undo history.
    #[command(alias = "new")]
    Clear {
        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Write the list into a ZIP archive.
    Archive {
        /// Output path. A timestamped name is generated when omitted.
        destination: Option<PathBuf>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long, value_enum)]
        compression: Option<CompressionArg>,
        /// Overwrite an existing file without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show recently created archives.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show or change settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Read commands from stdin until `exit`.
    Shell,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Print all settings.
    Show,
    /// Set one setting (default_output_dir, archive_kind, compression, max_history).
    Set { key: String, value: String },
}

/// Archive type. RAR and 7Z are accepted but still produce a ZIP container.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Zip,
    Rar,
    #[value(name = "7z")]
    SevenZip,
}

impl From<KindArg> for ArchiveKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Zip => ArchiveKind::Zip,
            KindArg::Rar => ArchiveKind::Rar,
            KindArg::SevenZip => ArchiveKind::SevenZip,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionArg {
    Stored,
    Deflated,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Stored => Compression::Stored,
            CompressionArg::Deflated => Compression::Deflated,
        }
    }
}
