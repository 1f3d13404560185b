use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use prompt_syntax_config::Config;
use prompt_syntax_engine::parsing::parse_tree;
use prompt_syntax_engine::{
    DocumentType, FileService, LocalFileService, PromptSyntaxService, StorageScope, file_uri,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "prompt-syntax")]
#[command(about = "Validate and inspect prompt, instructions and chat mode files")]
#[command(version)]
struct Cli {
    /// Workspace root; defaults to the current directory
    #[arg(short, long, value_name = "DIR", global = true)]
    workspace: Option<PathBuf>,

    /// Config file to use instead of ~/.config/prompt-syntax/config.toml
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report header and reference problems; fails if any is an error
    Check { files: Vec<PathBuf> },
    /// List prompt files of one type
    List {
        #[arg(value_enum)]
        kind: Kind,
        /// Search the user data directory instead of the workspace
        #[arg(long)]
        user: bool,
    },
    /// List instruction files whose applyTo matches any of the given files
    Applicable { files: Vec<PathBuf> },
    /// Print the metadata tree of each file, following references
    Metadata { files: Vec<PathBuf> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Prompt,
    Instructions,
    Mode,
}

impl From<Kind> for DocumentType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Prompt => DocumentType::Prompt,
            Kind::Instructions => DocumentType::Instructions,
            Kind::Mode => DocumentType::Mode,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("config file {} not found", path.display()))?,
        None => Config::load_or_default()?,
    };
    let workspace = match &cli.workspace {
        Some(dir) => absolute(dir)?,
        None => std::env::current_dir()?,
    };
    log::debug!("workspace root {}", workspace.display());

    let root = Url::from_directory_path(&workspace)
        .map_err(|()| anyhow::anyhow!("{} is not a valid directory", workspace.display()))?;
    let service = PromptSyntaxService::local(vec![root], Arc::new(config));
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Check { files } => check(&files, cli.json).await,
        Command::List { kind, user } => {
            let scope = if user {
                StorageScope::User
            } else {
                StorageScope::Local
            };
            let found = service.list_files(kind.into(), scope, &cancel).await?;
            print_uris(&found, cli.json)
        }
        Command::Applicable { files } => {
            let targets = uris(&files)?;
            let found = service.find_files_applicable_to(&targets, &cancel).await?;
            print_uris(&found, cli.json)
        }
        Command::Metadata { files } => {
            let trees = service.get_all_metadata(&uris(&files)?).await;
            println!("{}", serde_json::to_string_pretty(&trees)?);
            Ok(())
        }
    }
}

async fn check(files: &[PathBuf], json: bool) -> Result<()> {
    let service: Arc<dyn FileService> = Arc::new(LocalFileService);
    let mut reports = Vec::new();
    let mut errors = 0;

    for uri in uris(files)? {
        let text = service.read(&uri).await?;
        let node = parse_tree(&uri, DocumentType::infer(&uri), &text, Arc::clone(&service)).await;
        let problems = node.problems();
        errors += problems.iter().filter(|p| p.is_error()).count();

        if json {
            reports.push(serde_json::json!({ "uri": uri, "problems": problems }));
        } else {
            for problem in &problems {
                println!("{}:{problem}", display_path(&uri));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if errors > 0 {
        bail!("{errors} error(s) found");
    }
    Ok(())
}

fn print_uris(found: &[Url], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(found)?);
    } else {
        for uri in found {
            println!("{}", display_path(uri));
        }
    }
    Ok(())
}

fn uris(files: &[PathBuf]) -> Result<Vec<Url>> {
    files
        .iter()
        .map(|path| {
            let path = absolute(path)?;
            file_uri(&path).with_context(|| format!("cannot address {}", path.display()))
        })
        .collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn display_path(uri: &Url) -> String {
    uri.to_file_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|()| uri.to_string())
}
