use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use cinescribe::config::Config;
use cinescribe::db::{
    migrate, BoardKind, BoardRepository, CharacterRepository, LibraryRepository,
    ProjectRepository, SceneRepository,
};
use cinescribe::{logging, AssetStore, DocumentService, LibraryService, ProjectSession};

#[derive(Debug, PartialEq)]
enum Command {
    New { store: PathBuf, title: Option<String> },
    Open { store: PathBuf },
    Info { store: PathBuf },
    Import { store: PathBuf, sources: Vec<PathBuf> },
    Assets { store: PathBuf, query: Option<String> },
    Projects { query: Option<String>, all: bool },
    Export { store: PathBuf, target: String, output: PathBuf },
}

#[derive(Debug, PartialEq)]
struct CliArgs {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args_from(args: &[String]) -> std::result::Result<CliArgs, String> {
    let mut config_path = None;
    let mut title = None;
    let mut all = false;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires a path argument")?;
                config_path = Some(PathBuf::from(path));
            }
            "--title" | "-t" => {
                i += 1;
                title = Some(args.get(i).ok_or("--title requires a value")?.clone());
            }
            "--all" | "-a" => all = true,
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("Unknown argument: {}", arg));
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let (name, rest) = positional
        .split_first()
        .ok_or("No command given")?;
    let store = |what: &str| -> std::result::Result<PathBuf, String> {
        rest.first()
            .map(PathBuf::from)
            .ok_or(format!("{} requires a project store path", what))
    };

    let command = match name.as_str() {
        "new" => Command::New {
            store: store("new")?,
            title,
        },
        "open" => Command::Open {
            store: store("open")?,
        },
        "info" => Command::Info {
            store: store("info")?,
        },
        "import" => {
            let store = store("import")?;
            let sources: Vec<PathBuf> = rest[1..].iter().map(PathBuf::from).collect();
            if sources.is_empty() {
                return Err("import requires at least one image or directory".to_string());
            }
            Command::Import { store, sources }
        }
        "assets" => Command::Assets {
            store: store("assets")?,
            query: rest.get(1).cloned(),
        },
        "projects" => Command::Projects {
            query: rest.first().cloned(),
            all,
        },
        "export" => {
            if rest.len() != 3 {
                return Err("export takes <store> <doc-key|audio|cinematic> <out>".to_string());
            }
            Command::Export {
                store: PathBuf::from(&rest[0]),
                target: rest[1].clone(),
                output: PathBuf::from(&rest[2]),
            }
        }
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(CliArgs {
        config_path,
        command,
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") || args.is_empty() {
        print_help();
        std::process::exit(0);
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("cinescribe {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    match parse_args_from(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_help();
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"cinescribe - pre-production project stores for film work

USAGE:
    cinescribe [OPTIONS] <COMMAND>

COMMANDS:
    new <store> [--title T]                        Create a project store and register it
    open <store>                                   Open a project and mark it as recently used
    info <store>                                   Show project info and counts
    import <store> <image-or-dir>...               Import images into the project
    assets <store> [query]                         List imported images, optionally filtered
    projects [query] [--all]                       List known projects (--all includes archived)
    export <store> <doc-key|audio|cinematic> <out> Write a document or board to a file

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    CINESCRIBE_CONFIG   Path to config file (overrides default location)
    CINESCRIBE_LOG      Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/cinescribe/config.toml"#
    );
}

fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let path = explicit.or_else(|| std::env::var_os("CINESCRIBE_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => Config::load_from(&path),
        None => Config::load(),
    }
}

fn library(config: &Config) -> Result<LibraryService> {
    let path = config.library_store_path()?;
    let repo = LibraryRepository::open(&path)
        .with_context(|| format!("Failed to open library store {}", path.display()))?;
    Ok(LibraryService::new(repo))
}

fn open_session(store: &Path) -> Result<ProjectSession> {
    ProjectSession::open(store)
        .with_context(|| format!("Failed to open project store {}", store.display()))
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::New { store, title } => {
            library(config)?.create_project(&store, title.as_deref())?;
            let session = open_session(&store)?;
            println!("Created {}", session.store_path().display());
            println!("Assets: {}", session.dirs().assets_dir.display());
        }
        Command::Open { store } => {
            let session = library(config)?.open_project(&store)?;
            let info = ProjectRepository::new(&session).get_info()?;
            let title = info.map(|i| i.title).unwrap_or_default();
            println!("Opened \"{}\" ({})", title, session.store_path().display());
        }
        Command::Info { store } => {
            let session = open_session(&store)?;
            print_info(&session)?;
        }
        Command::Import { store, sources } => {
            let session = open_session(&store)?;
            let assets = AssetStore::new(&session, config.thumbnails.clone());
            import_sources(&assets, &sources, &config.import.image_extensions)?;
        }
        Command::Assets { store, query } => {
            let session = open_session(&store)?;
            let assets = AssetStore::new(&session, config.thumbnails.clone());
            for asset in assets.search(query.as_deref().unwrap_or(""))? {
                let size = match (asset.width, asset.height) {
                    (Some(w), Some(h)) => format!("{}x{}", w, h),
                    _ => "?".to_string(),
                };
                println!(
                    "{:>5}  {:<9}  {}  [{}]",
                    asset.id,
                    size,
                    asset.project_path,
                    asset.tags.unwrap_or_default()
                );
            }
        }
        Command::Projects { query, all } => {
            for project in library(config)?.search(query.as_deref(), all)? {
                let opened = project
                    .last_opened_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                let archived = if project.archived { " (archived)" } else { "" };
                println!(
                    "{}{}\n    {}\n    last opened: {}  tags: {}",
                    project.title, archived, project.project_path, opened, project.tags
                );
            }
        }
        Command::Export {
            store,
            target,
            output,
        } => {
            let session = open_session(&store)?;
            match target.as_str() {
                "audio" => BoardRepository::new(&session, BoardKind::Audio).export_to_file(&output)?,
                "cinematic" => {
                    BoardRepository::new(&session, BoardKind::Cinematic).export_to_file(&output)?
                }
                key => DocumentService::new(&session).export(key, &output)?,
            }
            println!("Wrote {}", output.display());
        }
    }
    Ok(())
}

fn print_info(session: &ProjectSession) -> Result<()> {
    let Some(info) = ProjectRepository::new(session).get_info()? else {
        bail!("Project store has no project info row");
    };
    let conn = session.connect()?;
    let version = migrate::current_version(&conn)?;

    let scenes = SceneRepository::new(session).list_scenes()?;
    let mut shot_count = 0;
    for scene in &scenes {
        shot_count += SceneRepository::new(session).list_shots(scene.id)?.len();
    }
    let characters = CharacterRepository::new(session).list()?;
    let assets = AssetStore::new(session, Default::default()).search("")?;

    println!("{}", info.title);
    if !info.logline.is_empty() {
        println!("  {}", info.logline);
    }
    println!("  store:      {}", session.store_path().display());
    println!("  schema:     v{}", version);
    println!("  tags:       {}", info.tag_list().join(", "));
    println!("  characters: {}", characters.len());
    println!("  scenes:     {} ({} shots)", scenes.len(), shot_count);
    println!("  images:     {}", assets.len());
    Ok(())
}

fn import_sources(assets: &AssetStore, sources: &[PathBuf], extensions: &[String]) -> Result<()> {
    let mut failures = 0;
    for source in sources {
        if source.is_dir() {
            let report = assets.import_directory(source, extensions)?;
            for imported in &report.imported {
                print_imported(imported);
            }
            for (path, error) in &report.failed {
                eprintln!("failed   {}: {}", path.display(), error);
            }
            failures += report.failed.len();
        } else {
            match assets.import_image(source) {
                Ok(imported) => print_imported(&imported),
                Err(e) => {
                    eprintln!("failed   {}: {}", source.display(), e);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} file(s) could not be imported", failures);
    }
    Ok(())
}

fn print_imported(imported: &cinescribe::ImportedAsset) {
    let status = if imported.reused { "existing" } else { "imported" };
    println!("{} #{:<5} {}", status, imported.asset_id, imported.stored_path);
}

fn main() {
    let cli = parse_args();

    // Uses journald on Linux, a file under ~/.cinescribe/logs otherwise
    let _ = logging::init(None);

    let result = load_config(cli.config_path).and_then(|config| run(cli.command, &config));
    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
