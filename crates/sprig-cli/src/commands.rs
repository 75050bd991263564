use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use sprig_sdk::{AddOutcome, RemoveOutcome, RepoPath, Repository, SdkError, StageError};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let root = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let format = cli.format;

    match cli.command {
        Command::Init(args) => cmd_init(&root, args),
        Command::Add(args) => cmd_add(&root, args, format),
        Command::Rm(args) => cmd_rm(&root, args),
        Command::Commit(args) => cmd_commit(&root, args, format),
        Command::Status => cmd_status(&root, format),
        Command::LsStaged => cmd_ls_staged(&root, format),
    }
}

fn parse_paths(raw: &[String]) -> anyhow::Result<Vec<RepoPath>> {
    raw.iter()
        .map(|p| RepoPath::from_relative(Path::new(p)).with_context(|| format!("bad path {p:?}")))
        .collect()
}

fn cmd_init(root: &Path, args: InitArgs) -> anyhow::Result<ExitCode> {
    let target: PathBuf = match args.path {
        Some(p) if p.is_absolute() => p,
        Some(p) => root.join(p),
        None => root.to_path_buf(),
    };
    match Repository::init(&target) {
        Ok(repo) => {
            println!(
                "{} Initialized empty sprig repository in {}",
                "✓".green().bold(),
                target.display().to_string().bold()
            );
            println!("  HEAD: {}", repo.head_id()?.short_hex().yellow());
            Ok(ExitCode::SUCCESS)
        }
        Err(SdkError::AlreadyInitialized(_)) => {
            println!("A sprig version-control system already exists in the current directory.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_add(root: &Path, args: AddArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let paths = parse_paths(&args.paths)?;
    let mut repo = Repository::open(root)?;

    let outcomes = match repo.add(&paths) {
        Ok(outcomes) => outcomes,
        Err(SdkError::Stage(StageError::NotFound(_))) => {
            println!("File does not exist.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if format == OutputFormat::Json {
        let rows: Vec<_> = outcomes
            .iter()
            .map(|(path, outcome)| {
                serde_json::json!({ "path": path, "outcome": format!("{outcome:?}") })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (path, outcome) in &outcomes {
            tracing::debug!(%path, ?outcome, "add finished");
            if let AddOutcome::RemovalUndone { cleared } = outcome {
                println!("  {} {} ({} removal(s) cancelled)", "restored:".green(), path, cleared);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_rm(root: &Path, args: RmArgs) -> anyhow::Result<ExitCode> {
    let paths = parse_paths(&args.paths)?;
    let mut repo = Repository::open(root)?;

    for path in &paths {
        match repo.remove(path) {
            Ok(RemoveOutcome::StagedForRemoval) => println!("  {} {}", "removed:".red(), path),
            Ok(RemoveOutcome::Unstaged) => println!("  {} {}", "unstaged:".yellow(), path),
            Err(SdkError::NothingToRemove(_)) => {
                println!("No reason to remove the file.");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_commit(root: &Path, args: CommitArgs, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let mut repo = Repository::open(root)?;

    let summary = match repo.commit(&args.message) {
        Ok(summary) => summary,
        Err(e @ (SdkError::NothingToCommit | SdkError::EmptyMessage)) => {
            println!("{}", capitalize(&e.to_string()));
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} {}", summary.id.short_hex().yellow().bold(), summary.message);
        println!(
            "  {} added/changed, {} removed",
            summary.added.to_string().green(),
            summary.removed.to_string().red()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_status(root: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let repo = Repository::open(root)?;
    let status = repo.status()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("HEAD: {}", repo.head_id()?.short_hex().yellow().bold());
    if status.is_clean() {
        println!("\nNothing staged. Working directory clean.");
        return Ok(ExitCode::SUCCESS);
    }

    print_section("Staged Files", &status.staged, |p| p.as_str().green().to_string());
    print_section("Removed Files", &status.removed, |p| p.as_str().red().to_string());
    print_section("Modifications Not Staged For Commit", &status.modified, |p| {
        format!("{} (modified)", p)
    });
    print_section("Deleted Files Not Staged", &status.deleted, |p| {
        format!("{} (deleted)", p)
    });
    print_section("Untracked Files", &status.untracked, |p| p.as_str().dimmed().to_string());
    if !status.has_staged_changes() {
        println!("\nNo changes staged for commit (use \"sprig add\" or \"sprig rm\").");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_ls_staged(root: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let repo = Repository::open(root)?;
    let staged = repo.staging_area().staged_addition_paths();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&staged)?);
    } else {
        for path in &staged {
            println!("{path}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_section(title: &str, paths: &[RepoPath], render: impl Fn(&RepoPath) -> String) {
    if paths.is_empty() {
        return;
    }
    println!("\n=== {} ===", title.bold());
    for path in paths {
        println!("  {}", render(path));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>() + ".",
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Runs one command against `root` and reports whether it succeeded.
    fn run(root: &Path, args: &[&str]) -> bool {
        let mut argv = vec!["sprig", "-C"];
        let root = root.to_str().unwrap();
        argv.push(root);
        argv.extend_from_slice(args);
        let code = run_command(Cli::parse_from(argv)).unwrap();
        format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
    }

    #[test]
    fn capitalize_adds_period() {
        assert_eq!(capitalize("no changes added to the commit"), "No changes added to the commit.");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn parse_paths_rejects_escape() {
        assert!(parse_paths(&["../x".to_string()]).is_err());
        let ok = parse_paths(&["./a/b.txt".to_string()]).unwrap();
        assert_eq!(ok[0].as_str(), "a/b.txt");
    }

    #[test]
    fn add_missing_file_fails_without_staging() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["init"]));
        std::fs::write(dir.path().join("here.txt"), "h").unwrap();

        assert!(!run(dir.path(), &["add", "here.txt", "missing.txt"]));
        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.staging_area().staged_addition_paths().is_empty());
    }

    #[test]
    fn status_reports_unstaged_work() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["init"]));
        std::fs::write(dir.path().join("loose.txt"), "l").unwrap();

        assert!(run(dir.path(), &["status"]));
        let status = Repository::open(dir.path()).unwrap().status().unwrap();
        assert!(!status.is_clean());
        assert!(!status.has_staged_changes());

        assert!(run(dir.path(), &["add", "loose.txt"]));
        let status = Repository::open(dir.path()).unwrap().status().unwrap();
        assert!(status.has_staged_changes());
    }

    #[test]
    fn add_commit_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["init"]));
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        assert!(run(dir.path(), &["add", "a.txt"]));
        assert!(run(dir.path(), &["commit", "-m", "first"]));
        assert!(!run(dir.path(), &["commit", "-m", "again"]));
        assert!(!run(dir.path(), &["init"]));
    }
}
