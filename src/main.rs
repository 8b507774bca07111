use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relsync::boundary::BoundaryWarning;
use relsync::cli::orchestration::{self, Chooser};
use relsync::cli::{BumpRequest, ReleaseBump, UpdateOptions};
use relsync::config::{self, Config, ConfigLayer};
use relsync::git::{Git2Repository, Repository};
use relsync::report::ReleaseReport;
use relsync::state;
use relsync::ui::{self, OutputFormat};

#[derive(Parser)]
#[command(
    name = "relsync",
    version,
    about = "Coordinate submodule tags and Helm chart versions for releases"
)]
struct Args {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = r#"Tag overrides as JSON, e.g. '{"subA": "latest", "subB": "v2"}'"#
    )]
    submodule_tag_overrides: Option<String>,

    #[arg(long, global = true, help = "JSON file with tag overrides")]
    submodule_tag_overrides_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ChartArgs {
    #[arg(long, help = "Repo Chart.yaml path")]
    repo_chart_path: Option<PathBuf>,

    #[arg(
        long,
        help = r#"Submodule chart paths as JSON, e.g. '{"subA": "path-in-A"}'"#
    )]
    submodule_chart_paths: Option<String>,

    #[arg(long, help = "JSON file with repoChart and submoduleCharts overrides")]
    chart_path_overrides: Option<PathBuf>,

    #[arg(long, help = "Path to store/load fetch state JSON")]
    state_file: Option<PathBuf>,

    #[arg(long, help = "Store the fetch result in the state file and reuse it")]
    use_state_file: bool,

    #[arg(long, help = "Fetch again instead of loading the state file")]
    force_refetch: bool,

    #[arg(long, help = "Do not create a Chart.yaml backup")]
    no_backup: bool,
}

#[derive(clap::Args)]
struct OutputArgs {
    #[arg(short, long, value_enum, default_value_t, help = "Output format")]
    output: OutputFormat,
}

#[derive(clap::Args)]
struct CommitArgs {
    #[arg(short, long, help = "Commit the changes")]
    commit: bool,

    #[arg(short = 'm', long, help = "Commit message")]
    commit_message: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Show submodule updates and the resulting parent chart version
    Fetch {
        #[command(flatten)]
        chart: ChartArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[arg(long, help = "Pre-release identifier for the parent chart version")]
        prerelease_identifier: Option<String>,
    },
    /// Move submodules to their suggested tags, update the parent chart and commit
    Update {
        #[command(flatten)]
        chart: ChartArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        commit: CommitArgs,
        #[arg(
            long,
            help = "Pre-release identifier, producing <next-version>-<identifier>(.<n>)"
        )]
        prerelease_identifier: Option<String>,
    },
    /// Render a JSON report from a file or stdin
    Format {
        #[command(flatten)]
        output: OutputArgs,
        #[arg(short, long, help = "Read this file instead of stdin")]
        file: Option<PathBuf>,
    },
    /// Submodule operations
    Submodule {
        #[command(subcommand)]
        command: SubmoduleCommand,
    },
    /// Parent chart operations
    Distribution {
        #[command(subcommand)]
        command: DistributionCommand,
    },
    /// Bump the repository version and chart
    Bump {
        #[arg(value_enum, default_value_t, help = "The bump to apply to the repo")]
        bump_type: ReleaseBump,
        #[command(flatten)]
        chart: ChartArgs,
        #[command(flatten)]
        commit: CommitArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[arg(short = 't', long, help = "Create a tag for the new version")]
        create_tag: bool,
        #[arg(long, help = "Keep the repo version and only bump the chart")]
        skip_repo_bump: bool,
        #[arg(long, value_enum, default_value_t, help = "The bump to apply to the chart")]
        chart_bump_type: ReleaseBump,
        #[arg(long, help = "This repository has no chart")]
        no_chart: bool,
    },
}

#[derive(Subcommand)]
enum SubmoduleCommand {
    /// Choose a tag per submodule and stage it
    Update {
        #[command(flatten)]
        chart: ChartArgs,
        #[command(flatten)]
        commit: CommitArgs,
        #[arg(short, long, help = "Accept all suggested tags")]
        accept: bool,
    },
}

#[derive(Subcommand)]
enum DistributionCommand {
    /// Write the checked out submodule chart versions into the parent chart
    Update {
        #[command(flatten)]
        chart: ChartArgs,
        #[command(flatten)]
        commit: CommitArgs,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Merge CLI flags, environment, JSON override files and the TOML file
fn resolve_config(
    root: &Path,
    args: &Args,
    chart: Option<&ChartArgs>,
    prerelease_identifier: Option<&str>,
) -> Result<Config> {
    let mut cli = ConfigLayer {
        prerelease_identifier: prerelease_identifier.map(str::to_string),
        ..ConfigLayer::default()
    };
    if let Some(raw) = &args.submodule_tag_overrides {
        cli.submodule_tags = config::parse_json_map(raw, "submodule tag overrides")?;
    }
    if let Some(chart) = chart {
        cli.repo_chart = chart.repo_chart_path.clone();
        cli.state_file = chart.state_file.clone();
        if let Some(raw) = &chart.submodule_chart_paths {
            cli.submodule_charts = config::parse_json_map(raw, "submodule chart paths")?;
        }
    }

    let files = config::override_files_layer(
        root,
        chart.and_then(|c| c.chart_path_overrides.as_deref()),
        args.submodule_tag_overrides_file.as_deref(),
    )?;
    let file = config::load_config_file(root, args.config.as_deref())?;

    Ok(config::resolve(&[cli, config::env_layer(), files, file]))
}

fn open_repo() -> Result<Git2Repository> {
    Git2Repository::open(".").context("Not inside a git repository")
}

fn show_warnings(warnings: &[BoundaryWarning]) {
    for warning in warnings {
        ui::display_boundary_warning(warning);
    }
}

fn commit(repo: &dyn Repository, args: &CommitArgs, default_message: &str) -> Result<Option<bool>> {
    if !args.commit {
        return Ok(None);
    }

    let message = args.commit_message.as_deref().unwrap_or(default_message);
    let committed = repo.commit_all(message).context("Failed to commit changes")?;
    if committed {
        ui::display_success(&format!("Committed: {}", message));
    } else {
        ui::display_status("Nothing to commit");
    }
    Ok(Some(committed))
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Format { output, file } => {
            let raw = match file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Cannot read {}", path.display()))?,
                None => {
                    let mut raw = String::new();
                    std::io::stdin().read_to_string(&mut raw)?;
                    raw
                }
            };
            if raw.trim().is_empty() {
                bail!("No input provided.");
            }

            let report: ReleaseReport = serde_json::from_str(&raw).context("Invalid JSON")?;
            println!("{}", ui::render_report(&report, output.output)?);
        }

        Command::Fetch {
            chart,
            output,
            prerelease_identifier,
        } => {
            let repo = open_repo()?;
            let root = repo.root();
            let config = resolve_config(root, args, Some(chart), prerelease_identifier.as_deref())?;

            let mut warnings = Vec::new();
            let report = orchestration::fetch_updates(
                &repo,
                root,
                &config,
                config.prerelease_identifier.as_deref(),
                &mut warnings,
            )?;
            show_warnings(&warnings);

            println!("{}", ui::render_report(&report, output.output)?);
            if chart.use_state_file {
                state::save(&report, &root.join(&config.state_file))?;
            }
        }

        Command::Update {
            chart,
            output,
            commit,
            prerelease_identifier,
        } => {
            let repo = open_repo()?;
            let root = repo.root();
            let config = resolve_config(root, args, Some(chart), prerelease_identifier.as_deref())?;
            let options = UpdateOptions {
                use_state_file: chart.use_state_file,
                force_refetch: chart.force_refetch,
                no_backup: chart.no_backup,
                commit: commit.commit,
                commit_message: commit.commit_message.clone(),
            };

            let mut warnings = Vec::new();
            let report = orchestration::update_all(&repo, root, &config, &options, &mut warnings)?;
            show_warnings(&warnings);

            println!("{}", ui::render_report(&report, output.output)?);
        }

        Command::Submodule {
            command:
                SubmoduleCommand::Update {
                    chart,
                    commit: commit_args,
                    accept,
                },
        } => {
            let repo = open_repo()?;
            let root = repo.root();
            let config = resolve_config(root, args, Some(chart), None)?;

            let mut warnings = Vec::new();
            let report = orchestration::fetch_updates(&repo, root, &config, None, &mut warnings)?;
            show_warnings(&warnings);
            warnings.clear();

            let mut chooser: Box<Chooser<'_>> = if *accept {
                Box::new(orchestration::accept_suggested)
            } else {
                Box::new(ui::prompt_selection)
            };
            let applied =
                orchestration::apply_submodule_updates(&repo, &report, chooser.as_mut(), &mut warnings)?;
            show_warnings(&warnings);

            for (name, tag) in &applied {
                ui::display_success(&format!("{} -> {}", name, tag));
            }
            commit(&repo, commit_args, "Update submodules")?;
        }

        Command::Distribution {
            command:
                DistributionCommand::Update {
                    chart,
                    commit: commit_args,
                },
        } => {
            let repo = open_repo()?;
            let root = repo.root();
            let config = resolve_config(root, args, Some(chart), None)?;

            let mut warnings = Vec::new();
            let status = orchestration::distribution_status(&repo, root, &config, &mut warnings)?;
            show_warnings(&warnings);

            orchestration::apply_distribution_updates(root, &config, &status, chart.no_backup)?;
            ui::display_status(&format!(
                "Updated parent chart version: {} -> {}",
                status.parent.current, status.parent.suggested
            ));
            commit(&repo, commit_args, "Update parent chart versions")?;
        }

        Command::Bump {
            bump_type,
            chart,
            commit,
            output,
            create_tag,
            skip_repo_bump,
            chart_bump_type,
            no_chart,
        } => {
            if *create_tag && !commit.commit && !*no_chart {
                ui::display_status(
                    "--create-tag without --commit only prints the versions unless --no-chart is used",
                );
            }

            let repo = open_repo()?;
            let root = repo.root();
            let config = resolve_config(root, args, Some(chart), None)?;
            let request = BumpRequest {
                bump: *bump_type,
                chart_bump: *chart_bump_type,
                skip_repo_bump: *skip_repo_bump,
                no_chart: *no_chart,
                commit: commit.commit,
                create_tag: *create_tag,
                commit_message: commit.commit_message.clone(),
            };

            let result = orchestration::bump_release(&repo, root, &config, &request)?;
            println!("{}", ui::render_bump_result(&result, output.output)?);
        }
    }

    Ok(())
}
