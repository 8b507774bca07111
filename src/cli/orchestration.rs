//! Workflow orchestration
//!
//! Each command of the binary is a function here over a [Repository], the workspace
//! root and the resolved [Config], so the workflows run unchanged against
//! [crate::git::MockRepository] in tests. Non-fatal problems are collected as
//! [BoundaryWarning]s for the caller to display.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::boundary::BoundaryWarning;
use crate::config::{Config, LATEST_TAG};
use crate::domain::{next_version, BumpKind, Selection, SemanticVersion, TagPattern};
use crate::git::Repository;
use crate::manifest::{self, Chart};
use crate::plan::UpdatePlan;
use crate::report::{BumpResult, ParentInfo, ReleaseReport, SubmoduleUpdate};
use crate::state;

/// Placeholder recorded when a submodule HEAD carries no tag
pub const NO_TAG: &str = "none";

/// Decides which tag a submodule moves to
pub type Chooser<'a> = dyn FnMut(&str, &SubmoduleUpdate) -> Result<Selection> + 'a;

/// Chooser that takes every suggestion without asking
pub fn accept_suggested(_name: &str, _update: &SubmoduleUpdate) -> Result<Selection> {
    Ok(Selection::Suggested)
}

fn push_warning(warnings: &mut Vec<BoundaryWarning>, warning: BoundaryWarning) {
    debug!(submodule = warning.submodule(), %warning, "boundary warning");
    warnings.push(warning);
}

/// Inspect every submodule and plan the parent chart's next version.
///
/// The suggested tag is the configured override (`latest` meaning the newest tag) or
/// else the newest tag. The current chart version comes from the submodule work tree,
/// the suggested one from the chart file at the suggested tag.
pub fn fetch_updates(
    repo: &dyn Repository,
    root: &Path,
    config: &Config,
    identifier: Option<&str>,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<ReleaseReport> {
    let submodules = repo.submodules().context("Failed to list submodules")?;
    let mut updates = IndexMap::new();
    let mut entities = Vec::new();

    for (name, path) in &submodules {
        if let Err(e) = repo.fetch_tags(path, &config.remote) {
            push_warning(
                warnings,
                BoundaryWarning::FetchFailed {
                    submodule: name.clone(),
                    reason: e.to_string(),
                },
            );
        }

        let listing = repo
            .tags(path)
            .with_context(|| format!("Failed to list tags of submodule '{}'", name))?;
        if listing.tags.is_empty() {
            push_warning(warnings, BoundaryWarning::NoTags { submodule: name.clone() });
        }

        let suggested_tag = match config.tag_override(name) {
            Some(LATEST_TAG) | None => listing.latest().map(str::to_string),
            Some(tag) => Some(tag.to_string()),
        };

        let chart_rel = config.submodule_chart(name);
        let chart_path = root.join(path).join(&chart_rel);
        let current_version = manifest::chart_version(&chart_path)
            .with_context(|| format!("Failed to read chart of submodule '{}'", name))?;
        if current_version.is_none() {
            push_warning(
                warnings,
                BoundaryWarning::ChartNotFound {
                    submodule: name.clone(),
                    path: chart_path.display().to_string(),
                },
            );
        }

        let mut chart_name = None;
        let mut suggested_version = None;
        if let Some(tag) = &suggested_tag {
            let chart_at_tag = repo
                .read_file_at(path, tag, &chart_rel.to_string_lossy())
                .map_err(anyhow::Error::from)
                .and_then(|raw| Ok(Chart::from_yaml(&raw)?));
            match chart_at_tag {
                Ok(chart) => {
                    chart_name = chart.name();
                    suggested_version = chart.version();
                }
                Err(e) => push_warning(
                    warnings,
                    BoundaryWarning::UnreadableChartAtTag {
                        submodule: name.clone(),
                        tag: tag.clone(),
                        reason: e.to_string(),
                    },
                ),
            }
        }

        debug!(
            submodule = %name,
            current = ?listing.current,
            suggested = ?suggested_tag,
            current_version = ?current_version,
            suggested_version = ?suggested_version,
            "inspected submodule"
        );

        entities.push((name.clone(), current_version.clone(), suggested_version.clone()));
        updates.insert(
            name.clone(),
            SubmoduleUpdate {
                path: path.clone(),
                chart_name,
                current_tag: listing.current.clone().unwrap_or_else(|| NO_TAG.to_string()),
                latest_tag: listing.latest().map(str::to_string),
                suggested_tag,
                recent_tags: listing.tags,
                current_tag_chart_version: current_version,
                suggested_tag_chart_version: suggested_version,
                chart_bump: None,
            },
        );
    }

    let plan = plan_parent(root, config, &entities, identifier)?;
    for (name, update) in updates.iter_mut() {
        update.chart_bump = plan.bump_for(name);
    }

    Ok(ReleaseReport {
        parent: ParentInfo::from(&plan),
        submodules: updates,
        committed_changes: None,
    })
}

fn plan_parent(
    root: &Path,
    config: &Config,
    entities: &[(String, Option<String>, Option<String>)],
    identifier: Option<&str>,
) -> Result<UpdatePlan> {
    let parent_chart = root.join(&config.repo_chart);
    let parent_version = manifest::chart_version(&parent_chart)
        .with_context(|| format!("Failed to read parent chart {}", parent_chart.display()))?;

    UpdatePlan::from_strings(entities, parent_version.as_deref(), &config.repo_chart, identifier)
        .context("Failed to plan the parent chart version")
}

/// Move each submodule to the tag its chooser picks and stage the submodule pointer.
///
/// Returns submodule name -> checked out tag for the submodules that moved.
pub fn apply_submodule_updates(
    repo: &dyn Repository,
    report: &ReleaseReport,
    chooser: &mut Chooser<'_>,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<IndexMap<String, String>> {
    let mut applied = IndexMap::new();

    for (name, update) in &report.submodules {
        let target = match chooser(name, update)? {
            Selection::Suggested => update.suggested_tag.clone(),
            Selection::Latest => update.latest_tag.clone(),
            Selection::ManualIndex(i) => update.recent_tags.get(i).cloned(),
            Selection::Skip => None,
            Selection::Invalid(input) => {
                push_warning(
                    warnings,
                    BoundaryWarning::UnrecognizedSelection {
                        submodule: name.clone(),
                        input,
                    },
                );
                None
            }
        };

        if let Some(tag) = target {
            repo.checkout(&update.path, &tag)
                .with_context(|| format!("Failed to check out '{}' in '{}'", tag, name))?;
            info!(submodule = %name, tag = %tag, "updated submodule");
            applied.insert(name.clone(), tag);
        }

        repo.stage(&update.path)
            .with_context(|| format!("Failed to stage submodule '{}'", name))?;
    }

    Ok(applied)
}

/// Write dependency versions and the suggested parent version into the parent chart
pub fn apply_distribution_updates(
    root: &Path,
    config: &Config,
    report: &ReleaseReport,
    no_backup: bool,
) -> Result<()> {
    let chart_path = root.join(&config.repo_chart);
    if !chart_path.is_file() {
        bail!("Repo chart not found: {}", chart_path.display());
    }

    if !no_backup {
        let backup = manifest::backup(&chart_path)?;
        debug!(backup = %backup.display(), "backed up parent chart");
    }

    let mut chart = Chart::load(&chart_path)?;
    for (name, update) in &report.submodules {
        if let Some(version) = update.effective_chart_version() {
            let dependency = update.dependency_name(name);
            if !chart.set_dependency_version(dependency, version) {
                debug!(dependency, "no matching dependency in parent chart");
            }
        }
    }

    info!(
        from = ?chart.version(),
        to = %report.parent.suggested,
        "updating parent chart version"
    );
    chart.set_version(&report.parent.suggested);
    chart.save(&chart_path)?;
    Ok(())
}

/// Plan from the versions recorded in the parent chart's dependencies against each
/// submodule's checked out chart, without looking at tags.
///
/// Always plans a stable parent version; pre-release trains belong to `update`.
pub fn distribution_status(
    repo: &dyn Repository,
    root: &Path,
    config: &Config,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<ReleaseReport> {
    let parent_path = root.join(&config.repo_chart);
    if !parent_path.is_file() {
        bail!("Parent chart not found: {}", parent_path.display());
    }
    let recorded = Chart::load(&parent_path)?.dependency_versions();

    let submodules = repo.submodules().context("Failed to list submodules")?;
    let mut updates = IndexMap::new();
    let mut entities = Vec::new();

    for (name, path) in &submodules {
        let chart_path = root.join(path).join(config.submodule_chart(name));
        let (chart_name, version) = if chart_path.is_file() {
            let chart = Chart::load(&chart_path)?;
            (chart.name(), chart.version())
        } else {
            push_warning(
                warnings,
                BoundaryWarning::ChartNotFound {
                    submodule: name.clone(),
                    path: chart_path.display().to_string(),
                },
            );
            (None, None)
        };

        let dependency = chart_name.as_deref().unwrap_or(name);
        let recorded_version = recorded
            .get(dependency)
            .or_else(|| recorded.get(name.as_str()))
            .cloned();
        entities.push((name.clone(), recorded_version, version.clone()));

        let current_tag = repo
            .tags(path)
            .with_context(|| format!("Failed to list tags of submodule '{}'", name))?
            .current
            .unwrap_or_else(|| NO_TAG.to_string());

        updates.insert(
            name.clone(),
            SubmoduleUpdate {
                path: path.clone(),
                chart_name: Some(dependency.to_string()),
                current_tag,
                latest_tag: None,
                suggested_tag: None,
                recent_tags: Vec::new(),
                current_tag_chart_version: version,
                suggested_tag_chart_version: None,
                chart_bump: None,
            },
        );
    }

    let plan = plan_parent(root, config, &entities, None)?;
    for (name, update) in updates.iter_mut() {
        update.chart_bump = plan.bump_for(name);
    }

    Ok(ReleaseReport {
        parent: ParentInfo::from(&plan),
        submodules: updates,
        committed_changes: None,
    })
}

/// Options of the full `update` run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Reuse and refresh the state file
    pub use_state_file: bool,
    /// Ignore an existing state file and fetch again
    pub force_refetch: bool,
    pub no_backup: bool,
    pub commit: bool,
    pub commit_message: Option<String>,
}

/// Move every submodule to its suggested tag, rewrite the parent chart and optionally commit.
///
/// With a state file the plan from an earlier `fetch` is reused. The returned report is
/// the plan that was applied; the state file afterwards holds a fresh fetch of the new
/// working tree.
pub fn update_all(
    repo: &dyn Repository,
    root: &Path,
    config: &Config,
    options: &UpdateOptions,
    warnings: &mut Vec<BoundaryWarning>,
) -> Result<ReleaseReport> {
    let identifier = config.prerelease_identifier.as_deref();
    let state_path = root.join(&config.state_file);

    let saved = if options.use_state_file && !options.force_refetch {
        state::load(&state_path)?
    } else {
        None
    };

    let report = match saved {
        Some(report) => {
            debug!(path = %state_path.display(), "using saved plan");
            report
        }
        None => {
            let report = fetch_updates(repo, root, config, identifier, warnings)?;
            if options.use_state_file {
                state::save(&report, &state_path)?;
            }
            report
        }
    };

    apply_submodule_updates(repo, &report, &mut accept_suggested, warnings)?;
    apply_distribution_updates(root, config, &report, options.no_backup)?;

    if options.use_state_file {
        let refreshed = fetch_updates(repo, root, config, None, &mut Vec::new())?;
        state::save(&refreshed, &state_path)?;
    }

    let committed = if options.commit {
        let message = options
            .commit_message
            .as_deref()
            .unwrap_or("Update submodules and chart versions");
        Some(repo.commit_all(message).context("Failed to commit changes")?)
    } else {
        None
    };

    Ok(report.with_committed_changes(committed))
}

/// Version increment for the `bump` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReleaseBump {
    Major,
    Minor,
    #[default]
    Patch,
    /// Drop the pre-release part, keeping the version core
    Release,
}

impl ReleaseBump {
    pub fn apply(self, version: &SemanticVersion) -> crate::error::Result<SemanticVersion> {
        match self {
            ReleaseBump::Major => next_version(version, BumpKind::Major),
            ReleaseBump::Minor => next_version(version, BumpKind::Minor),
            ReleaseBump::Patch => next_version(version, BumpKind::Patch),
            ReleaseBump::Release => Ok(version.release_core()),
        }
    }
}

/// Options of the `bump` command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BumpRequest {
    pub bump: ReleaseBump,
    pub chart_bump: ReleaseBump,
    /// Keep the app version and only move the chart
    pub skip_repo_bump: bool,
    /// The repository has no chart
    pub no_chart: bool,
    pub commit: bool,
    pub create_tag: bool,
    pub commit_message: Option<String>,
}

/// Newest release among the parent repository's tags, `0.0.0` when there is none
pub fn latest_release(repo: &dyn Repository, pattern: &TagPattern) -> Result<SemanticVersion> {
    let mut latest: Option<SemanticVersion> = None;
    for tag in repo.parent_tags().context("Failed to list repository tags")? {
        if let Some(version) = pattern.extract(&tag)? {
            if latest.as_ref().map_or(true, |l| version > *l) {
                latest = Some(version);
            }
        }
    }
    Ok(latest.unwrap_or_else(|| SemanticVersion::new(0, 0, 0)))
}

/// Bump the repository's app version and chart, then optionally commit and tag.
///
/// The chart file is only rewritten when committing. A chart-only release
/// (`skip_repo_bump`) is tagged `<app>+chart<chart>`.
pub fn bump_release(
    repo: &dyn Repository,
    root: &Path,
    config: &Config,
    request: &BumpRequest,
) -> Result<BumpResult> {
    let pattern = TagPattern::new(config.tag_pattern.as_str());
    let latest = latest_release(repo, &pattern)?;
    let app_version = if request.skip_repo_bump {
        latest.release_core()
    } else {
        request.bump.apply(&latest)?
    };
    debug!(latest = %latest, app = %app_version, "bumped app version");

    let chart_version = if request.no_chart {
        None
    } else {
        let chart_path = root.join(&config.repo_chart);
        if !chart_path.is_file() {
            bail!("Chart not found: {}", chart_path.display());
        }
        let mut chart = Chart::load(&chart_path)?;
        let current = chart
            .version()
            .with_context(|| format!("Chart {} has no version", chart_path.display()))?;
        let next = request.chart_bump.apply(&SemanticVersion::parse(&current)?)?;

        if request.commit {
            chart.set_version(&next.render());
            chart.set_app_version(&app_version.render());
            chart.save(&chart_path)?;
        }
        Some(next)
    };

    if request.commit && !request.no_chart {
        let default_message = if request.skip_repo_bump {
            "Update chart version"
        } else {
            "Update app and chart versions"
        };
        let message = request.commit_message.as_deref().unwrap_or(default_message);
        repo.commit_all(message).context("Failed to commit version bump")?;
    }

    let tag_version = match &chart_version {
        Some(chart) if request.skip_repo_bump => format!("{}+chart{}", app_version, chart),
        _ => app_version.render(),
    };
    let may_tag = request.no_chart || request.commit;
    let new_tag = if request.create_tag && may_tag {
        let tag = pattern.format(&tag_version);
        repo.create_tag(&tag)
            .with_context(|| format!("Failed to create tag '{}'", tag))?;
        info!(tag = %tag, "created tag");
        Some(tag)
    } else {
        None
    };

    Ok(BumpResult {
        app_version: app_version.render(),
        chart_version: chart_version.map(|v| v.render()),
        new_tag,
    })
}
