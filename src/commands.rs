use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use typediagram::config::{EmitOverrides, load_config};
use typediagram::output::{OutputMode, emit_failure, emit_success};
use typediagram::provider::registry;
use typediagram::toggle::{self, PACKAGE_NAME, StatusReport};
use typediagram::ui::{self, Icons, TableBuilder, theme};
use typediagram::{DriftReport, Error, build_solution, render, write_if_changed};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_EMIT_FAILED: u8 = 3;
pub const EXIT_DRIFT: u8 = 5;

fn display(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

pub struct EmitArgs {
    pub path: PathBuf,
    pub out: Option<PathBuf>,
    pub direction: Option<String>,
    pub min_access: Option<String>,
}

pub fn run_emit(output_mode: OutputMode, config: Option<&Path>, args: EmitArgs) -> anyhow::Result<ExitCode> {
    match emit(output_mode, config, args) {
        Ok(()) => Ok(ExitCode::from(EXIT_OK)),
        Err(e) => {
            if output_mode.is_human() {
                eprintln!("{} {:#}", "[emit] error:".style(theme().error), e);
            } else {
                emit_failure(output_mode, "emit", serde_json::json!({ "error": format!("{:#}", e) }))?;
            }
            Ok(ExitCode::from(EXIT_EMIT_FAILED))
        }
    }
}

fn emit(output_mode: OutputMode, config: Option<&Path>, args: EmitArgs) -> anyhow::Result<()> {
    let (provider, kind) = registry().find_provider(&args.path).ok_or_else(|| {
        Error::Input(format!(
            "{} is neither a build unit nor an aggregate descriptor",
            args.path.display()
        ))
    })?;
    let stem = provider.descriptor_stem(&args.path);

    let cwd = std::env::current_dir()?;
    let loaded = load_config(config, &cwd)?;
    let settings = loaded.emit_settings(
        &args.path,
        &stem,
        EmitOverrides {
            out: args.out,
            direction: args.direction,
            min_access: args.min_access,
        },
    );

    let units = registry().load(&args.path)?;
    let solution = build_solution(&units, settings.floor)?;
    let text = render(&solution, settings.direction.as_ref());
    let outcome = write_if_changed(&settings.out, &text)?;
    tracing::info!(out = %settings.out.display(), outcome = outcome.as_str(), "diagram emitted");

    if output_mode.is_human() {
        let out = settings.out.display().to_string();
        if outcome.is_written() {
            ui::file_written(&out);
        } else {
            ui::file_unchanged(&out);
        }
    } else {
        let data = serde_json::json!({
            "descriptor": args.path,
            "kind": kind.as_str(),
            "out": settings.out,
            "outcome": outcome.as_str(),
            "projects": solution.projects.len(),
            "types": solution.all_types().count(),
            "relations": solution.relation_count(),
        });
        emit_success(output_mode, "emit", data)?;
    }
    Ok(())
}

pub fn run_diff(output_mode: OutputMode, old: &Path, new: &Path) -> anyhow::Result<ExitCode> {
    let report = match DriftReport::compare(old, new) {
        Ok(report) => report,
        Err(Error::NotFound(missing)) => {
            if output_mode.is_human() {
                ui::error("Both files must exist.");
            } else {
                emit_failure(output_mode, "diff", serde_json::json!({ "missing": missing }))?;
            }
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
        Err(e) => return Err(e.into()),
    };

    if output_mode.is_human() {
        if report.has_drift() {
            ui::drift_detected();
            if let (Some(a), Some(b)) = (&report.old_digest, &report.new_digest) {
                ui::summary_row("old:", &format!("{}  {}", a, old.display()));
                ui::summary_row("new:", &format!("{}  {}", b, new.display()));
            }
        } else {
            ui::no_drift();
        }
    } else {
        emit_success(output_mode, "diff", &report)?;
    }

    Ok(ExitCode::from(if report.has_drift() { EXIT_DRIFT } else { EXIT_OK }))
}

pub fn run_install(output_mode: OutputMode, version: &str) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let doc = toggle::install(&cwd, version)?;
    if output_mode.is_human() {
        println!(
            "{} Installed {} {} in {}",
            Icons::PACKAGE,
            PACKAGE_NAME.style(theme().package),
            version,
            doc.path().display()
        );
    } else {
        let data = serde_json::json!({ "package": PACKAGE_NAME, "version": version, "path": doc.path() });
        emit_success(output_mode, "install", data)?;
    }
    Ok(ExitCode::from(EXIT_OK))
}

pub fn run_toggle(
    output_mode: OutputMode,
    enable: bool,
    solution: bool,
    project: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let command = if enable { "enable" } else { "disable" };
    let verb = if enable { "Enabled" } else { "Disabled" };
    let cwd = std::env::current_dir()?;

    if let Some(project) = project {
        toggle::set_unit_enabled(project, enable)?;
        if output_mode.is_human() {
            ui::success(&format!("{} in {}", verb, display(project)));
        } else {
            let data = serde_json::json!({ "scope": "project", "enabled": enable, "units": [display(project)] });
            emit_success(output_mode, command, data)?;
        }
        return Ok(ExitCode::from(EXIT_OK));
    }

    if solution {
        let Some(manifest) = toggle::find_solution_in_dir(&cwd)? else {
            if output_mode.is_human() {
                ui::error("No solution manifest found in current directory.");
            } else {
                emit_failure(output_mode, command, serde_json::json!({ "error": "no solution manifest" }))?;
            }
            return Ok(ExitCode::from(EXIT_FAILURE));
        };

        let mut units = Vec::new();
        for unit in typediagram::provider::dump::solution_units(&manifest)? {
            toggle::set_unit_enabled(&unit, enable)?;
            if output_mode.is_human() {
                ui::success(&format!("{} in {}", verb, display(&unit)));
            }
            units.push(display(&unit));
        }
        if !output_mode.is_human() {
            let data = serde_json::json!({ "scope": "solution", "enabled": enable, "units": units });
            emit_success(output_mode, command, data)?;
        }
        return Ok(ExitCode::from(EXIT_OK));
    }

    let doc = toggle::set_repo_default(&cwd, enable)?;
    if output_mode.is_human() {
        let state = if enable { "ENABLED" } else { "DISABLED" };
        ui::success(&format!("Repo default set to {} in {}", state, doc.path().display()));
    } else {
        let data = serde_json::json!({ "scope": "repo", "enabled": enable, "path": doc.path() });
        emit_success(output_mode, command, data)?;
    }
    Ok(ExitCode::from(EXIT_OK))
}

pub fn run_status(output_mode: OutputMode) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let report = StatusReport::gather(&cwd)?;

    if !output_mode.is_human() {
        emit_success(output_mode, "status", &report)?;
        return Ok(ExitCode::from(EXIT_OK));
    }

    match &report.build_config {
        Some(path) => {
            ui::status("Build config", &path.display().to_string());
            let package = match &report.package_version {
                Some(version) => format!("{} {}", PACKAGE_NAME, version),
                None => ui::muted("(not installed)"),
            };
            ui::status("Package", &package);
            let default = match report.repo_default {
                Some(enabled) => enabled.to_string(),
                None => ui::muted("(unset)"),
            };
            ui::status("Repo default", &default);
        }
        None => ui::status("Build config", &ui::muted("(none)")),
    }

    if let Some(solution) = &report.solution {
        ui::status("Solution", &solution.display().to_string());
        let mut table = TableBuilder::new();
        for unit in &report.units {
            table.add_row(&display(&unit.path), unit.state.as_str());
        }
        if !table.is_empty() {
            println!("{}", table.build());
        }
    }
    Ok(ExitCode::from(EXIT_OK))
}

pub fn run_uninstall(output_mode: OutputMode) -> anyhow::Result<ExitCode> {
    let cwd = std::env::current_dir()?;
    let doc = toggle::uninstall(&cwd)?;
    if output_mode.is_human() {
        match &doc {
            Some(doc) => ui::success(&format!("Removed {} from {}", PACKAGE_NAME, doc.path().display())),
            None => println!("Nothing to uninstall."),
        }
    } else {
        let data = serde_json::json!({ "package": PACKAGE_NAME, "path": doc.as_ref().map(|d| d.path()) });
        emit_success(output_mode, "uninstall", data)?;
    }
    Ok(ExitCode::from(EXIT_OK))
}
