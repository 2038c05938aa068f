use anyhow::anyhow;
use log::{debug, info};
use std::path::Path;

use super::conf::DEFAULT_REPOSDIR;
use super::query::{DNF_QUERYFORMAT, parse_query_output, rpm_queryformat};
use super::{Conf, Package, RepoConfig, Session, parse_repo_file};
use crate::error::{Error, Result};
use crate::progress::{DownloadProgress, Status};
use crate::runtime::{CommandOutput, Runtime};

/// Provides that name the distribution release, most specific first.
const RELEASEVER_PROVIDES: [&str; 2] = ["system-release(releasever)", "system-release"];

/// [`Session`] backed by the system `rpm` and `dnf` executables.
///
/// Repository definitions are read directly from the repository directory;
/// metadata fetching, solving and queries are left to `dnf`.
pub struct CommandSession<R: Runtime> {
    runtime: R,
    conf: Conf,
    repos: Vec<RepoConfig>,
    filled: bool,
}

impl<R: Runtime> CommandSession<R> {
    pub fn new(runtime: R, conf: Conf) -> Self {
        Self {
            runtime,
            conf,
            repos: Vec::new(),
            filled: false,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Every repository loaded by [`Session::read_all_repos`], enabled or not.
    pub fn repos(&self) -> &[RepoConfig] {
        &self.repos
    }

    fn enabled(&self) -> impl Iterator<Item = &RepoConfig> {
        self.repos.iter().filter(|r| r.enabled)
    }

    /// Options shared by every `dnf` invocation.
    fn dnf_args(&self) -> Vec<String> {
        let mut args = vec![
            "-q".to_string(),
            format!("--installroot={}", self.conf.installroot.display()),
        ];
        if let Some(releasever) = self.conf.releasever() {
            args.push(format!("--releasever={}", releasever));
        }
        if let Some(cachedir) = &self.conf.cachedir {
            args.push(format!("--setopt=cachedir={}", cachedir.display()));
        }
        if self.conf.reposdir != Path::new(DEFAULT_REPOSDIR) {
            args.push(format!(
                "--setopt=reposdir={}",
                self.conf.reposdir_path().display()
            ));
        }
        args
    }

    fn rpm_args(&self) -> Vec<String> {
        vec![
            "--root".to_string(),
            self.conf.installroot.display().to_string(),
        ]
    }

    fn ensure_filled(&self) -> Result<()> {
        if self.filled {
            Ok(())
        } else {
            Err(anyhow!("sack not filled").into())
        }
    }

    /// Run `program`, treating a non-zero exit as an error labelled
    /// `program action`.
    fn run_checked(&self, program: &str, action: &str, args: &[String]) -> Result<String> {
        let output = self.runtime.run_command(program, args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(command_failed(program, action, &output).into())
        }
    }

    fn load_repo_file(&self, path: &Path) -> Result<Vec<RepoConfig>> {
        let content = self
            .runtime
            .read_to_string(path)
            .map_err(|e| Error::repository(path, format!("{:#}", e)))?;
        parse_repo_file(&self.conf, path, &content)
    }
}

fn command_failed(program: &str, action: &str, output: &CommandOutput) -> anyhow::Error {
    let detail = output.stderr.trim();
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    if detail.is_empty() {
        anyhow!("{} {} failed (exit {})", program, action, code)
    } else {
        anyhow!("{} {} failed (exit {}): {}", program, action, code, detail)
    }
}

impl<R: Runtime> Session for CommandSession<R> {
    fn conf(&self) -> &Conf {
        &self.conf
    }

    fn conf_mut(&mut self) -> &mut Conf {
        &mut self.conf
    }

    #[tracing::instrument(skip(self))]
    fn detect_releasever(&self, install_root: &Path) -> Result<Option<String>> {
        for provide in RELEASEVER_PROVIDES {
            let args: Vec<String> = vec![
                "--root".to_string(),
                install_root.display().to_string(),
                "-q".to_string(),
                "--qf".to_string(),
                "%{version}\n".to_string(),
                "--whatprovides".to_string(),
                provide.to_string(),
            ];
            let output = self.runtime.run_command("rpm", &args)?;
            if !output.success {
                debug!("Nothing provides {} under {}", provide, install_root.display());
                continue;
            }
            if let Some(version) = output.stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
                return Ok(Some(version.to_string()));
            }
        }
        Ok(None)
    }

    #[tracing::instrument(skip(self))]
    fn read_all_repos(&mut self) -> Result<()> {
        let dir = self.conf.reposdir_path();
        if !self.runtime.is_dir(&dir) {
            debug!("Repository directory {} does not exist", dir.display());
            self.repos.clear();
            return Ok(());
        }

        let mut files: Vec<_> = self
            .runtime
            .read_dir(&dir)
            .map_err(|e| Error::repository(&dir, format!("{:#}", e)))?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "repo"))
            .collect();
        files.sort();

        let mut repos: Vec<RepoConfig> = Vec::new();
        for path in files {
            for repo in self.load_repo_file(&path)? {
                if let Some(existing) = repos.iter().find(|r| r.id == repo.id) {
                    return Err(Error::repository(
                        &path,
                        format!(
                            "repository '{}' is already defined in {}",
                            repo.id,
                            existing.path.display()
                        ),
                    ));
                }
                repos.push(repo);
            }
        }

        info!(
            "Loaded {} repositories ({} enabled) from {}",
            repos.len(),
            repos.iter().filter(|r| r.enabled).count(),
            dir.display()
        );
        self.repos = repos;
        Ok(())
    }

    fn repo_ids(&self) -> Vec<String> {
        self.enabled().map(|r| r.id.clone()).collect()
    }

    #[tracing::instrument(skip(self, progress))]
    fn fill_sack(&mut self, progress: &mut dyn DownloadProgress) -> Result<()> {
        let enabled: Vec<RepoConfig> = self.enabled().cloned().collect();
        progress.start(enabled.len(), 0);

        for repo in &enabled {
            progress.progress(repo, 0);

            let mut args = self.dnf_args();
            args.extend(["makecache".to_string(), format!("--repo={}", repo.id)]);

            let output = match self.runtime.run_command("dnf", &args) {
                Ok(output) => output,
                Err(e) => {
                    progress.end(repo, Status::Failed, Some(&format!("{:#}", e)));
                    return Err(e.into());
                }
            };
            if !output.success {
                progress.end(repo, Status::Failed, Some(output.stderr.trim()));
                return Err(anyhow!(
                    "Failed to download metadata for repo '{}': {}",
                    repo.id,
                    command_failed("dnf", "makecache", &output)
                )
                .into());
            }
            progress.end(repo, Status::Ok, None);
        }

        self.filled = true;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn query_available(&self) -> Result<Vec<Package>> {
        self.ensure_filled()?;
        if self.enabled().next().is_none() {
            debug!("No enabled repositories, nothing is available");
            return Ok(Vec::new());
        }

        let mut args = self.dnf_args();
        args.extend([
            "-C".to_string(),
            "repoquery".to_string(),
            "--available".to_string(),
            "--queryformat".to_string(),
            DNF_QUERYFORMAT.to_string(),
        ]);
        let stdout = self.run_checked("dnf", "repoquery", &args)?;
        Ok(parse_query_output(&stdout))
    }

    #[tracing::instrument(skip(self))]
    fn query_installed(&self) -> Result<Vec<Package>> {
        self.ensure_filled()?;

        let mut args = self.rpm_args();
        args.extend([
            "-qa".to_string(),
            "--qf".to_string(),
            rpm_queryformat(),
        ]);
        let stdout = self.run_checked("rpm", "-qa", &args)?;
        Ok(parse_query_output(&stdout))
    }
}
