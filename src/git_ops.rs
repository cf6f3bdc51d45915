use anyhow::{Context, Result, bail};
use git2::{Repository, Signature, Time};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const FALLBACK_NAME: &str = "todo-mcp";
const FALLBACK_EMAIL: &str = "todo-mcp@localhost";

/// Version control for the data file, when it lives inside a git repository
pub struct GitSync {
    repo: Option<Mutex<Repository>>,
}

impl GitSync {
    /// Look for a repository containing `file_path` (or its directory)
    pub fn discover(file_path: &Path) -> Self {
        let dir = if file_path.is_dir() {
            file_path
        } else {
            file_path.parent().unwrap_or(file_path)
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };

        let repo = Repository::discover(dir).ok().map(Mutex::new);
        if repo.is_none() {
            log::debug!("{} is not inside a git repository", dir.display());
        }
        Self { repo }
    }

    /// A sync instance that never touches git
    pub fn disabled() -> Self {
        Self { repo: None }
    }

    pub fn is_git_managed(&self) -> bool {
        self.repo.is_some()
    }

    fn lock(&self) -> Option<MutexGuard<'_, Repository>> {
        self.repo
            .as_ref()
            .map(|r| r.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn current_branch(repo: &Repository) -> Result<String> {
        let head = repo.head().context("Failed to get HEAD")?;
        Ok(head
            .shorthand()
            .context("Failed to get branch name")?
            .to_string())
    }

    fn has_origin(repo: &Repository) -> bool {
        repo.find_remote("origin").is_ok()
    }

    /// Fast-forward the current branch from `origin`
    ///
    /// Does nothing without a repository, without an `origin` remote, or
    /// before the first commit.
    pub fn pull(&self) -> Result<()> {
        let Some(repo) = self.lock() else {
            return Ok(());
        };
        if !Self::has_origin(&repo) || repo.head().is_err() {
            return Ok(());
        }

        let branch = Self::current_branch(&repo)?;
        let mut remote = repo.find_remote("origin")?;
        remote
            .fetch(&[&branch], None, None)
            .context("Failed to fetch from origin")?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

        if analysis.is_up_to_date() {
            return Ok(());
        }
        if analysis.is_fast_forward() {
            let refname = format!("refs/heads/{}", branch);
            let mut reference = repo.find_reference(&refname)?;
            reference.set_target(fetch_commit.id(), "Fast-forward")?;
            repo.set_head(&refname)?;
            repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
            return Ok(());
        }

        bail!("Local and remote todo data have diverged; merge them manually")
    }

    /// Commit `file_path` with `message`
    ///
    /// Returns `false` when the file is unchanged since the last commit.
    pub fn commit(&self, file_path: &Path, message: &str) -> Result<bool> {
        let Some(repo) = self.lock() else {
            return Ok(false);
        };

        let workdir = repo
            .workdir()
            .context("Repository has no working directory")?
            .canonicalize()?;
        let absolute: PathBuf = file_path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", file_path.display()))?;
        let relative = absolute
            .strip_prefix(&workdir)
            .context("Data file is not inside the repository")?;

        let mut index = repo.index()?;
        index.add_path(relative)?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        if let Some(parent) = &parent
            && parent.tree_id() == tree.id()
        {
            return Ok(false);
        }

        let signature = Self::signature(&repo)?;
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        log::debug!("Committed {}: {}", relative.display(), message);
        Ok(true)
    }

    /// Push the current branch to `origin`, if there is one
    pub fn push(&self) -> Result<()> {
        let Some(repo) = self.lock() else {
            return Ok(());
        };
        if !Self::has_origin(&repo) {
            return Ok(());
        }

        let branch = Self::current_branch(&repo)?;
        let mut remote = repo.find_remote("origin")?;
        let refspec = format!("refs/heads/{}", branch);
        remote
            .push(&[&refspec], None)
            .context("Failed to push to origin")?;
        Ok(())
    }

    /// Committer identity from git config, or a fixed fallback
    fn signature(repo: &Repository) -> Result<Signature<'static>> {
        let config = repo.config()?;
        let name = config
            .get_string("user.name")
            .unwrap_or_else(|_| FALLBACK_NAME.to_string());
        let email = config
            .get_string("user.email")
            .unwrap_or_else(|_| FALLBACK_EMAIL.to_string());

        match Signature::now(&name, &email) {
            Ok(sig) => Ok(sig),
            Err(_) => Signature::new(&name, &email, &Time::new(1_700_000_000, 0))
                .context("Failed to create commit signature"),
        }
    }
}
