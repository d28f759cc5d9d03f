//! writer::publish
//!
//! Commit and push staged changes, or do nothing when there are none.

use chrono::Utc;

use crate::core::types::Oid;
use crate::git::{Author, VersionControl};

use super::error::WriterError;

pub const BOT_NAME: &str = "Kratix";
pub const BOT_EMAIL: &str = "kratix@syntasso.io";

/// The identity every state store commit is authored by.
pub fn bot_author() -> Author {
    Author::new(BOT_NAME, BOT_EMAIL)
}

/// Outcome of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Published {
    /// Nothing was requested, so no workspace was created.
    Skipped,
    /// The requested state was already on the branch.
    Unchanged,
    /// A new commit was pushed.
    Pushed { commit: Oid, message: String },
}

impl Published {
    /// The pushed commit, if any.
    pub fn commit(&self) -> Option<&Oid> {
        match self {
            Published::Pushed { commit, .. } => Some(commit),
            _ => None,
        }
    }
}

/// Commits staged changes as the bot and pushes them upstream.
#[derive(Debug, Clone)]
pub struct CommitPublisher {
    author: Author,
}

impl Default for CommitPublisher {
    fn default() -> Self {
        Self {
            author: bot_author(),
        }
    }
}

impl CommitPublisher {
    pub fn new(author: Author) -> Self {
        Self { author }
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Commit and push whatever is staged in `vcs`.
    ///
    /// A clean working copy returns [`Published::Unchanged`] without
    /// committing or pushing. Push failures surface as
    /// [`WriterError::PushError`].
    pub fn publish<V>(&self, vcs: &V, message: &str) -> Result<Published, WriterError>
    where
        V: VersionControl + ?Sized,
    {
        let status = vcs.status()?;
        if status.is_clean() {
            tracing::info!("no changes to be committed");
            return Ok(Published::Unchanged);
        }

        let commit = vcs.commit(message, &self.author, Utc::now())?;
        tracing::info!(commit = %commit.short(7), staged = status.staged, "pushing changes");

        vcs.push()
            .inspect_err(|e| tracing::error!(error = %e, "could not push changes"))?;
        tracing::info!(commit = %commit.short(7), "changes pushed");

        Ok(Published::Pushed {
            commit,
            message: message.to_string(),
        })
    }
}
