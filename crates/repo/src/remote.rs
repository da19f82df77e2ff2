//! Transfer callbacks shared by clone, fetch, pull and push.

use std::cell::Cell;

use git2::{AutotagOption, Cred, CredentialType, FetchOptions, PushOptions, RemoteCallbacks};
use gitlane_core::jobs::{JobContext, Progress};

use crate::error::RepoError;

/// Credential attempts before giving up; libgit2 retries the callback
/// for as long as it keeps returning credentials.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

pub(crate) fn callbacks<'a>(
    ctx: &'a JobContext,
    config: Option<&'a git2::Config>,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();

    callbacks.transfer_progress(move |stats| {
        ctx.report(Progress {
            received_objects: stats.received_objects(),
            indexed_objects: stats.indexed_objects(),
            total_objects: stats.total_objects(),
            received_bytes: stats.received_bytes(),
        });
        // Returning false aborts the transfer.
        !ctx.is_cancelled()
    });

    callbacks.push_transfer_progress(move |current, total, bytes| {
        ctx.report(Progress {
            received_objects: current,
            indexed_objects: current,
            total_objects: total,
            received_bytes: bytes,
        });
    });

    let mut attempts = 0;
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            log::warn!("giving up on credentials for {url}");
            return Err(git2::Error::from_str("no usable credentials"));
        }
        log::debug!("credentials requested for {url} (user {username:?}, allowed {allowed:?})");

        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Some(config) = config
        {
            return Cred::credential_helper(config, url, username);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        Err(git2::Error::from_str("no supported credential type"))
    });

    callbacks
}

pub(crate) fn fetch_options<'a>(
    ctx: &'a JobContext,
    config: Option<&'a git2::Config>,
) -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options
        .remote_callbacks(callbacks(ctx, config))
        .download_tags(AutotagOption::All);
    options
}

pub(crate) fn push_options<'a>(
    ctx: &'a JobContext,
    config: Option<&'a git2::Config>,
    rejected: &'a Cell<Option<String>>,
) -> PushOptions<'a> {
    let mut callbacks = callbacks(ctx, config);
    callbacks.push_update_reference(move |refname, status| {
        if let Some(reason) = status {
            log::warn!("push of {refname} rejected: {reason}");
            rejected.set(Some(format!("{refname}: {reason}")));
        }
        Ok(())
    });
    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Classify a transfer error: aborted by our own callback, or a real failure.
pub(crate) fn interrupted(err: git2::Error, ctx: &JobContext) -> RepoError {
    if ctx.is_cancelled() {
        RepoError::Cancelled
    } else {
        RepoError::Git(err)
    }
}
