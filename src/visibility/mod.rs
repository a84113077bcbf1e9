use std::fmt;
use tracing::debug;

use crate::models::{PageVisibility, RequestContext, RoleVisibility, Settings, FRONT_TOKEN};

/// Outcome of a visibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Track,
    Skip,
}

impl From<bool> for Verdict {
    fn from(track: bool) -> Self {
        if track {
            Self::Track
        } else {
            Self::Skip
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track => f.write_str("track"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Decides whether a page view gets the tracking snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityMatcher {
    front_path: String,
}

impl Default for VisibilityMatcher {
    fn default() -> Self {
        Self::new("/")
    }
}

impl VisibilityMatcher {
    /// `front_path` is the site's designated home page, matched by `<front>`
    pub fn new(front_path: impl Into<String>) -> Self {
        Self {
            front_path: front_path.into(),
        }
    }

    pub fn front_path(&self) -> &str {
        &self.front_path
    }

    /// Page check AND role check. Never tracks without an account ID.
    pub fn should_track(&self, settings: &Settings, context: &RequestContext) -> bool {
        if settings.account_id.is_empty() {
            return false;
        }

        let pages_ok = self.page_passes(settings, context);
        let roles_ok = role_passes(settings, context);
        debug!(
            path = %context.path,
            pages_ok,
            roles_ok,
            "Evaluated tracking visibility"
        );
        pages_ok && roles_ok
    }

    pub fn verdict(&self, settings: &Settings, context: &RequestContext) -> Verdict {
        self.should_track(settings, context).into()
    }

    fn page_passes(&self, settings: &Settings, context: &RequestContext) -> bool {
        let listed = context
            .candidate_paths()
            .any(|path| self.matches_any(&settings.pages, path));

        match settings.page_visibility {
            PageVisibility::IncludeListedOnly => listed,
            PageVisibility::ExcludeListed => !listed,
        }
    }

    pub fn matches_any<S: AsRef<str>>(&self, patterns: &[S], path: &str) -> bool {
        patterns
            .iter()
            .any(|pattern| self.matches(pattern.as_ref(), path))
    }

    /// Match one pattern. Only a trailing `*` is a wildcard; anything that is
    /// neither `<front>` nor slash-prefixed never matches.
    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        let pattern = pattern.trim();
        if pattern == FRONT_TOKEN {
            return path == "/" || path == self.front_path;
        }
        if !pattern.starts_with('/') {
            return false;
        }

        match pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == pattern,
        }
    }
}

fn role_passes(settings: &Settings, context: &RequestContext) -> bool {
    if settings.roles.is_empty() {
        return true;
    }

    let has_listed_role = context
        .user_roles
        .iter()
        .any(|role| settings.roles.contains(role));

    match settings.role_visibility {
        RoleVisibility::IncludeListedOnly => has_listed_role,
        RoleVisibility::ExcludeListed => !has_listed_role,
    }
}
