use std::collections::BTreeSet;

/// A single page view being considered for tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub path: String,
    /// Human-facing alias of `path`, if the host has one
    pub alias: Option<String>,
    pub user_roles: BTreeSet<String>,
}

impl RequestContext {
    pub fn new<I, S>(path: impl Into<String>, user_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            alias: None,
            user_roles: user_roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The path followed by its alias, when one is set
    pub fn candidate_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.path.as_str()).chain(self.alias.as_deref())
    }
}
