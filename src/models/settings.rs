use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a Hotjar account ID
pub const ACCOUNT_ID_MAX_LEN: usize = 20;

/// Maximum length of a Hotjar snippet version
pub const SNIPPET_VERSION_MAX_LEN: usize = 10;

/// Reserved page pattern matching the site's home page
pub const FRONT_TOKEN: &str = "<front>";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Hotjar ID is required")]
    MissingAccountId,
    #[error("Hotjar ID must be at most {} characters", ACCOUNT_ID_MAX_LEN)]
    AccountIdTooLong,
    #[error("Hotjar snippet version is required")]
    MissingSnippetVersion,
    #[error("Hotjar snippet version must be at most {} characters", SNIPPET_VERSION_MAX_LEN)]
    SnippetVersionTooLong,
    #[error("Path \"{0}\" not prefixed with slash")]
    PageNotPrefixed(String),
    #[error("Unknown visibility mode '{0}'")]
    InvalidMode(String),
}

/// Which pages get the snippet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageVisibility {
    /// Every page except the listed pages
    #[default]
    ExcludeListed,
    /// The listed pages only
    IncludeListedOnly,
}

/// Which user roles get the snippet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleVisibility {
    /// Only users holding one of the selected roles
    #[default]
    IncludeListedOnly,
    /// Every user except those holding a selected role
    ExcludeListed,
}

// Numeric codes are the ones stored by the admin form.
impl FromStr for PageVisibility {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "exclude_listed" => Ok(Self::ExcludeListed),
            "1" | "include_listed_only" => Ok(Self::IncludeListedOnly),
            other => Err(SettingsError::InvalidMode(other.to_string())),
        }
    }
}

impl FromStr for RoleVisibility {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "include_listed_only" => Ok(Self::IncludeListedOnly),
            "1" | "exclude_listed" => Ok(Self::ExcludeListed),
            other => Err(SettingsError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for PageVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludeListed => f.write_str("exclude_listed"),
            Self::IncludeListedOnly => f.write_str("include_listed_only"),
        }
    }
}

impl fmt::Display for RoleVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncludeListedOnly => f.write_str("include_listed_only"),
            Self::ExcludeListed => f.write_str("exclude_listed"),
        }
    }
}

/// Raw values as submitted by an administrator, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub account: String,
    pub snippet_version: String,
    pub page_visibility: PageVisibility,
    /// One pattern per line
    pub pages: String,
    pub role_visibility: RoleVisibility,
    pub roles: Vec<String>,
}

/// Validated tracking settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub account_id: String,
    pub snippet_version: String,
    pub page_visibility: PageVisibility,
    pub pages: Vec<String>,
    pub role_visibility: RoleVisibility,
    pub roles: BTreeSet<String>,
}

impl Settings {
    /// Validate a submitted form the way the admin settings form does:
    /// trim text values, enforce the field limits, and require every listed
    /// page to start with a slash (or be the front page token).
    pub fn from_form(form: SettingsForm) -> Result<Self, SettingsError> {
        let account_id = form.account.trim().to_string();
        if account_id.is_empty() {
            return Err(SettingsError::MissingAccountId);
        }
        if account_id.chars().count() > ACCOUNT_ID_MAX_LEN {
            return Err(SettingsError::AccountIdTooLong);
        }

        let snippet_version = form.snippet_version.trim().to_string();
        if snippet_version.is_empty() {
            return Err(SettingsError::MissingSnippetVersion);
        }
        if snippet_version.chars().count() > SNIPPET_VERSION_MAX_LEN {
            return Err(SettingsError::SnippetVersionTooLong);
        }

        // Lines are checked before trimming, so leading whitespace is not a
        // slash. Only the first offending line is reported.
        if let Some(bad) = form
            .pages
            .trim()
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty())
            .find(|line| !line.starts_with('/') && line.trim_end() != FRONT_TOKEN)
        {
            return Err(SettingsError::PageNotPrefixed(bad.to_string()));
        }
        let pages = split_pages(&form.pages);

        let roles = form
            .roles
            .into_iter()
            .map(|role| role.trim().to_string())
            .filter(|role| !role.is_empty())
            .collect();

        Ok(Self {
            account_id,
            snippet_version,
            page_visibility: form.page_visibility,
            pages,
            role_visibility: form.role_visibility,
            roles,
        })
    }
}

/// Split a page list on any line ending, dropping blank lines
pub fn split_pages(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated role list, dropping blank entries
pub fn parse_roles(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SettingsForm {
        SettingsForm {
            account: " 12345 ".to_string(),
            snippet_version: "6".to_string(),
            pages: "/admin\r\n/admin/*\n\n<front>\r/user/*".to_string(),
            roles: vec!["administrator".to_string(), "  ".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_from_form_trims_and_splits() {
        let settings = Settings::from_form(form()).unwrap();
        assert_eq!(settings.account_id, "12345");
        assert_eq!(settings.snippet_version, "6");
        assert_eq!(
            settings.pages,
            vec!["/admin", "/admin/*", "<front>", "/user/*"]
        );
        assert_eq!(settings.roles.len(), 1);
        assert!(settings.roles.contains("administrator"));
        assert_eq!(settings.page_visibility, PageVisibility::ExcludeListed);
        assert_eq!(settings.role_visibility, RoleVisibility::IncludeListedOnly);
    }

    #[test]
    fn test_from_form_rejects_missing_values() {
        let mut missing_account = form();
        missing_account.account = "   ".to_string();
        assert_eq!(
            Settings::from_form(missing_account),
            Err(SettingsError::MissingAccountId)
        );

        let mut missing_version = form();
        missing_version.snippet_version = String::new();
        assert_eq!(
            Settings::from_form(missing_version),
            Err(SettingsError::MissingSnippetVersion)
        );
    }

    #[test]
    fn test_from_form_enforces_lengths() {
        let mut long_account = form();
        long_account.account = "1".repeat(ACCOUNT_ID_MAX_LEN + 1);
        assert_eq!(
            Settings::from_form(long_account),
            Err(SettingsError::AccountIdTooLong)
        );

        let mut max_account = form();
        max_account.account = "1".repeat(ACCOUNT_ID_MAX_LEN);
        assert!(Settings::from_form(max_account).is_ok());

        let mut long_version = form();
        long_version.snippet_version = "1".repeat(SNIPPET_VERSION_MAX_LEN + 1);
        assert_eq!(
            Settings::from_form(long_version),
            Err(SettingsError::SnippetVersionTooLong)
        );
    }

    #[test]
    fn test_from_form_reports_first_unprefixed_page() {
        let mut bad = form();
        bad.pages = "/ok\nblog\nnews/*".to_string();
        assert_eq!(
            Settings::from_form(bad),
            Err(SettingsError::PageNotPrefixed("blog".to_string()))
        );
    }

    #[test]
    fn test_from_form_rejects_indented_page() {
        let mut indented = form();
        indented.pages = "/ok\n  /blog".to_string();
        assert_eq!(
            Settings::from_form(indented),
            Err(SettingsError::PageNotPrefixed("  /blog".to_string()))
        );

        // Whitespace around the whole list is not part of any line
        let mut padded = form();
        padded.pages = "  /blog\n/news/*\n<front>  \n\n".to_string();
        let settings = Settings::from_form(padded).unwrap();
        assert_eq!(settings.pages, vec!["/blog", "/news/*", "<front>"]);
    }

    #[test]
    fn test_visibility_modes_parse_codes_and_names() {
        assert_eq!("0".parse::<PageVisibility>(), Ok(PageVisibility::ExcludeListed));
        assert_eq!("1".parse::<PageVisibility>(), Ok(PageVisibility::IncludeListedOnly));
        assert_eq!(
            "include_listed_only".parse::<PageVisibility>(),
            Ok(PageVisibility::IncludeListedOnly)
        );
        assert_eq!("0".parse::<RoleVisibility>(), Ok(RoleVisibility::IncludeListedOnly));
        assert_eq!("1".parse::<RoleVisibility>(), Ok(RoleVisibility::ExcludeListed));
        assert_eq!(
            "2".parse::<PageVisibility>(),
            Err(SettingsError::InvalidMode("2".to_string()))
        );
    }

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles("editor, ,administrator,editor");
        assert_eq!(
            roles.into_iter().collect::<Vec<_>>(),
            vec!["administrator", "editor"]
        );
        assert!(parse_roles("").is_empty());
    }
}
