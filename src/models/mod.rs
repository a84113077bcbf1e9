mod context;
mod settings;

pub use context::RequestContext;
pub use settings::{
    parse_roles, split_pages, PageVisibility, RoleVisibility, Settings, SettingsError,
    SettingsForm, ACCOUNT_ID_MAX_LEN, FRONT_TOKEN, SNIPPET_VERSION_MAX_LEN,
};
