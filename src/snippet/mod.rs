//! Hotjar tracking snippet generation
//!
//! The snippet is a fixed loader template with the account ID and snippet
//! version embedded as escaped JavaScript string literals. Building it is a
//! pure function of its inputs.

mod asset;

pub use asset::SnippetAsset;

/// Script URL prefix; the loader appends the account ID
pub const LOADER_BASE: &str = "//static.hotjar.com/c/hotjar-";

/// Script URL infix; the loader appends the snippet version
pub const LOADER_SUFFIX: &str = ".js?sv=";

/// Host facts that decide whether the snippet is compacted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactPolicy {
    /// Host-wide JavaScript preprocessing (aggregation) is enabled
    pub js_preprocess: bool,
    /// A third-party asset aggregation module is active
    pub aggregator_enabled: bool,
}

impl CompactPolicy {
    pub fn compact(&self) -> bool {
        self.js_preprocess || self.aggregator_enabled
    }

    /// Force compaction on (`Some(true)`) or off (`Some(false)`); `None`
    /// keeps the host facts as they are
    pub fn with_override(self, compact: Option<bool>) -> Self {
        match compact {
            Some(true) => Self {
                js_preprocess: true,
                ..self
            },
            Some(false) => Self::default(),
            None => self,
        }
    }
}

/// Encode `value` as a JSON string literal that is also safe inside an HTML
/// `<script>` element.
///
/// `<`, `>`, `&`, `'` and `"` inside the value are emitted as `\u00XX`
/// escapes, as are the U+2028/U+2029 line separators.
pub fn escape_js_string(value: &str) -> String {
    let encoded = serde_json::Value::String(value.to_owned()).to_string();
    let inner = &encoded[1..encoded.len() - 1];

    // serde_json never leaves a bare quote inside the literal, so every `\"`
    // here is an escaped quote
    let inner = inner
        .replace("\\\"", "\\u0022")
        .replace('<', "\\u003C")
        .replace('>', "\\u003E")
        .replace('&', "\\u0026")
        .replace('\'', "\\u0027")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029");

    format!("\"{inner}\"")
}

/// Build the tracking snippet for an account.
///
/// With `compact` set, newlines and then double spaces are stripped from the
/// result. Compaction only ever removes whitespace.
pub fn build(account_id: &str, snippet_version: &str, compact: bool) -> String {
    let id = escape_js_string(account_id);
    let version = escape_js_string(snippet_version);

    let script = format!(
        "(function(h,o,t,j,a,r){{
  h.hj=h.hj||function(){{(h.hj.q=h.hj.q||[]).push(arguments)}};
  h._hjSettings={{hjid:{id},hjsv:{version}}};
  a=o.getElementsByTagName('head')[0];
  r=o.createElement('script');r.async=1;
  r.src=t+h._hjSettings.hjid+j+h._hjSettings.hjsv;
  a.appendChild(r);
}})(window,document,'{LOADER_BASE}','{LOADER_SUFFIX}');"
    );

    if compact {
        script.replace('\n', "").replace("  ", "")
    } else {
        script
    }
}

/// URL of the external script the snippet loads at runtime
pub fn loader_url(account_id: &str, snippet_version: &str) -> String {
    format!("{LOADER_BASE}{account_id}{LOADER_SUFFIX}{snippet_version}")
}
