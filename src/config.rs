// src/config.rs

use std::env;

pub const URL_VAR: &str = "SUPABASE_URL";
/// Checked in order; the service key wins over the anon key.
pub const KEY_VARS: [&str; 2] = ["SUPABASE_SERVICE_KEY", "SUPABASE_KEY"];

/// Connection settings for the remote `orders` table.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub key: String,
}

// keep the key out of logs
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// What the sink will do with the parsed records, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkPlan {
    Upload(RemoteConfig),
    /// Credentials are missing: write a short sample and ask for them.
    SampleOnly,
    /// Built without the remote client: export everything locally.
    ExportAll,
}

impl SinkPlan {
    /// Resolve from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::resolve(cfg!(feature = "remote"), |name| env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup. Empty values count as missing.
    pub fn resolve<F>(remote_enabled: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if !remote_enabled {
            return SinkPlan::ExportAll;
        }

        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let url = non_empty(URL_VAR);
        let key = KEY_VARS.iter().find_map(|name| non_empty(*name));

        match (url, key) {
            (Some(url), Some(key)) => SinkPlan::Upload(RemoteConfig { url, key }),
            _ => SinkPlan::SampleOnly,
        }
    }
}
