use std::{collections::HashMap, fmt, path::Path};

use config::{Config, ConfigError, File, FileFormat, Value};
use serde::Deserialize;

/// One section of the AMIE client configuration (INI).
///
/// ```ini
/// [StonyBrook]
/// site_name = SBU
/// api_key = ...
/// usage_url = https://usage.amieclient.xsede.org/api/v1
/// resource = ookami.sbu.access-ci.org
/// ```
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub site_name: String,
    pub api_key: String,
    pub usage_url: String,
    pub resource: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("site_name", &self.site_name)
            .field("api_key", &"***")
            .field("usage_url", &self.usage_url)
            .field("resource", &self.resource)
            .finish()
    }
}

impl Settings {
    pub fn new(path: &Path, site: &str) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, Value> = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?
            .try_deserialize()?;

        // depending on the config version, section names may come back lowercased
        let key = sections
            .keys()
            .find(|name| name.as_str() == site)
            .or_else(|| sections.keys().find(|name| name.eq_ignore_ascii_case(site)))
            .cloned();
        let section = key
            .and_then(|key| sections.remove(&key))
            .ok_or_else(|| ConfigError::NotFound(format!("section [{site}] in {}", path.display())))?;

        section.try_deserialize()
    }
}
