use std::path::{Path, PathBuf};

const URL_SCHEME: &str = "instancestore://";

/// Instance store configuration
///
/// The store's whole configuration surface: where the files live and whether
/// completed instances keep their records.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding instance records and the timer table (created if absent)
    pub root_dir: PathBuf,

    /// Keep Data/Metadata records after an instance completes
    pub keep_instance_data_after_completion: bool,

    /// Indent the JSON written to disk
    pub pretty: bool,
}

impl StoreConfig {
    /// Create a configuration rooted at `root_dir`
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            keep_instance_data_after_completion: false,
            pretty: true,
        }
    }

    /// Keep instance records after completion
    pub fn keep_instance_data_after_completion(mut self, keep: bool) -> Self {
        self.keep_instance_data_after_completion = keep;
        self
    }

    /// Toggle indented JSON output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Parse from connection string
    ///
    /// Format: "instancestore:///path/to/store?keep_completed=true&pretty=false"
    ///
    /// # Examples
    ///
    /// ```
    /// use instancestore::StoreConfig;
    ///
    /// let url = "instancestore:///var/lib/store?keep_completed=true";
    /// let config = StoreConfig::from_url(url).unwrap();
    /// assert!(config.keep_instance_data_after_completion);
    /// ```
    pub fn from_url(url: &str) -> Result<Self, String> {
        let rest = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| format!("URL must start with '{URL_SCHEME}'"))?;

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err("Store directory cannot be empty".to_string());
        }

        let mut config = Self::new(path);
        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Invalid query parameter '{pair}'"))?;
            let flag = value
                .parse::<bool>()
                .map_err(|_| format!("Invalid boolean for '{key}': '{value}'"))?;
            config = match key {
                "keep_completed" => config.keep_instance_data_after_completion(flag),
                "pretty" => config.pretty(flag),
                other => return Err(format!("Unknown parameter '{other}'")),
            };
        }

        Ok(config)
    }

    /// Convert to connection string
    pub fn to_url(&self) -> String {
        format!(
            "{}{}?keep_completed={}&pretty={}",
            URL_SCHEME,
            self.root_dir.display(),
            self.keep_instance_data_after_completion,
            self.pretty
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.root_dir.as_os_str().is_empty() {
            return Err("Store directory cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("/tmp/store");
        assert_eq!(config.root_dir, PathBuf::from("/tmp/store"));
        assert!(!config.keep_instance_data_after_completion);
        assert!(config.pretty);
    }

    #[test]
    fn test_builder_pattern() {
        let config = StoreConfig::new("/tmp/store")
            .keep_instance_data_after_completion(true)
            .pretty(false);

        assert!(config.keep_instance_data_after_completion);
        assert!(!config.pretty);
    }

    #[test]
    fn test_from_url() {
        let config =
            StoreConfig::from_url("instancestore:///srv/store?keep_completed=true&pretty=false")
                .unwrap();

        assert_eq!(config.root_dir, PathBuf::from("/srv/store"));
        assert!(config.keep_instance_data_after_completion);
        assert!(!config.pretty);

        let plain = StoreConfig::from_url("instancestore://relative/dir").unwrap();
        assert_eq!(plain.root_dir, PathBuf::from("relative/dir"));
        assert!(!plain.keep_instance_data_after_completion);
    }

    #[test]
    fn test_invalid_url() {
        assert!(StoreConfig::from_url("file:///srv/store").is_err());
        assert!(StoreConfig::from_url("instancestore://").is_err());
        assert!(StoreConfig::from_url("instancestore:///srv?keep_completed=yes").is_err());
        assert!(StoreConfig::from_url("instancestore:///srv?compress=true").is_err());
        assert!(StoreConfig::from_url("instancestore:///srv?pretty").is_err());
    }

    #[test]
    fn test_url_round_trip() {
        let config = StoreConfig::new("/srv/store").keep_instance_data_after_completion(true);
        let parsed = StoreConfig::from_url(&config.to_url()).unwrap();
        assert_eq!(parsed.root_dir, config.root_dir);
        assert!(parsed.keep_instance_data_after_completion);
        assert!(parsed.pretty);
    }

    #[test]
    fn test_validate() {
        assert!(StoreConfig::new("/srv").validate().is_ok());
        assert!(StoreConfig::new("").validate().is_err());
    }
}
