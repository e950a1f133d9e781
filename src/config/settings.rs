use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Where the device key is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// Wrapped key file under the data directory.
    #[default]
    File,
    /// OS credential store (needs the `keyring-store` feature).
    Keyring,
}

/// Project-level configuration, loaded from `.securevault.toml`.
///
/// Every field has a sensible default so SecureVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to project root) holding all vault state.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Device key custody backend.
    #[serde(default)]
    pub key_backend: KeyBackend,

    /// Service name used for the OS keyring entry.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyfile wrapping the device key. Relative paths resolve against the
    /// project root; unset means `<data_dir>/device.keyfile`.
    #[serde(default)]
    pub keyfile: Option<String>,

    /// Shortest master password accepted by `init`.
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_data_dir() -> String {
    ".securevault".to_string()
}

fn default_keyring_service() -> String {
    "securevault".to_string()
}

fn default_min_password_len() -> usize {
    8
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_backend: KeyBackend::default(),
            keyring_service: default_keyring_service(),
            keyfile: None,
            min_password_len: default_min_password_len(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".securevault.toml";

    /// Load settings from `<project_dir>/.securevault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// `project_dir/.securevault`
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_dir)
    }

    /// Master credential record: `project_dir/.securevault/auth.json`.
    pub fn auth_path(&self, project_dir: &Path) -> PathBuf {
        self.data_path(project_dir).join("auth.json")
    }

    /// Wrapped device key: `project_dir/.securevault/device.key`.
    pub fn device_key_path(&self, project_dir: &Path) -> PathBuf {
        self.data_path(project_dir).join("device.key")
    }

    /// Keyfile for the file key store.
    pub fn keyfile_path(&self, project_dir: &Path) -> PathBuf {
        match &self.keyfile {
            Some(path) => project_dir.join(path),
            None => self.data_path(project_dir).join("device.keyfile"),
        }
    }

    /// SQLite record database: `project_dir/.securevault/records.db`.
    pub fn records_path(&self, project_dir: &Path) -> PathBuf {
        self.data_path(project_dir).join("records.db")
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.data_dir, ".securevault");
        assert_eq!(s.key_backend, KeyBackend::File);
        assert_eq!(s.keyring_service, "securevault");
        assert!(s.keyfile.is_none());
        assert_eq!(s.min_password_len, 8);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.data_dir, ".securevault");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
data_dir = "vaultdata"
key_backend = "keyring"
keyring_service = "acme-vault"
keyfile = "/media/usb/vault.keyfile"
min_password_len = 12
"#;
        fs::write(tmp.path().join(".securevault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.data_dir, "vaultdata");
        assert_eq!(settings.key_backend, KeyBackend::Keyring);
        assert_eq!(settings.keyring_service, "acme-vault");
        assert_eq!(settings.keyfile.as_deref(), Some("/media/usb/vault.keyfile"));
        assert_eq!(settings.min_password_len, 12);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".securevault.toml"), "min_password_len = 4\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.min_password_len, 4);
        assert_eq!(settings.data_dir, ".securevault");
        assert_eq!(settings.key_backend, KeyBackend::File);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".securevault.toml"), "not valid {{toml").unwrap();

        assert!(matches!(
            Settings::load(tmp.path()),
            Err(VaultError::Config(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_backend() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".securevault.toml"), "key_backend = \"tpm\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn paths_live_under_data_dir() {
        let s = Settings::default();
        let project = Path::new("/home/user/myproject");
        assert_eq!(
            s.auth_path(project),
            PathBuf::from("/home/user/myproject/.securevault/auth.json")
        );
        assert_eq!(
            s.device_key_path(project),
            PathBuf::from("/home/user/myproject/.securevault/device.key")
        );
        assert_eq!(
            s.keyfile_path(project),
            PathBuf::from("/home/user/myproject/.securevault/device.keyfile")
        );
        assert_eq!(
            s.records_path(project),
            PathBuf::from("/home/user/myproject/.securevault/records.db")
        );
    }

    #[test]
    fn keyfile_override_is_respected() {
        let s = Settings {
            keyfile: Some("keys/vault.keyfile".to_string()),
            ..Settings::default()
        };
        let project = Path::new("/home/user/myproject");
        assert_eq!(
            s.keyfile_path(project),
            PathBuf::from("/home/user/myproject/keys/vault.keyfile")
        );
    }
}
