//! SPIFFS storage adapter.
//!
//! Implements [`StoragePort`] and [`ConfigPort`] over the SPIFFS partition.
//! Keys map to files under `/spiffs/<key>.txt`; values are whole-file blobs
//! (the persisted LED state is a single byte, the config override a small
//! postcard blob).
//!
//! Startup is tolerant: a failed mount degrades every read to
//! `StorageError`, and the callers fall back to compiled-in defaults rather
//! than refusing to boot.

use log::{info, warn};

use crate::app::ports::{ConfigPort, StoragePort};
use crate::config::{validate_config, NodeConfig};
use crate::error::StorageError;

#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

/// Key under which the config override blob is stored.
const CONFIG_KEY: &str = "nodecfg";

pub struct SpiffsAdapter {
    mounted: bool,
    #[cfg(not(feature = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl SpiffsAdapter {
    /// Mount the SPIFFS partition. A mount failure is recorded, not fatal.
    pub fn new() -> Self {
        #[cfg(feature = "espidf")]
        {
            let mounted = Self::mount();
            if mounted {
                info!("SPIFFS: mounted");
            } else {
                warn!("SPIFFS: mount failed, persistence disabled");
            }
            Self { mounted }
        }
        #[cfg(not(feature = "espidf"))]
        {
            info!("SPIFFS: simulation backend");
            Self {
                mounted: true,
                store: HashMap::new(),
            }
        }
    }

    #[cfg(feature = "espidf")]
    fn mount() -> bool {
        use esp_idf_sys::{esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_OK};

        let base_path = c"/spiffs";
        let conf = esp_vfs_spiffs_conf_t {
            base_path: base_path.as_ptr(),
            partition_label: core::ptr::null(),
            max_files: 4,
            format_if_mount_failed: true,
        };
        // SAFETY: called once from the main task before any file access.
        unsafe { esp_vfs_spiffs_register(&conf) == ESP_OK }
    }

    #[cfg(feature = "espidf")]
    fn path_for(key: &str) -> String {
        format!("/spiffs/{key}.txt")
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Default for SpiffsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── StoragePort ───────────────────────────────────────────────

impl StoragePort for SpiffsAdapter {
    fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        if !self.mounted {
            return Err(StorageError::MountFailed);
        }
        #[cfg(feature = "espidf")]
        {
            match std::fs::read(Self::path_for(key)) {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(StorageError::NotFound)
                }
                Err(_) => Err(StorageError::IoError),
            }
        }
        #[cfg(not(feature = "espidf"))]
        {
            self.store.get(key).cloned().ok_or(StorageError::NotFound)
        }
    }

    fn write(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if !self.mounted {
            return Err(StorageError::MountFailed);
        }
        #[cfg(feature = "espidf")]
        {
            std::fs::write(Self::path_for(key), data).map_err(|_| StorageError::IoError)
        }
        #[cfg(not(feature = "espidf"))]
        {
            self.store.insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for SpiffsAdapter {
    fn load(&self, defaults: NodeConfig) -> NodeConfig {
        let blob = match self.read(CONFIG_KEY) {
            Ok(blob) => blob,
            Err(StorageError::NotFound) => return defaults,
            Err(e) => {
                warn!("config: load failed ({e}), using defaults");
                return defaults;
            }
        };
        match postcard::from_bytes::<NodeConfig>(&blob) {
            Ok(cfg) if validate_config(&cfg).is_ok() => {
                info!("config: override loaded from storage");
                cfg
            }
            Ok(_) => {
                warn!("config: stored override out of range, using defaults");
                defaults
            }
            Err(e) => {
                warn!("config: stored override corrupt ({e}), using defaults");
                defaults
            }
        }
    }

    fn save(&mut self, config: &NodeConfig) -> crate::error::Result<()> {
        validate_config(config)?;
        let blob = postcard::to_allocvec(config)
            .map_err(|_| crate::error::Error::Config("config serialise failed"))?;
        self.write(CONFIG_KEY, &blob)?;
        info!("config: override persisted ({} bytes)", blob.len());
        Ok(())
    }
}
