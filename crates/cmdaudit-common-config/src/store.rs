//! Property storage.

use crate::{ConfigError, ConfigResult, Property};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{CStr, CString};

/// Read and in-place modification of auditor properties.
///
/// Implementations never create a property that is not already present and
/// never replace one wholesale; `modify` rewrites an existing value.
pub trait PropertyStore: Send + Sync {
    /// Current value of a property, trimmed of padding.
    fn get(&self, key: Property) -> Option<String>;

    /// Overwrite an existing property's value in place.
    fn modify(&self, key: Property, value: &str) -> ConfigResult<()>;

    /// Whether the property is present with a non-empty value.
    fn has_value(&self, key: Property) -> bool {
        self.get(key).map_or(false, |v| !v.is_empty())
    }

    /// Whether the property is present at all, even if empty.
    fn is_present(&self, key: Property) -> bool {
        self.get(key).is_some()
    }

    /// Boolean value; unset counts as false.
    fn get_bool(&self, key: Property) -> bool {
        self.get(key).map_or(false, |v| {
            matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
        })
    }

    /// Unsigned integer value; unset or empty yields `None`.
    fn get_ulong(&self, key: Property) -> ConfigResult<Option<u64>> {
        match self.get(key) {
            Some(v) if !v.is_empty() => {
                v.parse()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidValue {
                        name: key.env_name(),
                        message: format!("expected unsigned integer, got '{}'", v),
                    })
            }
            _ => Ok(None),
        }
    }
}

/// Properties backed by the process environment.
///
/// Modification writes directly into the existing environment string. The
/// wrapper program is expected to pad values it wants the auditor to update;
/// unused trailing bytes are filled with spaces so the capacity survives
/// later updates, and `get` trims them away.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvProperties;

impl EnvProperties {
    /// Create an environment-backed store.
    pub fn new() -> Self {
        Self
    }
}

impl PropertyStore for EnvProperties {
    fn get(&self, key: Property) -> Option<String> {
        std::env::var(key.env_name())
            .ok()
            .map(|v| v.trim().to_string())
    }

    fn modify(&self, key: Property, value: &str) -> ConfigResult<()> {
        let env_name = key.env_name();
        let c_name = CString::new(env_name.as_str()).map_err(|e| ConfigError::InvalidValue {
            name: env_name.clone(),
            message: e.to_string(),
        })?;
        if value.as_bytes().contains(&0) {
            return Err(ConfigError::InvalidValue {
                name: env_name,
                message: "value contains a NUL byte".to_string(),
            });
        }

        // SAFETY: getenv returns either null or a pointer to the NUL-terminated
        // value inside the live environment block. We write at most
        // `available` bytes, never past the existing terminator, so the block
        // layout is unchanged. Callers modify properties only during
        // single-threaded initialization or under the auditor's lock.
        unsafe {
            let ptr = libc::getenv(c_name.as_ptr());
            if ptr.is_null() {
                return Err(ConfigError::NotSet { name: env_name });
            }
            let available = CStr::from_ptr(ptr).to_bytes().len();
            if value.len() > available {
                return Err(ConfigError::NoRoom {
                    name: env_name,
                    needed: value.len(),
                    available,
                });
            }
            let dst = ptr as *mut u8;
            std::ptr::copy_nonoverlapping(value.as_ptr(), dst, value.len());
            std::ptr::write_bytes(dst.add(value.len()), b' ', available - value.len());
        }

        Ok(())
    }
}

/// In-memory properties for tests and embedding.
///
/// Behaves like [`EnvProperties`] except that values have no fixed
/// capacity.
#[derive(Debug, Default)]
pub struct MemoryProperties {
    values: Mutex<HashMap<Property, String>>,
}

impl MemoryProperties {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a property (builder style).
    pub fn with(self, key: Property, value: impl Into<String>) -> Self {
        self.values.lock().insert(key, value.into());
        self
    }

    /// Seed a property.
    pub fn set(&self, key: Property, value: impl Into<String>) {
        self.values.lock().insert(key, value.into());
    }
}

impl PropertyStore for MemoryProperties {
    fn get(&self, key: Property) -> Option<String> {
        self.values.lock().get(&key).map(|v| v.trim().to_string())
    }

    fn modify(&self, key: Property, value: &str) -> ConfigResult<()> {
        let mut values = self.values.lock();
        match values.get_mut(&key) {
            Some(slot) => {
                *slot = value.to_string();
                Ok(())
            }
            None => Err(ConfigError::NotSet {
                name: key.env_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_memory_modify_requires_presence() {
        let store = MemoryProperties::new();
        let err = store.modify(Property::Depth, "1").unwrap_err();
        assert!(matches!(err, ConfigError::NotSet { .. }));

        store.set(Property::Depth, "0");
        store.modify(Property::Depth, "1").unwrap();
        assert_eq!(store.get(Property::Depth).as_deref(), Some("1"));
    }

    #[test]
    fn test_bool_and_ulong_parsing() {
        let store = MemoryProperties::new()
            .with(Property::NoMonitor, "yes")
            .with(Property::Depth, "12")
            .with(Property::Pcmdid, "abc");

        assert!(store.get_bool(Property::NoMonitor));
        assert!(!store.get_bool(Property::NotifyDone));
        assert_eq!(store.get_ulong(Property::Depth).unwrap(), Some(12));
        assert_eq!(store.get_ulong(Property::Verbosity).unwrap(), None);
        assert!(store.get_ulong(Property::Pcmdid).is_err());
    }

    #[test]
    fn test_has_value_vs_present() {
        let store = MemoryProperties::new().with(Property::ActivationProgRe, "");
        assert!(store.is_present(Property::ActivationProgRe));
        assert!(!store.has_value(Property::ActivationProgRe));
    }

    // Each env test owns a distinct property so parallel tests don't collide.
    #[test]
    fn test_env_modify_in_place_pads() {
        env::set_var(Property::Pccode.env_name(), "                ");
        let store = EnvProperties::new();

        store.modify(Property::Pccode, "abc123").unwrap();
        assert_eq!(store.get(Property::Pccode).as_deref(), Some("abc123"));
        assert_eq!(
            env::var(Property::Pccode.env_name()).unwrap().len(),
            16,
            "capacity must survive the update"
        );

        store.modify(Property::Pccode, "0123456789abcdef").unwrap();
        assert_eq!(store.get(Property::Pccode).as_deref(), Some("0123456789abcdef"));
        env::remove_var(Property::Pccode.env_name());
    }

    #[test]
    fn test_env_modify_rejects_overflow() {
        env::set_var(Property::Pcmdid.env_name(), "12");
        let store = EnvProperties::new();
        let err = store.modify(Property::Pcmdid, "12345").unwrap_err();
        assert!(matches!(err, ConfigError::NoRoom { needed: 5, available: 2, .. }));
        assert_eq!(store.get(Property::Pcmdid).as_deref(), Some("12"));
        env::remove_var(Property::Pcmdid.env_name());
    }

    #[test]
    fn test_env_modify_missing() {
        env::remove_var(Property::TrackEnvRe.env_name());
        let err = EnvProperties::new()
            .modify(Property::TrackEnvRe, "x")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotSet { .. }));
    }
}
