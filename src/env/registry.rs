//! Machine-wide environment in the Windows registry.

use super::{EnvVar, EnvironmentStore, PathFlavor};
use crate::core::JvError;
use std::io;
use tracing::debug;
use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_QUERY_VALUE, KEY_SET_VALUE, RegType};
use winreg::{RegKey, RegValue};

const ENVIRONMENT_KEY: &str = r"System\CurrentControlSet\Control\Session Manager\Environment";
const BROADCAST_TIMEOUT_MS: u32 = 5000;

/// `HKLM\...\Session Manager\Environment`.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore;

impl RegistryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether the environment key can be opened for writing.
    #[must_use]
    pub fn can_write() -> bool {
        RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey_with_flags(ENVIRONMENT_KEY, KEY_SET_VALUE)
            .is_ok()
    }

    fn open(&self, flags: u32) -> Result<RegKey, JvError> {
        RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey_with_flags(ENVIRONMENT_KEY, flags)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::PermissionDenied {
                    JvError::PrivilegeRequired {
                        operation: "modify the system environment".to_string(),
                    }
                } else {
                    JvError::Store {
                        operation: "open environment key".to_string(),
                        store: self.location(),
                        reason: e.to_string(),
                    }
                }
            })
    }
}

fn to_wide_bytes(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

impl EnvironmentStore for RegistryStore {
    fn flavor(&self) -> PathFlavor {
        PathFlavor::Windows
    }

    fn read(&self, var: EnvVar) -> Result<Option<String>, JvError> {
        let key = self.open(KEY_QUERY_VALUE)?;
        match key.get_value::<String, _>(self.var_name(var)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JvError::Store {
                operation: format!("read {}", self.var_name(var)),
                store: self.location(),
                reason: e.to_string(),
            }),
        }
    }

    fn write(&self, var: EnvVar, value: &str) -> Result<(), JvError> {
        let key = self.open(KEY_SET_VALUE)?;
        let name = self.var_name(var);
        let result = match var {
            EnvVar::Home => key.set_value(name, &value.to_string()),
            // The search path holds %JAVA_HOME% and must stay expandable.
            EnvVar::SearchPath => key.set_raw_value(
                name,
                &RegValue {
                    bytes: to_wide_bytes(value),
                    vtype: RegType::REG_EXPAND_SZ,
                },
            ),
        };
        result.map_err(|e| JvError::Store {
            operation: format!("write {name}"),
            store: self.location(),
            reason: e.to_string(),
        })
    }

    fn broadcast_change(&self) -> Result<(), JvError> {
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            HWND_BROADCAST, SMTO_ABORTIFHUNG, SendMessageTimeoutW, WM_SETTINGCHANGE,
        };

        let environment: Vec<u16> = "Environment".encode_utf16().chain(std::iter::once(0)).collect();
        let mut result: usize = 0;
        // SAFETY: `environment` is a NUL-terminated UTF-16 buffer that outlives the
        // call, and `result` is a valid out pointer.
        let sent = unsafe {
            SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                0,
                environment.as_ptr() as isize,
                SMTO_ABORTIFHUNG,
                BROADCAST_TIMEOUT_MS,
                &mut result,
            )
        };
        if sent == 0 {
            return Err(JvError::Store {
                operation: "broadcast environment change".to_string(),
                store: self.location(),
                reason: io::Error::last_os_error().to_string(),
            });
        }
        debug!("Broadcast WM_SETTINGCHANGE");
        Ok(())
    }

    fn location(&self) -> String {
        format!(r"HKLM\{ENVIRONMENT_KEY}")
    }
}
