#![forbid(unsafe_code)]

//! Hardware detection: is this a Raspberry Pi, and are we root?
//!
//! Every check reads a small text file. A file that is missing or unreadable
//! means "no", never an error: the display then runs keyboard-only.

use std::fs;
use std::path::PathBuf;

/// Paths consulted during detection. Overridable for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hardware {
    pub model_path: PathBuf,
    pub cpuinfo_path: PathBuf,
    pub status_path: PathBuf,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("/proc/device-tree/model"),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
            status_path: PathBuf::from("/proc/self/status"),
        }
    }
}

impl Hardware {
    /// Whether the board identifies itself as a Raspberry Pi.
    ///
    /// Checks the device-tree model first and falls back to the `Model` and
    /// `Hardware` lines of `/proc/cpuinfo` on older kernels.
    #[must_use]
    pub fn is_pi(&self) -> bool {
        if let Ok(model) = fs::read_to_string(&self.model_path) {
            return model.contains("Raspberry Pi");
        }
        let Ok(cpuinfo) = fs::read_to_string(&self.cpuinfo_path) else {
            return false;
        };
        cpuinfo.lines().any(|line| {
            let Some((key, value)) = line.split_once(':') else {
                return false;
            };
            match key.trim() {
                "Model" => value.contains("Raspberry Pi"),
                "Hardware" => {
                    let value = value.trim();
                    value.starts_with("BCM27") || value.starts_with("BCM28")
                }
                _ => false,
            }
        })
    }

    /// Effective uid, from the second field of the `Uid:` status line.
    #[must_use]
    pub fn effective_uid(&self) -> Option<u32> {
        let status = fs::read_to_string(&self.status_path).ok()?;
        let line = status.lines().find_map(|line| line.strip_prefix("Uid:"))?;
        line.split_whitespace().nth(1)?.parse().ok()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.effective_uid() == Some(0)
    }

    /// Buttons are only attempted on a Pi with root privileges.
    #[must_use]
    pub fn buttons_available(&self) -> bool {
        let pi = self.is_pi();
        let root = self.is_root();
        tracing::debug!(pi, root, "hardware detected");
        pi && root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hardware(dir: &TempDir) -> Hardware {
        Hardware {
            model_path: dir.path().join("model"),
            cpuinfo_path: dir.path().join("cpuinfo"),
            status_path: dir.path().join("status"),
        }
    }

    const ROOT_STATUS: &str = "Name:\tkeyhole\nUid:\t1000\t0\t0\t0\nGid:\t0\t0\t0\t0\n";

    #[test]
    fn nothing_readable_means_no_buttons() {
        let dir = tempfile::tempdir().unwrap();
        let hw = hardware(&dir);
        assert!(!hw.is_pi());
        assert!(!hw.is_root());
        assert!(!hw.buttons_available());
    }

    #[test]
    fn device_tree_model() {
        let dir = tempfile::tempdir().unwrap();
        let hw = hardware(&dir);
        fs::write(&hw.model_path, "Raspberry Pi 4 Model B Rev 1.4\0").unwrap();
        fs::write(&hw.status_path, ROOT_STATUS).unwrap();
        assert!(hw.is_pi());
        assert_eq!(hw.effective_uid(), Some(0));
        assert!(hw.buttons_available());
    }

    #[test]
    fn device_tree_wins_over_cpuinfo() {
        let dir = tempfile::tempdir().unwrap();
        let hw = hardware(&dir);
        fs::write(&hw.model_path, "Pine64 RockPro64").unwrap();
        fs::write(&hw.cpuinfo_path, "Hardware\t: BCM2835\n").unwrap();
        assert!(!hw.is_pi());
    }

    #[test]
    fn cpuinfo_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let hw = hardware(&dir);
        fs::write(&hw.cpuinfo_path, "processor\t: 0\nHardware\t: BCM2835\n").unwrap();
        assert!(hw.is_pi());
        fs::write(&hw.cpuinfo_path, "Model\t\t: Raspberry Pi Zero W Rev 1.1\n").unwrap();
        assert!(hw.is_pi());
        fs::write(&hw.cpuinfo_path, "model name\t: Intel(R) Core(TM)\n").unwrap();
        assert!(!hw.is_pi());
    }

    #[test]
    fn unprivileged_user() {
        let dir = tempfile::tempdir().unwrap();
        let hw = hardware(&dir);
        fs::write(&hw.model_path, "Raspberry Pi 3 Model B").unwrap();
        fs::write(&hw.status_path, "Uid:\t1000\t1000\t1000\t1000\n").unwrap();
        assert!(!hw.is_root());
        assert!(!hw.buttons_available());
    }
}
