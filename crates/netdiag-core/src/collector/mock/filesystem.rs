//! In-memory mock filesystem for running collectors without `/sys` or `/proc`.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;

/// Files and directories held in memory.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, as if the kernel stopped exposing it.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();
        for file_path in self.files.keys() {
            if file_path.parent() == Some(path) {
                entries.insert(file_path.clone());
            }
        }
        for dir_path in &self.directories {
            if dir_path.parent() == Some(path) {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/snmp", "Ip: Forwarding\nIp: 1\n");

        let net = fs.read_dir(Path::new("/proc/net")).unwrap();
        assert_eq!(net, vec![PathBuf::from("/proc/net/snmp")]);
        assert_eq!(
            fs.read_to_string(Path::new("/proc/net/snmp")).unwrap(),
            "Ip: Forwarding\nIp: 1\n"
        );
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/net/eth0/statistics/rx_dropped", "1");
        fs.add_file("/sys/class/net/eth0/statistics/tx_errors", "2");
        fs.add_file("/sys/class/net/eth0/carrier", "1");

        let stats = fs
            .read_dir(Path::new("/sys/class/net/eth0/statistics"))
            .unwrap();
        assert_eq!(stats.len(), 2);

        // carrier file plus the statistics directory
        let iface = fs.read_dir(Path::new("/sys/class/net/eth0")).unwrap();
        assert_eq!(iface.len(), 2);
    }

    #[test]
    fn test_mock_fs_missing_paths() {
        let mut fs = MockFs::new();
        fs.add_dir("/sys/class/net/lo");
        assert!(fs.read_dir(Path::new("/sys/class/net/lo")).unwrap().is_empty());
        assert!(fs.read_dir(Path::new("/nope")).is_err());

        fs.add_file("/proc/net/softnet_stat", "");
        fs.remove_file("/proc/net/softnet_stat");
        assert!(fs.read_to_string(Path::new("/proc/net/softnet_stat")).is_err());
    }
}
