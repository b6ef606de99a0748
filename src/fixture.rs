//! Fake `/sys/bus/pci` trees for tests

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::pci::{PciAddress, SysfsTree};

pub struct FakeSysfs {
    dir: TempDir,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("devices")).unwrap();
        fs::create_dir(dir.path().join("drivers")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tree(&self) -> SysfsTree {
        SysfsTree::with_root(self.root())
    }

    pub fn device_dir(&self, addr: &str) -> PathBuf {
        self.root().join("devices").join(addr)
    }

    /// Device directory with `vendor`, `class` and an empty `remove` control
    pub fn add_device(&self, addr: &str, vendor: &str, class: &str) -> PciAddress {
        let dir = self.device_dir(addr);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("vendor"), format!("{vendor}\n")).unwrap();
        fs::write(dir.join("class"), format!("{class}\n")).unwrap();
        fs::write(dir.join("remove"), "").unwrap();
        PciAddress::parse(addr).unwrap()
    }

    pub fn drop_attr(&self, addr: &PciAddress, attr: &str) {
        fs::remove_file(self.device_dir(addr.as_str()).join(attr)).unwrap();
    }

    /// Bind `addr` to `driver` the way the kernel lays it out
    pub fn bind(&self, addr: &PciAddress, driver: &str) {
        let driver_dir = self.root().join("drivers").join(driver);
        fs::create_dir_all(driver_dir.join(addr.as_str())).unwrap();
        if !driver_dir.join("unbind").exists() {
            fs::write(driver_dir.join("unbind"), "").unwrap();
        }
        std::os::unix::fs::symlink(&driver_dir, self.device_dir(addr.as_str()).join("driver"))
            .unwrap();
    }

    pub fn unbind_path(&self, driver: &str) -> PathBuf {
        self.root().join("drivers").join(driver).join("unbind")
    }

    pub fn remove_path(&self, addr: &PciAddress) -> PathBuf {
        self.device_dir(addr.as_str()).join("remove")
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}
