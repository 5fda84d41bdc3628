//! Device catalog and selection state
//!
//! The catalog holds the most recent enumeration snapshot plus at most one
//! selected path. Every scan replaces the snapshot wholesale; there is no
//! merging with prior state. A selection only ever points at a descriptor
//! in the current snapshot — a rescan that drops the selected path clears
//! the selection.

use crate::descriptor::DeviceDescriptor;

/// Most recent device enumeration plus the current selection
#[derive(Debug, Default)]
pub struct DeviceCatalog {
    devices: Vec<DeviceDescriptor>,
    selected_path: Option<String>,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a fresh enumeration and return the new
    /// device count. A selection whose path is absent from the new
    /// snapshot is cleared.
    pub fn apply_scan(&mut self, devices: Vec<DeviceDescriptor>) -> usize {
        self.devices = devices;
        if let Some(path) = &self.selected_path {
            if !self.contains(path) {
                tracing::debug!("Selected path {} gone after rescan, clearing selection", path);
                self.selected_path = None;
            }
        }
        self.devices.len()
    }

    /// Select a device by path. No-op if the path is not in the current
    /// snapshot; the display layer only offers valid paths.
    pub fn select(&mut self, path: &str) {
        if self.contains(path) {
            self.selected_path = Some(path.to_string());
        }
    }

    /// Clear the selection explicitly
    pub fn clear_selection(&mut self) {
        self.selected_path = None;
    }

    /// The currently selected descriptor, if any
    pub fn selected(&self) -> Option<&DeviceDescriptor> {
        let path = self.selected_path.as_deref()?;
        self.devices.iter().find(|d| d.path == path)
    }

    /// The currently selected path, if any
    pub fn selected_path(&self) -> Option<&str> {
        self.selected_path.as_deref()
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn contains(&self, path: &str) -> bool {
        self.devices.iter().any(|d| d.path == path)
    }
}
