//! Device descriptor types
//!
//! A descriptor identifies one enumerated HID interface. Descriptors are
//! produced by the backend on every scan and are only valid for the
//! snapshot they came from: paths are unique within one enumeration but
//! are not guaranteed stable across rescans.

/// One enumerated HID interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform-specific device path (opaque, unique within one snapshot)
    pub path: String,
    /// USB Vendor ID, formatted as `0xNNNN`
    pub vendor_id: String,
    /// USB Product ID, formatted as `0xNNNN`
    pub product_id: String,
    /// Product string (if available)
    pub product_string: Option<String>,
    /// Manufacturer string (if available)
    pub manufacturer_string: Option<String>,
    /// HID usage page of this interface
    pub usage_page: u16,
    /// Interface number distinguishing sibling interfaces on one device
    pub interface_number: i32,
}

impl DeviceDescriptor {
    /// Display label for list rendering: product string when present,
    /// otherwise the vid:pid pair.
    pub fn label(&self) -> String {
        match self.product_string.as_deref() {
            Some(product) if !product.is_empty() => product.to_string(),
            _ => format!("{}:{}", self.vendor_id, self.product_id),
        }
    }
}
