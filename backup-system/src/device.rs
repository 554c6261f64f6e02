/// The per-device directory name on the backup share: hostname plus the
/// primary interface's hardware address. The colons go away so the name
/// stays filesystem-safe; the MAC keeps the name stable even when the
/// hostname is a generic `raspberrypi`.
#[must_use]
pub fn device_directory(hostname: &str, mac_address: &str) -> String {
    format!(
        "{}_{}",
        hostname.trim(),
        mac_address.trim().replace(':', "")
    )
}
