//! The production [`VirtualDevice`] implementation, over a real tun/tap
//! interface, and the physical-interface MTU lookup used to size the
//! bundle buffer.

use std::ffi::CString;
use std::os::fd::{AsRawFd, RawFd};

use simplemux_core::VirtualDevice;
use thiserror::Error;
use tun_tap::{Iface, Mode};

/// Errors acquiring the virtual device or the physical interface's MTU.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeviceError {
    /// Opening the tun/tap device failed.
    #[error("failed to open virtual device {name:?}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },
    /// The physical interface name contains an interior NUL byte.
    #[error("interface name {0:?} is not a valid C string")]
    InvalidInterfaceName(String),
    /// `SIOCGIFMTU` failed (interface does not exist, no permission, ...).
    #[error("failed to look up MTU for interface {0:?}")]
    MtuLookup(String),
}

/// A tun (L3) or tap (L2) device, opened in no-packet-information mode.
pub struct TunTapDevice {
    iface: Iface,
}

impl TunTapDevice {
    /// Open `name` in the given mode.
    pub fn open(name: &str, tap: bool) -> Result<Self, DeviceError> {
        let mode = if tap { Mode::Tap } else { Mode::Tun };
        let iface =
            Iface::without_packet_info(name, mode).map_err(|source| DeviceError::Open {
                name: name.to_owned(),
                source,
            })?;
        Ok(Self { iface })
    }
}

impl VirtualDevice for TunTapDevice {
    fn raw_fd(&self) -> RawFd {
        self.iface.as_raw_fd()
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.iface.recv(buf)
    }

    fn write_packet(&mut self, packet: &[u8]) -> std::io::Result<()> {
        self.iface.send(packet).map(|_| ())
    }
}

/// Mirrors the kernel's `struct ifreq` for the `SIOCGIFMTU` request: the
/// `ifr_ifru` union's only member we touch is the leading `c_int`, so a
/// plain struct with `ifr_mtu` at that offset has the same layout.
#[repr(C)]
struct IfreqMtu {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    ifr_mtu: libc::c_int,
}

/// Resolve the MTU of the local physical interface named `name` via
/// `SIOCGIFMTU`, capped to `[128, 1500]`.
pub fn lookup_interface_mtu(name: &str) -> Result<usize, DeviceError> {
    let c_name =
        CString::new(name).map_err(|_| DeviceError::InvalidInterfaceName(name.to_owned()))?;
    let name_bytes = c_name.as_bytes_with_nul();

    let mut ifr = IfreqMtu {
        ifr_name: [0; libc::IFNAMSIZ],
        ifr_mtu: 0,
    };
    if name_bytes.len() > ifr.ifr_name.len() {
        return Err(DeviceError::InvalidInterfaceName(name.to_owned()));
    }
    #[allow(clippy::cast_possible_wrap)]
    for (dst, src) in ifr.ifr_name.iter_mut().zip(name_bytes.iter()) {
        *dst = *src as libc::c_char;
    }

    // SAFETY: `sock` is a valid, freshly-created socket fd; `ifr` is sized
    // and NUL-terminated for `IFNAMSIZ`; the ioctl reads `ifr_name` and
    // writes `ifr_mtu`, both within `IfreqMtu`'s layout.
    let mtu = unsafe {
        let sock = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if sock < 0 {
            return Err(DeviceError::MtuLookup(name.to_owned()));
        }
        let result = libc::ioctl(sock, libc::SIOCGIFMTU, std::ptr::addr_of_mut!(ifr));
        libc::close(sock);
        if result < 0 {
            return Err(DeviceError::MtuLookup(name.to_owned()));
        }
        ifr.ifr_mtu
    };

    #[allow(clippy::cast_sign_loss)]
    let mtu = mtu as usize;
    Ok(mtu.clamp(128, 1500))
}
