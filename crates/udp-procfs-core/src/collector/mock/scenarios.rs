//! Pre-built mock `/proc` trees for testing.

use super::filesystem::MockFs;
use crate::models::Protocol;

/// Header line of `/proc/[pid]/net/udp`.
pub const UDP_TABLE_HEADER: &str = concat!(
    "   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt",
    "   uid  timeout inode ref pointer drops"
);

/// IPv4 table of the statsd process in [`MockFs::statsd_host`].
///
/// Queued: 0x180 + 0x80 = 512. Dropped: 12 + 30 = 42.
pub const STATSD_UDP_TABLE: &str = concat!(
    "   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt",
    "   uid  timeout inode ref pointer drops\n",
    "  133: 00000000:1FBD 00000000:0000 07 00000180:00000000 00:00000000 00000000",
    "   998        0 25013 2 ffff8a0c3b2e1000 12\n",
    "  870: 0100007F:1FBE 00000000:0000 07 00000080:00000000 00:00000000 00000000",
    "   998        0 25014 2 ffff8a0c3b2e1400 30\n",
);

/// IPv6 table of the statsd process in [`MockFs::statsd_host`].
///
/// Queued: 0x10 = 16. Dropped: 5.
pub const STATSD_UDP6_TABLE: &str = concat!(
    "   sl  local_address                         remote_address                        st",
    " tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops\n",
    "  133: 00000000000000000000000000000000:1FBD 00000000000000000000000000000000:0000 07",
    " 00000010:00000000 00:00000000 00000000   998        0 25015 2 ffff8a0c3b2e1800 5\n",
);

impl MockFs {
    /// A host running a statsd daemon (PID 4242) with IPv4 and IPv6 UDP
    /// sockets, next to a few unrelated processes.
    pub fn statsd_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file("/proc/self", "");

        fs.add_process(1, "systemd");
        fs.add_process(812, "sshd");
        fs.add_process(4242, "statsd");
        fs.add_process(5120, "bash");

        fs.add_socket_table(4242, Protocol::Udp, STATSD_UDP_TABLE);
        fs.add_socket_table(4242, Protocol::Udp6, STATSD_UDP6_TABLE);

        fs
    }

    /// Two processes registered as `statsd` (PIDs 3001 and 3002).
    pub fn with_duplicate_names() -> Self {
        let mut fs = Self::new();

        fs.add_process(1, "systemd");
        fs.add_process(3001, "statsd");
        fs.add_process(3002, "statsd");
        fs.add_socket_table(3001, Protocol::Udp, STATSD_UDP_TABLE);
        fs.add_socket_table(3002, Protocol::Udp, UDP_TABLE_HEADER);

        fs
    }

    /// Entries a scan has to step over: a status file that cannot be read,
    /// a PID directory whose process exited, a status with a garbage first
    /// line, and non-PID entries. PID 6000 is the only valid `statsd`.
    pub fn with_unreadable_entries() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/meminfo", "MemTotal: 16384000 kB\n");
        fs.add_dir("/proc/sys");
        fs.add_dir("/proc/self");
        fs.add_denied_file("/proc/100/status");
        fs.add_dir("/proc/200");
        fs.add_file("/proc/300/status", "\u{0}\u{0}garbage\nName:\tstatsd\n");
        fs.add_file("/proc/400/status", "");
        fs.add_process(6000, "statsd");

        fs
    }
}
