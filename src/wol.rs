use tokio::net::UdpSocket;
use tracing::debug;

use crate::utils::parse_mac;
use crate::ZidooError;

const WOL_TARGET: &str = "255.255.255.255:9";
pub const MAGIC_PACKET_LEN: usize = 6 + 16 * 6;

/// Six `0xFF` bytes followed by the MAC repeated sixteen times.
pub fn magic_packet(mac: [u8; 6]) -> [u8; MAGIC_PACKET_LEN] {
    let mut packet = [0xFFu8; MAGIC_PACKET_LEN];
    for chunk in packet[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac);
    }
    packet
}

/// Broadcasts a Wake-on-LAN packet for `mac` on UDP port 9.
pub async fn wake(mac: &str) -> Result<(), ZidooError> {
    let packet = magic_packet(parse_mac(mac)?);
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;
    socket.send_to(&packet, WOL_TARGET).await?;
    debug!(mac, "Wake-on-LAN packet sent");
    Ok(())
}
