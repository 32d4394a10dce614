//! Wake-on-LAN support.
//!
//! The observatory machine running TheSkyX is usually asleep until shortly
//! before a session. A magic packet broadcast to UDP port 9 wakes it.

use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::info;

/// Standard discard-protocol port used for wake packets.
pub const WAKE_ON_LAN_PORT: u16 = 9;

const MAC_ADDRESS_LENGTH: usize = 6;
const MAGIC_PACKET_LENGTH: usize = 102;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WakeOnLanError {
    /// The hardware address did not normalize to six bytes of hex.
    #[error("Invalid hardware address: {0:?}")]
    InvalidMacAddress(String),

    /// The broadcast datagram could not be sent.
    #[error("Error sending wake packet: {0}")]
    Send(String),
}

/// Normalize a hardware address string into its six raw bytes. Accepts
/// colon, hyphen, and dot separators in any case ("aa:bb:cc:dd:ee:ff",
/// "AA-BB-CC-DD-EE-FF", "aabb.ccdd.eeff").
pub fn parse_mac_address(text: &str) -> Option<[u8; MAC_ADDRESS_LENGTH]> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();
    if cleaned.len() != 2 * MAC_ADDRESS_LENGTH {
        return None;
    }
    let mut bytes = [0u8; MAC_ADDRESS_LENGTH];
    for (index, pair) in cleaned.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(pair).ok()?;
        bytes[index] = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(bytes)
}

/// Build the 102-byte magic packet for a hardware address: six 0xFF bytes
/// followed by sixteen repetitions of the six-byte address.
pub fn magic_packet(mac_address: &str) -> Result<[u8; MAGIC_PACKET_LENGTH], WakeOnLanError> {
    let mac = parse_mac_address(mac_address)
        .ok_or_else(|| WakeOnLanError::InvalidMacAddress(mac_address.to_string()))?;
    let mut packet = [0xFFu8; MAGIC_PACKET_LENGTH];
    for repetition in 0..16 {
        let start = MAC_ADDRESS_LENGTH * (1 + repetition);
        packet[start..start + MAC_ADDRESS_LENGTH].copy_from_slice(&mac);
    }
    Ok(packet)
}

/// Broadcast a wake packet for the given hardware address.
pub async fn send_wake_on_lan(
    broadcast_address: &str,
    mac_address: &str,
) -> Result<(), WakeOnLanError> {
    let packet = magic_packet(mac_address)?;
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|err| WakeOnLanError::Send(err.to_string()))?;
    socket
        .set_broadcast(true)
        .map_err(|err| WakeOnLanError::Send(err.to_string()))?;
    let sent = socket
        .send_to(&packet, (broadcast_address, WAKE_ON_LAN_PORT))
        .await
        .map_err(|err| WakeOnLanError::Send(err.to_string()))?;
    if sent != packet.len() {
        return Err(WakeOnLanError::Send(format!(
            "short send: {sent} of {} bytes",
            packet.len()
        )));
    }
    info!(%broadcast_address, %mac_address, "wake-on-lan packet sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mac_address_separators() {
        let expected = [0x00, 0x1B, 0x44, 0x11, 0x3A, 0xB7];
        assert_eq!(parse_mac_address("00:1b:44:11:3a:b7"), Some(expected));
        assert_eq!(parse_mac_address("00-1B-44-11-3A-B7"), Some(expected));
        assert_eq!(parse_mac_address("001b.4411.3ab7"), Some(expected));
        assert_eq!(parse_mac_address("001B44113AB7"), Some(expected));
    }

    #[test]
    fn test_parse_mac_address_rejects_garbage() {
        assert_eq!(parse_mac_address(""), None);
        assert_eq!(parse_mac_address("00:1b:44:11:3a"), None);
        assert_eq!(parse_mac_address("00:1b:44:11:3a:b7:99"), None);
        assert_eq!(parse_mac_address("zz:zz:zz:zz:zz:zz"), None);
    }

    #[test]
    fn test_magic_packet_layout() {
        let packet = magic_packet("01:23:45:67:89:ab").unwrap();
        assert_eq!(packet.len(), 102);
        assert!(packet[..6].iter().all(|&b| b == 0xFF));
        let mac = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB];
        for repetition in 0..16 {
            let start = 6 + repetition * 6;
            assert_eq!(&packet[start..start + 6], &mac);
        }
    }

    #[test]
    fn test_magic_packet_invalid_address() {
        assert_eq!(
            magic_packet("not-a-mac"),
            Err(WakeOnLanError::InvalidMacAddress("not-a-mac".to_string()))
        );
    }

    #[tokio::test]
    async fn test_send_wake_on_lan_to_loopback() {
        // Loopback instead of a real broadcast address so the test is
        // self-contained; the payload is identical either way.
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();

        let packet = magic_packet("01:23:45:67:89:ab").unwrap();
        let sender = UdpSocket::bind("0.0.0.0:0").await.unwrap();
        sender
            .send_to(&packet, ("127.0.0.1", port))
            .await
            .unwrap();

        let mut buffer = [0u8; 256];
        let (received, _) = receiver.recv_from(&mut buffer).await.unwrap();
        assert_eq!(received, 102);
        assert_eq!(&buffer[..102], &packet[..]);
    }
}
