use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use bytebuffer::ByteBuffer;
use strum::{Display, FromRepr};
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

use crate::{Error, Result};

pub const VERSION: u8 = 0x05;

/// Hello reply: version, no authentication required.
pub const NO_AUTH_REPLY: [u8; 2] = [VERSION, 0x00];

/// Connect reply. The bound address is always reported as 0.0.0.0:0.
pub const SUCCESS_REPLY: [u8; 10] = [VERSION, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];

const MIN_REQUEST_LEN: usize = 7;

#[derive(FromRepr, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Connect = 0x01,
    Bind = 0x02,
    UdpAssociate = 0x03,
}

#[derive(FromRepr, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddrType {
    Ipv4 = 0x01,
    Domain = 0x03,
    Ipv6 = 0x04,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Ip(IpAddr),
    Domain(String),
}

/// A parsed CONNECT request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub addr: Address,
    pub port: u16,
}

/// Validate the client hello. Offered methods are not looked at.
pub fn check_hello(frame: &[u8]) -> Result<()> {
    match frame.first() {
        None => Err(Error::EmptyFrame),
        Some(&VERSION) => Ok(()),
        Some(&other) => Err(Error::UnsupportedVersion(other)),
    }
}

impl Request {
    /// Parse `VER CMD RSV ATYP ADDR PORT`. The port is always the trailing
    /// two bytes; for domains the length prefix is skipped and everything
    /// between it and the port is the name.
    pub fn parse(frame: &[u8]) -> Result<Self> {
        let len = frame.len();
        if len < MIN_REQUEST_LEN {
            return Err(Error::InvalidRequest(len));
        }

        let mut buf = ByteBuffer::from_bytes(frame);
        let _version = buf.read_u8()?;
        let command = buf.read_u8()?;
        let _reserved = buf.read_u8()?;
        let addr_type = buf.read_u8()?;

        let command = match Command::from_repr(command) {
            Some(Command::Connect) => Command::Connect,
            _ => return Err(Error::UnsupportedCommand(command)),
        };

        let port = u16::from_be_bytes([frame[len - 2], frame[len - 1]]);

        let addr = match AddrType::from_repr(addr_type) {
            Some(AddrType::Ipv4) => {
                if len < 10 {
                    return Err(Error::InvalidRequest(len));
                }
                let octets: [u8; 4] = buf
                    .read_bytes(4)?
                    .try_into()
                    .map_err(|_| Error::InvalidRequest(len))?;
                Address::Ip(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            Some(AddrType::Domain) => {
                let domain = std::str::from_utf8(&frame[5..len - 2])
                    .map_err(|_| Error::InvalidDomain)?;
                Address::Domain(domain.to_string())
            }
            Some(AddrType::Ipv6) => {
                if len < 22 {
                    return Err(Error::InvalidRequest(len));
                }
                let octets: [u8; 16] = buf
                    .read_bytes(16)?
                    .try_into()
                    .map_err(|_| Error::InvalidRequest(len))?;
                Address::Ip(IpAddr::V6(Ipv6Addr::from(octets)))
            }
            None => return Err(Error::UnsupportedAddressType(addr_type)),
        };

        Ok(Request {
            command,
            addr,
            port,
        })
    }

    pub fn addr_type(&self) -> AddrType {
        match &self.addr {
            Address::Ip(IpAddr::V4(_)) => AddrType::Ipv4,
            Address::Ip(IpAddr::V6(_)) => AddrType::Ipv6,
            Address::Domain(_) => AddrType::Domain,
        }
    }

    /// Open the destination connection. Domains are resolved and every
    /// candidate is tried in resolver order.
    pub async fn connect(&self) -> Result<TcpStream> {
        match &self.addr {
            Address::Ip(ip) => {
                let target = SocketAddr::new(*ip, self.port);
                TcpStream::connect(target)
                    .await
                    .map_err(|e| Error::Unreachable(format!("{target}: {e}")))
            }
            Address::Domain(domain) => {
                let candidates = lookup_host((domain.as_str(), self.port))
                    .await
                    .map_err(|e| Error::Unreachable(format!("{self}: {e}")))?;
                connect_any(candidates).await
            }
        }
    }
}

/// Try each address in order, returning the first that connects.
pub async fn connect_any<I>(candidates: I) -> Result<TcpStream>
where
    I: IntoIterator<Item = SocketAddr>,
{
    let mut last_err = None;

    for addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "candidate failed");
                last_err = Some(format!("{addr}: {e}"));
            }
        }
    }

    Err(match last_err {
        Some(e) => Error::Unreachable(e),
        None => Error::Unreachable("no address candidates".to_string()),
    })
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]"),
            Address::Ip(ip) => write!(f, "{ip}"),
            Address::Domain(domain) => f.write_str(domain),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello() {
        assert!(check_hello(&[0x05, 0x01, 0x00]).is_ok());
        assert!(matches!(check_hello(&[]), Err(Error::EmptyFrame)));
        assert!(matches!(
            check_hello(&[0x04, 0x01, 0x00]),
            Err(Error::UnsupportedVersion(0x04))
        ));
    }

    #[test]
    fn parse_ipv4() {
        let req = Request::parse(&[0x05, 0x01, 0x00, 0x01, 0x7f, 0x00, 0x00, 0x01, 0x87, 0x07])
            .unwrap();
        assert_eq!(req.addr, Address::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        assert_eq!(req.port, 34567);
        assert_eq!(req.to_string(), "127.0.0.1:34567");
    }

    #[test]
    fn parse_domain() {
        let mut frame = vec![0x05, 0x01, 0x00, 0x03, 11];
        frame.extend_from_slice(b"example.com");
        frame.extend_from_slice(&443u16.to_be_bytes());

        let req = Request::parse(&frame).unwrap();
        assert_eq!(req.addr, Address::Domain("example.com".into()));
        assert_eq!(req.port, 443);
        assert_eq!(req.addr_type(), AddrType::Domain);
    }

    #[test]
    fn command_bytes() {
        assert_eq!(Command::from_repr(0x01), Some(Command::Connect));
        assert_eq!(Command::from_repr(0x02), Some(Command::Bind));
        assert_eq!(Command::from_repr(0x00), None);
        assert_eq!(AddrType::from_repr(0x04), Some(AddrType::Ipv6));
        assert_eq!(AddrType::from_repr(0x02), None);
        assert_eq!(Command::UdpAssociate.to_string(), "UdpAssociate");
        assert_eq!(AddrType::Domain.to_string(), "Domain");
    }

    #[test]
    fn parse_ipv6() {
        let mut frame = vec![0x05, 0x01, 0x00, 0x04];
        frame.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
        frame.extend_from_slice(&[0x00, 0x50]);

        let req = Request::parse(&frame).unwrap();
        assert_eq!(req.addr, Address::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST)));
        assert_eq!(req.to_string(), "[::1]:80");
    }

    #[test]
    fn reject() {
        assert!(matches!(
            Request::parse(&[0x05, 0x01, 0x00, 0x01, 0x7f, 0x00]),
            Err(Error::InvalidRequest(6))
        ));
        assert!(matches!(
            Request::parse(&[0x05, 0x02, 0x00, 0x01, 0x7f, 0x00, 0x00, 0x01, 0x00, 0x50]),
            Err(Error::UnsupportedCommand(0x02))
        ));
        assert!(matches!(
            Request::parse(&[0x05, 0x03, 0x00, 0x01, 0x7f, 0x00, 0x00, 0x01, 0x00, 0x50]),
            Err(Error::UnsupportedCommand(0x03))
        ));
        assert!(matches!(
            Request::parse(&[0x05, 0x01, 0x00, 0x05, 0x7f, 0x00, 0x00, 0x01, 0x00, 0x50]),
            Err(Error::UnsupportedAddressType(0x05))
        ));
        // ipv4 needs the full four octets before the port
        assert!(matches!(
            Request::parse(&[0x05, 0x01, 0x00, 0x01, 0x7f, 0x00, 0x00, 0x01, 0x00]),
            Err(Error::InvalidRequest(9))
        ));
        assert!(matches!(
            Request::parse(&[0x05, 0x01, 0x00, 0x03, 0x02, 0xff, 0xfe, 0x00, 0x50]),
            Err(Error::InvalidDomain)
        ));
    }
}
