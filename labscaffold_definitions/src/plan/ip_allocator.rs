//! IP allocator (§4.2): sequential IPv4 addresses from a starting address,
//! failing rather than rolling the last octet past 255.

use crate::errors::IpError;
use std::net::Ipv4Addr;

pub fn allocate(start: Ipv4Addr, count: u32) -> Result<Vec<Ipv4Addr>, IpError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let octets = start.octets();
    let last = octets[3] as u32;
    if last + count - 1 > 255 {
        return Err(IpError::Exhausted { start, count });
    }
    Ok((0..count)
        .map(|i| Ipv4Addr::new(octets[0], octets[1], octets[2], (last + i) as u8))
        .collect())
}
