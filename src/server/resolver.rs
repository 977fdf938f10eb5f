//! # Resolución Inversa de Nombres
//! src/server/resolver.rs
//!
//! Una sola llamada bloqueante por conexión, sólo si la configuración
//! activa `reverse_lookups`.

use std::io;
use std::net::IpAddr;

/// Traduce una IP a nombre de host
pub trait HostnameResolver: Send + Sync {
    fn resolve(&self, addr: IpAddr) -> io::Result<String>;
}

impl<F> HostnameResolver for F
where
    F: Fn(IpAddr) -> io::Result<String> + Send + Sync,
{
    fn resolve(&self, addr: IpAddr) -> io::Result<String> {
        self(addr)
    }
}

/// Resolver del sistema vía `dns_lookup::lookup_addr`
///
/// Exige un nombre: una IP sin registro PTR es un error y no se devuelve
/// la IP en texto.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl HostnameResolver for SystemResolver {
    fn resolve(&self, addr: IpAddr) -> io::Result<String> {
        require_name(addr, dns_lookup::lookup_addr(&addr)?)
    }
}

/// `getnameinfo` sin `NI_NAMEREQD` devuelve la forma numérica cuando no
/// hay PTR; eso cuenta como fallo.
fn require_name(addr: IpAddr, name: String) -> io::Result<String> {
    if name.is_empty() || name.parse::<IpAddr>().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("reverse lookup of {} returned no name", addr),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_closure_resolver() {
        let resolver = |addr: IpAddr| -> io::Result<String> { Ok(format!("host-{}", addr)) };
        let name = resolver.resolve(IpAddr::V4(Ipv4Addr::LOCALHOST)).unwrap();
        assert_eq!(name, "host-127.0.0.1");
    }

    #[test]
    fn test_failing_resolver() {
        let resolver = |_: IpAddr| -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::Other, "no PTR"))
        };
        assert!(resolver.resolve(IpAddr::V4(Ipv4Addr::LOCALHOST)).is_err());
    }

    #[test]
    fn test_numeric_answer_is_not_a_name() {
        let v4 = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7));
        assert!(require_name(v4, "192.0.2.7".to_string()).is_err());
        assert!(require_name(v4, String::new()).is_err());

        let v6 = IpAddr::V6(Ipv6Addr::LOCALHOST);
        assert!(require_name(v6, "::1".to_string()).is_err());

        assert_eq!(require_name(v4, "box.example".to_string()).unwrap(), "box.example");
    }

    #[test]
    fn test_system_resolver_never_returns_numeric_host() {
        let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
        if let Ok(name) = SystemResolver.resolve(addr) {
            assert!(name.parse::<IpAddr>().is_err(), "got: {}", name);
        }
    }
}
