use async_trait::async_trait;

/// Resolver probe used by the DNSRecord feature.
///
/// Behind a trait so extraction tests can pin the outcome instead of
/// depending on the host environment's resolver.
#[async_trait]
pub trait DnsProbe: Send + Sync {
    /// True if the hostname resolves to at least one address.
    async fn resolves(&self, host: &str) -> bool;
}

/// System resolver via tokio's getaddrinfo wrapper.
pub struct SystemDns;

#[async_trait]
impl DnsProbe for SystemDns {
    async fn resolves(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        // Port is irrelevant, lookup_host just needs a socket address shape.
        match tokio::net::lookup_host((host, 80u16)).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(_) => false,
        }
    }
}
