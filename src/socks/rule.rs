//! Connection gating rules.
//!
//! A [`Rule`] decides whether a proxied connection may be tunneled. The
//! shipped rule, [`AllowListRule`], permits exact destination IPs and exact
//! destination FQDNs and denies everything else.
//!
//! Every evaluation writes one audit line, whatever the outcome:
//!
//! ```text
//! Allowing connection request from 192.0.2.7:51234 to 10.0.0.5:9092.
//! Denying connection request from 192.0.2.7:51240 to 93.184.215.14:443 (evil.example.com).
//! ```

use std::collections::HashSet;
use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};

use crate::config::AllowListConfig;
use crate::observability::metrics;

/// One side of a proxied connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
    /// Domain name the client asked for, if it did not send an IP.
    pub fqdn: Option<String>,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port, fqdn: None }
    }

    pub fn with_fqdn(mut self, fqdn: impl Into<String>) -> Self {
        self.fqdn = Some(fqdn.into());
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())?;
        if let Some(fqdn) = &self.fqdn {
            write!(f, " ({})", fqdn)?;
        }
        Ok(())
    }
}

/// A connection attempt as seen by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub source: Endpoint,
    pub destination: Endpoint,
}

/// Outcome of a rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    fn prefix(self) -> &'static str {
        match self {
            Decision::Allow => "Allowing",
            Decision::Deny => "Denying",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        })
    }
}

/// Policy consulted for every connection before any upstream attempt.
pub trait Rule: Send + Sync {
    /// Decide whether `request` may be tunneled.
    fn evaluate(&self, request: &ConnectionRequest) -> Decision;
}

/// Write the audit line for one decision.
pub fn log_decision(decision: Decision, request: &ConnectionRequest) {
    metrics::record_decision(decision.is_allowed());
    tracing::info!(
        decision = %decision,
        "{} connection request from {} to {}.",
        decision.prefix(),
        request.source,
        request.destination,
    );
}

/// Static allow-list of destination IPs and FQDNs.
#[derive(Debug, Clone, Default)]
pub struct AllowListRule {
    ips: HashSet<IpAddr>,
    fqdns: HashSet<String>,
}

impl AllowListRule {
    pub fn new<I, F>(ips: I, fqdns: F) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
        F: IntoIterator<Item = String>,
    {
        Self {
            ips: ips.into_iter().map(|ip| ip.to_canonical()).collect(),
            fqdns: fqdns.into_iter().collect(),
        }
    }

    /// Build the rule from configuration. IPs must already be validated.
    pub fn from_config(config: &AllowListConfig) -> Result<Self, AddrParseError> {
        let ips = config
            .ips
            .iter()
            .map(|ip| ip.parse::<IpAddr>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ips, config.fqdns.iter().cloned()))
    }

    pub fn allowed_ips(&self) -> impl Iterator<Item = &IpAddr> {
        self.ips.iter()
    }

    pub fn allowed_fqdns(&self) -> impl Iterator<Item = &str> {
        self.fqdns.iter().map(String::as_str)
    }

    fn matches(&self, destination: &Endpoint) -> bool {
        // An IPv4 address and its IPv4-mapped IPv6 form are the same address.
        if self.ips.contains(&destination.ip.to_canonical()) {
            return true;
        }
        destination
            .fqdn
            .as_ref()
            .is_some_and(|fqdn| self.fqdns.contains(fqdn))
    }
}

impl Rule for AllowListRule {
    fn evaluate(&self, request: &ConnectionRequest) -> Decision {
        let decision = if self.matches(&request.destination) {
            Decision::Allow
        } else {
            Decision::Deny
        };
        log_decision(decision, request);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn request_to(destination: Endpoint) -> ConnectionRequest {
        ConnectionRequest {
            source: Endpoint::new("192.0.2.7".parse().unwrap(), 51234),
            destination,
        }
    }

    fn rule() -> AllowListRule {
        AllowListRule::new(
            ["10.0.0.5".parse::<IpAddr>().unwrap()],
            ["acme-v02.api.letsencrypt.org".to_string()],
        )
    }

    #[test]
    fn allows_exact_ip_only() {
        let rule = rule();
        let allowed = request_to(Endpoint::new("10.0.0.5".parse().unwrap(), 9092));
        let denied = request_to(Endpoint::new("10.0.0.6".parse().unwrap(), 9092));

        assert_eq!(rule.evaluate(&allowed), Decision::Allow);
        assert_eq!(rule.evaluate(&denied), Decision::Deny);
    }

    #[test]
    fn ip_match_ignores_port() {
        let request = request_to(Endpoint::new("10.0.0.5".parse().unwrap(), 443));
        assert!(rule().evaluate(&request).is_allowed());
    }

    #[test]
    fn ipv4_mapped_ipv6_matches_ipv4_entry() {
        let mapped = IpAddr::V6("10.0.0.5".parse::<std::net::Ipv4Addr>().unwrap().to_ipv6_mapped());
        let request = request_to(Endpoint::new(mapped, 9092));
        assert_eq!(rule().evaluate(&request), Decision::Allow);

        let v6_rule = AllowListRule::new([IpAddr::V6(Ipv6Addr::LOCALHOST)], Vec::new());
        let v4_loopback = request_to(Endpoint::new("127.0.0.1".parse().unwrap(), 80));
        assert_eq!(v6_rule.evaluate(&v4_loopback), Decision::Deny);
    }

    #[test]
    fn allows_exact_fqdn_only() {
        let rule = rule();
        let acme = request_to(
            Endpoint::new("172.65.32.248".parse().unwrap(), 443)
                .with_fqdn("acme-v02.api.letsencrypt.org"),
        );
        let evil = request_to(
            Endpoint::new("93.184.215.14".parse().unwrap(), 443).with_fqdn("evil.example.com"),
        );
        let suffix = request_to(
            Endpoint::new("172.65.32.248".parse().unwrap(), 443)
                .with_fqdn("x.acme-v02.api.letsencrypt.org"),
        );
        let upper = request_to(
            Endpoint::new("172.65.32.248".parse().unwrap(), 443)
                .with_fqdn("ACME-V02.API.LETSENCRYPT.ORG"),
        );

        assert_eq!(rule.evaluate(&acme), Decision::Allow);
        assert_eq!(rule.evaluate(&evil), Decision::Deny);
        assert_eq!(rule.evaluate(&suffix), Decision::Deny);
        assert_eq!(rule.evaluate(&upper), Decision::Deny);
    }

    #[test]
    fn fqdn_listed_but_ip_unlisted_is_allowed() {
        // Resolution result does not matter once the name matches.
        let request = request_to(
            Endpoint::new("203.0.113.1".parse().unwrap(), 443)
                .with_fqdn("acme-v02.api.letsencrypt.org"),
        );
        assert!(rule().evaluate(&request).is_allowed());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let rule = rule();
        let request = request_to(Endpoint::new("10.0.0.6".parse().unwrap(), 9092));
        let first = rule.evaluate(&request);
        for _ in 0..10 {
            assert_eq!(rule.evaluate(&request), first);
        }
    }

    #[test]
    fn empty_allow_list_denies_everything() {
        let rule = AllowListRule::default();
        let request = request_to(Endpoint::new("10.0.0.5".parse().unwrap(), 9092));
        assert_eq!(rule.evaluate(&request), Decision::Deny);
    }

    #[test]
    fn from_config_uses_defaults() {
        let rule = AllowListRule::from_config(&AllowListConfig::default()).unwrap();
        assert_eq!(rule.allowed_ips().count(), 0);
        assert_eq!(
            rule.allowed_fqdns().collect::<Vec<_>>(),
            vec!["acme-v02.api.letsencrypt.org"]
        );

        let bad = AllowListConfig {
            ips: vec!["not-an-ip".into()],
            fqdns: Vec::new(),
        };
        assert!(AllowListRule::from_config(&bad).is_err());
    }

    #[test]
    fn endpoint_display() {
        let plain = Endpoint::new("10.0.0.5".parse().unwrap(), 9092);
        assert_eq!(plain.to_string(), "10.0.0.5:9092");

        let named = Endpoint::new("::1".parse().unwrap(), 443).with_fqdn("localhost");
        assert_eq!(named.to_string(), "[::1]:443 (localhost)");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_evaluation_writes_one_audit_line() {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_level(false)
            .with_target(false)
            .finish();

        let allowed = request_to(Endpoint::new("10.0.0.5".parse().unwrap(), 9092));
        let denied =
            request_to(Endpoint::new("1.2.3.4".parse().unwrap(), 443).with_fqdn("evil.example.com"));

        tracing::subscriber::with_default(subscriber, || {
            let rule = rule();
            assert!(rule.evaluate(&allowed).is_allowed());
            assert!(!rule.evaluate(&denied).is_allowed());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "{output}");
        assert!(lines[0]
            .starts_with("Allowing connection request from 192.0.2.7:51234 to 10.0.0.5:9092."));
        assert!(lines[1].starts_with(
            "Denying connection request from 192.0.2.7:51234 to 1.2.3.4:443 (evil.example.com)."
        ));
    }
}
