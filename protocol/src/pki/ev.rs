//! Extended Validation detection.
//!
//! A certificate is EV when any of its certificate policy OIDs is one of the
//! CA-specific EV policies below. The CA/Browser Forum generic EV OID
//! (2.23.140.1.1) alone does not qualify.

use super::certificate::Certificate;

/// Known EV certificate policy OIDs, one per issuing CA.
pub const EV_POLICY_OIDS: &[&str] = &[
    "2.16.840.1.114171.500.9",
    "1.2.392.200091.100.721.1",
    "1.3.6.1.4.1.6334.1.100.1",
    "2.16.528.1.1001.1.1.1.12.6.1.1.1",
    "2.16.756.1.89.1.2.1.1",
    "1.3.6.1.4.1.23223.2",
    "2.16.840.1.113733.1.7.23.6",
    "1.3.6.1.4.1.14370.1.6",
    "2.16.840.1.113733.1.7.48.1",
    "2.16.840.1.114404.1.1.2.4.1",
    "1.3.6.1.4.1.6449.1.2.1.5.1",
    "2.16.840.1.114413.1.7.23.3",
    "2.16.840.1.114414.1.7.23.3",
    "2.16.840.1.114412.2.1",
    "1.3.6.1.4.1.8024.0.2.100.1.2",
    "1.3.6.1.4.1.782.1.2.1.8.1",
    "2.16.840.1.114028.10.1.2",
    "1.3.6.1.4.1.4146.1.1",
];

pub fn is_ev_policy(oid: &str) -> bool {
    EV_POLICY_OIDS.contains(&oid)
}

impl Certificate {
    /// True when any certificate policy is a known EV policy.
    pub fn is_extended_validation(&self) -> bool {
        self.policy_oids().iter().any(|oid| is_ev_policy(oid))
    }
}
