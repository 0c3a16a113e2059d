//! Error types for the certificate trust engine.

use thiserror::Error;

/// Everything that can go wrong while parsing, classifying or validating a
/// certificate bundle.
#[derive(Debug, Error)]
pub enum CertificateError {
    /// A PEM block or its DER body could not be parsed.
    #[error("unable to parse certificate: {0}")]
    Parse(String),

    /// The bundle contained no `CERTIFICATE` blocks at all.
    #[error("certificate bundle is empty")]
    EmptyBundle,

    /// No certificate in the bundle qualifies as a client (leaf) certificate.
    #[error("client certificate not found in certificate bundle")]
    ClientCertificateNotFound,

    /// Current time is before the certificate's `notBefore`.
    #[error("certificate not valid until {not_before}")]
    NotYetValid {
        /// RFC 3339 rendering of `notBefore`.
        not_before: String,
    },

    /// Current time is after the certificate's `notAfter`.
    #[error("certificate expired on {not_after}")]
    Expired {
        /// RFC 3339 rendering of `notAfter`.
        not_after: String,
    },

    /// The certificate's serial appears on a CRL.
    #[error("certificate revoked, listed by distribution point {distribution_point}")]
    Revoked {
        /// The CRL distribution point that listed the serial.
        distribution_point: String,
    },

    /// A CRL could not be downloaded (network error, timeout, HTTP error).
    #[error("unable to fetch CRL from {distribution_point}: {reason}")]
    CrlUnavailable {
        distribution_point: String,
        reason: String,
    },

    /// A downloaded CRL could not be parsed.
    #[error("invalid CRL from {distribution_point}: {reason}")]
    InvalidCrl {
        distribution_point: String,
        reason: String,
    },

    /// The distribution point uses a scheme the fetcher cannot serve.
    #[error("can not download CRL from certificate distribution point: {0}")]
    UnsupportedDistributionPoint(String),

    /// The CRL fetcher itself could not be constructed.
    #[error("CRL fetcher setup failed: {0}")]
    FetcherSetup(String),
}

impl CertificateError {
    /// True for failures that come from the revocation check rather than
    /// from the certificate itself.
    pub fn is_revocation_failure(&self) -> bool {
        matches!(
            self,
            Self::Revoked { .. }
                | Self::CrlUnavailable { .. }
                | Self::InvalidCrl { .. }
                | Self::UnsupportedDistributionPoint(_)
        )
    }
}
