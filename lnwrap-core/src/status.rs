//! # Status Classifier
//!
//! Maps a failed call's [`tonic::Status`] onto one of three retry-relevant
//! fault kinds. The partition encodes a retry-safety contract at the type
//! level: a [`FaultKind::Client`] failure means fix the request and resend,
//! [`FaultKind::Communication`] means the call is safe to retry as-is, and
//! [`FaultKind::Server`] means escalate or back off. The classifier only
//! labels; it never retries.

use crate::BoxError;
use tonic::Code;

/// The retry-relevant classification of an RPC failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The request itself was at fault; resending it unchanged will fail
    /// again.
    Client,
    /// A transient transport condition; retrying the same request is safe.
    Communication,
    /// A server-side problem, or a failure that could not be classified.
    Server,
}

/// A classified RPC failure, created exactly once at the boundary where a
/// raw transport failure is observed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RpcFailure {
    kind: FaultKind,
    code: Option<Code>,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl RpcFailure {
    /// A locally detected client-side failure with no transport status, such
    /// as a message that could not be decoded or validated.
    pub fn client(message: impl Into<String>, cause: BoxError) -> Self {
        Self {
            kind: FaultKind::Client,
            code: None,
            message: message.into(),
            cause: Some(cause),
        }
    }

    /// A failure carrying no recognizable status at all.
    pub fn unclassified(cause: BoxError) -> Self {
        Self {
            kind: FaultKind::Server,
            code: None,
            message: "internal error, cannot classify".to_string(),
            cause: Some(cause),
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// The original status code, when the failure carried one.
    pub fn code(&self) -> Option<Code> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Classifies a failed call's status into an [`RpcFailure`].
pub fn classify(status: tonic::Status) -> RpcFailure {
    let kind = match status.code() {
        Code::Cancelled
        | Code::InvalidArgument
        | Code::NotFound
        | Code::AlreadyExists
        | Code::PermissionDenied
        | Code::OutOfRange
        | Code::Unauthenticated => FaultKind::Client,
        Code::DeadlineExceeded | Code::Unavailable => FaultKind::Communication,
        _ => FaultKind::Server,
    };
    RpcFailure {
        kind,
        code: Some(status.code()),
        message: status.message().to_string(),
        cause: Some(Box::new(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_fault_codes() {
        let codes = [
            Code::Cancelled,
            Code::InvalidArgument,
            Code::NotFound,
            Code::AlreadyExists,
            Code::PermissionDenied,
            Code::OutOfRange,
            Code::Unauthenticated,
        ];
        for code in codes {
            let failure = classify(tonic::Status::new(code, "boom"));
            assert_eq!(failure.kind(), FaultKind::Client, "code {code:?}");
            assert_eq!(failure.code(), Some(code));
        }
    }

    #[test]
    fn communication_fault_codes() {
        for code in [Code::DeadlineExceeded, Code::Unavailable] {
            let failure = classify(tonic::Status::new(code, "boom"));
            assert_eq!(failure.kind(), FaultKind::Communication, "code {code:?}");
        }
    }

    #[test]
    fn remaining_codes_are_server_faults() {
        let codes = [
            Code::Unknown,
            Code::FailedPrecondition,
            Code::Aborted,
            Code::Unimplemented,
            Code::Internal,
            Code::DataLoss,
            Code::ResourceExhausted,
        ];
        for code in codes {
            let failure = classify(tonic::Status::new(code, "boom"));
            assert_eq!(failure.kind(), FaultKind::Server, "code {code:?}");
        }
    }

    #[test]
    fn statusless_failure_is_a_server_fault() {
        let failure = RpcFailure::unclassified("connection reset".into());
        assert_eq!(failure.kind(), FaultKind::Server);
        assert_eq!(failure.code(), None);
        assert_eq!(failure.message(), "internal error, cannot classify");
    }
}
