//! Credit ledger error types.

/// Specific error conditions for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerErrorKind {
    /// The conditional debit found less balance than requested
    InsufficientFunds {
        /// Credits the operation tried to debit
        requested: i64,
        /// Credits available at the time of the attempt
        available: i64,
    },
    /// No subscription exists for the user
    SubscriptionNotFound(String),
    /// A subscription already exists for the user
    SubscriptionExists(String),
    /// Adjustment amount is not usable (zero, or negative where a debit is required)
    InvalidAmount(i64),
    /// Backing store failure
    Backend(String),
}

impl std::fmt::Display for LedgerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerErrorKind::InsufficientFunds {
                requested,
                available,
            } => write!(
                f,
                "Insufficient funds: requested {} credits, {} available",
                requested, available
            ),
            LedgerErrorKind::SubscriptionNotFound(user) => {
                write!(f, "No subscription found for user '{}'", user)
            }
            LedgerErrorKind::SubscriptionExists(user) => {
                write!(f, "Subscription already exists for user '{}'", user)
            }
            LedgerErrorKind::InvalidAmount(amount) => {
                write!(f, "Invalid adjustment amount: {}", amount)
            }
            LedgerErrorKind::Backend(msg) => write!(f, "Ledger backend error: {}", msg),
        }
    }
}

/// Ledger error with source location tracking.
///
/// # Examples
///
/// ```
/// use vermeer_error::{LedgerError, LedgerErrorKind};
///
/// let err = LedgerError::new(LedgerErrorKind::InsufficientFunds {
///     requested: 1,
///     available: 0,
/// });
/// assert!(format!("{}", err).contains("Insufficient funds"));
/// ```
#[derive(Debug, Clone)]
pub struct LedgerError {
    /// The kind of error that occurred
    pub kind: LedgerErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl LedgerError {
    /// Create a new LedgerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: LedgerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the debit was rejected for lack of balance.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self.kind, LedgerErrorKind::InsufficientFunds { .. })
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ledger Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for LedgerError {}

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for LedgerError {
    fn from(err: diesel::result::Error) -> Self {
        LedgerError::new(LedgerErrorKind::Backend(err.to_string()))
    }
}
