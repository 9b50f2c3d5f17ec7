//! Errors for roster operations.

use crate::models::player::PlayerId;
use crate::store::StorageError;
use crate::sync::RemoteError;

/// Errors that can occur during roster operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RosterError {
    /// A required field was empty.
    MissingField(&'static str),
    /// A date was not in `YYYY-MM-DD` form.
    InvalidDate(String),
    /// Convocation headcount outside 11..=18.
    ConvocationSize { called: usize },
    /// League journey already used by another match result.
    DuplicateJourney { journey: String, rival: String },
    /// Same league journey twice in one submission.
    JourneyRepeated(String),
    /// A result submission without any complete journey block.
    NoValidJourney,
    /// No convocation exists for the match date.
    NoConvocation(String),
    /// The player was not called up for the match date.
    NotConvocated { player_id: PlayerId, date: String },
    /// A player with this name exists; resend with confirmation to add anyway.
    DuplicatePlayerName(String),
    /// A session exists for this date; resend with overwrite to replace it.
    SessionExists(String),
    /// A convocation exists for this date; resend with overwrite to replace it.
    ConvocationExists(String),
    /// The player already has an entry for this date; resend with overwrite to replace it.
    MatchEntryExists { player_id: PlayerId, date: String },
    /// Record not found.
    NotFound { kind: &'static str, id: String },
    /// Full reset requested without both confirmations.
    ResetNotConfirmed,
    /// Settings payload rejected.
    InvalidConfig(String),
    /// Statistics could not be written as CSV.
    Export(String),
    /// Wrong email or password.
    InvalidCredentials,
    /// Operation requires a signed-in user.
    Unauthorized,
    Storage(StorageError),
    Remote(RemoteError),
}

impl RosterError {
    /// True for conflicts the caller may resolve by confirming (overwrite / add anyway).
    pub fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            RosterError::DuplicatePlayerName(_)
                | RosterError::SessionExists(_)
                | RosterError::ConvocationExists(_)
                | RosterError::MatchEntryExists { .. }
        )
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        RosterError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::MissingField(field) => write!(f, "Missing required field: {}", field),
            RosterError::InvalidDate(date) => write!(f, "Invalid date '{}', expected YYYY-MM-DD", date),
            RosterError::ConvocationSize { called } => write!(
                f,
                "A convocation needs between 11 and 18 called-up players (currently {})",
                called
            ),
            RosterError::DuplicateJourney { journey, rival } => write!(
                f,
                "Journey {} is already played against {}; only one match per league journey",
                journey, rival
            ),
            RosterError::JourneyRepeated(journey) => {
                write!(f, "Journey {} appears more than once in the submission", journey)
            }
            RosterError::NoValidJourney => write!(f, "At least one match needs a journey and a location"),
            RosterError::NoConvocation(date) => write!(f, "No convocation registered for {}", date),
            RosterError::NotConvocated { date, .. } => {
                write!(f, "This player is not called up for the match on {}", date)
            }
            RosterError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' already exists", name)
            }
            RosterError::SessionExists(date) => write!(f, "A session already exists on {}", date),
            RosterError::ConvocationExists(date) => {
                write!(f, "A convocation already exists for {}", date)
            }
            RosterError::MatchEntryExists { date, .. } => {
                write!(f, "This player already has match data for {}", date)
            }
            RosterError::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            RosterError::ResetNotConfirmed => write!(f, "Reset cancelled: confirmation missing"),
            RosterError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            RosterError::Export(msg) => write!(f, "Export failed: {}", msg),
            RosterError::InvalidCredentials => write!(f, "Invalid email or password"),
            RosterError::Unauthorized => write!(f, "Sign in required"),
            RosterError::Storage(e) => write!(f, "Storage error: {}", e),
            RosterError::Remote(e) => write!(f, "Remote error: {}", e),
        }
    }
}

impl std::error::Error for RosterError {}

impl From<StorageError> for RosterError {
    fn from(e: StorageError) -> Self {
        RosterError::Storage(e)
    }
}

impl From<RemoteError> for RosterError {
    fn from(e: RemoteError) -> Self {
        RosterError::Remote(e)
    }
}
