//! Names of the methods the daemon registers at startup.

use strum::{Display, EnumString, IntoStaticStr};

/// Built-in method names.
///
/// The wire carries method names as strings, so callers may also invoke
/// names outside this enum; the daemon answers those with an unknown-method
/// error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    /// Liveness probe reporting uptime.
    Ping,
    /// Stores a file and records an audit entry.
    UploadFile,
    /// Lists files received since startup.
    ListFiles,
    /// Removes a file from the catalogue.
    DeleteFile,
    /// Reports the balance of an account.
    CheckBalance,
    /// Records a payment against an account.
    MakePayment,
    /// Reports a student's grades.
    GetGrades,
    /// Reports the weekly timetable.
    GetTimetable,
    /// Accepts an assignment submission.
    SubmitAssignment,
}

/// Errors raised when parsing a [`Method`] from text.
pub type MethodParseError = strum::ParseError;

impl Method {
    /// Every built-in method, in registration order.
    pub const ALL: [Self; 9] = [
        Self::Ping,
        Self::UploadFile,
        Self::ListFiles,
        Self::DeleteFile,
        Self::CheckBalance,
        Self::MakePayment,
        Self::GetGrades,
        Self::GetTimetable,
        Self::SubmitAssignment,
    ];

    /// The wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
