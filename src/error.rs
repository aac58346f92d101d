//! Module containing the definition of error types.
//!
//! Every failure the client can run into is classified into a [`Kind`]. Its `Display`
//! implementation is the message shown to the user, so no raw transport error ever reaches the
//! output.

use failure::Fail;

/// Enumeration of the different error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Kind {
    /// No package was selected when the analysis was requested.
    #[fail(display = "no file selected, please select an APK file to analyze")]
    NoFileSelected,
    /// The selected package did not pass local validation.
    #[fail(display = "{}", message)]
    Validation {
        /// Error message.
        message: String,
    },
    /// The request never got a response.
    #[fail(
        display = "unable to connect to the analysis server, please check your connection and \
                   try again"
    )]
    Connection,
    /// The request took longer than the configured timeout.
    #[fail(display = "analysis timed out, the file may be too large or complex to analyze")]
    Timeout,
    /// The server could not parse the uploaded package (HTTP 422).
    #[fail(display = "could not parse the APK file, the file may be corrupted or invalid")]
    InvalidPackage,
    /// The server failed while processing the request (HTTP 5xx).
    #[fail(display = "server error ({}), please try again later", status)]
    Server {
        /// HTTP status code.
        status: u16,
    },
    /// The server rejected the request (HTTP 4xx other than 422).
    #[fail(display = "the analysis request was rejected by the server ({})", status)]
    Request {
        /// HTTP status code.
        status: u16,
    },
    /// The server answered with a body that could not be understood.
    #[fail(display = "the analysis server returned an invalid response")]
    InvalidResponse,
    /// The report document could not be decoded.
    #[fail(display = "failed to process report data")]
    Decode,
    /// The run was superseded by a newer one or explicitly reset.
    #[fail(display = "the analysis was cancelled")]
    Cancelled,
    /// Local input/output error.
    #[fail(display = "input/output error: {}", message)]
    Io {
        /// Error message.
        message: String,
    },
    /// Configuration error.
    #[fail(display = "there was an error in the configuration: {}", message)]
    Config {
        /// Error message.
        message: String,
    },
    /// Parsing error.
    #[fail(display = "there was an error in the parsing process")]
    Parse,
}

impl Kind {
    /// Classifies an unsuccessful HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            422 => Kind::InvalidPackage,
            500..=599 => Kind::Server { status },
            _ => Kind::Request { status },
        }
    }
}

impl From<reqwest::Error> for Kind {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Kind::Timeout
        } else if let Some(status) = error.status() {
            Kind::from_status(status.as_u16())
        } else if error.is_decode() {
            Kind::InvalidResponse
        } else {
            Kind::Connection
        }
    }
}

impl From<std::io::Error> for Kind {
    fn from(error: std::io::Error) -> Self {
        Kind::Io {
            message: error.to_string(),
        }
    }
}

impl<'k> From<&'k Kind> for i32 {
    fn from(kind: &Kind) -> i32 {
        match *kind {
            Kind::Parse => 20,
            Kind::Validation { .. } | Kind::NoFileSelected => 30,
            Kind::InvalidPackage => 40,
            Kind::Config { .. } => 50,
            Kind::Connection | Kind::Timeout => 60,
            Kind::Server { .. } | Kind::Request { .. } | Kind::InvalidResponse => 70,
            Kind::Decode => 80,
            Kind::Io { .. } => 100,
            Kind::Cancelled => 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Kind;

    #[test]
    fn it_status_classification() {
        assert_eq!(Kind::from_status(422), Kind::InvalidPackage);
        assert_eq!(Kind::from_status(500), Kind::Server { status: 500 });
        assert_eq!(Kind::from_status(503), Kind::Server { status: 503 });
        assert_eq!(Kind::from_status(404), Kind::Request { status: 404 });
        assert_eq!(Kind::from_status(400), Kind::Request { status: 400 });
    }

    #[test]
    fn it_user_messages() {
        assert!(Kind::InvalidPackage
            .to_string()
            .contains("could not parse the APK file"));
        assert!(Kind::Server { status: 502 }
            .to_string()
            .contains("try again later"));
        assert!(Kind::Timeout.to_string().contains("timed out"));
        assert_eq!(Kind::Decode.to_string(), "failed to process report data");
        assert_eq!(
            Kind::Validation {
                message: "File is empty".to_owned()
            }
            .to_string(),
            "File is empty"
        );
    }

    #[test]
    fn it_exit_codes() {
        assert_eq!(i32::from(&Kind::Parse), 20);
        assert_eq!(i32::from(&Kind::NoFileSelected), 30);
        assert_eq!(i32::from(&Kind::Cancelled), 130);
    }
}
