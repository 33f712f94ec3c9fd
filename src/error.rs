use std::{fmt, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    #[cfg(feature = "x11")]
    X11(X11Error),
    NoDisplay,
    Io(std::io::Error),
    Args(lexopt::Error),
    Usage(String),
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    Font(String),
    Canvas(u32, u32),
    Qr(String),
    UnsupportedDialog(String),
}

#[cfg(feature = "x11")]
#[derive(Debug)]
pub enum X11Error {
    Connect(x11rb::errors::ConnectError),
    Connection(x11rb::errors::ConnectionError),
    Reply(x11rb::errors::ReplyError),
    NoVisual,
    Keyboard,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "x11")]
            Error::X11(e) => write!(f, "X11 error: {e}"),
            Error::NoDisplay => write!(f, "no display server available"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Args(e) => write!(f, "{e}"),
            Error::Usage(msg) => write!(f, "{msg}"),
            Error::Config {
                path,
                source,
            } => write!(f, "invalid config file {}: {source}", path.display()),
            Error::Font(msg) => write!(f, "font: {msg}"),
            Error::Canvas(w, h) => write!(f, "cannot allocate a {w}x{h} canvas"),
            Error::Qr(msg) => write!(f, "QR code: {msg}"),
            Error::UnsupportedDialog(name) => write!(f, "unsupported dialog type: --{name}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Args(e) => Some(e),
            Error::Config {
                source, ..
            } => Some(source),
            _ => None,
        }
    }
}

#[cfg(feature = "x11")]
impl fmt::Display for X11Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            X11Error::Connect(e) => write!(f, "connect: {e}"),
            X11Error::Connection(e) => write!(f, "connection: {e}"),
            X11Error::Reply(e) => write!(f, "reply: {e}"),
            X11Error::NoVisual => write!(f, "no suitable visual found"),
            X11Error::Keyboard => write!(f, "XKB keyboard setup failed"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<lexopt::Error> for Error {
    fn from(e: lexopt::Error) -> Self {
        Error::Args(e)
    }
}

#[cfg(feature = "x11")]
impl From<x11rb::errors::ConnectError> for Error {
    fn from(e: x11rb::errors::ConnectError) -> Self {
        Error::X11(X11Error::Connect(e))
    }
}

#[cfg(feature = "x11")]
impl From<x11rb::errors::ConnectionError> for Error {
    fn from(e: x11rb::errors::ConnectionError) -> Self {
        Error::X11(X11Error::Connection(e))
    }
}

#[cfg(feature = "x11")]
impl From<x11rb::errors::ReplyError> for Error {
    fn from(e: x11rb::errors::ReplyError) -> Self {
        Error::X11(X11Error::Reply(e))
    }
}

#[cfg(feature = "x11")]
impl From<x11rb::errors::ReplyOrIdError> for Error {
    fn from(e: x11rb::errors::ReplyOrIdError) -> Self {
        match e {
            x11rb::errors::ReplyOrIdError::ConnectionError(e) => {
                Error::X11(X11Error::Connection(e))
            }
            x11rb::errors::ReplyOrIdError::X11Error(e) => Error::X11(X11Error::Reply(e.into())),
            x11rb::errors::ReplyOrIdError::IdsExhausted => Error::X11(X11Error::NoVisual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_and_dialog_messages() {
        assert_eq!(
            Error::Usage("--width must be followed by a positive number".into()).to_string(),
            "--width must be followed by a positive number"
        );
        assert_eq!(
            Error::UnsupportedDialog("calendar".into()).to_string(),
            "unsupported dialog type: --calendar"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
