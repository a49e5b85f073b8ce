//! The request/reply verb model, replacing the original's chained string
//! matching with a tagged enum and a single parse/render pair per direction.

use crate::error::ProtocolError;

/// A request frame the controller sends to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Hello,
    Exit,
    Processes,
    SysInfo,
    Disk,
    ListDir { path: String },
    CheckFile { path: String },
    RequestFile { path: String },
    SendFile { basename: String, payload_b64: String },
}

impl Request {
    pub fn render(&self) -> String {
        match self {
            Request::Hello => "hello".to_string(),
            Request::Exit => "exit".to_string(),
            Request::Processes => "processes".to_string(),
            Request::SysInfo => "sysinfo".to_string(),
            Request::Disk => "disk".to_string(),
            Request::ListDir { path } => format!("listdir|{path}"),
            Request::CheckFile { path } => format!("checkfile|{path}"),
            Request::RequestFile { path } => format!("request|{path}"),
            Request::SendFile {
                basename,
                payload_b64,
            } => format!("sendfile|{basename}|{payload_b64}"),
        }
    }

    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let (verb, rest) = split_verb(frame);
        match verb {
            "hello" => Ok(Request::Hello),
            "exit" => Ok(Request::Exit),
            "processes" => Ok(Request::Processes),
            "sysinfo" => Ok(Request::SysInfo),
            "disk" => Ok(Request::Disk),
            "listdir" => Ok(Request::ListDir {
                path: rest.ok_or(malformed("listdir", "missing path"))?.to_string(),
            }),
            "checkfile" => Ok(Request::CheckFile {
                path: rest
                    .ok_or(malformed("checkfile", "missing path"))?
                    .to_string(),
            }),
            "request" => Ok(Request::RequestFile {
                path: rest.ok_or(malformed("request", "missing path"))?.to_string(),
            }),
            "sendfile" => {
                let rest = rest.ok_or(malformed("sendfile", "missing payload"))?;
                let (basename, payload) = rest
                    .split_once('|')
                    .ok_or(malformed("sendfile", "missing `|` before payload"))?;
                Ok(Request::SendFile {
                    basename: basename.to_string(),
                    payload_b64: payload.to_string(),
                })
            }
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }
}

/// A reply frame an agent sends back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Hello,
    Processes { body: String },
    SysInfo { body: String },
    DiskInfo { body: String },
    DirListing { body: String },
    DirNotFound,
    PermissionDenied,
    NotADirectory,
    CheckFile { exists: bool },
    Send { payload_b64: String },
    SendDenied,
}

impl Reply {
    pub fn render(&self) -> String {
        match self {
            Reply::Hello => "hello".to_string(),
            Reply::Processes { body } => format!("processes|{body}"),
            Reply::SysInfo { body } => format!("sysinfo| {body}"),
            Reply::DiskInfo { body } => format!("diskinfo| {body}"),
            Reply::DirListing { body } => format!("dirlisting| {body}"),
            Reply::DirNotFound => "Directory not found".to_string(),
            Reply::PermissionDenied => "Permission denied".to_string(),
            Reply::NotADirectory => "Not a directory".to_string(),
            Reply::CheckFile { exists } => {
                format!("checkfile|{}", if *exists { 1 } else { 0 })
            }
            Reply::Send { payload_b64 } => format!("send|{payload_b64}"),
            Reply::SendDenied => "send|denied".to_string(),
        }
    }

    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        match frame {
            "hello" => return Ok(Reply::Hello),
            "Directory not found" => return Ok(Reply::DirNotFound),
            "Permission denied" => return Ok(Reply::PermissionDenied),
            "Not a directory" => return Ok(Reply::NotADirectory),
            _ => {}
        }

        let (verb, rest) = split_verb(frame);
        match verb {
            "processes" => Ok(Reply::Processes {
                body: rest.unwrap_or_default().to_string(),
            }),
            "sysinfo" => Ok(Reply::SysInfo {
                body: strip_leading_space(rest.unwrap_or_default()).to_string(),
            }),
            "diskinfo" => Ok(Reply::DiskInfo {
                body: strip_leading_space(rest.unwrap_or_default()).to_string(),
            }),
            "dirlisting" => Ok(Reply::DirListing {
                body: strip_leading_space(rest.unwrap_or_default()).to_string(),
            }),
            "checkfile" => match rest {
                Some("1") => Ok(Reply::CheckFile { exists: true }),
                Some("0") => Ok(Reply::CheckFile { exists: false }),
                _ => Err(malformed("checkfile", "expected 0 or 1")),
            },
            "send" => match rest {
                Some("denied") => Ok(Reply::SendDenied),
                Some(payload) => Ok(Reply::Send {
                    payload_b64: payload.to_string(),
                }),
                None => Err(malformed("send", "missing payload")),
            },
            other => Err(ProtocolError::UnknownVerb(other.to_string())),
        }
    }
}

fn split_verb(frame: &str) -> (&str, Option<&str>) {
    match frame.split_once('|') {
        Some((verb, rest)) => (verb, Some(rest)),
        None => (frame, None),
    }
}

fn strip_leading_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

fn malformed(verb: &'static str, reason: &str) -> ProtocolError {
    ProtocolError::MalformedPayload {
        verb,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips() {
        let reqs = [
            Request::Hello,
            Request::Exit,
            Request::Processes,
            Request::SysInfo,
            Request::Disk,
            Request::ListDir {
                path: "/etc".to_string(),
            },
            Request::CheckFile {
                path: "/etc/hostname".to_string(),
            },
            Request::RequestFile {
                path: "/etc/hostname".to_string(),
            },
            Request::SendFile {
                basename: "payload.bin".to_string(),
                payload_b64: "aGVsbG8=".to_string(),
            },
        ];
        for req in reqs {
            let rendered = req.render();
            assert_eq!(Request::parse(&rendered).unwrap(), req);
        }
    }

    #[test]
    fn reply_forms_preserve_leading_space_quirk() {
        let reply = Reply::SysInfo {
            body: "cpu: 4 cores".to_string(),
        };
        assert_eq!(reply.render(), "sysinfo| cpu: 4 cores");
        assert_eq!(Reply::parse(&reply.render()).unwrap(), reply);
    }

    #[test]
    fn reply_sentinel_bodies() {
        assert_eq!(
            Reply::parse("Directory not found").unwrap(),
            Reply::DirNotFound
        );
        assert_eq!(
            Reply::parse("Permission denied").unwrap(),
            Reply::PermissionDenied
        );
        assert_eq!(
            Reply::parse("Not a directory").unwrap(),
            Reply::NotADirectory
        );
    }

    #[test]
    fn checkfile_reply_round_trips() {
        assert_eq!(
            Reply::parse(&Reply::CheckFile { exists: true }.render()).unwrap(),
            Reply::CheckFile { exists: true }
        );
        assert_eq!(
            Reply::parse(&Reply::CheckFile { exists: false }.render()).unwrap(),
            Reply::CheckFile { exists: false }
        );
    }

    #[test]
    fn send_denied_round_trips() {
        assert_eq!(Reply::SendDenied.render(), "send|denied");
        assert_eq!(Reply::parse("send|denied").unwrap(), Reply::SendDenied);
    }

    #[test]
    fn unknown_verb_is_an_error() {
        assert!(matches!(
            Request::parse("frobnicate"),
            Err(ProtocolError::UnknownVerb(_))
        ));
    }
}
