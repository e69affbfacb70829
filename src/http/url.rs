//! Structural decomposition of HTTP request targets.
//!
//! Splits a raw request-target into its structural fields without decoding
//! or normalizing anything. Decomposition never fails: structure that is not
//! recognized simply degrades to absent fields.

/// Byte range of one structural field inside the raw target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// The structural fields found in a request target, as spans into the raw
/// text. A `None` field was not present at all; spans are never empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetInfo {
    pub scheme: Option<Span>,
    pub user_info: Option<Span>,
    pub host: Option<Span>,
    pub port: Option<u16>,
    pub path: Option<Span>,
    pub query: Option<Span>,
    pub fragment: Option<Span>,
}

impl TargetInfo {
    /// Scans a request target for structural fields.
    ///
    /// `is_connect` switches to authority-form parsing (`host:port`, no
    /// path), which is what a CONNECT request line carries.
    pub fn scan(target: &str, is_connect: bool) -> Self {
        let mut info = TargetInfo::default();
        let bytes = target.as_bytes();
        if bytes.is_empty() {
            return info;
        }

        if is_connect {
            info.scan_authority(target, 0, target.len());
            return info;
        }

        // origin-form ("/path?q#f") and asterisk-form ("*")
        if bytes[0] == b'/' || bytes[0] == b'*' {
            info.scan_path_and_after(target, 0);
            return info;
        }

        // absolute-form: scheme "://" authority [path...]
        let Some(sep) = target.find("://") else {
            return info;
        };
        let scheme = &bytes[..sep];
        let scheme_ok = !scheme.is_empty()
            && scheme[0].is_ascii_alphabetic()
            && scheme
                .iter()
                .all(|&c| c.is_ascii_alphanumeric() || c == b'+' || c == b'-' || c == b'.');
        if !scheme_ok {
            return info;
        }
        info.scheme = span(0, sep);

        let auth_start = sep + 3;
        let auth_end = bytes[auth_start..]
            .iter()
            .position(|&c| c == b'/' || c == b'?' || c == b'#')
            .map_or(target.len(), |p| auth_start + p);
        info.scan_authority(target, auth_start, auth_end);

        if auth_end < target.len() {
            info.scan_path_and_after(target, auth_end);
        }
        info
    }

    /// `[userinfo@]host[:port]`, with IPv6 literals in brackets.
    fn scan_authority(&mut self, target: &str, start: usize, end: usize) {
        let bytes = target.as_bytes();
        if start >= end {
            return;
        }

        let host_start = match bytes[start..end].iter().position(|&c| c == b'@') {
            Some(p) => {
                self.user_info = span(start, start + p);
                start + p + 1
            }
            None => start,
        };
        if host_start >= end {
            return;
        }

        if bytes[host_start] == b'[' {
            let Some(close) = bytes[host_start..end].iter().position(|&c| c == b']') else {
                return;
            };
            let close = host_start + close;
            self.host = span(host_start + 1, close);
            if close + 1 < end && bytes[close + 1] == b':' {
                self.port = target[close + 2..end].parse().ok();
            }
            return;
        }

        match bytes[host_start..end].iter().position(|&c| c == b':') {
            Some(p) => {
                let colon = host_start + p;
                self.host = span(host_start, colon);
                self.port = target[colon + 1..end].parse().ok();
            }
            None => self.host = span(host_start, end),
        }
    }

    fn scan_path_and_after(&mut self, target: &str, start: usize) {
        let bytes = target.as_bytes();
        let frag_at = bytes[start..]
            .iter()
            .position(|&c| c == b'#')
            .map(|p| start + p);
        let before_frag = frag_at.unwrap_or(target.len());
        let query_at = bytes[start..before_frag]
            .iter()
            .position(|&c| c == b'?')
            .map(|p| start + p);

        let path_end = query_at.unwrap_or(before_frag);
        self.path = span(start, path_end);
        if let Some(q) = query_at {
            self.query = span(q + 1, before_frag);
        }
        if let Some(h) = frag_at {
            self.fragment = span(h + 1, target.len());
        }
    }
}

fn span(start: usize, end: usize) -> Option<Span> {
    (start < end).then_some(Span { start, end })
}

/// A structurally decomposed request target.
///
/// Fields the target did not carry are `None`. The query string is kept raw
/// so the application layer can run its own key-value decoding over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    pub scheme: Option<String>,
    pub user_info: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Url {
    /// Extracts the fields named by `info` out of the raw target text.
    pub fn from_target(target: &str, info: &TargetInfo) -> Self {
        let get = |field: Option<Span>| field.map(|s| target[s.start..s.end].to_string());
        Self {
            scheme: get(info.scheme),
            user_info: get(info.user_info),
            host: get(info.host),
            port: info.port,
            path: get(info.path),
            query: get(info.query),
            fragment: get(info.fragment),
        }
    }

    /// Scans and extracts in one step.
    pub fn parse(target: &str, is_connect: bool) -> Self {
        Self::from_target(target, &TargetInfo::scan(target, is_connect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_spans() {
        let info = TargetInfo::scan("/path?x=1#frag", false);

        assert_eq!(info.path, Some(Span { start: 0, end: 5 }));
        assert_eq!(info.query, Some(Span { start: 6, end: 9 }));
        assert_eq!(info.fragment, Some(Span { start: 10, end: 14 }));
        assert_eq!(info.scheme, None);
        assert_eq!(info.host, None);
    }
}
