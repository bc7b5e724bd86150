//! Remote flag read path (door node).
//!
//! Fetches the shared document every loop iteration — no caching beyond the
//! last successfully decoded value. Failure policy is **fail-open to the
//! last known value**: a transport error, bad status or malformed payload
//! leaves the flag as previously computed and logs a warning, so one flaky
//! fetch cannot flap the actuation gate. At boot, before any successful
//! fetch, the flag is `false` (fail-closed: there is no trustworthy
//! last-known value yet).

use log::warn;

use super::document;
use crate::app::ports::HttpPort;
use crate::config::NodeConfig;
use crate::error::Error;

pub struct FlagOracle {
    url: String,
    auth_header: String,
    last_known: bool,
}

impl FlagOracle {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            url: config.document_url(),
            auth_header: format!("token {}", config.github_token),
            last_known: false,
        }
    }

    /// Fetch and decode the flag, returning the freshest value available.
    /// Never fails the caller's loop.
    pub fn refresh(&mut self, http: &mut impl HttpPort) -> bool {
        match self.try_fetch(http) {
            Ok(value) => {
                self.last_known = value;
                value
            }
            Err(e) => {
                warn!("flag oracle: fetch failed ({e}), keeping sensor2={}", self.last_known);
                self.last_known
            }
        }
    }

    /// Last successfully decoded flag value.
    pub fn current(&self) -> bool {
        self.last_known
    }

    fn try_fetch(&mut self, http: &mut impl HttpPort) -> Result<bool, Error> {
        let headers = [
            ("Authorization", self.auth_header.as_str()),
            ("Accept", "application/vnd.github.v3+json"),
            ("User-Agent", "doorlink"),
        ];
        let resp = http.get(&self.url, &headers)?;
        if !resp.is_success() {
            return Err(crate::error::CommsError::HttpStatus(resp.status).into());
        }
        Ok(document::parse_document(&resp.body)?.sensor2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{HttpPort, HttpResponse};
    use crate::error::CommsError;
    use crate::remote::b64;

    /// Scripted HTTP stub: pops one canned result per request.
    struct ScriptedHttp {
        responses: Vec<Result<HttpResponse, CommsError>>,
    }

    impl HttpPort for ScriptedHttp {
        fn get(
            &mut self,
            _url: &str,
            _headers: &[(&str, &str)],
        ) -> Result<HttpResponse, CommsError> {
            self.responses.remove(0)
        }

        fn put(
            &mut self,
            _url: &str,
            _headers: &[(&str, &str)],
            _body: &str,
        ) -> Result<HttpResponse, CommsError> {
            unreachable!("oracle never writes")
        }
    }

    fn ok_envelope(flag: bool) -> Result<HttpResponse, CommsError> {
        let content = b64::encode(format!("{{\"sensor2\": {flag}}}").as_bytes());
        Ok(HttpResponse {
            status: 200,
            body: format!(r#"{{"content": "{content}", "sha": "r1"}}"#),
        })
    }

    #[test]
    fn defaults_false_before_first_fetch() {
        let oracle = FlagOracle::new(&NodeConfig::door_node());
        assert!(!oracle.current());
    }

    #[test]
    fn refresh_tracks_remote_value() {
        let mut oracle = FlagOracle::new(&NodeConfig::door_node());
        let mut http = ScriptedHttp {
            responses: vec![ok_envelope(true), ok_envelope(false)],
        };
        assert!(oracle.refresh(&mut http));
        assert!(!oracle.refresh(&mut http));
    }

    #[test]
    fn failure_keeps_last_known_value() {
        let mut oracle = FlagOracle::new(&NodeConfig::door_node());
        let mut http = ScriptedHttp {
            responses: vec![
                ok_envelope(true),
                Err(CommsError::HttpTransport),
                Ok(HttpResponse { status: 500, body: String::new() }),
                Ok(HttpResponse { status: 200, body: "garbage".into() }),
            ],
        };
        assert!(oracle.refresh(&mut http));
        // Transport error, bad status, bad payload: all keep true.
        assert!(oracle.refresh(&mut http));
        assert!(oracle.refresh(&mut http));
        assert!(oracle.refresh(&mut http));
    }
}
