//! WhatsApp notification adapter (callmebot gateway).
//!
//! Implements [`NotifyPort`] as a single templated GET:
//!
//! ```text
//! https://api.callmebot.com/whatsapp.php?phone=<phone>&text=<escaped>&apikey=<key>
//! ```
//!
//! The gateway only needs spaces escaped for the message text; everything
//! else in the configured message is plain ASCII.

use log::{info, warn};

use crate::app::ports::{HttpPort, NotifyPort};
use crate::config::NodeConfig;
use crate::error::CommsError;

/// Escape spaces as `%20` for the query string.
pub fn escape_spaces(text: &str) -> String {
    text.replace(' ', "%20")
}

pub struct CallmebotNotifier<H> {
    http: H,
    phone: String,
    apikey: String,
}

impl<H: HttpPort> CallmebotNotifier<H> {
    pub fn new(http: H, config: &NodeConfig) -> Self {
        Self {
            http,
            phone: config.notify_phone.to_string(),
            apikey: config.notify_apikey.to_string(),
        }
    }

    fn url_for(&self, text: &str) -> String {
        format!(
            "https://api.callmebot.com/whatsapp.php?phone={}&text={}&apikey={}",
            self.phone,
            escape_spaces(text),
            self.apikey
        )
    }
}

impl<H: HttpPort> NotifyPort for CallmebotNotifier<H> {
    fn send_message(&mut self, text: &str) -> Result<(), CommsError> {
        let url = self.url_for(text);
        let response = self.http.get(&url, &[])?;
        if !response.is_success() {
            warn!("notify: gateway returned {}", response.status);
            return Err(CommsError::HttpStatus(response.status));
        }
        info!("notify: message delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;

    struct CapturingHttp {
        last_url: Option<String>,
        status: u16,
    }

    impl HttpPort for CapturingHttp {
        fn get(&mut self, url: &str, _h: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
            self.last_url = Some(url.to_owned());
            Ok(HttpResponse {
                status: self.status,
                body: String::new(),
            })
        }

        fn put(
            &mut self,
            _url: &str,
            _h: &[(&str, &str)],
            _body: &str,
        ) -> Result<HttpResponse, CommsError> {
            unreachable!("notifier never issues PUT")
        }
    }

    fn notifier(status: u16) -> CallmebotNotifier<CapturingHttp> {
        let mut cfg = NodeConfig::door_node();
        cfg.notify_phone = crate::config::CfgString::try_from("+5584999990000").unwrap();
        cfg.notify_apikey = crate::config::CfgString::try_from("123456").unwrap();
        CallmebotNotifier::new(
            CapturingHttp {
                last_url: None,
                status,
            },
            &cfg,
        )
    }

    #[test]
    fn spaces_are_percent_escaped() {
        assert_eq!(escape_spaces("door is open"), "door%20is%20open");
        assert_eq!(escape_spaces("nospace"), "nospace");
    }

    #[test]
    fn builds_the_gateway_url() {
        let mut n = notifier(200);
        n.send_message("close the door").unwrap();
        let url = n.http.last_url.as_deref().unwrap();
        assert!(url.starts_with("https://api.callmebot.com/whatsapp.php?phone=+5584999990000"));
        assert!(url.contains("&text=close%20the%20door&"));
        assert!(url.ends_with("&apikey=123456"));
    }

    #[test]
    fn non_2xx_surfaces_as_error() {
        let mut n = notifier(503);
        assert_eq!(
            n.send_message("hi"),
            Err(CommsError::HttpStatus(503))
        );
    }
}
