//! Blocking HTTP client adapter.
//!
//! Implements [`HttpPort`] over `EspHttpConnection` with the platform
//! certificate bundle, so the GitHub and callmebot TLS endpoints verify
//! without shipping certificates in the image. Responses are read to
//! completion in one call; bodies here are at most a few KiB.
//!
//! On non-espidf targets every exchange fails with a transport error. Tests
//! drive the domain through scripted [`HttpPort`] stubs instead.

use log::debug;

use crate::app::ports::{HttpPort, HttpResponse};
use crate::error::CommsError;

pub struct HttpAdapter {
    #[cfg(feature = "espidf")]
    client: embedded_svc::http::client::Client<esp_idf_svc::http::client::EspHttpConnection>,
}

impl HttpAdapter {
    #[cfg(feature = "espidf")]
    pub fn new() -> crate::error::Result<Self> {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let conf = Configuration {
            timeout: Some(core::time::Duration::from_secs(10)),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|_| crate::error::Error::Init("http client"))?;
        Ok(Self {
            client: embedded_svc::http::client::Client::wrap(conn),
        })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {})
    }

    #[cfg(feature = "espidf")]
    fn exchange(
        &mut self,
        method: embedded_svc::http::Method,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse, CommsError> {
        use embedded_svc::io::{Read, Write};

        let mut request = self
            .client
            .request(method, url, headers)
            .map_err(|_| CommsError::HttpTransport)?;
        if let Some(body) = body {
            request
                .write_all(body.as_bytes())
                .map_err(|_| CommsError::HttpTransport)?;
        }
        let mut response = request.submit().map_err(|_| CommsError::HttpTransport)?;
        let status = response.status();

        let mut body = Vec::new();
        let mut chunk = [0_u8; 512];
        loop {
            match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => body.extend_from_slice(&chunk[..n]),
                Err(_) => return Err(CommsError::HttpTransport),
            }
        }
        debug!("HTTP {status} <- {url} ({} bytes)", body.len());
        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

impl HttpPort for HttpAdapter {
    #[cfg(feature = "espidf")]
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
        self.exchange(embedded_svc::http::Method::Get, url, headers, None)
    }

    #[cfg(feature = "espidf")]
    fn put(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<HttpResponse, CommsError> {
        let length = body.len().to_string();
        let mut all: Vec<(&str, &str)> = headers.to_vec();
        all.push(("Content-Type", "application/json"));
        all.push(("Content-Length", &length));
        self.exchange(embedded_svc::http::Method::Put, url, &all, Some(body))
    }

    #[cfg(not(feature = "espidf"))]
    fn get(&mut self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
        debug!("HTTP(sim): GET {url} unavailable off-device");
        Err(CommsError::HttpTransport)
    }

    #[cfg(not(feature = "espidf"))]
    fn put(
        &mut self,
        url: &str,
        _headers: &[(&str, &str)],
        _body: &str,
    ) -> Result<HttpResponse, CommsError> {
        debug!("HTTP(sim): PUT {url} unavailable off-device");
        Err(CommsError::HttpTransport)
    }
}
