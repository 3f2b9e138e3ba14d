use std::time::Duration;

use url::Url;

use crate::ClientError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Applies to info, submit and download requests. The push stream only
    /// gets `connect_timeout`.
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::Transport(format!("invalid server url {base_url:?}: {err}")))?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Joins `segments` onto the base url, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Transport(format!("server url {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_SERVER_URL).expect("default server url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let settings = ClientSettings::new("http://host:5000/clipflow/").unwrap();
        let url = settings.endpoint(&["download", "my file.mp4"]).unwrap();
        assert_eq!(url.as_str(), "http://host:5000/clipflow/download/my%20file.mp4");

        let settings = ClientSettings::new("http://host:5000").unwrap();
        let url = settings.endpoint(&["api", "status", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://host:5000/api/status/abc");
    }

    #[test]
    fn rejects_unparsable_server_url() {
        assert!(ClientSettings::new("not a url").is_err());
    }
}
