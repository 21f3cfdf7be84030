use url::{ParseError, Url};

/// Ordered beacon node URLs. Later URLs are fallbacks for earlier ones.
///
/// Requests start at the preferred endpoint, which is the last one that answered.
pub struct Endpoints {
    urls: Vec<Url>,
    preferred: usize,
}

impl Endpoints {
    pub fn new(urls: impl IntoIterator<Item = Url>) -> Self {
        Self {
            urls: urls.into_iter().collect(),
            preferred: 0,
        }
    }

    /// Every endpoint once, starting at the preferred one and wrapping around.
    pub fn attempt_order(&self) -> Vec<(usize, Url)> {
        let count = self.urls.len();

        (0..count)
            .map(|offset| (self.preferred + offset) % count)
            .filter_map(|index| Some((index, self.urls.get(index)?.clone())))
            .collect()
    }

    pub fn mark_answered(&mut self, index: usize) {
        if index < self.urls.len() {
            self.preferred = index;
        }
    }
}

/// Appends `path_and_query` to `base`.
///
/// [`Url::join`] would replace the path of the base URL,
/// which breaks endpoints like `https://host/eth/v1alpha1`.
pub fn resolve(base: &Url, path_and_query: &str) -> Result<Url, ParseError> {
    let base = base.as_str().trim_end_matches('/');
    format!("{base}{path_and_query}").parse()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    fn indices(endpoints: &Endpoints) -> Vec<usize> {
        endpoints
            .attempt_order()
            .into_iter()
            .map(|(index, _)| index)
            .collect()
    }

    #[test]
    fn no_endpoints_means_nothing_to_attempt() {
        assert!(Endpoints::new([]).attempt_order().is_empty());
    }

    #[test]
    fn attempts_start_at_the_endpoint_that_answered_last() -> Result<()> {
        let mut endpoints = Endpoints::new([
            "http://node-1:3500".parse()?,
            "http://node-2:3500".parse()?,
            "http://node-3:3500".parse()?,
        ]);

        assert_eq!(indices(&endpoints), [0, 1, 2]);

        endpoints.mark_answered(1);

        assert_eq!(indices(&endpoints), [1, 2, 0]);
        assert_eq!(
            endpoints.attempt_order().first().map(|(_, url)| url.as_str()),
            Some("http://node-2:3500/"),
        );

        endpoints.mark_answered(7);

        assert_eq!(indices(&endpoints), [1, 2, 0]);

        Ok(())
    }

    #[test]
    fn resolve_keeps_base_path() -> Result<()> {
        let base = "https://node.example/eth/v1alpha1".parse()?;

        assert_eq!(
            resolve(&base, "/beacon/blocks?slot=3")?.as_str(),
            "https://node.example/eth/v1alpha1/beacon/blocks?slot=3",
        );

        Ok(())
    }
}
