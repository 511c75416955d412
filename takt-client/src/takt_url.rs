use crate::domain::TaktFilter;

#[derive(Debug, Clone)]
pub struct TaktUrl(String);

impl AsRef<str> for TaktUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TaktUrl {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self(base.trim_end_matches('/').to_string())
    }

    /// Append the given path to the URL.
    pub fn append_path(&self, path: &str) -> Self {
        let trimmed_url = self.0.trim_end_matches('/');
        let trimmed_path = path.trim_start_matches('/');
        Self(format!("{}/{}", trimmed_url, trimmed_path))
    }

    pub fn with_filter(&self, filter: &impl TaktFilter) -> Self {
        self.with_query(&filter.as_query_pairs())
    }

    pub fn with_query(&self, pairs: &[(&'static str, String)]) -> Self {
        let mut url = self.0.clone();
        for (key, value) in pairs {
            let sep = if url.contains('?') { '&' } else { '?' };
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        Self(url)
    }
}
