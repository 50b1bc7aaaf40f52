use reqwest::Url;

use super::RequestError;
use super::auth::Token;
use crate::types::TimeRange;

/// Parameters of one subsetting/reformatting request to the data endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    /// Dataset short name (e.g. `SPL3SMP`)
    pub short_name: String,
    pub version: String,
    pub format: String,
    pub time_range: TimeRange,
    /// Variable path inside the granule
    pub coverage: String,
    pub projection: String,
    pub email: String,
}

impl DataRequest {
    /// Query pairs in the order the endpoint documents them. The token is left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("short_name", self.short_name.clone()),
            ("version", self.version.clone()),
            ("format", self.format.clone()),
            ("time", self.time_range.to_string()),
            ("Coverage", self.coverage.clone()),
            ("projection", self.projection.clone()),
        ]
    }

    /// Build the full request URL against `base`. Values are percent-encoded.
    pub fn to_url(&self, base: &str, token: &Token) -> Result<Url, RequestError> {
        let mut pairs = self.query_pairs();
        pairs.push(("token", token.as_str().to_string()));
        pairs.push(("email", self.email.clone()));
        Url::parse_with_params(base, &pairs).map_err(|e| RequestError::Url {
            url: base.to_string(),
            reason: e.to_string(),
        })
    }

    /// Archive name used when the response carries no `Content-Disposition` filename.
    pub fn fallback_archive_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.zip",
            sanitize(&self.short_name),
            sanitize(&self.version),
            self.time_range.start.format("%Y%m%d"),
            self.time_range.end.format("%Y%m%d"),
        )
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DataRequest {
        DataRequest {
            short_name: "SPL3SMP".to_string(),
            version: "004".to_string(),
            format: "GeoTIFF".to_string(),
            time_range: TimeRange::parse("2015-03-31,2015-04-01").unwrap(),
            coverage: "/Soil_Moisture_Retrieval_Data/soil_moisture".to_string(),
            projection: "Geographic".to_string(),
            email: "user@example.org".to_string(),
        }
    }

    #[test]
    fn url_carries_parameters_in_order() {
        let url = request()
            .to_url("https://n5eil01u.ecs.nsidc.org/egi/request", &Token::new("TOK"))
            .unwrap();
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(
            keys,
            [
                "short_name",
                "version",
                "format",
                "time",
                "Coverage",
                "projection",
                "token",
                "email"
            ]
        );
        let values: std::collections::HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(values["time"], "2015-03-31,2015-04-01");
        assert_eq!(values["Coverage"], "/Soil_Moisture_Retrieval_Data/soil_moisture");
        assert_eq!(values["token"], "TOK");
        assert_eq!(values["email"], "user@example.org");
    }

    #[test]
    fn unsafe_values_are_encoded() {
        let mut req = request();
        req.email = "a+b@example.org&x=1".to_string();
        let url = req.to_url("https://example.org/egi", &Token::new("T")).unwrap();
        let email = url
            .query_pairs()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.into_owned());
        assert_eq!(email.as_deref(), Some("a+b@example.org&x=1"));
        assert!(url.query_pairs().all(|(k, _)| k != "x"));
    }

    #[test]
    fn invalid_base_is_reported() {
        let err = request().to_url("not a url", &Token::new("T")).unwrap_err();
        assert!(matches!(err, RequestError::Url { .. }));
    }

    #[test]
    fn fallback_name_is_filesystem_safe() {
        assert_eq!(
            request().fallback_archive_name(),
            "SPL3SMP_004_20150331_20150401.zip"
        );
    }
}
