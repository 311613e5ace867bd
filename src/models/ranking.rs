use serde::Deserialize;

/// Payload of `/apiEsc/total-rank-top1`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TopRanker {
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub total_profit: f64,
}

impl TopRanker {
    /// The server flags failures with a truthy `error` field.
    pub fn is_error(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.user_id.as_deref())
            .unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_payload() {
        let ranker: TopRanker =
            serde_json::from_str(r#"{"user_id":"u1","user_name":"","total_profit":1234.5}"#).unwrap();
        assert!(!ranker.is_error());
        assert_eq!(ranker.display_name(), "u1");
        assert_eq!(ranker.total_profit, 1234.5);
    }

    #[test]
    fn recognises_error_flags() {
        let flagged: TopRanker =
            serde_json::from_str(r#"{"error":true,"message":"es down"}"#).unwrap();
        assert!(flagged.is_error());
        let cleared: TopRanker = serde_json::from_str(r#"{"error":false}"#).unwrap();
        assert!(!cleared.is_error());
    }
}
