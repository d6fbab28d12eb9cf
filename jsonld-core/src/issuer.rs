use std::collections::HashMap;

/// Issues fresh blank node identifiers and remembers how existing ones were
/// relabelled.
///
/// One issuer is shared by everything that runs inside a single top-level
/// call, so the same input label always maps to the same output label.
#[derive(Debug, Clone)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: u64,
    issued: HashMap<String, String>,
    /// Input labels in the order they were first seen.
    order: Vec<String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("_:b")
    }
}

impl BlankNodeIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Label for `existing`, issuing one on first sight. `None` always
    /// issues a new label.
    pub fn issue(&mut self, existing: Option<&str>) -> String {
        if let Some(old) = existing {
            if let Some(label) = self.issued.get(old) {
                return label.clone();
            }
        }
        let label = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        if let Some(old) = existing {
            self.issued.insert(old.to_string(), label.clone());
            self.order.push(old.to_string());
        }
        label
    }

    pub fn get(&self, existing: &str) -> Option<&str> {
        self.issued.get(existing).map(String::as_str)
    }

    pub fn has(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }

    pub fn issued_order(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_stable() {
        let mut issuer = BlankNodeIssuer::default();
        assert_eq!(issuer.issue(Some("_:x")), "_:b0");
        assert_eq!(issuer.issue(None), "_:b1");
        assert_eq!(issuer.issue(Some("_:y")), "_:b2");
        assert_eq!(issuer.issue(Some("_:x")), "_:b0");

        assert_eq!(issuer.get("_:y"), Some("_:b2"));
        assert!(!issuer.has("_:z"));
        assert_eq!(issuer.issued_order(), &["_:x".to_string(), "_:y".to_string()]);
    }
}
