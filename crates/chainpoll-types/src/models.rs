use serde::{Deserialize, Serialize};

/// A poll as stored by the contract. `id` is its index in the contract's poll
/// array; vote counters are read separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_serializes_with_numeric_id() {
        let poll = Poll {
            id: 3,
            question: "Tabs or spaces?".into(),
            options: vec!["tabs".into(), "spaces".into()],
        };

        let json = serde_json::to_value(&poll).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["options"][1], "spaces");
    }
}
