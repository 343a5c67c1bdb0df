use bson::Document;

/// Recognized keys of a message's `options` mapping. Anything else is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub upsert: bool,
    pub set_on_insert: bool,
}

impl CommandOptions {
    pub fn from_document(options: Option<&Document>) -> Self {
        let flag = |key: &str| {
            options
                .and_then(|o| o.get_bool(key).ok())
                .unwrap_or(false)
        };
        Self {
            upsert: flag("upsert"),
            set_on_insert: flag("set_on_insert"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_defaults_when_absent() {
        assert_eq!(CommandOptions::from_document(None), CommandOptions::default());
    }

    #[test]
    fn test_unknown_keys_and_non_bool_values_are_ignored() {
        let raw = doc! { "hehe": "hehe", "upsert": "yes", "set_on_insert": 1 };
        let options = CommandOptions::from_document(Some(&raw));
        assert!(!options.upsert);
        assert!(!options.set_on_insert);
    }

    #[test]
    fn test_reads_both_flags() {
        let raw = doc! { "upsert": true, "set_on_insert": true };
        let options = CommandOptions::from_document(Some(&raw));
        assert!(options.upsert);
        assert!(options.set_on_insert);
    }
}
