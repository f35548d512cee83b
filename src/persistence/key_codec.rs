use crate::persistence::api::PersistenceError;

// Percent-encoding leaves '.' alone, so a key could otherwise map to "." or "..", or to a dot-file
// that collides with our temp files.
const LEADING_DOT: &str = "%2E";

/// Reversible mapping from a datum key to a single path component.
pub(crate) fn key_to_file_name(key: &str) -> Result<String, PersistenceError> {
    if key.is_empty() {
        return Err(PersistenceError::InvalidKey(key.to_string()));
    }

    let encoded = urlencoding::encode(key);
    match encoded.strip_prefix('.') {
        Some(rest) => Ok(format!("{}{}", LEADING_DOT, rest)),
        None => Ok(encoded.into_owned()),
    }
}

pub(crate) fn file_name_to_key(file_name: &str) -> Result<String, PersistenceError> {
    let key = urlencoding::decode(file_name).map_err(|_| PersistenceError::InvalidKey(file_name.to_string()))?;
    if key.is_empty() {
        return Err(PersistenceError::InvalidKey(file_name.to_string()));
    }

    Ok(key.into_owned())
}

/// Names we create that are never datum records.
pub(crate) fn is_temp_file_name(file_name: &str) -> bool {
    file_name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_characters_are_escaped() {
        assert_eq!(key_to_file_name("svc:x").unwrap(), "svc%3Ax");
        assert_eq!(key_to_file_name("a/b\\c").unwrap(), "a%2Fb%5Cc");
        assert_eq!(key_to_file_name("..").unwrap(), "%2E.");
        assert_eq!(key_to_file_name(".hidden").unwrap(), "%2Ehidden");
        assert_eq!(key_to_file_name("plain-key_1.v2").unwrap(), "plain-key_1.v2");
    }

    #[test]
    fn escaping_round_trips() {
        let keys = [
            "svc:x",
            "naming.instance-list.public##svc@@group",
            "..",
            ".",
            "../../etc/passwd",
            "空格 and spaces",
            "100%",
        ];
        for key in keys.iter() {
            let file_name = key_to_file_name(key).unwrap();
            assert!(!file_name.contains('/'), "{}", file_name);
            assert!(!is_temp_file_name(&file_name), "{}", file_name);
            assert_eq!(file_name_to_key(&file_name).unwrap(), *key);
        }
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(key_to_file_name(""), Err(PersistenceError::InvalidKey(_))));
    }
}
