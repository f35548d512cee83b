//! Brief keys shorten datum keys inside beat digests. The two record-type prefixes that make up
//! nearly every key in a registry are swapped for short markers. Any key that already starts with
//! the marker character gets it doubled, so the translation stays reversible.

const MARKER: char = '#';

const PREFIXES: [(&str, &str); 2] = [
    ("naming.instance-list.", "#il:"),
    ("naming.service-meta.", "#sm:"),
];

pub(crate) fn brief_key(key: &str) -> String {
    for (long, short) in PREFIXES.iter() {
        if let Some(rest) = key.strip_prefix(long) {
            return format!("{}{}", short, rest);
        }
    }
    if key.starts_with(MARKER) {
        return format!("{}{}", MARKER, key);
    }
    key.to_string()
}

pub(crate) fn detail_key(brief: &str) -> String {
    if let Some(rest) = brief.strip_prefix(MARKER) {
        if rest.starts_with(MARKER) {
            return rest.to_string();
        }
    }
    for (long, short) in PREFIXES.iter() {
        if let Some(rest) = brief.strip_prefix(short) {
            return format!("{}{}", long, rest);
        }
    }
    brief.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefixes_are_shortened() {
        assert_eq!(brief_key("naming.instance-list.public##svc"), "#il:public##svc");
        assert_eq!(brief_key("naming.service-meta.public##svc"), "#sm:public##svc");
        assert_eq!(brief_key("svc:x"), "svc:x");
    }

    #[test]
    fn translation_is_reversible() {
        let keys = [
            "naming.instance-list.public##svc",
            "naming.service-meta.x",
            "svc:x",
            "#il:looks-like-a-brief-key",
            "##",
            "#",
            "",
            "naming.instance-list",
        ];
        for key in keys.iter() {
            assert_eq!(detail_key(&brief_key(key)), *key, "{}", key);
        }
    }
}
