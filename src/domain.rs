/// Domain part of a sender address: everything after the last `@`, lower-cased.
pub fn extract_domain(address: &str) -> Option<String> {
    let (_, domain) = address.rsplit_once('@')?;
    let domain = domain.trim();
    if domain.is_empty() {
        return None;
    }
    Some(domain.to_ascii_lowercase())
}

/// Mask a domain for display, keeping only its top-level label.
pub fn redact_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() <= 1 {
        return domain.to_string();
    }

    if parts[parts.len() - 2].len() <= 3 {
        return format!("???.{}", parts[parts.len() - 1]);
    }

    let redacted_parts: Vec<String> = parts[..parts.len() - 1]
        .iter()
        .map(|part| "*".repeat(part.len()))
        .collect();

    format!("{}.{}", redacted_parts.join("."), parts[parts.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_after_last_at() {
        assert_eq!(extract_domain("user@Example.COM").as_deref(), Some("example.com"));
        assert_eq!(extract_domain("\"a@b\"@mail.test").as_deref(), Some("mail.test"));
    }

    #[test]
    fn no_domain() {
        assert_eq!(extract_domain("postmaster"), None);
        assert_eq!(extract_domain("user@"), None);
    }

    #[test]
    fn redaction() {
        assert_eq!(redact_domain("spammer.net"), "*******.net");
        assert_eq!(redact_domain("abc.io"), "???.io");
        assert_eq!(redact_domain("localhost"), "localhost");
    }
}
