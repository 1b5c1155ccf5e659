//! Finding masking rules (spec §4.1, §8 testable property 3).
//!
//! Masking operates on `char`s rather than bytes so multi-byte UTF-8
//! sequences are not split; this mirrors the original's Python string
//! slicing, which is also character-indexed.

fn mask_alphanumeric(chars: &[char]) -> String {
    chars
        .iter()
        .map(|&c| if c.is_ascii_alphanumeric() { '*' } else { c })
        .collect()
}

fn mask_email(data: &str, keep_leading: usize) -> String {
    let Some(at) = data.find('@') else {
        return mask_alphanumeric(&data.chars().collect::<Vec<_>>());
    };
    let (local, domain_with_at) = data.split_at(at);
    let domain = &domain_with_at[1..];
    let local_chars: Vec<char> = local.chars().collect();
    if local_chars.len() <= keep_leading {
        return format!("{local}@{domain}");
    }
    let leading: String = local_chars[..keep_leading].iter().collect();
    let masked_local: String = mask_alphanumeric(&local_chars[keep_leading..]);
    format!("{leading}{masked_local}@{domain}")
}

/// `EMAIL_ADDRESS` keeps 1 leading char and the TLD, masking everything else
/// in the local part (the domain label itself is masked, only the TLD
/// survives).
fn mask_email_address(data: &str) -> String {
    let Some(at) = data.find('@') else {
        return mask_alphanumeric(&data.chars().collect::<Vec<_>>());
    };
    let domain = &data[at + 1..];
    let tld = domain.rsplit('.').next().unwrap_or(domain);
    let kept_tail_len = tld.chars().count();
    let chars: Vec<char> = data.chars().collect();
    let total = chars.len();
    if total <= 1 + kept_tail_len {
        return data.to_string();
    }
    let leading: String = chars[..1].iter().collect();
    let tail: String = chars[total - kept_tail_len..].iter().collect();
    let masked_middle = mask_alphanumeric(&chars[1..total - kept_tail_len]);
    format!("{leading}{masked_middle}{tail}")
}

/// `US_SSN` / `PERSON` keep progressively more of the head/tail as the
/// value gets longer (spec §4.1).
fn mask_short_identifier(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    let len = chars.len();
    if len <= 4 {
        let leading: String = chars[..1.min(len)].iter().collect();
        format!("{leading}{}", mask_alphanumeric(&chars[1.min(len)..]))
    } else if len <= 6 {
        let leading: String = chars[..2].iter().collect();
        format!("{leading}{}", mask_alphanumeric(&chars[2..]))
    } else {
        let leading: String = chars[..2].iter().collect();
        let trailing: String = chars[len - 2..].iter().collect();
        format!("{leading}{}{trailing}", mask_alphanumeric(&chars[2..len - 2]))
    }
}

/// Apply the masking rule for `classifier_name` to `data`, per spec §4.1.
/// Masking a masked value is a fixed point (spec §8 round-trip property):
/// once alphanumerics are replaced with `*`, re-masking changes nothing.
pub fn mask_finding(classifier_name: &str, data: &str) -> String {
    if data.is_empty() {
        return String::new();
    }
    if classifier_name.contains("EMAIL") && data.contains('@') {
        if classifier_name == "EMAIL_ADDRESS" {
            mask_email_address(data)
        } else {
            mask_email(data, 2)
        }
    } else if classifier_name == "US_SSN" || classifier_name == "PERSON" {
        mask_short_identifier(data)
    } else {
        mask_alphanumeric(&data.chars().collect::<Vec<_>>())
    }
}
