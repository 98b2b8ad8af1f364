pub const APP_NAME: &str = "HARVTECH";
pub const APP_TAGLINE: &str = "Rent equipment, sell produce, move harvests";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");
pub const GIT_SHA: Option<&str> = option_env!("GIT_SHA");

/// Release tag when built from one, else the crate version with the commit.
pub fn version_label() -> String {
    label_from(GIT_TAG, GIT_SHA, APP_VERSION)
}

fn label_from(tag: Option<&str>, sha: Option<&str>, version: &str) -> String {
    match (tag, sha) {
        (Some(tag), _) if !tag.is_empty() => tag.to_string(),
        (_, Some(sha)) if !sha.is_empty() => format!("v{version} ({sha})"),
        _ => format!("v{version}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_wins_over_commit() {
        assert_eq!(label_from(Some("v0.2.0"), Some("abc1234"), "0.1.0"), "v0.2.0");
        assert_eq!(label_from(None, Some("abc1234"), "0.1.0"), "v0.1.0 (abc1234)");
        assert_eq!(label_from(Some(""), None, "0.1.0"), "v0.1.0");
    }
}
