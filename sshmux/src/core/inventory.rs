//! Server inventory parsing.

/// Hosts listed in an inventory, in file order.
///
/// Lines are trimmed; blank lines and `#` comments are skipped.
pub fn parse_inventory(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let hosts = parse_inventory("db1\n\n  \n# staging\n  web1  \ndb1\n");
        assert_eq!(hosts, vec!["db1", "web1", "db1"]);
    }

    #[test]
    fn empty_inventory_has_no_hosts() {
        assert!(parse_inventory("").is_empty());
        assert!(parse_inventory("\n\n").is_empty());
    }
}
