/// Collapse whitespace and number `?` placeholders as Postgres `$n`.
///
/// Question marks inside single-quoted literals are left alone.
pub fn sql(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut param = 0;
    let mut in_literal = false;
    let mut pending_space = false;

    for c in query.chars() {
        if !in_literal && c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }

        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                param += 1;
                out.push('$');
                out.push_str(&param.to_string());
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_numbered() {
        assert_eq!(
            sql("SELECT *\n  FROM properties\n  WHERE id = ? AND wilaya_code = ?"),
            "SELECT * FROM properties WHERE id = $1 AND wilaya_code = $2"
        );
    }

    #[test]
    fn test_literals_are_preserved() {
        assert_eq!(
            sql("SELECT '?  x' FROM t WHERE a = ?"),
            "SELECT '?  x' FROM t WHERE a = $1"
        );
    }
}
