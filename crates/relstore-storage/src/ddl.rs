//! DDL helpers: identifier quoting and `CREATE TABLE` rewriting.

/// Quote an identifier for direct inclusion in SQL text.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Rewrite the table-name token of a `CREATE TABLE` statement.
///
/// `sqlite_master.sql` stores the original DDL verbatim; replacing the
/// name token lets a template table's schema be cloned under a new name.
/// Handles `TEMP`, `IF NOT EXISTS`, and quoted/backticked/bracketed names.
/// Returns `None` when the statement does not look like `CREATE TABLE`.
pub fn splice_table_name(create_sql: &str, new_table: &str) -> Option<String> {
    let (start, end) = table_name_span(create_sql)?;
    let mut out = String::with_capacity(create_sql.len() + new_table.len());
    out.push_str(&create_sql[..start]);
    out.push_str(&quote_ident(new_table));
    out.push_str(&create_sql[end..]);
    Some(out)
}

/// Byte span of the table-name token in a `CREATE TABLE` statement.
fn table_name_span(sql: &str) -> Option<(usize, usize)> {
    let mut tokens = Tokens { sql, pos: 0 };

    let (_, first) = tokens.next()?;
    if !first.eq_ignore_ascii_case("CREATE") {
        return None;
    }
    let (_, mut tok) = tokens.next()?;
    if tok.eq_ignore_ascii_case("TEMP") || tok.eq_ignore_ascii_case("TEMPORARY") {
        tok = tokens.next()?.1;
    }
    if !tok.eq_ignore_ascii_case("TABLE") {
        return None;
    }
    let (mut start, mut name) = tokens.next()?;
    if name.eq_ignore_ascii_case("IF") {
        let not = tokens.next()?.1;
        let exists = tokens.next()?.1;
        if !not.eq_ignore_ascii_case("NOT") || !exists.eq_ignore_ascii_case("EXISTS") {
            return None;
        }
        let next = tokens.next()?;
        start = next.0;
        name = next.1;
    }
    Some((start, start + name.len()))
}

/// Minimal SQL token scanner — enough to find the table-name token.
/// Quoted tokens keep their quotes; `(` terminates a bare token.
struct Tokens<'a> {
    sql: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.sql.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        match bytes[start] {
            quote @ (b'"' | b'`' | b'\'') => {
                self.pos += 1;
                while self.pos < bytes.len() {
                    if bytes[self.pos] == quote {
                        self.pos += 1;
                        // A doubled quote is an escape, not a terminator.
                        if self.pos < bytes.len() && bytes[self.pos] == quote {
                            self.pos += 1;
                            continue;
                        }
                        break;
                    }
                    self.pos += 1;
                }
            }
            b'[' => {
                while self.pos < bytes.len() && bytes[self.pos] != b']' {
                    self.pos += 1;
                }
                if self.pos < bytes.len() {
                    self.pos += 1;
                }
            }
            b'(' => {
                self.pos += 1;
            }
            _ => {
                while self.pos < bytes.len()
                    && !bytes[self.pos].is_ascii_whitespace()
                    && bytes[self.pos] != b'('
                {
                    self.pos += 1;
                }
            }
        }
        Some((start, &self.sql[start..self.pos]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_escapes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn splices_plain_name() {
        let sql = "CREATE TABLE src (id INTEGER, ra DOUBLE)";
        assert_eq!(
            splice_table_name(sql, "dst").as_deref(),
            Some("CREATE TABLE \"dst\" (id INTEGER, ra DOUBLE)")
        );
    }

    #[test]
    fn splices_name_touching_paren() {
        let sql = "create table src(id integer)";
        assert_eq!(
            splice_table_name(sql, "dst").as_deref(),
            Some("create table \"dst\"(id integer)")
        );
    }

    #[test]
    fn splices_quoted_name() {
        let sql = "CREATE TABLE \"odd name\" (id INTEGER)";
        assert_eq!(
            splice_table_name(sql, "dst").as_deref(),
            Some("CREATE TABLE \"dst\" (id INTEGER)")
        );
    }

    #[test]
    fn splices_after_if_not_exists() {
        let sql = "CREATE TABLE IF NOT EXISTS src (id INTEGER)";
        assert_eq!(
            splice_table_name(sql, "dst").as_deref(),
            Some("CREATE TABLE IF NOT EXISTS \"dst\" (id INTEGER)")
        );
    }

    #[test]
    fn rejects_non_create_table() {
        assert_eq!(splice_table_name("CREATE INDEX idx ON t (c)", "dst"), None);
        assert_eq!(splice_table_name("SELECT 1", "dst"), None);
    }
}
