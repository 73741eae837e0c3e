//! Built-in generation helpers

use super::{PagingStyle, SqlGenerationHelper};

/// Double every occurrence of `close` and wrap in `open`/`close`
fn delimit(identifier: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(identifier.len() + 2);
    out.push(open);
    for c in identifier.chars() {
        if c == close {
            out.push(close);
        }
        out.push(c);
    }
    out.push(close);
    out
}

/// SQL Server: `[ident]`, `TOP(n)`, `OFFSET ... FETCH NEXT`, `CAST(1 AS BIT)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerSqlGenerationHelper;

impl SqlGenerationHelper for SqlServerSqlGenerationHelper {
    fn delimit_identifier(&self, identifier: &str) -> String {
        delimit(identifier, '[', ']')
    }

    fn typed_true_literal(&self) -> &str {
        "CAST(1 AS BIT)"
    }

    fn typed_false_literal(&self) -> &str {
        "CAST(0 AS BIT)"
    }

    fn paging_style(&self) -> PagingStyle {
        PagingStyle::TopOffsetFetch
    }
}

/// PostgreSQL: `"ident"`, `LIMIT`/`OFFSET`, `TRUE`/`FALSE`
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSqlGenerationHelper;

impl SqlGenerationHelper for PostgresSqlGenerationHelper {
    fn delimit_identifier(&self, identifier: &str) -> String {
        delimit(identifier, '"', '"')
    }

    fn typed_true_literal(&self) -> &str {
        "TRUE"
    }

    fn typed_false_literal(&self) -> &str {
        "FALSE"
    }
}

/// SQLite: `"ident"`, `LIMIT -1 OFFSET n` for offset-only paging, `1`/`0`
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSqlGenerationHelper;

impl SqlGenerationHelper for SqliteSqlGenerationHelper {
    fn delimit_identifier(&self, identifier: &str) -> String {
        delimit(identifier, '"', '"')
    }

    fn typed_true_literal(&self) -> &str {
        "1"
    }

    fn typed_false_literal(&self) -> &str {
        "0"
    }

    fn paging_style(&self) -> PagingStyle {
        PagingStyle::LimitOffset {
            offset_requires_limit: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_server_delimiting() {
        let helper = SqlServerSqlGenerationHelper;
        assert_eq!(helper.delimit_identifier("Customers"), "[Customers]");
        assert_eq!(helper.delimit_identifier("we]ird"), "[we]]ird]");
        assert_eq!(
            helper.delimit_identifier_with_schema("Customers", Some("dbo")),
            "[dbo].[Customers]"
        );
        assert_eq!(
            helper.delimit_identifier_with_schema("Customers", Some("")),
            "[Customers]"
        );
    }

    #[test]
    fn test_postgres_delimiting() {
        let helper = PostgresSqlGenerationHelper;
        assert_eq!(helper.delimit_identifier("user\"name"), "\"user\"\"name\"");
        assert_eq!(helper.generate_parameter_name("id"), "@id");
        assert_eq!(helper.typed_true_literal(), "TRUE");
    }

    #[test]
    fn test_defaults() {
        let helper = SqliteSqlGenerationHelper;
        assert_eq!(helper.alias_separator(), " AS ");
        assert_eq!(helper.single_line_comment_token(), "--");
        assert_eq!(helper.pseudo_from_clause(), None);
        assert_eq!(
            helper.paging_style(),
            PagingStyle::LimitOffset {
                offset_requires_limit: true
            }
        );
        assert_eq!(
            SqlServerSqlGenerationHelper.paging_style(),
            PagingStyle::TopOffsetFetch
        );
    }
}
