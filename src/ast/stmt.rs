//! SELECT expressions and table sources
//!
//! A [`SelectExpr`] is the root of every relational tree handed to the
//! generator. It is also used nested: as a FROM source, inside EXISTS and
//! IN, and as a scalar sub-select.

use super::expr::{Expr, Ident};
use super::params::Value;

/// SELECT expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectExpr {
    /// SELECT DISTINCT
    pub distinct: bool,
    /// Row limit (TOP / LIMIT / FETCH NEXT)
    pub limit: Option<Expr>,
    /// Rows to skip (OFFSET)
    pub offset: Option<Expr>,
    /// Projection list; an empty list renders as `1`
    pub projection: Vec<Expr>,
    /// FROM sources, joins included
    pub tables: Vec<TableExpr>,
    /// WHERE clause
    pub predicate: Option<Expr>,
    /// GROUP BY clause
    pub group_by: Vec<Expr>,
    /// HAVING clause
    pub having: Option<Expr>,
    /// ORDER BY clause
    pub order_by: Vec<Ordering>,
    /// Alias when used as a FROM source
    pub alias: Option<Ident>,
    /// Project `alias.*` of the named table source ahead of the projection list
    pub project_star: Option<Ident>,
    /// Free-form annotations emitted as leading comments
    pub tags: Vec<String>,
}

impl SelectExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SELECT over a single table source
    pub fn from_table(table: TableExpr) -> Self {
        Self {
            tables: vec![table],
            ..Default::default()
        }
    }

    pub fn with_projection(mut self, projection: Vec<Expr>) -> Self {
        self.projection = projection;
        self
    }

    /// Append one projected expression
    pub fn project(mut self, expr: Expr) -> Self {
        self.projection.push(expr);
        self
    }

    pub fn with_table(mut self, table: TableExpr) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_predicate(mut self, predicate: Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_group_by(mut self, group_by: Vec<Expr>) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn with_having(mut self, having: Expr) -> Self {
        self.having = Some(having);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<Ordering>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_limit(mut self, limit: Expr) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: Expr) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<Ident>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_project_star(mut self, table_alias: impl Into<Ident>) -> Self {
        self.project_star = Some(table_alias.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Aliases of every table source introduced by this SELECT, joins included
    pub fn table_aliases(&self) -> Vec<&Ident> {
        let mut aliases = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            table.collect_aliases(&mut aliases);
        }
        aliases
    }
}

/// ORDER BY entry
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub expr: Expr,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}

/// Arguments substituted into the `{n}` placeholders of a raw SQL source
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FromSqlArguments {
    #[default]
    None,
    /// Constant array: every element becomes an inline literal
    Values(Vec<Value>),
    /// Array of expressions: literals inline, parameters as placeholders
    Expressions(Vec<Expr>),
    /// Name of a parameter bound to an array. Each element becomes its own
    /// generated parameter, so the SQL depends on the array's length.
    Parameter(String),
}

/// A table source in FROM
#[derive(Debug, Clone, PartialEq)]
pub enum TableExpr {
    /// [schema].[name] AS [alias]
    Table {
        name: Ident,
        schema: Option<Ident>,
        alias: Ident,
    },
    /// (SELECT ...) AS [alias]; the alias is taken from the sub-select
    Select(Box<SelectExpr>),
    /// (raw SQL) AS [alias]
    FromSql {
        sql: String,
        arguments: FromSqlArguments,
        alias: Ident,
    },
    /// CROSS JOIN source
    CrossJoin(Box<TableExpr>),
    /// CROSS JOIN LATERAL source
    CrossJoinLateral(Box<TableExpr>),
    /// INNER JOIN source ON predicate
    InnerJoin {
        table: Box<TableExpr>,
        predicate: Expr,
    },
    /// LEFT JOIN source ON predicate
    LeftOuterJoin {
        table: Box<TableExpr>,
        predicate: Expr,
    },
}

impl TableExpr {
    pub fn table(name: impl Into<Ident>, alias: impl Into<Ident>) -> Self {
        Self::Table {
            name: name.into(),
            schema: None,
            alias: alias.into(),
        }
    }

    pub fn table_with_schema(
        schema: impl Into<Ident>,
        name: impl Into<Ident>,
        alias: impl Into<Ident>,
    ) -> Self {
        Self::Table {
            name: name.into(),
            schema: Some(schema.into()),
            alias: alias.into(),
        }
    }

    pub fn subquery(select: SelectExpr) -> Self {
        Self::Select(Box::new(select))
    }

    pub fn from_sql(
        sql: impl Into<String>,
        arguments: FromSqlArguments,
        alias: impl Into<Ident>,
    ) -> Self {
        Self::FromSql {
            sql: sql.into(),
            arguments,
            alias: alias.into(),
        }
    }

    pub fn cross_join(table: TableExpr) -> Self {
        Self::CrossJoin(Box::new(table))
    }

    pub fn cross_join_lateral(table: TableExpr) -> Self {
        Self::CrossJoinLateral(Box::new(table))
    }

    pub fn inner_join(table: TableExpr, predicate: Expr) -> Self {
        Self::InnerJoin {
            table: Box::new(table),
            predicate,
        }
    }

    pub fn left_join(table: TableExpr, predicate: Expr) -> Self {
        Self::LeftOuterJoin {
            table: Box::new(table),
            predicate,
        }
    }

    fn collect_aliases<'a>(&'a self, aliases: &mut Vec<&'a Ident>) {
        match self {
            Self::Table { alias, .. } | Self::FromSql { alias, .. } => aliases.push(alias),
            Self::Select(select) => {
                if let Some(alias) = &select.alias {
                    aliases.push(alias);
                }
            }
            Self::CrossJoin(table)
            | Self::CrossJoinLateral(table)
            | Self::InnerJoin { table, .. }
            | Self::LeftOuterJoin { table, .. } => table.collect_aliases(aliases),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_builder() {
        let select = SelectExpr::from_table(TableExpr::table("Customers", "c"))
            .project(Expr::column("c", "Id"))
            .with_predicate(Expr::column("c", "Id").eq(Expr::int(1)))
            .with_limit(Expr::int(10))
            .with_tag("customers by id");

        assert_eq!(select.projection.len(), 1);
        assert!(select.predicate.is_some());
        assert_eq!(select.limit, Some(Expr::int(10)));
        assert_eq!(select.tags, vec!["customers by id".to_string()]);
        assert!(!select.distinct);
    }

    #[test]
    fn test_table_aliases() {
        let orders = SelectExpr::from_table(TableExpr::table("Orders", "o0")).with_alias("o");
        let select = SelectExpr::from_table(TableExpr::table("Customers", "c"))
            .with_table(TableExpr::inner_join(
                TableExpr::subquery(orders),
                Expr::column("c", "Id").eq(Expr::column("o", "CustomerId")),
            ))
            .with_table(TableExpr::cross_join(TableExpr::from_sql(
                "SELECT 1",
                FromSqlArguments::None,
                "r",
            )));

        let aliases: Vec<&str> = select
            .table_aliases()
            .into_iter()
            .map(|a| a.as_str())
            .collect();
        assert_eq!(aliases, vec!["c", "o", "r"]);
    }
}
