//! SQL text generation
//!
//! This module turns a relational tree into command text. It is the only
//! place in the crate where SQL strings are constructed.
//!
//! # Architecture
//!
//! - [`QuerySqlGenerator`]: the public entry point, bound to one dialect
//!   (a [`SqlGenerationHelper`] plus a [`TypeMappingSource`]). It holds no
//!   per-call state and can be shared.
//! - `SqlRenderer`: the state of one generation call: the command builder,
//!   the parameter registry, the ambient type mapping, the alias scopes and
//!   the optimizer.
//!
//! Every predicate, projection, ordering key and join condition goes through
//! the [`ExpressionOptimizer`] right before it is written out.
//!
//! # Escaping
//!
//! Identifiers are always delimited by the dialect helper. Literals are
//! always formatted through a type mapping.

use super::expr::*;
use super::params::{ParameterValues, Value};
use super::stmt::*;
use super::types::TypeMapping;
use crate::command::{
    get_log_level, log_command, log_value_conversion_warning, GenerationTimer, LogLevel,
    ParameterBinding, ParameterNameGenerator, RelationalCommand, RelationalCommandBuilder,
    TypeMaterializationInfo,
};
use crate::dialect::{PagingStyle, SqlGenerationHelper, TypeMappingSource};
use crate::error::{SqlGenError, SqlGenResult};
use crate::optimizer::{ExpressionOptimizer, Position};

// =============================================================================
// Render Trait
// =============================================================================

/// Nodes that can write themselves into a renderer
trait Render {
    fn render(&self, renderer: &mut SqlRenderer<'_>) -> SqlGenResult<()>;
}

impl Render for SelectExpr {
    fn render(&self, renderer: &mut SqlRenderer<'_>) -> SqlGenResult<()> {
        renderer.render_select(self)
    }
}

impl Render for TableExpr {
    fn render(&self, renderer: &mut SqlRenderer<'_>) -> SqlGenResult<()> {
        renderer.render_table(self)
    }
}

impl Render for Expr {
    fn render(&self, renderer: &mut SqlRenderer<'_>) -> SqlGenResult<()> {
        renderer.render_expr(self)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Generates SQL commands for one dialect
pub struct QuerySqlGenerator<'a> {
    helper: &'a dyn SqlGenerationHelper,
    mappings: &'a dyn TypeMappingSource,
    log_level: LogLevel,
}

impl<'a> QuerySqlGenerator<'a> {
    /// Create a generator. The log level is read from `RELSQL_LOG_LEVEL`.
    pub fn new(helper: &'a dyn SqlGenerationHelper, mappings: &'a dyn TypeMappingSource) -> Self {
        Self {
            helper,
            mappings,
            log_level: get_log_level(),
        }
    }

    /// Override the log level read from the environment
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Generate the command for `select` with the given parameter values.
    ///
    /// The tree and the values are only read. Calling this twice with the
    /// same inputs produces identical commands.
    pub fn generate(
        &self,
        select: &SelectExpr,
        parameters: &ParameterValues,
    ) -> SqlGenResult<RelationalCommand> {
        let timer = GenerationTimer::new("SQL generation", self.log_level);
        let mut renderer = SqlRenderer::new(
            self.helper,
            self.mappings,
            parameters,
            self.log_level,
            true,
        );

        if let Err(e) = renderer.render_root(select) {
            timer.failure(&e.to_string());
            return Err(e);
        }

        let command = renderer.into_command(select);
        log_command(self.log_level, &command, &select.tags);
        timer.success();
        Ok(command)
    }

    /// Optimize and render a single expression for `position`.
    ///
    /// Column aliases are not checked against any scope.
    pub fn render_expression(
        &self,
        expr: &Expr,
        position: Position,
        parameters: &ParameterValues,
    ) -> SqlGenResult<String> {
        let mut renderer = SqlRenderer::new(
            self.helper,
            self.mappings,
            parameters,
            self.log_level,
            false,
        );
        let optimized = renderer.optimizer.optimize(expr, position)?;
        optimized.render(&mut renderer)?;
        let (text, _) = renderer.sql.into_parts();
        Ok(text)
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// An ORDER BY entry after optimization
enum OrderKey<'s> {
    Alias(&'s Ident),
    /// Constant or parameter kept for paging
    Constant,
    Expr(Expr),
}

/// State of a single generation call
struct SqlRenderer<'g> {
    helper: &'g dyn SqlGenerationHelper,
    mappings: &'g dyn TypeMappingSource,
    parameters: &'g ParameterValues,
    sql: RelationalCommandBuilder,
    optimizer: ExpressionOptimizer<'g>,
    name_generator: ParameterNameGenerator,
    /// Ambient mapping used to format literals and type parameters
    type_mapping: Option<TypeMapping>,
    warnings_enabled: bool,
    warnings: Vec<String>,
    /// Table aliases visible at each nesting level, innermost last
    scopes: Vec<Vec<String>>,
    validate_scopes: bool,
    cacheable: bool,
    log_level: LogLevel,
}

impl<'g> SqlRenderer<'g> {
    fn new(
        helper: &'g dyn SqlGenerationHelper,
        mappings: &'g dyn TypeMappingSource,
        parameters: &'g ParameterValues,
        log_level: LogLevel,
        validate_scopes: bool,
    ) -> Self {
        Self {
            helper,
            mappings,
            parameters,
            sql: RelationalCommandBuilder::new(),
            optimizer: ExpressionOptimizer::new(parameters, log_level),
            name_generator: ParameterNameGenerator::new(),
            type_mapping: None,
            warnings_enabled: false,
            warnings: Vec::new(),
            scopes: Vec::new(),
            validate_scopes,
            cacheable: true,
            log_level,
        }
    }

    fn into_command(self, select: &SelectExpr) -> RelationalCommand {
        let cacheable = self.cacheable && !self.optimizer.depends_on_parameter_values();
        let materialization = materialization_info(select, self.mappings);
        let (command_text, parameters) = self.sql.into_parts();
        RelationalCommand {
            command_text,
            parameters,
            cacheable,
            materialization,
            warnings: self.warnings,
        }
    }

    // =========================================================================
    // Scoped state
    // =========================================================================

    /// Run `f` with `mapping` as the ambient type mapping, restoring the
    /// previous one afterwards (also on error)
    fn with_type_mapping<T>(
        &mut self,
        mapping: Option<TypeMapping>,
        f: impl FnOnce(&mut Self) -> SqlGenResult<T>,
    ) -> SqlGenResult<T> {
        let saved = std::mem::replace(&mut self.type_mapping, mapping);
        let result = f(self);
        self.type_mapping = saved;
        result
    }

    fn with_warnings<T>(
        &mut self,
        enabled: bool,
        f: impl FnOnce(&mut Self) -> SqlGenResult<T>,
    ) -> SqlGenResult<T> {
        let saved = std::mem::replace(&mut self.warnings_enabled, enabled);
        let result = f(self);
        self.warnings_enabled = saved;
        result
    }

    /// Column mapping of either operand, else the ambient one
    fn inferred_mapping(&self, left: &Expr, right: &Expr) -> Option<TypeMapping> {
        left.column_type_mapping()
            .or_else(|| right.column_type_mapping())
            .or(self.type_mapping.as_ref())
            .cloned()
    }

    // =========================================================================
    // Statement rendering
    // =========================================================================

    fn render_root(&mut self, select: &SelectExpr) -> SqlGenResult<()> {
        let comment = self.helper.single_line_comment_token();
        for tag in &select.tags {
            for line in tag.lines() {
                self.sql.append(comment).append(" ").append_line(line);
            }
            self.sql.new_line();
        }
        select.render(self)
    }

    fn render_select(&mut self, select: &SelectExpr) -> SqlGenResult<()> {
        self.scopes.push(
            select
                .table_aliases()
                .into_iter()
                .map(|alias| alias.as_str().to_string())
                .collect(),
        );
        let saved_warnings = self.warnings_enabled;
        let result = self.render_select_body(select);
        self.warnings_enabled = saved_warnings;
        self.scopes.pop();
        result
    }

    fn render_select_body(&mut self, select: &SelectExpr) -> SqlGenResult<()> {
        let helper = self.helper;
        let paging = helper.paging_style();

        self.sql.append("SELECT ");
        if select.distinct {
            self.sql.append("DISTINCT ");
        }
        if paging == PagingStyle::TopOffsetFetch {
            if let (Some(limit), None) = (&select.limit, &select.offset) {
                self.sql.append("TOP(");
                self.render_expr(limit)?;
                self.sql.append(") ");
            }
        }

        let mut projected = false;
        if let Some(table_alias) = &select.project_star {
            self.sql
                .append(&helper.delimit_identifier(table_alias.as_str()))
                .append(".*");
            projected = true;
        }
        if !select.projection.is_empty() {
            if projected {
                self.sql.append(", ");
            }
            for (i, projection) in select.projection.iter().enumerate() {
                if i > 0 {
                    self.sql.append(", ");
                }
                let optimized = self.optimizer.optimize(projection, Position::Value)?;
                self.render_expr(&optimized)?;
            }
            projected = true;
        }
        if !projected {
            self.sql.append("1");
        }

        self.warnings_enabled = true;

        if !select.tables.is_empty() {
            self.sql.new_line().append("FROM ");
            for (i, table) in select.tables.iter().enumerate() {
                if i > 0 {
                    self.sql.new_line();
                }
                table.render(self)?;
            }
        } else if let Some(pseudo_from) = helper.pseudo_from_clause() {
            self.sql.new_line().append(pseudo_from);
        }

        if let Some(predicate) = &select.predicate {
            self.render_predicate(predicate)?;
        }

        if !select.group_by.is_empty() {
            self.sql.new_line().append("GROUP BY ");
            for (i, expr) in select.group_by.iter().enumerate() {
                if i > 0 {
                    self.sql.append(", ");
                }
                let optimized = self.optimizer.optimize(expr, Position::Value)?;
                self.render_expr(&optimized)?;
            }
        }

        if let Some(having) = &select.having {
            let optimized = self.optimizer.optimize(having, Position::SearchCondition)?;
            self.sql.new_line().append("HAVING ");
            self.render_expr(&optimized)?;
        }

        self.render_order_by(select)?;
        self.render_limit_offset(select, paging)
    }

    fn render_predicate(&mut self, predicate: &Expr) -> SqlGenResult<()> {
        let optimized = self.optimizer.optimize(predicate, Position::SearchCondition)?;
        if is_tautology(&optimized) {
            return Ok(());
        }
        self.sql.new_line().append("WHERE ");
        self.render_expr(&optimized)
    }

    fn render_order_by(&mut self, select: &SelectExpr) -> SqlGenResult<()> {
        let paged = select.limit.is_some() || select.offset.is_some();

        let mut keys = Vec::with_capacity(select.order_by.len());
        for ordering in &select.order_by {
            if let Expr::Alias { alias, .. } = &ordering.expr {
                keys.push((OrderKey::Alias(alias), ordering.descending));
                continue;
            }
            let optimized = self.optimizer.optimize(&ordering.expr, Position::Value)?;
            if is_constant(&optimized) {
                // Ordering by a constant only matters alongside paging
                if paged {
                    keys.push((OrderKey::Constant, ordering.descending));
                }
            } else {
                keys.push((OrderKey::Expr(optimized), ordering.descending));
            }
        }

        if keys.is_empty() {
            return Ok(());
        }

        let helper = self.helper;
        self.sql.new_line().append("ORDER BY ");
        for (i, (key, descending)) in keys.iter().enumerate() {
            if i > 0 {
                self.sql.append(", ");
            }
            match key {
                OrderKey::Alias(alias) => {
                    self.sql.append(&helper.delimit_identifier(alias.as_str()));
                }
                OrderKey::Constant => {
                    self.sql.append("(SELECT 1");
                    if let Some(pseudo_from) = helper.pseudo_from_clause() {
                        self.sql.append(" ").append(pseudo_from);
                    }
                    self.sql.append(")");
                }
                OrderKey::Expr(expr) => self.render_expr(expr)?,
            }
            if *descending {
                self.sql.append(" DESC");
            }
        }
        Ok(())
    }

    fn render_limit_offset(&mut self, select: &SelectExpr, paging: PagingStyle) -> SqlGenResult<()> {
        match paging {
            PagingStyle::TopOffsetFetch => {
                // A limit without an offset was written as TOP(n)
                if let Some(offset) = &select.offset {
                    self.sql.new_line().append("OFFSET ");
                    self.render_expr(offset)?;
                    self.sql.append(" ROWS");
                    if let Some(limit) = &select.limit {
                        self.sql.append(" FETCH NEXT ");
                        self.render_expr(limit)?;
                        self.sql.append(" ROWS ONLY");
                    }
                }
            }
            PagingStyle::LimitOffset {
                offset_requires_limit,
            } => {
                let write_limit =
                    select.limit.is_some() || (select.offset.is_some() && offset_requires_limit);
                if write_limit {
                    self.sql.new_line().append("LIMIT ");
                    match &select.limit {
                        Some(limit) => self.render_expr(limit)?,
                        None => {
                            self.sql.append("-1");
                        }
                    }
                }
                if let Some(offset) = &select.offset {
                    if write_limit {
                        self.sql.append(" OFFSET ");
                    } else {
                        self.sql.new_line().append("OFFSET ");
                    }
                    self.render_expr(offset)?;
                }
            }
        }
        Ok(())
    }

    /// Body of a nested SELECT on its own indented lines
    fn render_nested_select(&mut self, select: &SelectExpr) -> SqlGenResult<()> {
        self.sql.new_line().increment_indent();
        select.render(self)?;
        self.sql.decrement_indent().new_line();
        Ok(())
    }

    // =========================================================================
    // Table sources
    // =========================================================================

    fn render_table(&mut self, table: &TableExpr) -> SqlGenResult<()> {
        let helper = self.helper;
        match table {
            TableExpr::Table {
                name,
                schema,
                alias,
            } => {
                self.sql
                    .append(&helper.delimit_identifier_with_schema(
                        name.as_str(),
                        schema.as_ref().map(Ident::as_str),
                    ))
                    .append(helper.alias_separator())
                    .append(&helper.delimit_identifier(alias.as_str()));
            }
            TableExpr::Select(select) => {
                let alias = select.alias.as_ref().ok_or_else(|| {
                    SqlGenError::invalid_tree("a sub-select used as a table source needs an alias")
                })?;
                self.sql.append("(");
                self.render_nested_select(select)?;
                self.sql
                    .append(")")
                    .append(helper.alias_separator())
                    .append(&helper.delimit_identifier(alias.as_str()));
            }
            TableExpr::FromSql {
                sql,
                arguments,
                alias,
            } => {
                let text = match self.from_sql_substitutions(arguments)? {
                    Some(substitutions) => substitute_placeholders(sql, &substitutions)?,
                    None => sql.clone(),
                };
                self.sql.append_line("(").increment_indent();
                self.sql.append_lines(&text).decrement_indent();
                self.sql
                    .append(")")
                    .append(helper.alias_separator())
                    .append(&helper.delimit_identifier(alias.as_str()));
            }
            TableExpr::CrossJoin(table) => {
                self.sql.append("CROSS JOIN ");
                table.render(self)?;
            }
            TableExpr::CrossJoinLateral(table) => {
                self.sql.append("CROSS JOIN LATERAL ");
                table.render(self)?;
            }
            TableExpr::InnerJoin { table, predicate } => {
                self.sql.append("INNER JOIN ");
                self.render_join(table, predicate)?;
            }
            TableExpr::LeftOuterJoin { table, predicate } => {
                self.sql.append("LEFT JOIN ");
                self.render_join(table, predicate)?;
            }
        }
        Ok(())
    }

    fn render_join(&mut self, table: &TableExpr, predicate: &Expr) -> SqlGenResult<()> {
        table.render(self)?;
        self.sql.append(" ON ");
        let optimized = self.optimizer.optimize(predicate, Position::JoinCondition)?;
        self.render_expr(&optimized)
    }

    /// Text for each `{n}` placeholder of a raw SQL source, or None when the
    /// SQL is used verbatim
    fn from_sql_substitutions(
        &mut self,
        arguments: &FromSqlArguments,
    ) -> SqlGenResult<Option<Vec<String>>> {
        match arguments {
            FromSqlArguments::None => Ok(None),
            FromSqlArguments::Values(values) => {
                let mut substitutions = Vec::with_capacity(values.len());
                for value in values {
                    substitutions.push(self.literal_sql(value)?);
                }
                Ok(Some(substitutions))
            }
            FromSqlArguments::Expressions(exprs) => {
                let mut substitutions = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    let text = match expr.remove_convert() {
                        Expr::Literal(value) => self.literal_sql(value)?,
                        Expr::Parameter(param) => self.parameter_placeholder(param),
                        other => {
                            return Err(SqlGenError::invalid_tree(format!(
                                "raw SQL arguments must be literals or parameters, got {:?}",
                                other
                            )))
                        }
                    };
                    substitutions.push(text);
                }
                Ok(Some(substitutions))
            }
            FromSqlArguments::Parameter(name) => {
                let parameters = self.parameters;
                let elements = match parameters.get(name) {
                    None => return Err(SqlGenError::missing_parameter(name.as_str())),
                    Some(Value::Null) => {
                        return Err(SqlGenError::expected_non_null_parameter(name.as_str()))
                    }
                    Some(Value::Array(elements)) => elements,
                    Some(other) => {
                        return Err(SqlGenError::invalid_tree(format!(
                            "raw SQL argument parameter '{}' must hold an array, got {:?}",
                            name, other
                        )))
                    }
                };

                // The text now depends on how many arguments were supplied
                self.cacheable = false;

                let helper = self.helper;
                let mut substitutions = Vec::with_capacity(elements.len());
                let mut members = Vec::with_capacity(elements.len());
                for element in elements {
                    let sql = &self.sql;
                    let generated = self.name_generator.generate_unused(|candidate| {
                        parameters.contains(candidate) || sql.has_parameter(candidate)
                    });
                    let placeholder = helper.generate_parameter_name_placeholder(&generated);
                    members.push(
                        ParameterBinding::new(
                            generated.as_str(),
                            helper.generate_parameter_name(&generated),
                            placeholder.as_str(),
                            self.mappings.mapping_for_value(element),
                            element.is_null(),
                        )
                        .with_value(element.clone()),
                    );
                    substitutions.push(placeholder);
                }
                self.sql.add_composite_parameter(name.as_str(), members);
                Ok(Some(substitutions))
            }
        }
    }

    // =========================================================================
    // Expression rendering
    // =========================================================================

    fn render_expr(&mut self, expr: &Expr) -> SqlGenResult<()> {
        let helper = self.helper;
        match expr {
            Expr::Column(col) => self.render_column(col)?,

            Expr::Alias { expr: inner, alias } => {
                inner.render(self)?;
                let same_name =
                    matches!(inner.remove_convert(), Expr::Column(col) if col.name == *alias);
                if !same_name {
                    self.sql
                        .append(helper.alias_separator())
                        .append(&helper.delimit_identifier(alias.as_str()));
                }
            }

            Expr::BinaryOp { left, op, right } => {
                let warnings = self.warnings_enabled
                    && !matches!(op, BinaryOperator::Eq | BinaryOperator::NotEq);
                let mapping = if op.is_comparison()
                    || matches!(op, BinaryOperator::Add | BinaryOperator::Coalesce)
                {
                    self.inferred_mapping(left, right)
                } else {
                    self.type_mapping.clone()
                };
                self.with_warnings(warnings, |r| {
                    r.with_type_mapping(mapping, |r| r.render_binary(left, *op, right))
                })?;
            }

            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: inner,
            } => match &**inner {
                Expr::In { operand, values } => self.render_in(operand, values, true)?,
                Expr::IsNull(operand) => {
                    operand.render(self)?;
                    self.sql.append(" IS NOT NULL");
                }
                Expr::Exists(subquery) => {
                    self.sql.append("NOT ");
                    self.render_exists(subquery)?;
                }
                other => {
                    self.sql.append("NOT (");
                    other.render(self)?;
                    self.sql.append(")");
                }
            },

            Expr::UnaryOp {
                op: UnaryOperator::Convert,
                expr: inner,
            } => inner.render(self)?,

            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                expr: inner,
            } => {
                self.sql.append("-");
                self.render_operand(inner)?;
            }

            Expr::Case(case) => self.render_case(case)?,

            Expr::FunctionCall(call) => self.render_function_call(call)?,

            Expr::In { operand, values } => self.render_in(operand, values, false)?,

            Expr::Exists(subquery) => self.render_exists(subquery)?,

            Expr::IsNull(operand) => {
                operand.render(self)?;
                self.sql.append(" IS NULL");
            }

            Expr::Like {
                matched,
                pattern,
                escape,
            } => {
                let mapping = matched
                    .column_type_mapping()
                    .or(self.type_mapping.as_ref())
                    .cloned();
                self.with_type_mapping(mapping, |r| {
                    matched.render(r)?;
                    r.sql.append(" LIKE ");
                    pattern.render(r)?;
                    if let Some(escape) = escape {
                        r.sql.append(" ESCAPE ");
                        escape.render(r)?;
                    }
                    Ok(())
                })?;
            }

            Expr::Fragment(sql) => {
                self.sql.append(sql);
            }

            Expr::Literal(value) => {
                let text = self.literal_sql(value)?;
                self.sql.append(&text);
            }

            Expr::Parameter(param) => {
                let placeholder = self.parameter_placeholder(param);
                self.sql.append(&placeholder);
            }

            Expr::Select(select) => {
                self.sql.append("(");
                self.render_nested_select(select)?;
                self.sql.append(")");
            }

            Expr::Cast { expr: inner, target } => {
                let target_mapping = self.mappings.find_mapping(*target).ok_or_else(|| {
                    SqlGenError::unsupported_type(format!("cast target {:?}", target))
                })?;
                self.sql.append("CAST(");
                let mapping = inner.column_type_mapping().cloned();
                self.with_type_mapping(mapping, |r| inner.render(r))?;
                self.sql
                    .append(" AS ")
                    .append(&target_mapping.store_type)
                    .append(")");
            }
        }
        Ok(())
    }

    fn render_column(&mut self, col: &ColumnRef) -> SqlGenResult<()> {
        if self.validate_scopes
            && !self
                .scopes
                .iter()
                .any(|scope| scope.iter().any(|alias| alias == col.table_alias.as_str()))
        {
            return Err(SqlGenError::invalid_tree(format!(
                "column {}.{} references a table alias that is not in scope",
                col.table_alias, col.name
            )));
        }
        let helper = self.helper;
        self.sql
            .append(&helper.delimit_identifier(col.table_alias.as_str()))
            .append(".")
            .append(&helper.delimit_identifier(col.name.as_str()));
        Ok(())
    }

    fn render_binary(&mut self, left: &Expr, op: BinaryOperator, right: &Expr) -> SqlGenResult<()> {
        if op == BinaryOperator::Coalesce {
            self.sql.append("COALESCE(");
            left.render(self)?;
            self.sql.append(", ");
            right.render(self)?;
            self.sql.append(")");
            return Ok(());
        }

        self.render_operand(left)?;
        self.sql.append(" ").append(op.as_sql()).append(" ");
        self.render_operand(right)
    }

    /// Parenthesize nested binary operations other than COALESCE
    fn render_operand(&mut self, operand: &Expr) -> SqlGenResult<()> {
        let needs_parens = matches!(
            operand.remove_convert(),
            Expr::BinaryOp { op, .. } if *op != BinaryOperator::Coalesce
        );
        if needs_parens {
            self.sql.append("(");
        }
        operand.render(self)?;
        if needs_parens {
            self.sql.append(")");
        }
        Ok(())
    }

    fn render_case(&mut self, case: &CaseExpr) -> SqlGenResult<()> {
        self.sql.append("CASE");

        let test_mapping = match &case.operand {
            Some(operand) => {
                self.sql.append(" ");
                operand.render(self)?;
                operand
                    .column_type_mapping()
                    .or(self.type_mapping.as_ref())
                    .cloned()
            }
            None => self.type_mapping.clone(),
        };

        self.sql.new_line().increment_indent();
        for (test, result) in &case.when_clauses {
            self.sql.append("WHEN ");
            self.with_warnings(false, |r| {
                r.with_type_mapping(test_mapping.clone(), |r| test.render(r))
            })?;
            self.sql.append(" THEN ");
            self.render_case_result(result)?;
            self.sql.new_line();
        }
        if let Some(else_clause) = &case.else_clause {
            self.sql.append("ELSE ");
            self.render_case_result(else_clause)?;
            self.sql.new_line();
        }
        self.sql.decrement_indent().append("END");
        Ok(())
    }

    /// Boolean THEN/ELSE results are typed scalars, not bare literals
    fn render_case_result(&mut self, result: &Expr) -> SqlGenResult<()> {
        let helper = self.helper;
        match result.as_bool_literal() {
            Some(true) => {
                self.sql.append(helper.typed_true_literal());
                Ok(())
            }
            Some(false) => {
                self.sql.append(helper.typed_false_literal());
                Ok(())
            }
            None => result.render(self),
        }
    }

    fn render_function_call(&mut self, call: &FunctionCall) -> SqlGenResult<()> {
        if let Some(schema) = &call.schema {
            let delimited = self.helper.delimit_identifier(schema.as_str());
            self.sql.append(&delimited).append(".");
        }
        if let Some(instance) = &call.instance {
            instance.render(self)?;
            self.sql.append(".");
        }
        self.sql.append(&call.name);

        if call.niladic {
            return Ok(());
        }

        self.sql.append("(");
        self.with_type_mapping(None, |r| r.render_expr_list(&call.args))?;
        self.sql.append(")");
        Ok(())
    }

    fn render_in(&mut self, operand: &Expr, values: &InValues, negated: bool) -> SqlGenResult<()> {
        let mapping = operand
            .column_type_mapping()
            .or(self.type_mapping.as_ref())
            .cloned();
        self.with_warnings(false, |r| {
            r.with_type_mapping(mapping, |r| match values {
                InValues::List(items) if items.is_empty() => {
                    r.sql.append(if negated { "1 = 1" } else { "1 = 0" });
                    Ok(())
                }
                InValues::List(items) => {
                    operand.render(r)?;
                    r.sql.append(if negated { " NOT IN (" } else { " IN (" });
                    r.render_expr_list(items)?;
                    r.sql.append(")");
                    Ok(())
                }
                InValues::Subquery(subquery) => {
                    operand.render(r)?;
                    r.sql.append(if negated { " NOT IN (" } else { " IN (" });
                    r.render_nested_select(subquery)?;
                    r.sql.append(")");
                    Ok(())
                }
            })
        })
    }

    fn render_exists(&mut self, subquery: &SelectExpr) -> SqlGenResult<()> {
        self.sql.append("EXISTS (");
        self.render_nested_select(subquery)?;
        self.sql.append(")");
        Ok(())
    }

    fn render_expr_list(&mut self, exprs: &[Expr]) -> SqlGenResult<()> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.sql.append(", ");
            }
            expr.render(self)?;
        }
        Ok(())
    }

    // =========================================================================
    // Literals and parameters
    // =========================================================================

    /// Format a value through the ambient mapping when it accepts the value,
    /// otherwise through the mapping for the value's own kind
    fn literal_sql(&mut self, value: &Value) -> SqlGenResult<String> {
        let ambient = self.type_mapping.as_ref().filter(|mapping| match value.kind() {
            Some(kind) => mapping.accepts(kind),
            None => value.is_null(),
        });
        let mapping = match ambient {
            Some(mapping) => Some(mapping.clone()),
            None => self.mappings.mapping_for_value(value),
        };

        match mapping {
            Some(mapping) => {
                self.value_conversion_warning(&mapping, "literal");
                mapping.generate_literal(value)
            }
            None if value.is_null() => Ok("NULL".to_string()),
            None => Err(SqlGenError::unsupported_type(format!("literal {:?}", value))),
        }
    }

    /// Register the parameter on first use and return its placeholder
    fn parameter_placeholder(&mut self, param: &ParamRef) -> String {
        let helper = self.helper;
        if !self.sql.has_parameter(&param.name) {
            let kind = param.value_type.kind;
            let mapping = match &self.type_mapping {
                Some(mapping) if mapping.accepts(kind) => Some(mapping.clone()),
                _ => self.mappings.find_mapping(kind),
            };
            if let Some(mapping) = &mapping {
                self.value_conversion_warning(mapping, &format!("parameter '{}'", param.name));
            }
            self.sql.add_parameter(ParameterBinding::new(
                param.name.as_str(),
                helper.generate_parameter_name(&param.name),
                helper.generate_parameter_name_placeholder(&param.name),
                mapping,
                param.value_type.nullable,
            ));
        }
        helper.generate_parameter_name_placeholder(&param.name)
    }

    fn value_conversion_warning(&mut self, mapping: &TypeMapping, subject: &str) {
        if !self.warnings_enabled || mapping.converter.is_none() {
            return;
        }
        let message = format!(
            "{} is rendered through value-converting mapping '{}'; the SQL may not match the stored representation",
            subject, mapping.store_type
        );
        log_value_conversion_warning(self.log_level, &message);
        self.warnings.push(message);
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `true = true` / `false <> false`: a WHERE clause that filters nothing
fn is_tautology(expr: &Expr) -> bool {
    match expr {
        Expr::BinaryOp { left, op, right } => matches!(
            (op, left.as_bool_literal(), right.as_bool_literal()),
            (BinaryOperator::Eq, Some(true), Some(true))
                | (BinaryOperator::NotEq, Some(false), Some(false))
        ),
        _ => false,
    }
}

fn is_constant(expr: &Expr) -> bool {
    matches!(
        expr.remove_convert(),
        Expr::Literal(_) | Expr::Parameter(_)
    )
}

/// Replace `{n}` with the n-th substitution; `{{` and `}}` are literal braces
fn substitute_placeholders(sql: &str, substitutions: &[String]) -> SqlGenResult<String> {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                if digits.is_empty() || chars.next() != Some('}') {
                    return Err(SqlGenError::invalid_tree(format!(
                        "malformed placeholder in raw SQL: {}",
                        sql
                    )));
                }
                let index: usize = digits.parse().map_err(|_| {
                    SqlGenError::invalid_tree(format!("placeholder index out of range: {{{}}}", digits))
                })?;
                let substitution = substitutions.get(index).ok_or_else(|| {
                    SqlGenError::invalid_tree(format!(
                        "raw SQL placeholder {{{}}} has no matching argument",
                        index
                    ))
                })?;
                out.push_str(substitution);
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Result-reader metadata for each projected expression
fn materialization_info(
    select: &SelectExpr,
    mappings: &dyn TypeMappingSource,
) -> Vec<TypeMaterializationInfo> {
    select
        .projection
        .iter()
        .enumerate()
        .map(|(index, expr)| {
            let kind = expr.value_kind();
            let alias = match expr.remove_convert() {
                Expr::Alias { alias, .. } => Some(alias.as_str().to_string()),
                Expr::Column(col) => Some(col.name.as_str().to_string()),
                _ => None,
            };
            TypeMaterializationInfo {
                index,
                alias,
                kind,
                type_mapping: expr
                    .column_type_mapping()
                    .cloned()
                    .or_else(|| kind.and_then(|k| mappings.find_mapping(k))),
                nullable: expr.is_nullable(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_placeholders() {
        let subs = vec!["@p0".to_string(), "'x'".to_string()];
        assert_eq!(
            substitute_placeholders("SELECT * FROM t WHERE a = {0} AND b = {1}", &subs).unwrap(),
            "SELECT * FROM t WHERE a = @p0 AND b = 'x'"
        );
        assert_eq!(
            substitute_placeholders("SELECT '{{0}}', {1}", &subs).unwrap(),
            "SELECT '{0}', 'x'"
        );
    }

    #[test]
    fn test_substitute_placeholders_errors() {
        let subs = vec!["1".to_string()];
        assert!(matches!(
            substitute_placeholders("SELECT {3}", &subs),
            Err(SqlGenError::InvalidTree(_))
        ));
        assert!(matches!(
            substitute_placeholders("SELECT {x}", &subs),
            Err(SqlGenError::InvalidTree(_))
        ));
    }

    #[test]
    fn test_tautology_detection() {
        assert!(is_tautology(&Expr::bool(true).eq(Expr::bool(true))));
        assert!(is_tautology(&Expr::bool(false).not_eq(Expr::bool(false))));
        assert!(!is_tautology(&Expr::bool(false).eq(Expr::bool(true))));
        assert!(!is_tautology(&Expr::column("c", "A").eq(Expr::bool(true))));
    }

    #[test]
    fn test_constant_ordering_keys() {
        assert!(is_constant(&Expr::int(1)));
        assert!(is_constant(&Expr::convert(Expr::param(
            "p",
            crate::ast::ValueType::scalar(crate::ast::ValueKind::Integer)
        ))));
        assert!(!is_constant(&Expr::column("c", "Id")));
    }
}
