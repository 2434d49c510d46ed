//! The SQL parser.

use std::iter::Peekable;
use std::ops::Add;

use super::ast::{
    Direction, Expression, FromClause, Join, JoinKind, Literal, Operator, SelectStatement,
    Statement,
};
use super::lexer::{Keyword, Lexer, Token};
use crate::error::{Error, Result};
use crate::types::{Column, DataType};

/// The SQL parser takes tokens from the lexer and parses the SQL syntax
/// into an Abstract Syntax Tree.
///
/// The AST represents the syntactic structure of a SQL query (the SELECT
/// and FROM clauses, values, arithmetic expressions, etc.). It only ensures
/// the syntax is well-formed, and does not know whether e.g. a given table
/// or column exists -- that is the job of the semantic layer.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl Parser<'_> {
    /// Parses the input string into a SQL statement AST. The entire string
    /// must be parsed as a single statement, ending with an optional
    /// semicolon.
    pub fn parse(statement: &str) -> Result<Statement> {
        let mut parser = Self::new(statement);
        let statement = parser.parse_statement()?;
        parser.skip(Token::Semicolon);
        if let Some(token) = parser.lexer.next().transpose()? {
            return Err(Error::Parse(format!("unexpected token {token}")));
        }
        Ok(statement)
    }

    /// Parses the input string as a single expression. Only used in tests.
    #[cfg(test)]
    pub fn parse_expr(expr: &str) -> Result<Expression> {
        let mut parser = Self::new(expr);
        let expression = parser.parse_expression()?;
        if let Some(token) = parser.lexer.next().transpose()? {
            return Err(Error::Parse(format!("unexpected token {token}")));
        }
        Ok(expression)
    }

    /// Creates a new parser for the given raw SQL string.
    fn new(input: &str) -> Parser<'_> {
        Parser {
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// Fetches the next lexer token, or errors if none is found.
    fn next(&mut self) -> Result<Token> {
        self.lexer
            .next()
            .transpose()?
            .ok_or_else(|| Error::Parse("unexpected end of input".into()))
    }

    /// Returns the next identifier, or errors if not found. Reserved words
    /// lex as keywords and are thereby rejected as identifiers.
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(Error::Parse(format!("expected identifier, got {token}"))),
        }
    }

    /// Returns the next lexer token if it satisfies the predicate.
    fn next_if(&mut self, predicate: impl Fn(&Token) -> bool) -> Option<Token> {
        self.peek().ok()?.filter(|t| predicate(t))?;
        self.next().ok()
    }

    /// Passes the next lexer token through the closure, consuming it if the
    /// closure returns Some. Returns the result of the closure.
    fn next_if_map<T>(&mut self, f: impl Fn(&Token) -> Option<T>) -> Option<T> {
        self.peek().ok()?.map(f)?.inspect(|_| drop(self.next()))
    }

    /// Consumes the next lexer token if it is the given token, returning
    /// true.
    fn next_is(&mut self, token: Token) -> bool {
        self.next_if(|t| t == &token).is_some()
    }

    /// Consumes the next lexer token if it's the expected token, or errors.
    fn expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::Parse(format!(
                "expected token {expect}, found {token}"
            )));
        }
        Ok(())
    }

    /// Consumes the next lexer token if it is the given token. Equivalent
    /// to next_is(), but expresses intent better.
    fn skip(&mut self, token: Token) {
        self.next_is(token);
    }

    /// Peeks the next lexer token if any, but transposes it for
    /// convenience.
    fn peek(&mut self) -> Result<Option<&Token>> {
        self.lexer
            .peek()
            .map(|r| r.as_ref().map_err(|err| err.clone()))
            .transpose()
    }

    /// Parses a SQL statement. Top-level discrimination is by the first
    /// keyword; anything else is an unrecognized command.
    fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek()? {
            Some(Token::Keyword(Keyword::Create)) => self.parse_create_table(),
            Some(Token::Keyword(Keyword::Drop)) => self.parse_drop_table(),
            Some(Token::Keyword(Keyword::Insert)) => self.parse_insert(),
            Some(Token::Keyword(Keyword::Select)) => self.parse_select(),
            Some(token) => Err(Error::UnknownCommand(token.to_string())),
            None => Err(Error::Parse("unexpected end of input".into())),
        }
    }

    /// Parses a CREATE TABLE statement.
    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect(Keyword::Create.into())?;
        self.expect(Keyword::Table.into())?;
        let name = self.next_ident()?;
        self.expect(Token::OpenParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_def()?);
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        self.expect(Token::CloseParen)?;
        Ok(Statement::CreateTable { name, columns })
    }

    /// Parses a CREATE TABLE column definition.
    fn parse_column_def(&mut self) -> Result<Column> {
        let name = self.next_ident()?;
        let data_type = match self.next()? {
            Token::Keyword(Keyword::Integer) => DataType::Integer,
            Token::Keyword(Keyword::Boolean) => DataType::Boolean,
            token => return Err(Error::Parse(format!("expected data type, found {token}"))),
        };
        Ok(Column { name, data_type })
    }

    /// Parses a DROP TABLE statement.
    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.expect(Keyword::Drop.into())?;
        self.expect(Keyword::Table.into())?;
        let mut if_exists = false;
        if self.next_is(Keyword::If.into()) {
            self.expect(Keyword::Exists.into())?;
            if_exists = true;
        }
        let name = self.next_ident()?;
        Ok(Statement::DropTable { name, if_exists })
    }

    /// Parses an INSERT statement.
    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(Keyword::Insert.into())?;
        self.expect(Keyword::Into.into())?;
        let table = self.next_ident()?;
        self.expect(Keyword::Values.into())?;
        let mut rows = Vec::new();
        loop {
            let mut row = Vec::new();
            self.expect(Token::OpenParen)?;
            loop {
                row.push(self.parse_expression()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::CloseParen)?;
            rows.push(row);
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(Statement::Insert { table, rows })
    }

    /// Parses a SELECT statement.
    fn parse_select(&mut self) -> Result<Statement> {
        self.expect(Keyword::Select.into())?;
        let projections = self.parse_projections()?;
        let from = self.parse_from_clause()?;
        let (r#where, group_by, order_by, limit, offset) = if from.is_some() {
            (
                self.parse_where_clause()?,
                self.parse_group_by_clause()?,
                self.parse_order_by_clause()?,
                self.parse_limit_clause()?,
                self.parse_offset_clause()?,
            )
        } else {
            // A constant SELECT has no row source, so no further clauses.
            (None, None, None, None, None)
        };
        Ok(Statement::Select(Box::new(SelectStatement {
            projections,
            from,
            r#where,
            group_by,
            order_by,
            limit,
            offset,
        })))
    }

    /// Parses the projection list: `expression [AS alias]`, comma
    /// separated. A bare `*` is a projection of its own.
    fn parse_projections(&mut self) -> Result<Vec<(Expression, Option<String>)>> {
        let mut projections = Vec::new();
        loop {
            let expr = if self.next_is(Token::Asterisk) {
                Expression::All
            } else {
                self.parse_expression()?
            };
            let mut alias = None;
            if self.next_is(Keyword::As.into()) {
                if expr == Expression::All {
                    return Err(Error::Parse("can't alias *".into()));
                }
                alias = Some(self.next_ident()?);
            }
            projections.push((expr, alias));
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(projections)
    }

    /// Parses a FROM clause with any number of joins, if present.
    fn parse_from_clause(&mut self) -> Result<Option<FromClause>> {
        if !self.next_is(Keyword::From.into()) {
            return Ok(None);
        }
        let table = self.next_ident()?;
        let alias = self.parse_alias()?;
        let mut joins = Vec::new();
        while let Some(kind) = self.parse_join_kind()? {
            let table = self.next_ident()?;
            let alias = self.parse_alias()?;
            self.expect(Keyword::On.into())?;
            let on = self.parse_expression()?;
            joins.push(Join {
                kind,
                table,
                alias,
                on,
            });
        }
        Ok(Some(FromClause {
            table,
            alias,
            joins,
        }))
    }

    /// Parses an optional table alias: `AS name`, or a bare identifier
    /// that is not a clause keyword.
    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.next_is(Keyword::As.into()) {
            return Ok(Some(self.next_ident()?));
        }
        if matches!(self.peek()?, Some(Token::Ident(_))) {
            return Ok(Some(self.next_ident()?));
        }
        Ok(None)
    }

    /// Parses a join kind, if present. The ON clause is required for all of
    /// them, so there is no CROSS JOIN.
    fn parse_join_kind(&mut self) -> Result<Option<JoinKind>> {
        if self.next_is(Keyword::Inner.into()) {
            self.expect(Keyword::Join.into())?;
            return Ok(Some(JoinKind::Inner));
        }
        if self.next_is(Keyword::Left.into()) {
            self.expect(Keyword::Outer.into())?;
            self.expect(Keyword::Join.into())?;
            return Ok(Some(JoinKind::Left));
        }
        if self.next_is(Keyword::Right.into()) {
            self.expect(Keyword::Outer.into())?;
            self.expect(Keyword::Join.into())?;
            return Ok(Some(JoinKind::Right));
        }
        if self.next_is(Keyword::Full.into()) {
            self.expect(Keyword::Outer.into())?;
            self.expect(Keyword::Join.into())?;
            return Ok(Some(JoinKind::Full));
        }
        Ok(None)
    }

    /// Parses a WHERE clause, if present.
    fn parse_where_clause(&mut self) -> Result<Option<Expression>> {
        if !self.next_is(Keyword::Where.into()) {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    /// Parses a GROUP BY clause, if present.
    fn parse_group_by_clause(&mut self) -> Result<Option<Expression>> {
        if !self.next_is(Keyword::Group.into()) {
            return Ok(None);
        }
        self.expect(Keyword::By.into())?;
        Ok(Some(self.parse_expression()?))
    }

    /// Parses an ORDER BY clause, if present.
    fn parse_order_by_clause(&mut self) -> Result<Option<(Expression, Direction)>> {
        if !self.next_is(Keyword::Order.into()) {
            return Ok(None);
        }
        self.expect(Keyword::By.into())?;
        let expr = self.parse_expression()?;
        let direction = self
            .next_if_map(|token| match token {
                Token::Keyword(Keyword::Asc) => Some(Direction::Ascending),
                Token::Keyword(Keyword::Desc) => Some(Direction::Descending),
                _ => None,
            })
            .unwrap_or_default();
        Ok(Some((expr, direction)))
    }

    /// Parses a LIMIT clause, if present.
    fn parse_limit_clause(&mut self) -> Result<Option<Expression>> {
        if !self.next_is(Keyword::Limit.into()) {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    /// Parses an OFFSET clause, if present.
    fn parse_offset_clause(&mut self) -> Result<Option<Expression>> {
        if !self.next_is(Keyword::Offset.into()) {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    /// Parses an expression using the precedence climbing algorithm. See:
    ///
    /// <https://en.wikipedia.org/wiki/Operator-precedence_parser#Precedence_climbing_method>
    ///
    /// Operator precedence, from loosest to tightest binding:
    ///
    /// * 1: OR
    /// * 2: AND
    /// * 3: =, <>, <, <=, >, >=, IS [NOT] NULL
    /// * 4: +, - (infix)
    /// * 5: *, /
    /// * 6: NOT, - (prefix)
    ///
    /// All infix operators are left-associative; prefix operators are
    /// right-associative by definition. The algorithm recursively parses
    /// the left-hand side (including prefix operators), then greedily
    /// consumes infix and postfix operators as long as their precedence is
    /// at least the current minimum, recursing into right-hand sides at the
    /// consumed operator's precedence.
    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_expression_at(0)
    }

    /// Parses an expression at the given minimum precedence.
    fn parse_expression_at(&mut self, min_precedence: Precedence) -> Result<Expression> {
        // If the left-hand side is a prefix operator, recursively parse it
        // and its operand. Otherwise, parse the left-hand side as an atom.
        let mut lhs = if let Some(prefix) = self.parse_prefix_operator_at(min_precedence) {
            let next_precedence = prefix.precedence() + Associativity::Right;
            let rhs = self.parse_expression_at(next_precedence)?;
            prefix.into_expression(rhs)
        } else {
            self.parse_expression_atom()?
        };

        // Apply any postfix operators to the left-hand side.
        while let Some(postfix) = self.parse_postfix_operator_at(min_precedence)? {
            lhs = postfix.into_expression(lhs)
        }

        // Repeatedly apply any infix operators as long as their precedence
        // is at least the current minimum (that of the upstack operator).
        while let Some(infix) = self.parse_infix_operator_at(min_precedence) {
            let next_precedence = infix.precedence() + Associativity::Left;
            let rhs = self.parse_expression_at(next_precedence)?;
            lhs = infix.into_expression(lhs, rhs);
        }

        // Apply any postfix operators after the binary operator. Consider
        // e.g. 1 + NULL IS NULL.
        while let Some(postfix) = self.parse_postfix_operator_at(min_precedence)? {
            lhs = postfix.into_expression(lhs)
        }

        Ok(lhs)
    }

    /// Parses an expression atom: a literal, a (possibly qualified) column
    /// name, a function call, or a parenthesized expression.
    fn parse_expression_atom(&mut self) -> Result<Expression> {
        Ok(match self.next()? {
            Token::Number(n) => {
                let n = n
                    .parse()
                    .map_err(|err| Error::Parse(format!("invalid integer: {err}")))?;
                Literal::Integer(n).into()
            }
            Token::Keyword(Keyword::True) => Literal::Boolean(true).into(),
            Token::Keyword(Keyword::False) => Literal::Boolean(false).into(),
            Token::Keyword(Keyword::Null) => Literal::Null.into(),

            // The built-in functions are reserved words, but parse like any
            // other call.
            Token::Keyword(Keyword::Abs) => Expression::Function("ABS".into(), self.parse_args()?),
            Token::Keyword(Keyword::Mod) => Expression::Function("MOD".into(), self.parse_args()?),
            Token::Keyword(Keyword::Count) => {
                Expression::Aggregate("COUNT".into(), self.parse_aggregate_args()?)
            }
            Token::Keyword(Keyword::Sum) => {
                Expression::Aggregate("SUM".into(), self.parse_aggregate_args()?)
            }

            // Generic function call. Validation rejects unknown names.
            Token::Ident(name) if self.next_is(Token::OpenParen) => {
                let mut args = Vec::new();
                while !self.next_is(Token::CloseParen) {
                    if !args.is_empty() {
                        self.expect(Token::Comma)?;
                    }
                    args.push(self.parse_expression()?);
                }
                Expression::Function(name, args)
            }

            // Column name, either qualified as table.column or unqualified.
            Token::Ident(table) if self.next_is(Token::Period) => {
                Expression::Column(Some(table), self.next_ident()?)
            }
            Token::Ident(column) => Expression::Column(None, column),

            // Parenthesized expression.
            Token::OpenParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::CloseParen)?;
                expr
            }

            token => {
                return Err(Error::Parse(format!(
                    "expected expression atom, found {token}"
                )));
            }
        })
    }

    /// Parses a parenthesized argument list, which may be empty.
    fn parse_args(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::OpenParen)?;
        let mut args = Vec::new();
        while !self.next_is(Token::CloseParen) {
            if !args.is_empty() {
                self.expect(Token::Comma)?;
            }
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    /// Like parse_args, but also accepts the bare `*` of COUNT(*) as an
    /// empty argument list.
    fn parse_aggregate_args(&mut self) -> Result<Vec<Expression>> {
        self.expect(Token::OpenParen)?;
        if self.next_is(Token::Asterisk) {
            self.expect(Token::CloseParen)?;
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        while !self.next_is(Token::CloseParen) {
            if !args.is_empty() {
                self.expect(Token::Comma)?;
            }
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    /// Parses a prefix operator, if there is one and its precedence is at
    /// least min_precedence.
    fn parse_prefix_operator_at(&mut self, min_precedence: Precedence) -> Option<PrefixOperator> {
        self.next_if_map(|token| {
            let operator = match token {
                Token::Keyword(Keyword::Not) => PrefixOperator::Not,
                Token::Minus => PrefixOperator::Minus,
                _ => return None,
            };
            Some(operator).filter(|op| op.precedence() >= min_precedence)
        })
    }

    /// Parses an infix operator, if there is one and its precedence is at
    /// least min_precedence.
    fn parse_infix_operator_at(&mut self, min_precedence: Precedence) -> Option<InfixOperator> {
        self.next_if_map(|token| {
            let operator = match token {
                Token::Asterisk => InfixOperator::Multiply,
                Token::Equal => InfixOperator::Equal,
                Token::GreaterThan => InfixOperator::GreaterThan,
                Token::GreaterThanOrEqual => InfixOperator::GreaterThanOrEqual,
                Token::Keyword(Keyword::And) => InfixOperator::And,
                Token::Keyword(Keyword::Or) => InfixOperator::Or,
                Token::LessThan => InfixOperator::LessThan,
                Token::LessThanOrEqual => InfixOperator::LessThanOrEqual,
                Token::Minus => InfixOperator::Subtract,
                Token::NotEqual => InfixOperator::NotEqual,
                Token::Plus => InfixOperator::Add,
                Token::Slash => InfixOperator::Divide,
                _ => return None,
            };
            Some(operator).filter(|op| op.precedence() >= min_precedence)
        })
    }

    /// Parses a postfix operator, if there is one and its precedence is at
    /// least min_precedence. IS [NOT] NULL is multiple tokens, so it can't
    /// go through next_if_map.
    fn parse_postfix_operator_at(
        &mut self,
        min_precedence: Precedence,
    ) -> Result<Option<PostfixOperator>> {
        if self.peek()? != Some(&Token::Keyword(Keyword::Is)) {
            return Ok(None);
        }
        if PostfixOperator::IsNull.precedence() < min_precedence {
            return Ok(None);
        }
        self.expect(Keyword::Is.into())?;
        let not = self.next_is(Keyword::Not.into());
        self.expect(Keyword::Null.into())?;
        Ok(Some(match not {
            false => PostfixOperator::IsNull,
            true => PostfixOperator::IsNotNull,
        }))
    }
}

/// Operator precedence.
type Precedence = u8;

/// Operator associativity.
enum Associativity {
    Left,
    Right,
}

impl Add<Associativity> for Precedence {
    type Output = Self;

    fn add(self, rhs: Associativity) -> Self {
        // Left-associative operators have increased precedence, so they
        // bind tighter to their left-hand side.
        self + match rhs {
            Associativity::Left => 1,
            Associativity::Right => 0,
        }
    }
}

/// Prefix operators.
enum PrefixOperator {
    Minus, // -a
    Not,   // NOT a
}

impl PrefixOperator {
    /// The operator precedence. Prefix operators bind tightest.
    fn precedence(&self) -> Precedence {
        6
    }

    /// Builds an AST expression for the operator.
    fn into_expression(self, rhs: Expression) -> Expression {
        let rhs = Box::new(rhs);
        match self {
            Self::Minus => Operator::Negate(rhs).into(),
            Self::Not => Operator::Not(rhs).into(),
        }
    }
}

/// Infix operators.
enum InfixOperator {
    Add,                // a + b
    And,                // a AND b
    Divide,             // a / b
    Equal,              // a = b
    GreaterThan,        // a > b
    GreaterThanOrEqual, // a >= b
    LessThan,           // a < b
    LessThanOrEqual,    // a <= b
    Multiply,           // a * b
    NotEqual,           // a <> b
    Or,                 // a OR b
    Subtract,           // a - b
}

impl InfixOperator {
    /// The operator precedence.
    fn precedence(&self) -> Precedence {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal
            | Self::NotEqual
            | Self::LessThan
            | Self::LessThanOrEqual
            | Self::GreaterThan
            | Self::GreaterThanOrEqual => 3,
            Self::Add | Self::Subtract => 4,
            Self::Multiply | Self::Divide => 5,
        }
    }

    /// Builds an AST expression for the infix operator.
    fn into_expression(self, lhs: Expression, rhs: Expression) -> Expression {
        let (lhs, rhs) = (Box::new(lhs), Box::new(rhs));
        match self {
            Self::Add => Operator::Add(lhs, rhs).into(),
            Self::And => Operator::And(lhs, rhs).into(),
            Self::Divide => Operator::Divide(lhs, rhs).into(),
            Self::Equal => Operator::Equal(lhs, rhs).into(),
            Self::GreaterThan => Operator::GreaterThan(lhs, rhs).into(),
            Self::GreaterThanOrEqual => Operator::GreaterThanOrEqual(lhs, rhs).into(),
            Self::LessThan => Operator::LessThan(lhs, rhs).into(),
            Self::LessThanOrEqual => Operator::LessThanOrEqual(lhs, rhs).into(),
            Self::Multiply => Operator::Multiply(lhs, rhs).into(),
            Self::NotEqual => Operator::NotEqual(lhs, rhs).into(),
            Self::Or => Operator::Or(lhs, rhs).into(),
            Self::Subtract => Operator::Subtract(lhs, rhs).into(),
        }
    }
}

/// Postfix operators.
enum PostfixOperator {
    IsNull,    // a IS NULL
    IsNotNull, // a IS NOT NULL
}

impl PostfixOperator {
    /// The operator precedence, shared with the comparison operators.
    fn precedence(&self) -> Precedence {
        3
    }

    /// Builds an AST expression for the operator.
    fn into_expression(self, lhs: Expression) -> Expression {
        let lhs = Box::new(lhs);
        match self {
            Self::IsNull => Operator::IsNull(lhs).into(),
            Self::IsNotNull => Operator::IsNotNull(lhs).into(),
        }
    }
}
