//! Expression parsing (precedence climbing).

use super::parser::Parser;
use crate::Error;
use crate::ast::*;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parses a full expression.
    pub(super) fn parse_expression(&mut self) -> Result<Expression, Error> {
        self.parse_assignment()
    }

    pub(super) fn parse_assignment(&mut self) -> Result<Expression, Error> {
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }

        let expr = self.parse_conditional()?;

        let operator = match &self.current.kind {
            TokenKind::Equal => Some(AssignmentOperator::Assign),
            TokenKind::PlusEqual => Some(AssignmentOperator::AddAssign),
            TokenKind::MinusEqual => Some(AssignmentOperator::SubtractAssign),
            TokenKind::StarEqual => Some(AssignmentOperator::MultiplyAssign),
            TokenKind::SlashEqual => Some(AssignmentOperator::DivideAssign),
            TokenKind::PercentEqual => Some(AssignmentOperator::ModuloAssign),
            _ => None,
        };

        if let Some(operator) = operator {
            if !matches!(expr, Expression::Identifier(_) | Expression::Member(_)) {
                return Err(Error::SyntaxError("Invalid assignment target".into()));
            }
            self.advance();
            let right = self.parse_assignment()?;
            return Ok(Expression::Assignment(AssignmentExpression {
                operator,
                left: Box::new(expr),
                right: Box::new(right),
            }));
        }

        Ok(expr)
    }

    /// Attempts to parse an arrow function; restores the parser state and
    /// returns None when the lookahead does not form one.
    fn try_parse_arrow(&mut self) -> Result<Option<Expression>, Error> {
        let snapshot = self.clone();

        let params = match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.check(&TokenKind::Arrow) {
                    vec![Identifier { name }]
                } else {
                    *self = snapshot;
                    return Ok(None);
                }
            }
            TokenKind::LeftParen => match self.parse_parameters() {
                Ok(params) if self.check(&TokenKind::Arrow) => params,
                _ => {
                    *self = snapshot;
                    return Ok(None);
                }
            },
            _ => return Ok(None),
        };

        self.expect(&TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LeftBrace) {
            ArrowBody::Block(self.parse_function_body()?)
        } else {
            ArrowBody::Expression(Box::new(self.parse_assignment()?))
        };

        Ok(Some(Expression::Arrow(ArrowFunctionExpression {
            params,
            body,
        })))
    }

    fn parse_conditional(&mut self) -> Result<Expression, Error> {
        let test = self.parse_nullish()?;
        if self.check(&TokenKind::Question) {
            self.advance();
            let consequent = self.parse_assignment()?;
            self.expect(&TokenKind::Colon)?;
            let alternate = self.parse_assignment()?;
            return Ok(Expression::Conditional(ConditionalExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            }));
        }
        Ok(test)
    }

    fn parse_nullish(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_logical_or()?;
        while self.check(&TokenKind::QuestionQuestion) {
            self.advance();
            let right = self.parse_logical_or()?;
            left = binary(BinaryOperator::NullishCoalescing, left, right);
        }
        Ok(left)
    }

    fn parse_logical_or(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_logical_and()?;
        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = binary(BinaryOperator::LogicalOr, left, right);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(BinaryOperator::LogicalAnd, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_relational()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::EqualEqualEqual => BinaryOperator::StrictEqual,
                TokenKind::BangEqualEqual => BinaryOperator::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::Less => BinaryOperator::LessThan,
                TokenKind::LessEqual => BinaryOperator::LessThanEqual,
                TokenKind::Greater => BinaryOperator::GreaterThan,
                TokenKind::GreaterEqual => BinaryOperator::GreaterThanEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;
        loop {
            let operator = match &self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        let operator = match &self.current.kind {
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Bang => Some(UnaryOperator::LogicalNot),
            TokenKind::Typeof => Some(UnaryOperator::Typeof),
            TokenKind::Void => Some(UnaryOperator::Void),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument: Box::new(argument),
            }));
        }

        if matches!(
            self.current.kind,
            TokenKind::PlusPlus | TokenKind::MinusMinus
        ) {
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();
            let argument = self.parse_unary()?;
            if !matches!(argument, Expression::Identifier(_) | Expression::Member(_)) {
                return Err(Error::SyntaxError(
                    "Invalid target for update expression".into(),
                ));
            }
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(argument),
                prefix: true,
            }));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, Error> {
        let expr = self.parse_call_member()?;
        if !self.current.newline_before
            && matches!(
                self.current.kind,
                TokenKind::PlusPlus | TokenKind::MinusMinus
            )
        {
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            if !matches!(expr, Expression::Identifier(_) | Expression::Member(_)) {
                return Err(Error::SyntaxError(
                    "Invalid target for update expression".into(),
                ));
            }
            self.advance();
            return Ok(Expression::Update(UpdateExpression {
                operator,
                argument: Box::new(expr),
                prefix: false,
            }));
        }
        Ok(expr)
    }

    fn parse_call_member(&mut self) -> Result<Expression, Error> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.expect_identifier()?;
                    expr = member(expr, MemberProperty::Identifier(property));
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = member(expr, MemberProperty::Expression(Box::new(property)));
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, Error> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.parse_assignment()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let kind = self.current.kind.clone();
        match kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) | TokenKind::Template(s) => {
                self.advance();
                Ok(Expression::Literal(Literal::String(s)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Literal(Literal::Null))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(Identifier { name }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                let params = self.parse_parameters()?;
                let body = self.parse_function_body()?;
                Ok(Expression::Function(FunctionExpression { id, params, body }))
            }
            TokenKind::New => {
                self.advance();
                let mut callee = self.parse_primary()?;
                // Member accesses bind tighter than the constructor call
                loop {
                    match &self.current.kind {
                        TokenKind::Dot => {
                            self.advance();
                            let property = self.expect_identifier()?;
                            callee = member(callee, MemberProperty::Identifier(property));
                        }
                        TokenKind::LeftBracket => {
                            self.advance();
                            let property = self.parse_expression()?;
                            self.expect(&TokenKind::RightBracket)?;
                            callee = member(callee, MemberProperty::Expression(Box::new(property)));
                        }
                        _ => break,
                    }
                }
                let arguments = if self.check(&TokenKind::LeftParen) {
                    self.parse_arguments()?
                } else {
                    Vec::new()
                };
                Ok(Expression::New(NewExpression {
                    callee: Box::new(callee),
                    arguments,
                }))
            }
            other => Err(Error::SyntaxError(format!("Unexpected token: {other:?}"))),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, Error> {
        self.expect(&TokenKind::LeftBracket)?;
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            if self.check(&TokenKind::Comma) {
                // Hole
                elements.push(None);
                self.advance();
                continue;
            }
            elements.push(Some(self.parse_assignment()?));
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(ArrayExpression { elements }))
    }

    fn parse_object_literal(&mut self) -> Result<Expression, Error> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let key = match &self.current.kind {
                TokenKind::Identifier(name) => {
                    let name = name.clone();
                    self.advance();
                    PropertyKey::Identifier(Identifier { name })
                }
                TokenKind::String(s) => {
                    let s = s.clone();
                    self.advance();
                    PropertyKey::Literal(Literal::String(s))
                }
                TokenKind::Number(n) => {
                    let n = *n;
                    self.advance();
                    PropertyKey::Literal(Literal::Number(n))
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let expr = self.parse_assignment()?;
                    self.expect(&TokenKind::RightBracket)?;
                    PropertyKey::Computed(Box::new(expr))
                }
                other => {
                    return Err(Error::SyntaxError(format!(
                        "Unexpected token in object literal: {other:?}"
                    )));
                }
            };

            let property = if self.check(&TokenKind::Colon) {
                self.advance();
                let value = self.parse_assignment()?;
                Property {
                    key,
                    value,
                    shorthand: false,
                }
            } else if let PropertyKey::Identifier(id) = &key {
                // Shorthand: { foo }
                let value = Expression::Identifier(id.clone());
                Property {
                    key,
                    value,
                    shorthand: true,
                }
            } else {
                return Err(Error::SyntaxError(
                    "Expected ':' in object literal".into(),
                ));
            };
            properties.push(property);

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(ObjectExpression { properties }))
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn member(object: Expression, property: MemberProperty) -> Expression {
    Expression::Member(MemberExpression {
        object: Box::new(object),
        property,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;

    fn parse_expr(source: &str) -> Expression {
        let program = Parser::new(source).parse_program().unwrap();
        match program.body.into_iter().next().unwrap() {
            Statement::Expression(stmt) => stmt.expression,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match parse_expr("1 + 2 * 3;") {
            Expression::Binary(add) => {
                assert_eq!(add.operator, BinaryOperator::Add);
                assert!(matches!(
                    *add.right,
                    Expression::Binary(BinaryExpression {
                        operator: BinaryOperator::Multiply,
                        ..
                    })
                ));
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_arrow_functions() {
        assert!(matches!(parse_expr("x => x + 1;"), Expression::Arrow(_)));
        assert!(matches!(
            parse_expr("(a, b) => { return a + b; };"),
            Expression::Arrow(_)
        ));
        // Parenthesized expression is not an arrow
        assert!(matches!(
            parse_expr("(1 + 2);"),
            Expression::Binary(_)
        ));
    }

    #[test]
    fn parses_member_and_call_chains() {
        match parse_expr("foo.bar(1)[0];") {
            Expression::Member(m) => {
                assert!(matches!(m.property, MemberProperty::Expression(_)));
                assert!(matches!(*m.object, Expression::Call(_)));
            }
            other => panic!("expected member expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_new_expression() {
        match parse_expr("new Error('boom');") {
            Expression::New(new) => {
                assert_eq!(new.arguments.len(), 1);
            }
            other => panic!("expected new expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_object_literals() {
        match parse_expr("({ a: 1, b, 'c': 3 });") {
            Expression::Object(obj) => {
                assert_eq!(obj.properties.len(), 3);
                assert!(obj.properties[1].shorthand);
            }
            other => panic!("expected object literal, got {other:?}"),
        }
    }
}
