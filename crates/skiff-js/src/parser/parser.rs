//! The main parser implementation.

use crate::Error;
use crate::ast::*;
use crate::lexer::{Scanner, Token, TokenKind};

/// A recursive descent parser for JavaScript.
#[derive(Clone)]
pub struct Parser<'a> {
    pub(super) scanner: Scanner<'a>,
    pub(super) current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self { scanner, current }
    }

    /// Parses the source code into a Program AST node (script goal).
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses the source code in the module goal, accepting `import` and
    /// `export` declarations at the top level.
    pub fn parse_module(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_module_item()?);
        }

        Ok(Program { body })
    }

    fn parse_module_item(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Import => self.parse_import_declaration(),
            TokenKind::Export => self.parse_export_declaration(),
            _ => self.parse_statement(),
        }
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_variable_declaration(),
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Continue)
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => self.parse_block_statement(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            TokenKind::Import | TokenKind::Export => Err(Error::SyntaxError(
                "import and export may only appear at the top level of a module".into(),
            )),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Statement, Error> {
        let declaration = self.parse_variable_declaration_body()?;
        self.expect_semicolon()?;
        Ok(Statement::VariableDeclaration(declaration))
    }

    fn parse_variable_declaration_body(&mut self) -> Result<VariableDeclaration, Error> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(Error::SyntaxError("Expected variable keyword".into())),
        };
        self.advance();

        let mut declarations = Vec::new();

        loop {
            let id = self.expect_identifier()?;
            let init = if self.check(&TokenKind::Equal) {
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if init.is_none() && kind == VariableKind::Const {
                return Err(Error::SyntaxError(format!(
                    "Missing initializer in const declaration of '{}'",
                    id.name
                )));
            }

            declarations.push(VariableDeclarator { id, init });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_function_declaration(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'function'
        let id = self.expect_identifier()?;
        let params = self.parse_parameters()?;
        let body = self.parse_function_body()?;
        Ok(Statement::FunctionDeclaration(FunctionDeclaration {
            id,
            params,
            body,
        }))
    }

    pub(super) fn parse_parameters(&mut self) -> Result<Vec<Identifier>, Error> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(params)
    }

    pub(super) fn parse_function_body(&mut self) -> Result<Vec<Statement>, Error> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            self.advance();
            None
        } else if matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let declaration = self.parse_variable_declaration_body()?;
            self.expect(&TokenKind::Semicolon)?;
            Some(ForInit::Declaration(Box::new(declaration)))
        } else {
            let expression = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            Some(ForInit::Expression(expression))
        };

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(Statement::Return(ReturnStatement { argument }))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(Error::SyntaxError(
                "Illegal newline after throw".into(),
            ));
        }
        let argument = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Throw(ThrowStatement { argument }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'try'
        let block = self.parse_block_body()?;

        let handler = if self.check(&TokenKind::Catch) {
            self.advance();
            let param = if self.check(&TokenKind::LeftParen) {
                self.advance();
                let id = self.expect_identifier()?;
                self.expect(&TokenKind::RightParen)?;
                Some(id)
            } else {
                None
            };
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.check(&TokenKind::Finally) {
            self.advance();
            Some(self.parse_block_body()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(Error::SyntaxError(
                "Missing catch or finally after try".into(),
            ));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_block_statement(&mut self) -> Result<Statement, Error> {
        Ok(Statement::Block(self.parse_block_body()?))
    }

    fn parse_block_body(&mut self) -> Result<BlockStatement, Error> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(BlockStatement { body })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, Error> {
        let expression = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Expression(ExpressionStatement { expression }))
    }

    // --- Module items ---

    fn parse_import_declaration(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'import'

        // Side-effect only: import 'module';
        if let TokenKind::String(specifier) = &self.current.kind {
            let specifier = specifier.clone();
            self.advance();
            self.expect_semicolon()?;
            return Ok(Statement::Import(ImportDeclaration {
                specifier,
                imports: Vec::new(),
                side_effect_only: true,
            }));
        }

        let mut imports = Vec::new();

        // Default import binding
        if let TokenKind::Identifier(name) = &self.current.kind {
            imports.push(ImportSpecifier::Default(name.clone()));
            self.advance();
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.eat_contextual("from")?;
                return self.finish_import(imports);
            }
        }

        match &self.current.kind {
            TokenKind::Star => {
                self.advance();
                self.eat_contextual("as")?;
                let name = self.expect_identifier()?;
                imports.push(ImportSpecifier::Namespace(name.name));
            }
            TokenKind::LeftBrace => {
                self.advance();
                while !self.check(&TokenKind::RightBrace) {
                    let imported = self.expect_identifier()?;
                    let local = if self.check_contextual("as") {
                        self.advance();
                        Some(self.expect_identifier()?.name)
                    } else {
                        None
                    };
                    imports.push(ImportSpecifier::Named(imported.name, local));
                    if !self.check(&TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                self.expect(&TokenKind::RightBrace)?;
            }
            _ => {
                return Err(Error::SyntaxError(format!(
                    "Unexpected token in import declaration: {:?}",
                    self.current.kind
                )));
            }
        }

        self.eat_contextual("from")?;
        self.finish_import(imports)
    }

    fn finish_import(&mut self, imports: Vec<ImportSpecifier>) -> Result<Statement, Error> {
        let specifier = self.expect_string()?;
        self.expect_semicolon()?;
        Ok(Statement::Import(ImportDeclaration {
            specifier,
            imports,
            side_effect_only: false,
        }))
    }

    fn parse_export_declaration(&mut self) -> Result<Statement, Error> {
        self.advance(); // consume 'export'

        match &self.current.kind {
            // export * from 'm'; / export * as ns from 'm';
            TokenKind::Star => {
                self.advance();
                let name = if self.check_contextual("as") {
                    self.advance();
                    Some(self.expect_identifier()?.name)
                } else {
                    None
                };
                self.eat_contextual("from")?;
                let from_module = self.expect_string()?;
                self.expect_semicolon()?;
                Ok(Statement::Export(ExportDeclaration::All {
                    name,
                    from_module,
                }))
            }
            // export default <expression>;
            TokenKind::Default => {
                self.advance();
                let expression = self.parse_assignment()?;
                self.expect_semicolon()?;
                Ok(Statement::Export(ExportDeclaration::Default(expression)))
            }
            // export { a, b as c } [from 'm'];
            TokenKind::LeftBrace => {
                self.advance();
                let mut specifiers = Vec::new();
                while !self.check(&TokenKind::RightBrace) {
                    let local = self.expect_identifier()?;
                    let exported = if self.check_contextual("as") {
                        self.advance();
                        Some(self.expect_identifier()?.name)
                    } else {
                        None
                    };
                    specifiers.push(ExportSpecifier {
                        local: local.name,
                        exported,
                    });
                    if !self.check(&TokenKind::Comma) {
                        break;
                    }
                    self.advance();
                }
                self.expect(&TokenKind::RightBrace)?;
                let from_module = if self.check_contextual("from") {
                    self.advance();
                    Some(self.expect_string()?)
                } else {
                    None
                };
                self.expect_semicolon()?;
                Ok(Statement::Export(ExportDeclaration::Named {
                    specifiers,
                    from_module,
                }))
            }
            // export const x = ...; / export function f() {}
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                Ok(Statement::Export(ExportDeclaration::Declaration(Box::new(
                    declaration,
                ))))
            }
            TokenKind::Function => {
                let declaration = self.parse_function_declaration()?;
                Ok(Statement::Export(ExportDeclaration::Declaration(Box::new(
                    declaration,
                ))))
            }
            other => Err(Error::SyntaxError(format!(
                "Unexpected token in export declaration: {other:?}"
            ))),
        }
    }

    // --- Token helpers ---

    pub(super) fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    pub(super) fn check_contextual(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(name) if name == word)
    }

    fn eat_contextual(&mut self, word: &str) -> Result<(), Error> {
        if self.check_contextual(word) {
            self.advance();
            Ok(())
        } else {
            Err(Error::SyntaxError(format!(
                "Expected '{word}' but found {:?}",
                self.current.kind
            )))
        }
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(Error::SyntaxError(format!(
                "Expected {:?} but found {:?}",
                kind, self.current.kind
            )))
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<Identifier, Error> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(Identifier { name })
        } else {
            Err(Error::SyntaxError(format!(
                "Expected identifier but found {:?}",
                self.current.kind
            )))
        }
    }

    fn expect_string(&mut self) -> Result<String, Error> {
        if let TokenKind::String(value) = &self.current.kind {
            let value = value.clone();
            self.advance();
            Ok(value)
        } else {
            Err(Error::SyntaxError(format!(
                "Expected string literal but found {:?}",
                self.current.kind
            )))
        }
    }

    /// Consumes a semicolon, or applies automatic semicolon insertion when
    /// the next token is `}`, end of input, or preceded by a line terminator.
    pub(super) fn expect_semicolon(&mut self) -> Result<(), Error> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(());
        }
        if matches!(self.current.kind, TokenKind::RightBrace | TokenKind::Eof)
            || self.current.newline_before
        {
            return Ok(());
        }
        Err(Error::SyntaxError(format!(
            "Expected ';' but found {:?}",
            self.current.kind
        )))
    }

    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_const_declaration() {
        let program = Parser::new("const testValue = 42;").parse_program().unwrap();
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.kind, VariableKind::Const);
                assert_eq!(decl.declarations[0].id.name, "testValue");
                assert_eq!(
                    decl.declarations[0].init,
                    Some(Expression::Literal(Literal::Number(42.0)))
                );
            }
            other => panic!("expected variable declaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_export_const() {
        let program = Parser::new("export const testValue = 42;")
            .parse_module()
            .unwrap();
        match &program.body[0] {
            Statement::Export(ExportDeclaration::Declaration(inner)) => {
                assert!(matches!(**inner, Statement::VariableDeclaration(_)));
            }
            other => panic!("expected export declaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_imports() {
        let source = r#"
            import foo from 'foo';
            import { bar, baz as qux } from 'bar';
            import * as all from 'all';
            import 'side-effect';
        "#;
        let program = Parser::new(source).parse_module().unwrap();
        let specifiers: Vec<_> = program
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Statement::Import(import) => Some(import.specifier.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(specifiers, vec!["foo", "bar", "all", "side-effect"]);

        match &program.body[1] {
            Statement::Import(import) => {
                assert_eq!(
                    import.imports,
                    vec![
                        ImportSpecifier::Named("bar".into(), None),
                        ImportSpecifier::Named("baz".into(), Some("qux".into())),
                    ]
                );
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn parses_export_forms() {
        let source = r#"
            export default 1;
            export { foo, bar as baz };
            export * from 'reexport';
            export * as ns from 'namespace';
            export { a } from 'other';
        "#;
        let program = Parser::new(source).parse_module().unwrap();
        assert_eq!(program.body.len(), 5);
        assert!(matches!(
            program.body[0],
            Statement::Export(ExportDeclaration::Default(_))
        ));
        assert!(matches!(
            &program.body[3],
            Statement::Export(ExportDeclaration::All { name: Some(name), .. }) if name == "ns"
        ));
    }

    #[test]
    fn rejects_import_in_script_goal() {
        let result = Parser::new("import 'foo';").parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn inserts_semicolons_at_line_breaks() {
        let program = Parser::new("let a = 1\nlet b = 2\n").parse_program().unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn rejects_const_without_initializer() {
        assert!(Parser::new("const x;").parse_program().is_err());
    }
}
