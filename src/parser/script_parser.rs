use super::ast::{
    BinaryOp, ConditionalOp, DeclaredType, Declarations, Expression,
    ExternalFunctionDeclaration, ModuleDeclaration, Program, Statement, StatementList, UnaryOp,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Recursive-descent parser for AudioScript
pub struct ScriptParser {
    tokens: Vec<Token>,
    current: usize,
}

impl ScriptParser {
    /// Creates a new parser over a token stream
    ///
    /// An `Eof` token is appended if the stream does not already end in one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof) {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, 0));
        }
        ScriptParser { tokens, current: 0 }
    }

    /// Parses the tokens into an AST
    ///
    /// `program = [declarations] statement-list EOF`
    pub fn parse(&mut self) -> Result<Program> {
        let declarations = if self.check(&TokenKind::Declarations) {
            Some(self.parse_declarations()?)
        } else {
            None
        };

        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { declarations, body })
    }

    // ------------------------------------------------------------------
    // Declarations header
    // ------------------------------------------------------------------

    fn parse_declarations(&mut self) -> Result<Declarations> {
        self.consume(TokenKind::Declarations)?;
        self.consume(TokenKind::LeftBrace)?;

        let mut declarations = Declarations::default();

        if self.match_kind(&TokenKind::Types) {
            self.consume(TokenKind::Colon)?;
            loop {
                let name = self.expect_identifier()?;
                declarations.types.push(DeclaredType { name });
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::Semicolon)?;
        }

        if self.match_kind(&TokenKind::Modules) {
            self.consume(TokenKind::LeftBrace)?;
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
                declarations.modules.push(self.parse_module()?);
            }
            self.consume(TokenKind::RightBrace)?;
        }

        self.consume(TokenKind::RightBrace)?;
        Ok(declarations)
    }

    fn parse_module(&mut self) -> Result<ModuleDeclaration> {
        let name = self.expect_identifier()?;
        self.consume(TokenKind::LeftBrace)?;

        let mut functions = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            functions.push(self.parse_external_function()?);
        }
        self.consume(TokenKind::RightBrace)?;

        Ok(ModuleDeclaration { name, functions })
    }

    /// `[type] name(type, ...);`
    fn parse_external_function(&mut self) -> Result<ExternalFunctionDeclaration> {
        let return_type = match (&self.peek().kind, &self.peek_next().kind) {
            (TokenKind::TypeName(_), _) => Some(self.expect_type_name()?),
            (TokenKind::Identifier(_), TokenKind::Identifier(_)) => {
                Some(self.expect_type_name()?)
            }
            _ => None,
        };
        let name = self.expect_identifier()?;

        self.consume(TokenKind::LeftParen)?;
        let mut parameter_types = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                parameter_types.push(self.expect_type_name()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;
        self.consume(TokenKind::Semicolon)?;

        Ok(ExternalFunctionDeclaration {
            name,
            parameter_types,
            return_type,
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Statement> {
        match &self.peek().kind {
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::NoOp)
            }
            TokenKind::Def => self.parse_function_declaration(),
            TokenKind::If => {
                self.advance();
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(Statement::If { condition, body })
            }
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression()?;
                let body = self.parse_block()?;
                Ok(Statement::While { condition, body })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon)?;
                Ok(Statement::Return { value })
            }
            TokenKind::TypeName(_) => self.parse_var_declaration(),
            TokenKind::Identifier(name) => {
                let name = name.clone();
                match self.peek_next().kind {
                    // Declared external type used as a variable type: `Sound s;`
                    TokenKind::Identifier(_) => self.parse_var_declaration(),
                    TokenKind::Assign => {
                        self.advance(); // name
                        self.advance(); // =
                        let value = self.parse_expression()?;
                        self.consume(TokenKind::Semicolon)?;
                        Ok(Statement::Assignment { name, value })
                    }
                    _ => self.parse_expression_statement(),
                }
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let expr = self.parse_expression()?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::Expression(expr))
    }

    /// `{ statement-list }`
    fn parse_block(&mut self) -> Result<StatementList> {
        self.consume(TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RightBrace)?;
        Ok(statements)
    }

    /// `type a, b, c;`
    fn parse_var_declaration(&mut self) -> Result<Statement> {
        let type_name = self.expect_type_name()?;
        let mut names = vec![self.expect_identifier()?];
        while self.match_kind(&TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        self.consume(TokenKind::Semicolon)?;
        Ok(Statement::VarDeclaration { type_name, names })
    }

    /// `def name(a, b) { ... }`
    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.consume(TokenKind::Def)?;
        let name = self.expect_identifier()?;

        self.consume(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;

        let body = self.parse_block()?;
        Ok(Statement::FunctionDeclaration { name, params, body })
    }

    // ------------------------------------------------------------------
    // Expressions, lowest precedence first
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.match_kind(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expression::Conditional {
                op: ConditionalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;
        while self.match_kind(&TokenKind::And) {
            let right = self.parse_comparison()?;
            left = Expression::Conditional {
                op: ConditionalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let left = self.parse_sum()?;

        let op = match self.peek().kind {
            TokenKind::Eq => ConditionalOp::Eq,
            TokenKind::NotEq => ConditionalOp::NotEq,
            TokenKind::Lt => ConditionalOp::Lt,
            TokenKind::Gt => ConditionalOp::Gt,
            TokenKind::LtEq => ConditionalOp::LtEq,
            TokenKind::GtEq => ConditionalOp::GtEq,
            _ => return Ok(left),
        };
        self.advance();

        let right = self.parse_sum()?;
        Ok(Expression::Conditional {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_sum(&mut self) -> Result<Expression> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expression> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expression> {
        let token = self.advance();
        match token.kind {
            TokenKind::Plus => Ok(Expression::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(self.parse_factor()?),
            }),
            TokenKind::Minus => Ok(Expression::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(self.parse_factor()?),
            }),
            TokenKind::Integer(n) => Ok(Expression::IntLiteral(n)),
            TokenKind::Float(f) => Ok(Expression::FloatLiteral(f)),
            TokenKind::String(s) => Ok(Expression::StringLiteral(s)),
            TokenKind::True => Ok(Expression::BoolLiteral(true)),
            TokenKind::False => Ok(Expression::BoolLiteral(false)),
            TokenKind::Identifier(name) => {
                if self.match_kind(&TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    Ok(Expression::FunctionCall { name, args })
                } else {
                    Ok(Expression::Variable(name))
                }
            }
            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            other => Err(Error::UnexpectedToken {
                line: token.line,
                expected: "expression".to_string(),
                got: other.to_string(),
            }),
        }
    }

    /// Arguments after the opening `(` of a call, through the closing `)`
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen)?;
        Ok(args)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Builtin type keyword or declared type identifier
    fn expect_type_name(&mut self) -> Result<String> {
        match &self.peek().kind {
            TokenKind::TypeName(name) | TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("type name")),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            return Error::UnexpectedEof;
        }
        Error::UnexpectedToken {
            line: token.line,
            expected: expected.to_string(),
            got: token.kind.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::ScriptScanner;

    fn parse_str(source: &str) -> Result<Program> {
        let mut scanner = ScriptScanner::new(source);
        let tokens = scanner.scan_tokens()?;
        let mut parser = ScriptParser::new(tokens);
        parser.parse()
    }

    #[test]
    fn test_var_declaration_and_assignment() {
        let program = parse_str("var x; x = 3;").unwrap();
        assert!(program.declarations.is_none());
        assert_eq!(
            program.body,
            vec![
                Statement::VarDeclaration {
                    type_name: "VAR".to_string(),
                    names: vec!["x".to_string()],
                },
                Statement::Assignment {
                    name: "x".to_string(),
                    value: Expression::IntLiteral(3),
                },
            ]
        );
    }

    #[test]
    fn test_multiple_names_and_named_type() {
        let program = parse_str("NUMBER a, b; Sound s;").unwrap();
        assert_eq!(
            program.body[0],
            Statement::VarDeclaration {
                type_name: "NUMBER".to_string(),
                names: vec!["a".to_string(), "b".to_string()],
            }
        );
        assert_eq!(
            program.body[1],
            Statement::VarDeclaration {
                type_name: "Sound".to_string(),
                names: vec!["s".to_string()],
            }
        );
    }

    #[test]
    fn test_precedence() {
        let program = parse_str("1 + 2 * 3;").unwrap();
        assert_eq!(
            program.body[0],
            Statement::Expression(Expression::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expression::IntLiteral(1)),
                right: Box::new(Expression::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expression::IntLiteral(2)),
                    right: Box::new(Expression::IntLiteral(3)),
                }),
            })
        );
    }

    #[test]
    fn test_connectives_bind_looser_than_comparisons() {
        let program = parse_str("a < 1 or b >= 2 and c == 3;").unwrap();
        match &program.body[0] {
            Statement::Expression(Expression::Conditional { op, right, .. }) => {
                assert_eq!(*op, ConditionalOp::Or);
                assert!(matches!(
                    **right,
                    Expression::Conditional {
                        op: ConditionalOp::And,
                        ..
                    }
                ));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_function_declaration_and_call() {
        let program = parse_str("def add(a, b) { return a + b; } r = add(2, 3);").unwrap();
        match &program.body[0] {
            Statement::FunctionDeclaration { name, params, body } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(body[0], Statement::Return { value: Some(_) }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
        assert_eq!(
            program.body[1],
            Statement::Assignment {
                name: "r".to_string(),
                value: Expression::FunctionCall {
                    name: "add".to_string(),
                    args: vec![Expression::IntLiteral(2), Expression::IntLiteral(3)],
                },
            }
        );
    }

    #[test]
    fn test_control_flow() {
        let program = parse_str("while (i < 3) { i = i + 1; } if i == 3 { ; }").unwrap();
        assert!(matches!(program.body[0], Statement::While { .. }));
        match &program.body[1] {
            Statement::If { body, .. } => assert_eq!(body, &vec![Statement::NoOp]),
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_declarations_header() {
        let source = r#"
            Declarations {
                Types: Sound, Track;
                Modules {
                    audio {
                        Sound load(STRING);
                        play(Sound);
                    }
                    math { NUMBER sqrtFn(NUMBER); }
                }
            }
            play(load("a.wav"));
        "#;
        let program = parse_str(source).unwrap();
        let declarations = program.declarations.unwrap();

        assert_eq!(
            declarations.types,
            vec![
                DeclaredType {
                    name: "Sound".to_string()
                },
                DeclaredType {
                    name: "Track".to_string()
                },
            ]
        );
        assert_eq!(declarations.modules.len(), 2);
        assert_eq!(
            declarations.modules[0].functions,
            vec![
                ExternalFunctionDeclaration {
                    name: "load".to_string(),
                    parameter_types: vec!["STRING".to_string()],
                    return_type: Some("Sound".to_string()),
                },
                ExternalFunctionDeclaration {
                    name: "play".to_string(),
                    parameter_types: vec!["Sound".to_string()],
                    return_type: None,
                },
            ]
        );
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_missing_semicolon() {
        assert_eq!(parse_str("x = 3").unwrap_err(), Error::UnexpectedEof);
        assert!(matches!(
            parse_str("x = 3 y = 4;"),
            Err(Error::UnexpectedToken { line: 1, .. })
        ));
    }

    #[test]
    fn test_bare_return() {
        let program = parse_str("def f() { return; }").unwrap();
        match &program.body[0] {
            Statement::FunctionDeclaration { body, .. } => {
                assert_eq!(body[0], Statement::Return { value: None })
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }
}
