use crate::{
    codegen,
    ir::Module,
    parser,
    token::Spanned,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Parse(Spanned<parser::Error>),
    Codegen(Spanned<codegen::Error>),
}

impl From<Spanned<parser::Error>> for Error {
    fn from(error: Spanned<parser::Error>) -> Self {
        Error::Parse(error)
    }
}

impl From<Spanned<codegen::Error>> for Error {
    fn from(error: Spanned<codegen::Error>) -> Self {
        Error::Codegen(error)
    }
}

/// Lexes, parses and lowers `src` into a module named `module_name`.
pub fn compile(src: &str, module_name: &str) -> Result<Module, Error> {
    let program = parser::parse_program(src)?;
    let module = codegen::CodeGenerator::new(module_name).generate(&program)?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer;

    #[test]
    fn test_compile() {
        let module = compile(r#"dikha_bhai "hi""#, "hello").unwrap();
        let expected = indoc! {r#"
            ; ModuleID = 'hello'

            @.str = private unnamed_addr constant [3 x i8] c"hi\00"

            declare void @dikha_bhai(ptr)

            define i32 @main() {
            entry:
              call void @dikha_bhai(ptr @.str)
              ret i32 0
            }
        "#};
        assert_eq!(module.to_string(), expected);
    }

    #[test]
    fn test_lexer_failure() {
        let error = compile("dikha_bhai \"abc", "m").unwrap_err();
        let Error::Parse(error) = error else {
            panic!("expected a parse error");
        };
        assert_eq!(error.inner, parser::Error::Lexer(lexer::Error::UnterminatedString));
    }

    #[test]
    fn test_codegen_failure() {
        let error = compile("dekh f(x bool) {}", "m").unwrap_err();
        assert_eq!(format!("{error:#}"), "1:10: cannot lower parameter type `bool`");
        assert!(matches!(error, Error::Codegen(_)));
    }

    #[test]
    fn test_demo_program() {
        let module = compile(include_str!("../demos/big.awara"), "big").unwrap();
        assert!(module.get_function("main").is_some());
        assert!(module.get_declaration(codegen::PRINT_ENTRY_POINT).is_some());
    }
}
