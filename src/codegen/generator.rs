use std::collections::{HashMap, HashSet};

use crate::{
    ast::{self, Expr, ExprKind, FunctionDecl, LiteralKind, Print, Stmt},
    codegen::{
        Error, BOOL_TO_STRING_ENTRY_POINT, GC_REGISTER_ENTRY_POINT, INT_TO_STRING_ENTRY_POINT,
        PRINT_ENTRY_POINT,
    },
    ir::{
        BasicBlock, BinaryOp, Function, FunctionId, Instruction, Module, Parameter, Terminator,
        Type, Value,
    },
    lexer,
    token::{Span, Spanned},
};

type Result<T> = std::result::Result<T, Spanned<Error>>;

/// Where the next instruction goes.
#[derive(Copy, Clone, Debug)]
pub(super) struct InsertPoint {
    function: FunctionId,
    block: usize,
    next_temp: u32,
}

/// Walks the AST once, in source order, emitting into a single module.
pub struct CodeGenerator {
    module: Module,
    /// Every function defined so far, nested ones included.
    functions: HashMap<Box<str>, FunctionId>,
    /// `None` at the top level.
    pub(super) current: Option<InsertPoint>,
    /// The synthesized `main`, which holds top-level statements.
    pub(super) main: Option<InsertPoint>,
    /// Value of the last lowered expression. Consumed by the enclosing node.
    last_value: Option<Value>,
}

impl CodeGenerator {
    pub fn new(module_name: &str) -> CodeGenerator {
        CodeGenerator {
            module: Module::new(module_name),
            functions: HashMap::new(),
            current: None,
            main: None,
            last_value: None,
        }
    }

    pub fn generate(mut self, program: &ast::Program) -> Result<Module> {
        for stmt in &program.stmts {
            self.g_top_level_stmt(stmt)?;
        }
        Ok(self.finish())
    }

    /// Seals the synthesized `main`, if any, and returns the module.
    pub(super) fn finish(mut self) -> Module {
        if let Some(main) = self.main.take() {
            self.current = Some(main);
            self.seal(Terminator::Ret(Some(Value::i32(0))));
        }
        self.module
    }

    fn g_top_level_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Print(print) => {
                self.current = Some(self.main_insert_point(print.span)?);
                self.g_print(print)?;
                self.main = self.current.take();
                Ok(())
            }
            Stmt::Function(function) => self.g_function(function),
        }
    }

    fn g_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Print(print) => self.g_print(print),
            Stmt::Function(function) => self.g_function(function),
        }
    }

    fn g_print(&mut self, print: &Print) -> Result<()> {
        self.g_expr(&print.expr)?;
        let value = self.take_value(print.span)?;
        let value = match value.ty() {
            Type::Ptr => value,
            Type::I32 => self.g_to_string(INT_TO_STRING_ENTRY_POINT, value),
            Type::I1 => self.g_to_string(BOOL_TO_STRING_ENTRY_POINT, value),
            Type::Void => return Err(print.span.wrap(Error::MissingValue)),
        };
        self.module.declare(PRINT_ENTRY_POINT, Type::Void, &[Type::Ptr]);
        self.emit(Instruction::Call {
            dest: None,
            ret: Type::Void,
            callee: PRINT_ENTRY_POINT.into(),
            args: vec![value],
        });
        Ok(())
    }

    /// Converts a scalar into a fresh runtime string, which is handed to the
    /// collector.
    fn g_to_string(&mut self, entry_point: &str, value: Value) -> Value {
        self.module.declare(entry_point, Type::Ptr, &[value.ty()]);
        let dest = self.next_temp();
        self.emit(Instruction::Call {
            dest: Some(dest),
            ret: Type::Ptr,
            callee: entry_point.into(),
            args: vec![value],
        });
        let string = Value::Temp {
            id: dest,
            ty: Type::Ptr,
        };
        self.track(&string);
        string
    }

    fn g_function(&mut self, decl: &FunctionDecl) -> Result<()> {
        let name = &decl.name;
        self.check_undefined(&name.name, name.span)?;

        let mut seen = HashSet::new();
        let params = decl
            .params
            .iter()
            .map(|param| {
                let name = &param.name;
                if !seen.insert(&*name.name) {
                    return Err(name.span.wrap(Error::DuplicateParameter {
                        name: name.name.clone(),
                    }));
                }
                Ok(Parameter {
                    name: param.name.name.clone(),
                    ty: lower_type(&param.ty)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut function = Function::new(&*name.name, params, Type::Void);
        function.blocks.push(BasicBlock::new("entry"));
        let id = self.module.push_function(function);
        self.functions.insert(name.name.clone(), id);

        let enclosing = self.current.replace(InsertPoint {
            function: id,
            block: 0,
            next_temp: 0,
        });
        for stmt in &decl.body {
            self.g_stmt(stmt)?;
        }
        // Return values are not lowered.
        self.seal(Terminator::Ret(None));
        self.current = enclosing;
        Ok(())
    }

    fn g_expr(&mut self, expr: &Expr) -> Result<()> {
        self.last_value = None;
        match &expr.kind {
            ExprKind::Literal(literal) => {
                let value = self.g_literal(literal, expr.span)?;
                self.track(&value);
                self.last_value = Some(value);
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.g_expr(lhs)?;
                let lhs = self.take_value(lhs.span)?;
                self.g_expr(rhs)?;
                let rhs = self.take_value(rhs.span)?;

                let ty = lhs.ty();
                if ty != rhs.ty() || !ty.is_integer() {
                    return Err(expr.span.wrap(Error::InvalidOperands {
                        op: *op,
                        lhs: ty,
                        rhs: rhs.ty(),
                    }));
                }
                let dest = self.next_temp();
                let op = match op {
                    ast::BinaryOperator::And => BinaryOp::And,
                    ast::BinaryOperator::Or => BinaryOp::Or,
                };
                self.emit(Instruction::Binary {
                    dest,
                    op,
                    ty,
                    lhs,
                    rhs,
                });
                self.last_value = Some(Value::Temp { id: dest, ty });
            }
        }
        Ok(())
    }

    fn g_literal(&mut self, literal: &ast::Literal, span: Span) -> Result<Value> {
        let raw = &*literal.raw;
        let value = match literal.kind {
            LiteralKind::Number => {
                let n = raw.parse::<i32>().map_err(|_| {
                    span.wrap(Error::MalformedLiteral {
                        raw: literal.raw.clone(),
                    })
                })?;
                Value::i32(n)
            }
            LiteralKind::String => self.module.intern_string(&lexer::unescape(raw)),
            LiteralKind::Boolean => Value::bool(raw == "true"),
            LiteralKind::Khali => Value::Null,
        };
        Ok(value)
    }

    /// Registers non-constant values with the collector.
    pub(super) fn track(&mut self, value: &Value) {
        if value.is_constant() {
            return;
        }
        self.module.declare(GC_REGISTER_ENTRY_POINT, Type::Void, &[Type::Ptr]);
        self.emit(Instruction::Call {
            dest: None,
            ret: Type::Void,
            callee: GC_REGISTER_ENTRY_POINT.into(),
            args: vec![value.clone()],
        });
    }
}

/// Helper methods.
impl CodeGenerator {
    /// Returns the insertion point of `main`, creating the function on first
    /// use.
    pub(super) fn main_insert_point(&mut self, span: Span) -> Result<InsertPoint> {
        if let Some(main) = self.main {
            return Ok(main);
        }
        self.check_undefined("main", span)?;

        let mut main = Function::new("main", vec![], Type::I32);
        main.blocks.push(BasicBlock::new("entry"));
        let id = self.module.push_function(main);
        self.functions.insert("main".into(), id);
        Ok(InsertPoint {
            function: id,
            block: 0,
            next_temp: 0,
        })
    }

    fn check_undefined(&self, name: &str, span: Span) -> Result<()> {
        if self.functions.contains_key(name) {
            return Err(span.wrap(Error::DuplicateFunction { name: name.into() }));
        }
        Ok(())
    }

    fn take_value(&mut self, span: Span) -> Result<Value> {
        self.last_value
            .take()
            .ok_or_else(|| span.wrap(Error::MissingValue))
    }

    fn next_temp(&mut self) -> u32 {
        let ip = self.insert_point_mut();
        let temp = ip.next_temp;
        ip.next_temp += 1;
        temp
    }

    fn emit(&mut self, inst: Instruction) {
        self.current_block().instructions.push(inst);
    }

    fn seal(&mut self, terminator: Terminator) {
        self.current_block().terminator = Some(terminator);
    }

    fn current_block(&mut self) -> &mut BasicBlock {
        let InsertPoint {
            function, block, ..
        } = *self.insert_point_mut();
        &mut self.module.function_mut(function).blocks[block]
    }

    fn insert_point_mut(&mut self) -> &mut InsertPoint {
        let Some(ip) = self.current.as_mut() else {
            unreachable!("instructions are only emitted inside a function");
        };
        ip
    }
}

fn lower_type(ty: &ast::TypeName) -> Result<Type> {
    match ty.name() {
        "int" => Ok(Type::I32),
        "string" => Ok(Type::Ptr),
        name => Err(ty.span().wrap(Error::UnlowerableType { name: name.into() })),
    }
}
