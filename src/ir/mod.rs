//! A small, typed IR modelled on LLVM's. It only carries what the code
//! generator emits: string constants, external declarations and functions made
//! of basic blocks.

use std::collections::HashMap;

mod printer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Void,
    I1,
    I32,
    Ptr,
}

impl Type {
    pub fn is_integer(self) -> bool {
        matches!(self, Type::I1 | Type::I32)
    }
}

/// Index of a string constant within its module.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StringId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// An `i1` or `i32` constant.
    ConstInt { ty: Type, value: i64 },
    /// The null pointer. Every `khali` lowers to it.
    Null,
    /// Pointer to a module string constant.
    String(StringId),
    /// Result of an instruction.
    Temp { id: u32, ty: Type },
}

impl Value {
    pub fn bool(value: bool) -> Value {
        Value::ConstInt {
            ty: Type::I1,
            value: i64::from(value),
        }
    }

    pub fn i32(value: i32) -> Value {
        Value::ConstInt {
            ty: Type::I32,
            value: i64::from(value),
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Value::ConstInt { ty, .. } | Value::Temp { ty, .. } => *ty,
            Value::Null | Value::String(_) => Type::Ptr,
        }
    }

    pub fn is_constant(&self) -> bool {
        !matches!(self, Value::Temp { .. })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Binary {
        dest: u32,
        op: BinaryOp,
        ty: Type,
        lhs: Value,
        rhs: Value,
    },
    /// `dest` is `None` exactly when `ret` is [`Type::Void`].
    Call {
        dest: Option<u32>,
        ret: Type,
        callee: Box<str>,
        args: Vec<Value>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Ret(Option<Value>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: Box<str>,
    pub instructions: Vec<Instruction>,
    /// `None` until the block is sealed.
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(label: impl Into<Box<str>>) -> BasicBlock {
        BasicBlock {
            label: label.into(),
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: Box<str>,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    pub name: Box<str>,
    pub params: Vec<Parameter>,
    pub return_type: Type,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<Box<str>>, params: Vec<Parameter>, return_type: Type) -> Function {
        Function {
            name: name.into(),
            params,
            return_type,
            blocks: Vec::new(),
        }
    }
}

/// A function defined outside of the module, such as a runtime entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: Box<str>,
    pub return_type: Type,
    pub params: Vec<Type>,
}

/// Index of a function within its module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FunctionId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub name: Box<str>,
    strings: Vec<Box<str>>,
    string_ids: HashMap<Box<str>, StringId>,
    declarations: Vec<Declaration>,
    functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<Box<str>>) -> Module {
        Module {
            name: name.into(),
            strings: Vec::new(),
            string_ids: HashMap::new(),
            declarations: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Returns a pointer to the constant holding `s`, creating it on first use.
    /// Identical strings share one constant.
    pub fn intern_string(&mut self, s: &str) -> Value {
        if let Some(&id) = self.string_ids.get(s) {
            return Value::String(id);
        }
        let id = StringId(self.strings.len());
        self.strings.push(s.into());
        self.string_ids.insert(s.into(), id);
        Value::String(id)
    }

    pub fn strings(&self) -> &[Box<str>] {
        &self.strings
    }

    /// Declares an external function. Redeclarations are ignored.
    pub fn declare(&mut self, name: &str, return_type: Type, params: &[Type]) {
        if self.get_declaration(name).is_some() {
            return;
        }
        self.declarations.push(Declaration {
            name: name.into(),
            return_type,
            params: params.to_vec(),
        });
    }

    pub fn get_declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| &*d.name == name)
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn push_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(function);
        FunctionId(self.functions.len() - 1)
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.0]
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| &*f.name == name)
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_strings_are_deduplicated() {
        let mut module = Module::new("m");
        let a = module.intern_string("a");
        let b = module.intern_string("b");
        let a2 = module.intern_string("a");
        assert_eq!(a, Value::String(StringId(0)));
        assert_eq!(b, Value::String(StringId(1)));
        assert_eq!(a, a2);
        assert_eq!(module.strings().len(), 2);
    }

    #[test]
    fn test_many_strings_keep_insertion_order() {
        let mut module = Module::new("m");
        for round in 0..2 {
            for i in 0..1000 {
                let value = module.intern_string(&format!("s{i}"));
                assert_eq!(value, Value::String(StringId(i)), "round {round}");
            }
        }
        assert_eq!(module.strings().len(), 1000);
        assert_eq!(&*module.strings()[999], "s999");
    }

    #[test]
    fn test_declare_once() {
        let mut module = Module::new("m");
        module.declare("f", Type::Void, &[Type::Ptr]);
        module.declare("f", Type::Void, &[Type::Ptr]);
        assert_eq!(module.declarations().len(), 1);
        assert_eq!(module.get_declaration("f").unwrap().params, [Type::Ptr]);
        assert!(module.get_declaration("g").is_none());
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::bool(true).ty(), Type::I1);
        assert_eq!(Value::i32(-1).ty(), Type::I32);
        assert_eq!(Value::Null.ty(), Type::Ptr);
        assert_eq!(Value::String(StringId(3)).ty(), Type::Ptr);
        assert!(Value::Null.is_constant());
        assert!(!Value::Temp { id: 0, ty: Type::Ptr }.is_constant());
    }

    #[test]
    fn test_print_module() {
        let mut module = Module::new("demo");
        let hi = module.intern_string("hi\n");
        let quoted = module.intern_string("say \"x\"");
        module.declare("dikha_bhai", Type::Void, &[Type::Ptr]);
        module.declare("awara_bool_to_str", Type::Ptr, &[Type::I1]);

        let mut greet = Function::new(
            "greet",
            vec![
                Parameter {
                    name: "naam".into(),
                    ty: Type::Ptr,
                },
                Parameter {
                    name: "umar".into(),
                    ty: Type::I32,
                },
            ],
            Type::Void,
        );
        let mut entry = BasicBlock::new("entry");
        entry.instructions.push(Instruction::Binary {
            dest: 0,
            op: BinaryOp::Or,
            ty: Type::I1,
            lhs: Value::bool(true),
            rhs: Value::bool(false),
        });
        entry.instructions.push(Instruction::Call {
            dest: Some(1),
            ret: Type::Ptr,
            callee: "awara_bool_to_str".into(),
            args: vec![Value::Temp { id: 0, ty: Type::I1 }],
        });
        entry.instructions.push(Instruction::Call {
            dest: None,
            ret: Type::Void,
            callee: "dikha_bhai".into(),
            args: vec![Value::Temp { id: 1, ty: Type::Ptr }],
        });
        entry.terminator = Some(Terminator::Ret(None));
        greet.blocks.push(entry);
        module.push_function(greet);

        let mut main = Function::new("main", vec![], Type::I32);
        let mut entry = BasicBlock::new("entry");
        for arg in [hi, quoted, Value::Null] {
            entry.instructions.push(Instruction::Call {
                dest: None,
                ret: Type::Void,
                callee: "dikha_bhai".into(),
                args: vec![arg],
            });
        }
        entry.terminator = Some(Terminator::Ret(Some(Value::i32(0))));
        main.blocks.push(entry);
        module.push_function(main);

        let expected = indoc! {r#"
            ; ModuleID = 'demo'

            @.str = private unnamed_addr constant [4 x i8] c"hi\0A\00"
            @.str.1 = private unnamed_addr constant [8 x i8] c"say \22x\22\00"

            declare void @dikha_bhai(ptr)
            declare ptr @awara_bool_to_str(i1)

            define void @greet(ptr %naam, i32 %umar) {
            entry:
              %0 = or i1 true, false
              %1 = call ptr @awara_bool_to_str(i1 %0)
              call void @dikha_bhai(ptr %1)
              ret void
            }

            define i32 @main() {
            entry:
              call void @dikha_bhai(ptr @.str)
              call void @dikha_bhai(ptr @.str.1)
              call void @dikha_bhai(ptr null)
              ret i32 0
            }
        "#};
        assert_eq!(module.to_string(), expected);
    }

    #[test]
    fn test_print_unsealed_block() {
        let mut module = Module::new("m");
        let mut f = Function::new("f", vec![], Type::Void);
        f.blocks.push(BasicBlock::new("entry"));
        module.push_function(f);

        let expected = indoc! {"
            ; ModuleID = 'm'

            define void @f() {
            entry:
            }
        "};
        assert_eq!(module.to_string(), expected);
    }
}
